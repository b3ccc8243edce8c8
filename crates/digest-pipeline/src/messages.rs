//! User-facing notice texts.

pub const BATCH_FAILED: &str = "Unknown error. Please try again later";
pub const JOB_RETRYING: &str = "Unknown error, retrying...";
pub const JOB_FAILED: &str = "Unknown error, please try again!";
pub const SUMMARY_FAILED: &str = "Unknown error while generating summary.";

pub const USER_INFO_NOT_FOUND: &str = "User information not found! Please use /register!";
pub const USER_NOT_REGISTERED: &str =
    "User not found. Please register first by using the /register command.";
pub const CHATS_NOT_FOUND: &str = "Chat information not found! Please use /add!";
pub const INVALID_HOURS: &str = "Invalid input format. Please try again later.";

pub const USER_EXISTS: &str =
    "User already exists. Use command /remove to delete all of your data and then use /register.";
pub const INVALID_PHONE: &str = "Invalid phone number. Please try the /register command again.";
pub const REGISTERED: &str = "Great! You're all set to use this bot. To see the first chat IDs available in your account, use the /list command. To add new chats, use the /add command.";
pub const CHAT_ADDED: &str = "Added.";
pub const CHAT_REMOVED: &str = "Deleted.";
pub const USER_REMOVED: &str = "Information deleted.";

pub const LIST_PENDING: &str = "Please wait, this may take some time...";
pub const LIST_FAILED: &str = "Unknown error while retrieving the chat list. Please try again later.";
pub const LIST_EMPTY: &str = "No chats found.";
pub const LIST_CURRENT_FAILED: &str =
    "Unknown error executing /list_current command. Please try again later";

/// Placeholder sent before a chat is summarized.
pub fn generating(title: &str) -> String {
    format!("Generating summary for chat {}, please wait...", title)
}

/// A finished summary.
pub fn summary(hours: i64, title: &str, text: &str) -> String {
    format!("Summary for the past {} hours for chat {}:\n {}", hours, title, text)
}

/// Notice for a window without messages.
pub fn no_messages(title: &str, hours: i64) -> String {
    format!("No messages found in {} for the past {} hours.", title, hours)
}

/// One line of a chat listing.
pub fn chat_line(name: &str, chat_id: i64) -> String {
    format!("{}: `{}`", name, chat_id)
}
