//! Message, dialog and chat types exposed by messaging sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media attached to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Audio,
    Voice,
    Video,
    Photo,
    /// A file, with its original name when the provider reports one.
    Document { file_name: Option<String> },
    Sticker,
    /// Animated GIF.
    Animation,
    VideoNote,
}

impl MediaKind {
    /// Bracketed tag used when rendering the message into a transcript.
    pub fn tag(&self) -> String {
        match self {
            MediaKind::Audio => "[AUDIO]".to_string(),
            MediaKind::Voice => "[VOICE]".to_string(),
            MediaKind::Video => "[VIDEO]".to_string(),
            MediaKind::Photo => "[PHOTO]".to_string(),
            MediaKind::Document { file_name } => format!(
                "[FILE: {}]",
                file_name.as_deref().unwrap_or("unknown")
            ),
            MediaKind::Sticker => "[STICKER]".to_string(),
            MediaKind::Animation => "[GIF]".to_string(),
            MediaKind::VideoNote => "[VIDEO NOTE]".to_string(),
        }
    }

    /// Position of this kind's tag in a rendered line.
    fn rank(&self) -> u8 {
        match self {
            MediaKind::Audio => 0,
            MediaKind::Voice => 1,
            MediaKind::Video => 2,
            MediaKind::Photo => 3,
            MediaKind::Document { .. } => 4,
            MediaKind::Sticker => 5,
            MediaKind::Animation => 6,
            MediaKind::VideoNote => 7,
        }
    }
}

/// A single message from a chat's history.
///
/// Every field except the id is optional: providers routinely omit
/// senders (channel posts, deleted accounts) and occasionally dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Provider message id.
    pub id: i64,
    /// When the message was sent.
    pub date: Option<DateTime<Utc>>,
    /// Sender display name.
    pub sender: Option<String>,
    /// Message text.
    pub text: Option<String>,
    /// Media caption.
    pub caption: Option<String>,
    /// Media carried by the message.
    pub media: Vec<MediaKind>,
}

impl HistoryMessage {
    /// Create a plain text message.
    pub fn text(id: i64, date: DateTime<Utc>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            date: Some(date),
            sender: Some(sender.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Attach a media kind.
    pub fn with_media(mut self, media: MediaKind) -> Self {
        self.media.push(media);
        self
    }

    /// Attach a caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Render the message body: text (or caption) followed by media tags.
    ///
    /// Returns `None` when nothing renderable remains.
    pub fn render_body(&self) -> Option<String> {
        let mut body = self
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.caption.as_deref())
            .unwrap_or_default()
            .to_string();

        if !self.media.is_empty() {
            let mut media: Vec<&MediaKind> = self.media.iter().collect();
            media.sort_by_key(|m| m.rank());
            let tags: Vec<String> = media.iter().map(|m| m.tag()).collect();
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(&tags.join(" "));
        }

        if body.trim().is_empty() {
            None
        } else {
            Some(body)
        }
    }
}

/// Kind of a dialog in the user's chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    /// One-to-one conversation.
    Private {
        first_name: Option<String>,
        last_name: Option<String>,
    },
    /// Group or supergroup.
    Group { title: Option<String> },
    /// Broadcast channel.
    Channel { title: Option<String> },
    /// Anything the provider reports that we cannot classify.
    Unknown,
}

/// An entry of the user's chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub chat_id: i64,
    pub kind: DialogKind,
}

impl Dialog {
    /// Human-readable name, or `None` for entries that cannot be shown.
    pub fn display_name(&self) -> Option<String> {
        match &self.kind {
            DialogKind::Private {
                first_name,
                last_name,
            } => {
                let mut name = first_name
                    .clone()
                    .unwrap_or_else(|| "Deleted Account".to_string());
                if let Some(last) = last_name.as_deref().filter(|l| !l.is_empty()) {
                    name.push(' ');
                    name.push_str(last);
                }
                Some(name)
            }
            DialogKind::Group { title } | DialogKind::Channel { title } => Some(
                title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Unnamed Chat".to_string()),
            ),
            DialogKind::Unknown => None,
        }
    }
}

/// Chat metadata looked up by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    pub id: i64,
    pub title: Option<String>,
}

impl ChatInfo {
    /// Title for user-facing messages.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("chat {}", self.id))
    }
}
