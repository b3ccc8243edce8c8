//! Dialog and chat history types from the gateway daemon.

use chrono::DateTime;
use digest_core::{ChatInfo, Dialog, DialogKind, HistoryMessage, MediaKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A chat as reported by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChat {
    /// Chat id.
    pub id: i64,

    /// Chat type: "private", "bot", "group", "supergroup" or "channel".
    #[serde(default, rename = "type")]
    pub chat_type: Option<String>,

    /// Title for groups and channels.
    #[serde(default)]
    pub title: Option<String>,

    /// First name for private chats.
    #[serde(default)]
    pub first_name: Option<String>,

    /// Last name for private chats.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl RawChat {
    /// Convert to the pipeline's chat metadata.
    pub fn to_chat_info(&self) -> ChatInfo {
        let title = self.title.clone().or_else(|| {
            self.first_name.as_ref().map(|first| match &self.last_name {
                Some(last) => format!("{} {}", first, last),
                None => first.clone(),
            })
        });
        ChatInfo { id: self.id, title }
    }
}

/// An entry of the dialog list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDialog {
    pub chat: RawChat,
}

impl RawDialog {
    /// Convert to a [`Dialog`].
    pub fn to_dialog(&self) -> Dialog {
        let chat = &self.chat;
        let kind = match chat.chat_type.as_deref() {
            Some("private") | Some("bot") => DialogKind::Private {
                first_name: chat.first_name.clone(),
                last_name: chat.last_name.clone(),
            },
            Some("group") | Some("supergroup") => DialogKind::Group {
                title: chat.title.clone(),
            },
            Some("channel") => DialogKind::Channel {
                title: chat.title.clone(),
            },
            _ => DialogKind::Unknown,
        };
        Dialog {
            chat_id: chat.id,
            kind,
        }
    }
}

/// One page of the dialog list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogPage {
    #[serde(default)]
    pub dialogs: Vec<RawDialog>,

    /// Offset for the next page, absent on the last page.
    #[serde(default)]
    pub next_offset: Option<i64>,
}

/// Message author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub first_name: Option<String>,
}

/// A media item attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    /// Media type, e.g. "photo", "document", "video_note".
    #[serde(default, rename = "type")]
    pub media_type: String,

    /// Original filename for documents.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl RawMedia {
    fn to_media_kind(&self) -> Option<MediaKind> {
        let kind = match self.media_type.as_str() {
            "audio" => MediaKind::Audio,
            "voice" => MediaKind::Voice,
            "video" => MediaKind::Video,
            "photo" => MediaKind::Photo,
            "document" => MediaKind::Document {
                file_name: self.file_name.clone(),
            },
            "sticker" => MediaKind::Sticker,
            "animation" => MediaKind::Animation,
            "video_note" => MediaKind::VideoNote,
            other => {
                debug!("Ignoring unknown media type {:?}", other);
                return None;
            }
        };
        Some(kind)
    }
}

/// A message from a chat's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: i64,

    /// Unix timestamp in seconds.
    #[serde(default)]
    pub date: Option<i64>,

    #[serde(default)]
    pub from: Option<RawUser>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub caption: Option<String>,

    #[serde(default)]
    pub media: Vec<RawMedia>,
}

impl RawMessage {
    /// Convert to a [`HistoryMessage`].
    pub fn to_history_message(&self) -> HistoryMessage {
        HistoryMessage {
            id: self.id,
            date: self.date.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            sender: self.from.as_ref().and_then(|u| u.first_name.clone()),
            text: self.text.clone(),
            caption: self.caption.clone(),
            media: self.media.iter().filter_map(RawMedia::to_media_kind).collect(),
        }
    }
}

/// One page of chat history, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default)]
    pub messages: Vec<RawMessage>,

    /// Message id to continue from, absent on the last page.
    #[serde(default)]
    pub next_offset_id: Option<i64>,
}
