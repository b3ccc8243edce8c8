//! Normalized chat transcripts.

use chrono::{DateTime, Utc};

/// One rendered line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub text: String,
}

impl std::fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%:z"),
            self.sender,
            self.text
        )
    }
}

/// A chat's recent activity, oldest line first.
///
/// An empty window is represented by [`Transcript::NoMessages`], never by
/// an empty line list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Lines(Vec<TranscriptLine>),
    NoMessages,
}

impl Transcript {
    /// Build a transcript from chronologically ordered lines.
    pub fn from_lines(lines: Vec<TranscriptLine>) -> Self {
        if lines.is_empty() {
            Transcript::NoMessages
        } else {
            Transcript::Lines(lines)
        }
    }

    /// True for the "no messages" sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, Transcript::NoMessages)
    }

    /// The lines of the transcript (empty for the sentinel).
    pub fn lines(&self) -> &[TranscriptLine] {
        match self {
            Transcript::Lines(lines) => lines,
            Transcript::NoMessages => &[],
        }
    }

    /// Render the transcript as newline-separated text.
    pub fn render(&self) -> Option<String> {
        match self {
            Transcript::Lines(lines) => Some(
                lines
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Transcript::NoMessages => None,
        }
    }
}
