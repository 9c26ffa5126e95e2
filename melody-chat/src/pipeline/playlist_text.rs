//! Numbered playlist text → ordered song references
//!
//! Expected entry shape, one per line:
//!
//! ```text
//! 1. Happy - Pharrell Williams
//! 10. Good Vibrations - The Beach Boys
//! ```
//!
//! Anything else (headings, prose, `1)` or `1-` numbering, extra ` - `
//! separators) is classified by [`parse_line`] and skipped by
//! [`parse_playlist`].

use thiserror::Error;
use tracing::debug;

const FIELD_SEPARATOR: &str = " - ";
const ORDINAL_SEPARATOR: &str = ". ";

/// A song as named by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub title: String,
    pub artist: String,
}

impl SongRef {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// Generated playlist: the text shown to the user plus the entries parsed from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDraft {
    pub display_text: String,
    pub entries: Vec<SongRef>,
}

impl PlaylistDraft {
    pub fn from_text(text: impl Into<String>) -> Self {
        let display_text = text.into();
        let entries = parse_playlist(&display_text);
        Self {
            display_text,
            entries,
        }
    }
}

/// Why a line is not a playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("blank line")]
    Blank,

    #[error("line does not start with a list number")]
    NotNumbered,

    #[error("expected exactly one \" - \" separator, found {0}")]
    SeparatorCount(usize),

    #[error("no \". \" between list number and title")]
    MissingOrdinal,

    #[error("list number is not numeric")]
    BadOrdinal,

    #[error("empty title or artist")]
    EmptyField,
}

/// Parse one line as `<n>. <title> - <artist>`
pub fn parse_line(line: &str) -> Result<SongRef, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineError::Blank);
    }
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(LineError::NotNumbered);
    }

    let separators = line.matches(FIELD_SEPARATOR).count();
    if separators != 1 {
        return Err(LineError::SeparatorCount(separators));
    }
    let (numbered_title, artist) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or(LineError::SeparatorCount(0))?;

    let (ordinal, title) = numbered_title
        .split_once(ORDINAL_SEPARATOR)
        .ok_or(LineError::MissingOrdinal)?;
    if !ordinal.chars().all(|c| c.is_ascii_digit()) {
        return Err(LineError::BadOrdinal);
    }

    let title = title.trim();
    let artist = artist.trim();
    if title.is_empty() || artist.is_empty() {
        return Err(LineError::EmptyField);
    }

    Ok(SongRef::new(title, artist))
}

/// Extract every well-formed entry, in input order
///
/// Malformed lines are skipped; an empty result is valid.
pub fn parse_playlist(text: &str) -> Vec<SongRef> {
    text.lines()
        .filter_map(|line| match parse_line(line) {
            Ok(song) => Some(song),
            Err(LineError::Blank) | Err(LineError::NotNumbered) => None,
            Err(reason) => {
                debug!(line = %line, %reason, "Skipping malformed playlist line");
                None
            }
        })
        .collect()
}
