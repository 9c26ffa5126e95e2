//! Playlist pipeline stages
//!
//! Generated text → preferences ([`preferences`]) → playlist text
//! ([`playlist_text`]) → catalog tracks ([`resolver`]) → remote playlist
//! ([`publisher`]). Each stage absorbs its own failures and hands a
//! (possibly smaller) result to the next.

pub mod playlist_text;
pub mod preferences;
pub mod publisher;
pub mod resolver;

pub use playlist_text::{parse_playlist, PlaylistDraft, SongRef};
pub use preferences::{extract_preferences, Extraction};
pub use publisher::{PlaylistPublisher, PublishedPlaylist};
pub use resolver::{LookupOutcome, ResolvedTrack, TrackResolver};
