//! Song references → catalog track identifiers
//!
//! One search per song, top hit only. Songs with no hit or a failed lookup
//! are dropped; the batch always runs to the end.

use super::playlist_text::SongRef;
use crate::catalog::{CatalogError, TrackSearch};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Catalog identifier (track URI) accepted by playlist insertion
pub type ResolvedTrack = String;

/// Result of looking up a single song
#[derive(Debug)]
pub enum LookupOutcome {
    Found(ResolvedTrack),
    NotFound,
    ProviderError(CatalogError),
}

/// Maps songs to catalog tracks, best effort
pub struct TrackResolver {
    search: Arc<dyn TrackSearch>,
}

impl TrackResolver {
    pub fn new(search: Arc<dyn TrackSearch>) -> Self {
        Self { search }
    }

    /// Look up one song, keeping only the top match
    pub async fn lookup(&self, song: &SongRef) -> LookupOutcome {
        match self.search.search_tracks(&song.title, &song.artist, 1).await {
            Ok(tracks) => match tracks.into_iter().next() {
                Some(track) => LookupOutcome::Found(track.uri),
                None => LookupOutcome::NotFound,
            },
            Err(e) => LookupOutcome::ProviderError(e),
        }
    }

    /// Resolve songs in order
    ///
    /// Output is never longer than `songs` and keeps their relative order.
    pub async fn resolve(&self, songs: &[SongRef]) -> Vec<ResolvedTrack> {
        let mut resolved = Vec::with_capacity(songs.len());
        let mut not_found = 0usize;
        let mut failed = 0usize;

        for song in songs {
            match self.lookup(song).await {
                LookupOutcome::Found(uri) => {
                    debug!(title = %song.title, artist = %song.artist, uri = %uri, "Track resolved");
                    resolved.push(uri);
                }
                LookupOutcome::NotFound => {
                    debug!(title = %song.title, artist = %song.artist, "No catalog match");
                    not_found += 1;
                }
                LookupOutcome::ProviderError(e) => {
                    warn!(
                        title = %song.title,
                        artist = %song.artist,
                        error = %e,
                        "Track search failed"
                    );
                    failed += 1;
                }
            }
        }

        info!(
            requested = songs.len(),
            resolved = resolved.len(),
            not_found,
            failed,
            "Track resolution complete"
        );

        resolved
    }
}
