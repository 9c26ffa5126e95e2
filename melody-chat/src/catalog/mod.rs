//! Music catalog integration
//!
//! Three capabilities, each a trait so the pipeline can run against fakes:
//! - [`TrackSearch`]: title/artist lookup
//! - [`PlaylistStore`]: playlist creation and population for the owner account
//! - [`AccountAuthorization`]: one-time owner consent (OAuth code flow)
//!
//! [`SpotifyClient`] implements all three against the Spotify Web API.

use async_trait::async_trait;
use thiserror::Error;

pub mod spotify;
pub mod token;

pub use spotify::SpotifyClient;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog request timed out")]
    Timeout,

    /// Rejected credentials or token (401/403, invalid_grant)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Owner account has no refresh token yet; visit /authorize
    #[error("Owner account not authorized")]
    NotAuthorized,

    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Catalog API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Track as returned by a catalog search
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    /// Identifier accepted by [`PlaylistStore::add_items`]
    pub uri: String,
    pub name: String,
}

/// Playlist as returned by creation
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRecord {
    pub id: String,
    /// Public web link; absent if the catalog did not report one
    pub share_url: Option<String>,
}

/// Playlist creation parameters
#[derive(Debug, Clone)]
pub struct NewPlaylist<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub public: bool,
    pub description: &'a str,
}

#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Search tracks by title and artist field filters
    async fn search_tracks(
        &self,
        title: &str,
        artist: &str,
        limit: u32,
    ) -> Result<Vec<TrackRecord>, CatalogError>;
}

#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn create_playlist(&self, playlist: &NewPlaylist<'_>)
        -> Result<PlaylistRecord, CatalogError>;

    /// Append tracks, in order, in one call
    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait AccountAuthorization: Send + Sync {
    /// Consent page URL the owner must visit once
    fn authorize_url(&self) -> Result<String, CatalogError>;

    /// Exchange the code delivered to the redirect URI for owner credentials
    async fn complete_authorization(&self, code: &str) -> Result<(), CatalogError>;

    /// Whether owner credentials are currently installed
    async fn is_authorized(&self) -> bool;
}
