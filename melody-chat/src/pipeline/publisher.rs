//! Resolved tracks → public playlist on the owner account
//!
//! All playlists belong to one configured account, regardless of who asked
//! for them. Failures stop at this boundary: the caller only learns whether
//! a share link is available.

use super::resolver::ResolvedTrack;
use crate::catalog::{CatalogError, NewPlaylist, PlaylistStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Playlist created in the remote catalog
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPlaylist {
    pub id: String,
    pub share_url: Option<String>,
}

/// Creates and fills playlists for the owner account
pub struct PlaylistPublisher {
    store: Arc<dyn PlaylistStore>,
    owner: String,
    description: String,
}

impl PlaylistPublisher {
    pub fn new(store: Arc<dyn PlaylistStore>, owner: String, description: String) -> Self {
        Self {
            store,
            owner,
            description,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Create the playlist and add `tracks` in order
    ///
    /// The add step is skipped for an empty track list.
    pub async fn try_publish(
        &self,
        name: &str,
        tracks: &[ResolvedTrack],
    ) -> Result<PublishedPlaylist, CatalogError> {
        let record = self
            .store
            .create_playlist(&NewPlaylist {
                owner: &self.owner,
                name,
                public: true,
                description: &self.description,
            })
            .await?;

        if !tracks.is_empty() {
            self.store.add_items(&record.id, tracks).await?;
        }

        info!(
            playlist_id = %record.id,
            owner = %self.owner,
            tracks = tracks.len(),
            "Playlist published"
        );

        Ok(PublishedPlaylist {
            id: record.id,
            share_url: record.share_url,
        })
    }

    /// Publish and return the share link, or `None` on any failure
    pub async fn publish(&self, name: &str, tracks: &[ResolvedTrack]) -> Option<String> {
        match self.try_publish(name, tracks).await {
            Ok(playlist) => {
                if playlist.share_url.is_none() {
                    warn!(playlist_id = %playlist.id, "Playlist created without a share link");
                }
                playlist.share_url
            }
            Err(e) => {
                warn!(name = %name, error = %e, "Playlist publishing failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlaylistRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        fail_create: bool,
        fail_add: bool,
        created: Mutex<Vec<(String, String, bool, String)>>,
        added: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl PlaylistStore for FakeStore {
        async fn create_playlist(
            &self,
            playlist: &NewPlaylist<'_>,
        ) -> Result<PlaylistRecord, CatalogError> {
            if self.fail_create {
                return Err(CatalogError::Auth("expired".to_string()));
            }
            self.created.lock().unwrap().push((
                playlist.owner.to_string(),
                playlist.name.to_string(),
                playlist.public,
                playlist.description.to_string(),
            ));
            Ok(PlaylistRecord {
                id: "pl-1".to_string(),
                share_url: Some("https://open.spotify.com/playlist/pl-1".to_string()),
            })
        }

        async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
            if self.fail_add {
                return Err(CatalogError::Status(500, "boom".to_string()));
            }
            self.added
                .lock()
                .unwrap()
                .push((playlist_id.to_string(), uris.to_vec()));
            Ok(())
        }
    }

    fn publisher(store: Arc<FakeStore>) -> PlaylistPublisher {
        PlaylistPublisher::new(store, "helloniam".to_string(), "By Melody".to_string())
    }

    #[tokio::test]
    async fn test_publish_creates_public_playlist_for_owner() {
        let store = Arc::new(FakeStore::default());
        let tracks = vec!["spotify:track:1".to_string(), "spotify:track:2".to_string()];

        let url = publisher(store.clone()).publish("happy pop Playlist", &tracks).await;

        assert_eq!(url.as_deref(), Some("https://open.spotify.com/playlist/pl-1"));
        let created = store.created.lock().unwrap();
        assert_eq!(
            created[0],
            (
                "helloniam".to_string(),
                "happy pop Playlist".to_string(),
                true,
                "By Melody".to_string()
            )
        );
        let added = store.added.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0], ("pl-1".to_string(), tracks.clone()));
    }

    #[tokio::test]
    async fn test_zero_tracks_skips_add_step() {
        let store = Arc::new(FakeStore::default());

        let url = publisher(store.clone()).publish("empty", &[]).await;

        assert!(url.is_some());
        assert_eq!(store.created.lock().unwrap().len(), 1);
        assert!(store.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_yields_no_url() {
        let store = Arc::new(FakeStore {
            fail_create: true,
            ..FakeStore::default()
        });

        assert!(publisher(store).publish("x", &["t".to_string()]).await.is_none());
    }

    #[tokio::test]
    async fn test_add_failure_yields_no_url() {
        let store = Arc::new(FakeStore {
            fail_add: true,
            ..FakeStore::default()
        });

        let result = publisher(store.clone()).try_publish("x", &["t".to_string()]).await;
        assert!(matches!(result, Err(CatalogError::Status(500, _))));
        assert!(publisher(store).publish("x", &["t".to_string()]).await.is_none());
    }
}
