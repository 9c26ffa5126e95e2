//! Spotify Web API client
//!
//! Two identities are in play:
//! - The app itself (client-credentials grant), used for catalog search.
//! - The fixed owner account (refresh-token grant), used to create and fill
//!   playlists. The refresh token comes from configuration or from a
//!   completed `/authorize` → `/callback` round trip.
//!
//! # API Reference
//! - Token: `POST {accounts}/api/token`
//! - Search: `GET {api}/search?q=track:<t> artist:<a>&type=track&limit=n`
//! - Create: `POST {api}/users/{owner}/playlists`
//! - Add: `POST {api}/playlists/{id}/tracks`

use super::token::{CachedToken, TokenResponse};
use super::{
    AccountAuthorization, CatalogError, NewPlaylist, PlaylistRecord, PlaylistStore, TrackRecord,
    TrackSearch,
};
use async_trait::async_trait;
use melody_common::config::CatalogConfig;
use reqwest::{header, Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("melody-chat/", env!("CARGO_PKG_VERSION"));

/// Scope needed to create and modify public playlists
const OWNER_SCOPE: &str = "playlist-modify-public";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<SearchTracks>,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    uri: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    public: bool,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddItemsBody<'a> {
    uris: &'a [String],
}

/// Spotify client for search, playlist management and owner authorization
pub struct SpotifyClient {
    http_client: Client,
    api_base_url: String,
    accounts_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    /// Client-credentials token for search
    app_token: Mutex<Option<CachedToken>>,
    /// Owner token for playlist writes
    owner_token: Mutex<Option<CachedToken>>,
    refresh_token: RwLock<Option<String>>,
}

impl SpotifyClient {
    /// Build a client from validated configuration
    pub fn new(config: &CatalogConfig, timeout: Duration) -> Result<Self, CatalogError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            accounts_base_url: config.accounts_base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            redirect_uri: config.redirect_uri.clone(),
            app_token: Mutex::new(None),
            owner_token: Mutex::new(None),
            refresh_token: RwLock::new(config.refresh_token.clone()),
        })
    }

    /// POST a form to the token endpoint with client basic auth
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, CatalogError> {
        let url = format!("{}/api/token", self.accounts_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        // The token endpoint reports bad grants/credentials as 400
        let status = response.status();
        if status.as_u16() == 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(body));
        }

        let response = check_status(response).await?;
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse token response: {}", e)))
    }

    /// App token, renewed when stale
    async fn app_access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.app_token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        debug!("Requesting client-credentials token");
        let response = self
            .request_token(&[("grant_type", "client_credentials")])
            .await?;
        let token = CachedToken::from_response(&response);
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }

    /// Owner token, refreshed from the stored refresh token when stale
    async fn owner_access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.owner_token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let refresh = self
            .refresh_token
            .read()
            .await
            .clone()
            .ok_or(CatalogError::NotAuthorized)?;

        debug!("Refreshing owner access token");
        let response = self
            .request_token(&[("grant_type", "refresh_token"), ("refresh_token", refresh.as_str())])
            .await?;

        // Spotify may rotate the refresh token
        if let Some(rotated) = response.refresh_token.clone() {
            *self.refresh_token.write().await = Some(rotated);
        }

        let token = CachedToken::from_response(&response);
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }

    /// Drop a cached owner token after the API rejected it
    async fn invalidate_owner_token(&self) {
        *self.owner_token.lock().await = None;
    }
}

#[async_trait]
impl TrackSearch for SpotifyClient {
    async fn search_tracks(
        &self,
        title: &str,
        artist: &str,
        limit: u32,
    ) -> Result<Vec<TrackRecord>, CatalogError> {
        let token = self.app_access_token().await?;
        let url = format!("{}/search", self.api_base_url);
        let query = format!("track:{} artist:{}", title, artist);
        let limit = limit.to_string();

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = match check_status(response).await {
            Err(CatalogError::Auth(msg)) => {
                *self.app_token.lock().await = None;
                return Err(CatalogError::Auth(msg));
            }
            other => other?,
        };

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse search response: {}", e)))?;

        Ok(parsed
            .tracks
            .map(|t| t.items)
            .unwrap_or_default()
            .into_iter()
            .map(|t| TrackRecord {
                id: t.id,
                uri: t.uri,
                name: t.name,
            })
            .collect())
    }
}

#[async_trait]
impl PlaylistStore for SpotifyClient {
    async fn create_playlist(
        &self,
        playlist: &NewPlaylist<'_>,
    ) -> Result<PlaylistRecord, CatalogError> {
        let token = self.owner_access_token().await?;
        let url = format!("{}/users/{}/playlists", self.api_base_url, playlist.owner);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&CreatePlaylistBody {
                name: playlist.name,
                public: playlist.public,
                description: playlist.description,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = match check_status(response).await {
            Err(CatalogError::Auth(msg)) => {
                self.invalidate_owner_token().await;
                return Err(CatalogError::Auth(msg));
            }
            other => other?,
        };

        let created: SpotifyPlaylist = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse playlist: {}", e)))?;

        Ok(PlaylistRecord {
            id: created.id,
            share_url: created.external_urls.and_then(|u| u.spotify),
        })
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
        let token = self.owner_access_token().await?;
        let url = format!("{}/playlists/{}/tracks", self.api_base_url, playlist_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&AddItemsBody { uris })
            .send()
            .await
            .map_err(map_transport_error)?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(CatalogError::Auth(msg)) => {
                self.invalidate_owner_token().await;
                Err(CatalogError::Auth(msg))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AccountAuthorization for SpotifyClient {
    fn authorize_url(&self) -> Result<String, CatalogError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_base_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", OWNER_SCOPE),
            ],
        )
        .map_err(|e| CatalogError::Parse(format!("Invalid accounts URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn complete_authorization(&self, code: &str) -> Result<(), CatalogError> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;

        let refresh = response.refresh_token.clone().ok_or_else(|| {
            CatalogError::Parse("Token response carried no refresh token".to_string())
        })?;

        *self.refresh_token.write().await = Some(refresh);
        *self.owner_token.lock().await = Some(CachedToken::from_response(&response));

        info!("Owner account authorized");
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        self.refresh_token.read().await.is_some()
    }
}

fn map_transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Network(e.to_string())
    }
}

/// Classify a non-success response
async fn check_status(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => {
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::Auth(body))
        }
        429 => {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            warn!(?retry_after_secs, "Catalog rate limit hit");
            Err(CatalogError::RateLimited { retry_after_secs })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::Status(code, body))
        }
    }
}
