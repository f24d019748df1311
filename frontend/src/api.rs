//! HTTP client for the mixdesk track API.

use async_trait::async_trait;
use mixdesk_types::{ErrorResponse, TrackListResponse, TrackUpdate};
use tracing::{debug, info};

use crate::engine::{Engine, EngineError, EngineResult};

/// Client for the REST API, rooted at `{server}/api`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for a server URL such as `http://localhost:8080`.
    pub fn new(server_url: &str) -> Self {
        Self {
            base_url: format!("{}/api", server_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tracks_url(&self) -> String {
        format!("{}/tracks", self.base_url)
    }

    fn track_url(&self, track_name: &str) -> String {
        format!("{}/tracks/{}", self.base_url, urlencoding::encode(track_name))
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> EngineResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Network error during {}: {}", what, e);
            EngineError::Network(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            tracing::error!("HTTP error {} during {}: {}", status, what, message);
            return Err(EngineError::Http { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl Engine for ApiClient {
    async fn update_track(&self, track_name: &str, update: TrackUpdate) -> EngineResult<()> {
        let url = self.track_url(track_name);
        debug!("Updating track {}: {}", track_name, update.description());

        self.send(self.client.patch(&url).json(&update), "track update")
            .await?;
        Ok(())
    }

    async fn add_empty_track(&self) -> EngineResult<()> {
        let url = self.tracks_url();
        info!("Adding empty track via: {}", url);

        self.send(self.client.post(&url), "add track").await?;
        Ok(())
    }

    async fn remove_track(&self, track_name: &str) -> EngineResult<()> {
        let url = self.track_url(track_name);
        info!("Removing track: {}", track_name);

        self.send(self.client.delete(&url), "remove track").await?;
        Ok(())
    }

    async fn get_track_list(&self) -> EngineResult<TrackListResponse> {
        let url = self.tracks_url();
        debug!("Fetching tracks from: {}", url);

        let response = self.send(self.client.get(&url), "track list").await?;
        let list: TrackListResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse track list response: {}", e);
            EngineError::Decode(e.to_string())
        })?;

        debug!("Loaded {} tracks", list.tracks.len());
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_appends_api() {
        assert_eq!(
            ApiClient::new("http://localhost:8080").base_url(),
            "http://localhost:8080/api"
        );
        assert_eq!(
            ApiClient::new("http://localhost:8080/").base_url(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_track_names_are_escaped() {
        let client = ApiClient::new("http://host:1");
        assert_eq!(
            client.track_url("Lead Vox/2"),
            "http://host:1/api/tracks/Lead%20Vox%2F2"
        );
    }
}
