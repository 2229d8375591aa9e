//! Likes API for the Refrain server.

use crate::error::{ClientError, Result};
use crate::types::{LikeKey, LikeOutcome, LikeResponse, UnlikeOutcome};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Likes client for the Refrain server.
pub struct LikesClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: &'a str,
}

impl<'a> LikesClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: &'a str) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/likes", self.base_url)
    }

    /// Get every track the user has liked.
    pub async fn list(&self) -> Result<Vec<LikeKey>> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching likes");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let likes: Vec<LikeKey> = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse likes response: {}", e))
            })?;

            debug!(count = likes.len(), "Fetched likes");
            Ok(likes)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::AuthRequired)
        } else {
            Err(server_error(response).await)
        }
    }

    /// Like a track.
    pub async fn like(&self, key: LikeKey) -> Result<LikeOutcome> {
        let url = self.endpoint();
        debug!(url = %url, album_id = key.album_id, track_number = key.track_number, "Liking track");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.access_token)
            .json(&key)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        match response.status() {
            StatusCode::CREATED => {
                let body: LikeResponse = response.json().await.map_err(|e| {
                    ClientError::ParseError(format!("Failed to parse like response: {}", e))
                })?;
                debug!(message = %body.message, "Like recorded");
                Ok(LikeOutcome::Created(body.like.unwrap_or(key)))
            }
            StatusCode::OK => Ok(LikeOutcome::AlreadyLiked),
            StatusCode::UNAUTHORIZED => Err(ClientError::AuthRequired),
            _ => Err(server_error(response).await),
        }
    }

    /// Remove a like.
    pub async fn unlike(&self, key: LikeKey) -> Result<UnlikeOutcome> {
        let url = self.endpoint();
        debug!(url = %url, album_id = key.album_id, track_number = key.track_number, "Unliking track");

        let response = self
            .http
            .delete(&url)
            .bearer_auth(self.access_token)
            .json(&key)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        match response.status() {
            StatusCode::OK => Ok(UnlikeOutcome::Removed),
            StatusCode::NOT_FOUND => Ok(UnlikeOutcome::NotFound),
            StatusCode::UNAUTHORIZED => Err(ClientError::AuthRequired),
            _ => Err(server_error(response).await),
        }
    }
}

async fn server_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ClientError::ServerError { status, message }
}
