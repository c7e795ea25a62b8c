//! Twitter client: media upload (v1.1) and post creation (v2)

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::oauth::{authorization_header, RequestNonce};
use super::{MediaId, PublishError, SocialClient};
use crate::config::PublishSettings;
use crate::credentials::Credentials;

const UPLOAD_PATH: &str = "/1.1/media/upload.json";
const TWEETS_PATH: &str = "/2/tweets";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Async client for the two posting endpoints
pub struct TwitterClient {
    http: reqwest::Client,
    credentials: Credentials,
    upload_base_url: String,
    api_base_url: String,
}

impl TwitterClient {
    pub fn new(credentials: Credentials, settings: &PublishSettings) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            credentials,
            upload_base_url: settings.upload_base_url.trim_end_matches('/').to_string(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorize(&self, method: &str, url: &str) -> String {
        authorization_header(&self.credentials, method, url, &[], &RequestNonce::fresh())
    }

    /// Upload raw media bytes, returning the media id
    pub async fn upload_media_async(&self, media: &[u8]) -> Result<MediaId, PublishError> {
        let url = format!("{}{}", self.upload_base_url, UPLOAD_PATH);
        let form = Form::new().part("media", Part::bytes(media.to_vec()).file_name("photo"));

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorize("POST", &url))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = check(response).await?.json().await?;
        debug!("Uploaded media {}", body.media_id_string);
        Ok(MediaId(body.media_id_string))
    }

    /// Create a post with `text` and one attached media item
    pub async fn create_status_async(
        &self,
        text: &str,
        media: &MediaId,
    ) -> Result<String, PublishError> {
        let url = format!("{}{}", self.api_base_url, TWEETS_PATH);
        let payload = json!({
            "text": text,
            "media": { "media_ids": [media.0] },
        });

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorize("POST", &url))
            .json(&payload)
            .send()
            .await?;

        let body: CreateTweetResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| PublishError::Response(e.to_string()))?;
        info!("Created post {}", body.data.id);
        Ok(body.data.id)
    }
}

/// Turn non-success statuses into `PublishError::Api`
async fn check(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Blocking adapter used from the dispatcher thread
pub struct BlockingTwitter {
    client: TwitterClient,
    runtime: Runtime,
}

impl BlockingTwitter {
    pub fn new(client: TwitterClient) -> Result<Self, PublishError> {
        Ok(Self {
            client,
            runtime: Runtime::new()?,
        })
    }
}

impl SocialClient for BlockingTwitter {
    fn upload_media(&self, media: &[u8]) -> Result<MediaId, PublishError> {
        self.runtime.block_on(self.client.upload_media_async(media))
    }

    fn create_status(&self, text: &str, media: &MediaId) -> Result<String, PublishError> {
        self.runtime.block_on(self.client.create_status_async(text, media))
    }
}
