//! Publisher
//!
//! Posts a capture to the social account in two steps: upload the media,
//! then create a status that references the returned media id. There are no
//! retries and reposting the same file creates a duplicate post.

pub mod oauth;
pub mod twitter;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use twitter::{BlockingTwitter, TwitterClient};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to read media: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("no picture has been taken yet")]
    NoCapture,
}

/// Identifier the service assigns to uploaded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two calls the publisher needs from a posting service
pub trait SocialClient {
    fn upload_media(&self, media: &[u8]) -> Result<MediaId, PublishError>;

    /// Returns the id of the created status
    fn create_status(&self, text: &str, media: &MediaId) -> Result<String, PublishError>;
}

pub struct Publisher {
    client: Box<dyn SocialClient>,
}

impl Publisher {
    pub fn new(client: Box<dyn SocialClient>) -> Self {
        Self { client }
    }

    /// Upload the file at `path` and post it with `caption`
    pub fn post(&self, path: &Path, caption: &str) -> Result<String, PublishError> {
        let media_id = {
            // The file stays open until the upload finishes or fails.
            let mut file = File::open(path)?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            info!("Uploading {:?} ({} bytes)", path, bytes.len());
            self.client.upload_media(&bytes)?
        };

        let status_id = self.client.create_status(caption, &media_id)?;
        info!("Posted status {} with media {}", status_id, media_id);
        Ok(status_id)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSocialClient;
    use super::*;

    #[test]
    fn test_post_uploads_then_references_media() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"pixels").unwrap();

        let client = FakeSocialClient::default();
        let publisher = Publisher::new(Box::new(client.clone()));
        let status = publisher.post(&path, "caption").unwrap();

        assert_eq!(status, "status-1");
        let calls = client.calls.lock();
        assert_eq!(calls.uploads, vec![b"pixels".to_vec()]);
        assert_eq!(
            calls.statuses,
            vec![("caption".to_string(), MediaId("media-1".to_string()))]
        );
    }

    #[test]
    fn test_failed_upload_skips_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"pixels").unwrap();

        let client = FakeSocialClient {
            fail_upload: true,
            ..Default::default()
        };
        let publisher = Publisher::new(Box::new(client.clone()));

        let err = publisher.post(&path, "caption").unwrap_err();
        assert!(matches!(err, PublishError::Api { status: 503, .. }));
        let calls = client.calls.lock();
        assert_eq!(calls.uploads.len(), 1);
        assert!(calls.statuses.is_empty());
    }

    #[test]
    fn test_missing_file_calls_nothing() {
        let client = FakeSocialClient::default();
        let publisher = Publisher::new(Box::new(client.clone()));

        let err = publisher
            .post(Path::new("/nonexistent/photo.png"), "caption")
            .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
        assert!(client.calls.lock().uploads.is_empty());
    }

    #[test]
    fn test_reposting_creates_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"pixels").unwrap();

        let client = FakeSocialClient::default();
        let publisher = Publisher::new(Box::new(client.clone()));
        publisher.post(&path, "caption").unwrap();
        publisher.post(&path, "caption").unwrap();

        let calls = client.calls.lock();
        assert_eq!(calls.uploads.len(), 2);
        assert_eq!(calls.statuses.len(), 2);
        assert_eq!(calls.statuses[1].1, MediaId("media-2".to_string()));
    }
}
