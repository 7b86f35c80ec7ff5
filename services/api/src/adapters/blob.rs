//! services/api/src/adapters/blob.rs
//!
//! Stores uploaded media on the local filesystem. The router serves the same
//! directory under `/media`.

use std::path::PathBuf;

use async_trait::async_trait;
use course_admin_core::ports::{BlobStorage, PortError, PortResult};
use tracing::debug;
use uuid::Uuid;

pub struct LocalBlobStorage {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStorage {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn save(&self, bytes: &[u8], content_type: &str) -> PortResult<String> {
        let name = format!("{}.{}", Uuid::new_v4().simple(), extension_for(content_type));
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to prepare media directory: {e}")))?;
        tokio::fs::write(self.dir.join(&name), bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to store upload: {e}")))?;
        debug!(file = %name, size = bytes.len(), "Stored upload");
        Ok(format!("{}/media/{}", self.public_base_url, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_files_are_addressed_under_media() {
        let dir = std::env::temp_dir().join(format!("course-admin-media-{}", Uuid::new_v4()));
        let blobs = LocalBlobStorage::new(&dir, "http://admin.test");

        let url = blobs.save(b"png-bytes", "image/png").await.unwrap();
        let name = url.strip_prefix("http://admin.test/media/").unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(dir.join(name)).unwrap(), b"png-bytes");

        std::fs::remove_dir_all(dir).ok();
    }
}
