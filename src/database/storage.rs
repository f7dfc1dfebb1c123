//! Object storage for equipment and condition photos

use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use super::connection::BackendClient;
use super::store::PhotoStorage;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    client: BackendClient,
}

impl ObjectStorage {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Public URL of an object in a public bucket
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/public/{}/{}", bucket, encode_path(path)))?;
        Ok(url.to_string())
    }
}

/// Percent-encode each path segment while keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl PhotoStorage for ObjectStorage {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}/{}", bucket, encode_path(path)))?;
        let request = self
            .client
            .request(Method::POST, url)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        self.client.send(request).await?;

        info!(bucket = bucket, path = path, size = size, "Photo uploaded");
        self.public_url(bucket, path)
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<()> {
        let url = self.client.endpoint(&format!("storage/v1/object/{}", bucket))?;
        let request = self
            .client
            .request(Method::DELETE, url)
            .json(&serde_json::json!({ "prefixes": [path] }));
        self.client.send(request).await?;

        info!(bucket = bucket, path = path, "Photo removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("studio/unit/1700000000000.jpg"), "studio/unit/1700000000000.jpg");
        assert_eq!(encode_path("a b/c"), "a%20b/c");
    }
}
