//! Cloudinary-backed image store.
//!
//! Uploads go through the unsigned upload API with an upload preset; deletes
//! use the signed destroy API (SHA-256 request signatures).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::kernel::traits::BaseImageStore;

#[derive(Debug, Clone)]
pub struct CloudinaryOptions {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    options: CloudinaryOptions,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryStore {
    pub fn new(options: CloudinaryOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.options.cloud_name, action
        )
    }

    /// Extract the public id (folder path + basename without extension or
    /// version segment) from a Cloudinary delivery URL.
    fn public_id_from_url(url: &str) -> Option<String> {
        let tail = url.split("/upload/").nth(1)?;
        let tail = tail
            .split_once('/')
            .filter(|(version, _)| version.starts_with('v'))
            .map(|(_, rest)| rest)
            .unwrap_or(tail);
        let without_ext = tail.rsplit_once('.').map(|(base, _)| base).unwrap_or(tail);
        Some(without_ext.to_string())
    }

    fn sign(&self, params: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.as_bytes());
        hasher.update(self.options.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl BaseImageStore for CloudinaryStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .context("invalid image content type")?;

        let form = Form::new()
            .text("upload_preset", self.options.upload_preset.clone())
            .text("folder", folder.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .context("image upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("image upload failed ({}): {}", status, body));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .context("unexpected image upload response")?;

        Ok(uploaded.secure_url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let public_id = Self::public_id_from_url(url)
            .ok_or_else(|| anyhow!("not a recognizable image URL: {}", url))?;

        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(&format!("public_id={}&timestamp={}", public_id, timestamp));

        let form = Form::new()
            .text("public_id", public_id)
            .text("timestamp", timestamp.to_string())
            .text("api_key", self.options.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256".to_string());

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await
            .context("image delete request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("image delete failed ({}): {}", status, body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_strips_version_and_extension() {
        let url =
            "https://res.cloudinary.com/demo/image/upload/v1700000000/green-guard/posts/abc123.jpg";
        assert_eq!(
            CloudinaryStore::public_id_from_url(url).unwrap(),
            "green-guard/posts/abc123"
        );
    }

    #[test]
    fn public_id_without_version_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/green-guard/profiles/pfp.png";
        assert_eq!(
            CloudinaryStore::public_id_from_url(url).unwrap(),
            "green-guard/profiles/pfp"
        );
    }

    #[test]
    fn public_id_rejects_foreign_urls() {
        assert!(CloudinaryStore::public_id_from_url("https://example.com/cat.jpg").is_none());
    }
}
