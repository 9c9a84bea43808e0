// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Domain actions
// use these seams so external services can be swapped out in tests.
//
// Naming convention: Base* for trait names (e.g., BaseImageStore)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Image Store Trait (Infrastructure - uploaded photo storage/CDN)
// =============================================================================

#[async_trait]
pub trait BaseImageStore: Send + Sync {
    /// Upload an image and return its public URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<String>;

    /// Delete a previously uploaded image by its public URL.
    async fn delete(&self, url: &str) -> Result<()>;
}

// =============================================================================
// Plant Identifier Trait (Infrastructure - species recognition)
// =============================================================================

/// Species identification result, already reduced to the fields the
/// application stores.
#[derive(Debug, Clone)]
pub struct IdentifiedSpecies {
    pub common_name: String,
    pub scientific_name: Option<String>,
    /// Confidence percentage (0-100).
    pub confidence: Option<i32>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub alternative_names: Vec<String>,
}

#[async_trait]
pub trait BasePlantIdentifier: Send + Sync {
    /// Identify the species on an image. `Ok(None)` means the service could
    /// not recognize a plant; hard failures are errors.
    async fn identify(
        &self,
        image: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<Option<IdentifiedSpecies>>;
}

// =============================================================================
// OTP Sender Trait (Infrastructure - code delivery via email/SMS)
// =============================================================================

#[async_trait]
pub trait BaseOtpSender: Send + Sync {
    /// Deliver a one-time code to an email address or phone number.
    async fn send_code(&self, identifier: &str, code: &str) -> Result<()>;
}
