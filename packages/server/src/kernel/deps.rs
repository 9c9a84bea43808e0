//! Server dependencies for domain actions (using traits for testability)
//!
//! Central dependency container handed to actions and route handlers. All
//! external services sit behind trait abstractions so tests can stub them.

use anyhow::Result;
use async_trait::async_trait;
use plantnet::PlantNetService;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::JwtService;
use crate::kernel::traits::{BaseImageStore, BaseOtpSender, BasePlantIdentifier, IdentifiedSpecies};

// =============================================================================
// PlantNetService Adapter (implements BasePlantIdentifier trait)
// =============================================================================

/// Wrapper around the plantnet client that implements BasePlantIdentifier
pub struct PlantNetAdapter(pub Arc<PlantNetService>);

impl PlantNetAdapter {
    pub fn new(service: Arc<PlantNetService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BasePlantIdentifier for PlantNetAdapter {
    async fn identify(
        &self,
        image: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<Option<IdentifiedSpecies>> {
        let response = self
            .0
            .identify(image, file_name, content_type, "auto")
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let Some(top) = response.results.first() else {
            return Ok(None);
        };

        Ok(Some(IdentifiedSpecies {
            common_name: top.display_name().to_string(),
            scientific_name: Some(top.species.scientific_name.clone()),
            confidence: Some((top.score * 100.0).round() as i32),
            family: top.species.family.as_ref().map(|t| t.scientific_name.clone()),
            genus: top.species.genus.as_ref().map(|t| t.scientific_name.clone()),
            alternative_names: top.species.common_names.clone(),
        }))
    }
}

// =============================================================================
// Log-only OTP sender (delivery vendor is environment-specific)
// =============================================================================

/// Fallback sender that logs the code instead of delivering it. Used in
/// development and tests; production wires a real delivery adapter here.
pub struct LogOtpSender;

#[async_trait]
impl BaseOtpSender for LogOtpSender {
    async fn send_code(&self, identifier: &str, code: &str) -> Result<()> {
        tracing::info!(identifier = %identifier, code = %code, "OTP code (log delivery)");
        Ok(())
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub image_store: Arc<dyn BaseImageStore>,
    pub plant_identifier: Arc<dyn BasePlantIdentifier>,
    pub otp_sender: Arc<dyn BaseOtpSender>,
    /// JWT service for token creation
    pub jwt_service: Arc<JwtService>,
    pub admin_identifiers: Vec<String>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        image_store: Arc<dyn BaseImageStore>,
        plant_identifier: Arc<dyn BasePlantIdentifier>,
        otp_sender: Arc<dyn BaseOtpSender>,
        jwt_service: Arc<JwtService>,
        admin_identifiers: Vec<String>,
    ) -> Self {
        Self {
            db_pool,
            image_store,
            plant_identifier,
            otp_sender,
            jwt_service,
            admin_identifiers,
        }
    }
}
