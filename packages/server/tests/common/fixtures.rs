//! Test fixtures: stubbed external services and data builders.
//!
//! Data builders go through the model methods so fixtures exercise the same
//! code paths production does.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use server_core::common::UserId;
use server_core::domains::plants::models::{NewPlant, Plant};
use server_core::domains::posts::models::{NewPost, Post};
use server_core::domains::users::models::User;
use server_core::kernel::{BaseImageStore, BasePlantIdentifier, IdentifiedSpecies};

// =============================================================================
// Service stubs
// =============================================================================

/// Image store that "stores" nothing and hands back a deterministic URL.
pub struct StubImageStore;

#[async_trait]
impl BaseImageStore for StubImageStore {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        _content_type: &str,
        folder: &str,
    ) -> Result<String> {
        Ok(format!("https://images.test/{}/{}", folder, file_name))
    }

    async fn delete(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}

/// Identifier that never recognizes anything (posts fall back to "Plant").
pub struct StubPlantIdentifier;

#[async_trait]
impl BasePlantIdentifier for StubPlantIdentifier {
    async fn identify(
        &self,
        _image: Vec<u8>,
        _file_name: &str,
        _content_type: &str,
    ) -> Result<Option<IdentifiedSpecies>> {
        Ok(None)
    }
}

// =============================================================================
// Data builders
// =============================================================================

pub async fn create_test_user(pool: &PgPool, username: &str) -> Result<User> {
    User::insert(username, username, pool).await
}

/// A public post that is up for adoption.
pub async fn create_adoptable_post(pool: &PgPool, author: UserId, species: &str) -> Result<Post> {
    Post::create(
        NewPost {
            author_id: author,
            species_common_name: species.to_string(),
            species_scientific_name: None,
            identification_confidence: None,
            species_family: None,
            species_genus: None,
            caption: format!("{} looking for a new home", species),
            images: vec!["https://images.test/green-guard/posts/test.jpg".to_string()],
            latitude: 52.52,
            longitude: 13.405,
            address: None,
            city: Some("Berlin".to_string()),
            country: Some("Germany".to_string()),
            tags: vec!["adoption".to_string()],
            up_for_adoption: true,
        },
        pool,
    )
    .await
}

/// A standalone plant listing.
pub async fn create_test_plant(pool: &PgPool, owner: UserId, species: &str) -> Result<Plant> {
    Plant::create(
        NewPlant {
            owner_id: owner,
            species_common_name: species.to_string(),
            species_scientific_name: None,
            image_url: "https://images.test/green-guard/plants/test.jpg".to_string(),
            latitude: 52.52,
            longitude: 13.405,
            description: Some("Healthy cutting".to_string()),
        },
        pool,
    )
    .await
}
