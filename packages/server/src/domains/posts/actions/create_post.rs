//! Create post action - upload images and identify the species

use anyhow::Result;
use tracing::{info, warn};

use crate::common::UserId;
use crate::domains::posts::models::{NewPost, Post};
use crate::kernel::{IdentifiedSpecies, ServerDeps};

const POSTS_FOLDER: &str = "green-guard/posts";

/// One uploaded image as received from the multipart form.
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Metadata accompanying the images.
pub struct CreatePostInput {
    pub caption: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub tags: Vec<String>,
    pub up_for_adoption: bool,
}

/// Create a post from uploaded images.
///
/// Images are stored first; species identification runs on the first image
/// and is best-effort - when the recognizer is unavailable or finds nothing,
/// the post is created with a generic species name, as losing the photo over
/// a third-party outage would be worse.
pub async fn create_post(
    author: UserId,
    input: CreatePostInput,
    images: Vec<UploadedImage>,
    deps: &ServerDeps,
) -> Result<Post> {
    let mut urls = Vec::with_capacity(images.len());
    for image in &images {
        let url = deps
            .image_store
            .upload(
                image.bytes.clone(),
                &image.file_name,
                &image.content_type,
                POSTS_FOLDER,
            )
            .await?;
        urls.push(url);
    }

    let species = identify_first_image(&images, deps).await;

    let (common_name, scientific_name, confidence, family, genus) = match species {
        Some(s) => (
            s.common_name,
            s.scientific_name,
            s.confidence,
            s.family,
            s.genus,
        ),
        None => ("Plant".to_string(), None, None, None, None),
    };

    let post = Post::create(
        NewPost {
            author_id: author,
            species_common_name: common_name,
            species_scientific_name: scientific_name,
            identification_confidence: confidence,
            species_family: family,
            species_genus: genus,
            caption: input.caption,
            images: urls,
            latitude: input.latitude,
            longitude: input.longitude,
            address: input.address,
            city: input.city,
            country: input.country,
            tags: input.tags,
            up_for_adoption: input.up_for_adoption,
        },
        &deps.db_pool,
    )
    .await?;

    info!(post_id = %post.id, "post created");
    Ok(post)
}

async fn identify_first_image(
    images: &[UploadedImage],
    deps: &ServerDeps,
) -> Option<IdentifiedSpecies> {
    let first = images.first()?;

    match deps
        .plant_identifier
        .identify(
            first.bytes.clone(),
            &first.file_name,
            &first.content_type,
        )
        .await
    {
        Ok(species) => species,
        Err(e) => {
            warn!(error = %e, "species identification failed, proceeding with basic post");
            None
        }
    }
}
