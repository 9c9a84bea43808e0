//! API data types for posts.

use serde::Serialize;

use crate::domains::posts::models::{Comment, Post, PostWithDistance, PostWithMeta};
use crate::domains::users::data::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct PlantInfoData {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub confidence: Option<i32>,
    pub family: Option<String>,
    pub genus: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Post as returned by the API, with social counters for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: String,
    pub author: UserSummary,
    pub plant_data: PlantInfoData,
    pub caption: String,
    pub images: Vec<String>,
    pub location: LocationData,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub up_for_adoption: bool,
    pub adoption_status: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Distance from the caller in km; only on adoption-map responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl PostData {
    pub fn from_meta(meta: PostWithMeta, author: UserSummary) -> Self {
        Self::build(
            meta.post,
            author,
            meta.like_count,
            meta.comment_count,
            meta.is_liked,
            None,
        )
    }

    pub fn from_distance(with_distance: PostWithDistance, author: UserSummary) -> Self {
        let distance = (with_distance.distance_km * 100.0).round() / 100.0;
        Self::build(with_distance.post, author, 0, 0, false, Some(distance))
    }

    /// Listing view without viewer-specific counters (adoption lists).
    pub fn from_post(post: Post, author: UserSummary) -> Self {
        Self::build(post, author, 0, 0, false, None)
    }

    fn build(
        post: Post,
        author: UserSummary,
        like_count: i64,
        comment_count: i64,
        is_liked: bool,
        distance_km: Option<f64>,
    ) -> Self {
        Self {
            id: post.id.to_string(),
            author,
            plant_data: PlantInfoData {
                common_name: post.species_common_name,
                scientific_name: post.species_scientific_name,
                confidence: post.identification_confidence,
                family: post.species_family,
                genus: post.species_genus,
            },
            caption: post.caption,
            images: post.images,
            location: LocationData {
                latitude: post.latitude,
                longitude: post.longitude,
                address: post.address,
                city: post.city,
                country: post.country,
            },
            tags: post.tags,
            is_public: post.is_public,
            up_for_adoption: post.up_for_adoption,
            adoption_status: post.adoption_status,
            like_count,
            comment_count,
            is_liked,
            created_at: post.created_at,
            distance_km,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentData {
    pub id: String,
    pub user: UserSummary,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl CommentData {
    pub fn from_comment(comment: Comment, user: UserSummary) -> Self {
        Self {
            id: comment.id.to_string(),
            user,
            text: comment.body,
            created_at: comment.created_at,
        }
    }
}
