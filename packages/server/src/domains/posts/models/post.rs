use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{PostId, UserId};
use crate::domains::adoption::machines::AdoptionState;

/// Post model - SQL persistence layer
///
/// A post is a plant photo with identification data and, when the author
/// marks it up for adoption, the adoption sub-state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,

    // Plant identification data
    pub species_common_name: String,
    pub species_scientific_name: Option<String>,
    pub identification_confidence: Option<i32>,
    pub species_family: Option<String>,
    pub species_genus: Option<String>,

    // Content
    pub caption: String,
    pub images: Vec<String>,

    // Location
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,

    pub tags: Vec<String>,
    pub is_public: bool,

    // Adoption sub-state
    pub up_for_adoption: bool,
    pub adoption_status: String,
    pub adoption_requested_by: Option<UserId>,
    pub adoption_requested_at: Option<DateTime<Utc>>,
    pub adopted_by: Option<UserId>,
    pub adopted_at: Option<DateTime<Utc>>,
    pub rejected_adopters: Vec<UserId>,
    pub adoption_version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub species_common_name: String,
    pub species_scientific_name: Option<String>,
    pub identification_confidence: Option<i32>,
    pub species_family: Option<String>,
    pub species_genus: Option<String>,
    pub caption: String,
    pub images: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub tags: Vec<String>,
    pub up_for_adoption: bool,
}

/// Owner-editable fields; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostEdit {
    pub caption: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub up_for_adoption: Option<bool>,
}

/// Post joined with its social counters for the requesting viewer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithMeta {
    #[sqlx(flatten)]
    pub post: Post,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked: bool,
}

/// Post plus its distance from the caller (adoption map).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithDistance {
    #[sqlx(flatten)]
    pub post: Post,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Shared SELECT list for viewer-aware post queries. `$1` is the viewer
/// (nullable for anonymous access).
const POST_META_COLUMNS: &str = r#"
    p.*,
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
    ($1::uuid IS NOT NULL AND EXISTS(
        SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1
    )) AS is_liked
"#;

impl Post {
    pub async fn create(new: NewPost, pool: &PgPool) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (
                id, author_id,
                species_common_name, species_scientific_name, identification_confidence,
                species_family, species_genus,
                caption, images,
                latitude, longitude, address, city, country,
                tags, up_for_adoption
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(PostId::new())
        .bind(new.author_id)
        .bind(new.species_common_name)
        .bind(new.species_scientific_name)
        .bind(new.identification_confidence)
        .bind(new.species_family)
        .bind(new.species_genus)
        .bind(new.caption)
        .bind(new.images)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(new.address)
        .bind(new.city)
        .bind(new.country)
        .bind(new.tags)
        .bind(new.up_for_adoption)
        .fetch_one(pool)
        .await?;
        Ok(post)
    }

    pub async fn find_by_id(id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// One post with viewer-aware counters.
    pub async fn find_with_meta(
        id: PostId,
        viewer: Option<UserId>,
        pool: &PgPool,
    ) -> Result<Option<PostWithMeta>> {
        let query = format!(
            "SELECT {} FROM posts p WHERE p.id = $2",
            POST_META_COLUMNS
        );
        let post = sqlx::query_as::<_, PostWithMeta>(&query)
            .bind(viewer)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// Timeline: public posts by the viewer and everyone they follow.
    pub async fn feed(
        viewer: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<PostWithMeta>> {
        let query = format!(
            r#"
            SELECT {}
            FROM posts p
            WHERE p.is_public
              AND (p.author_id = $1 OR p.author_id IN (
                  SELECT followee_id FROM follows WHERE follower_id = $1
              ))
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            POST_META_COLUMNS
        );
        let posts = sqlx::query_as::<_, PostWithMeta>(&query)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(posts)
    }

    pub async fn feed_count(viewer: UserId, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts p
            WHERE p.is_public
              AND (p.author_id = $1 OR p.author_id IN (
                  SELECT followee_id FROM follows WHERE follower_id = $1
              ))
            "#,
        )
        .bind(viewer)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Discovery: all public posts, optionally filtered by species name or tag.
    pub async fn explore(
        viewer: Option<UserId>,
        species: Option<&str>,
        tag: Option<&str>,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<PostWithMeta>> {
        let query = format!(
            r#"
            SELECT {}
            FROM posts p
            WHERE p.is_public
              AND ($2::text IS NULL
                   OR p.species_common_name ILIKE '%' || $2 || '%'
                   OR p.species_scientific_name ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR EXISTS(
                  SELECT 1 FROM unnest(p.tags) t WHERE LOWER(t) = LOWER($3)
              ))
            ORDER BY p.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            POST_META_COLUMNS
        );
        let posts = sqlx::query_as::<_, PostWithMeta>(&query)
            .bind(viewer)
            .bind(species)
            .bind(tag)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(posts)
    }

    pub async fn explore_count(
        species: Option<&str>,
        tag: Option<&str>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts p
            WHERE p.is_public
              AND ($1::text IS NULL
                   OR p.species_common_name ILIKE '%' || $1 || '%'
                   OR p.species_scientific_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR EXISTS(
                  SELECT 1 FROM unnest(p.tags) t WHERE LOWER(t) = LOWER($2)
              ))
            "#,
        )
        .bind(species)
        .bind(tag)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Most used tags across public posts.
    pub async fn top_tags(limit: i64, pool: &PgPool) -> Result<Vec<TagCount>> {
        let tags = sqlx::query_as::<_, TagCount>(
            r#"
            SELECT t AS tag, COUNT(*) AS count
            FROM posts p, unnest(p.tags) t
            WHERE p.is_public
            GROUP BY t
            ORDER BY count DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(tags)
    }

    /// Adoptable posts within `radius_km` of the caller, nearest first.
    ///
    /// Shows both available and pending listings so the map reflects what is
    /// spoken for.
    pub async fn adoption_map(
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        pool: &PgPool,
    ) -> Result<Vec<PostWithDistance>> {
        let posts = sqlx::query_as::<_, PostWithDistance>(
            r#"
            SELECT p.*, haversine_distance($1, $2, p.latitude, p.longitude) AS distance_km
            FROM posts p
            WHERE p.is_public
              AND p.up_for_adoption
              AND p.adoption_status IN ('available', 'pending')
              AND haversine_distance($1, $2, p.latitude, p.longitude) <= $3
            ORDER BY distance_km
            "#,
        )
        .bind(latitude)
        .bind(longitude)
        .bind(radius_km)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// A user's public posts, newest first.
    pub async fn by_author(
        author: UserId,
        viewer: Option<UserId>,
        pool: &PgPool,
    ) -> Result<Vec<PostWithMeta>> {
        let query = format!(
            r#"
            SELECT {}
            FROM posts p
            WHERE p.author_id = $2 AND (p.is_public OR p.author_id = $1)
            ORDER BY p.created_at DESC
            "#,
            POST_META_COLUMNS
        );
        let posts = sqlx::query_as::<_, PostWithMeta>(&query)
            .bind(viewer)
            .bind(author)
            .fetch_all(pool)
            .await?;
        Ok(posts)
    }

    /// Posts a user has liked, newest like first.
    pub async fn liked_by(
        user: UserId,
        viewer: Option<UserId>,
        pool: &PgPool,
    ) -> Result<Vec<PostWithMeta>> {
        let query = format!(
            r#"
            SELECT {}
            FROM posts p
            JOIN likes liked ON liked.post_id = p.id AND liked.user_id = $2
            WHERE p.is_public
            ORDER BY liked.created_at DESC
            "#,
            POST_META_COLUMNS
        );
        let posts = sqlx::query_as::<_, PostWithMeta>(&query)
            .bind(viewer)
            .bind(user)
            .fetch_all(pool)
            .await?;
        Ok(posts)
    }

    pub async fn update_editable(id: PostId, edit: &PostEdit, pool: &PgPool) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET caption = COALESCE($2, caption),
                tags = COALESCE($3, tags),
                is_public = COALESCE($4, is_public),
                up_for_adoption = COALESCE($5, up_for_adoption),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&edit.caption)
        .bind(&edit.tags)
        .bind(edit.is_public)
        .bind(edit.up_for_adoption)
        .fetch_one(pool)
        .await?;
        Ok(post)
    }

    pub async fn delete(id: PostId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Adoption
    // ------------------------------------------------------------------

    /// Snapshot of the adoption sub-state for the transition engine.
    pub fn adoption_state(&self) -> Result<AdoptionState> {
        Ok(AdoptionState {
            owner: self.author_id,
            status: self.adoption_status.parse()?,
            requested_by: self.adoption_requested_by,
            requested_at: self.adoption_requested_at,
            adopted_by: self.adopted_by,
            adopted_at: self.adopted_at,
            rejected_adopters: self.rejected_adopters.clone(),
        })
    }

    /// Conditionally persist a transition result. The version predicate makes
    /// this a compare-and-swap: false means another writer got there first.
    pub async fn store_adoption(
        id: PostId,
        expected_version: i32,
        next: &AdoptionState,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET adoption_status = $3,
                adoption_requested_by = $4,
                adoption_requested_at = $5,
                adopted_by = $6,
                adopted_at = $7,
                rejected_adopters = $8,
                adoption_version = adoption_version + 1,
                updated_at = NOW()
            WHERE id = $1 AND adoption_version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(next.status.to_string())
        .bind(next.requested_by)
        .bind(next.requested_at)
        .bind(next.adopted_by)
        .bind(next.adopted_at)
        .bind(&next.rejected_adopters)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pending requests made by a user.
    pub async fn requested_by_user(user: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE adoption_requested_by = $1 AND adoption_status = 'pending'
            ORDER BY adoption_requested_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Listings a user has adopted.
    pub async fn adopted_by_user(user: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE adopted_by = $1 AND adoption_status = 'adopted'
            ORDER BY adopted_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Incoming requests on a user's own listings.
    pub async fn incoming_for_owner(owner: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE author_id = $1 AND adoption_status = 'pending'
            ORDER BY adoption_requested_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }
}
