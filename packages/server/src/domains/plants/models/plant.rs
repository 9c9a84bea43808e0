use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{PlantId, UserId};
use crate::domains::adoption::machines::AdoptionState;

/// Plant model - SQL persistence layer
///
/// A standalone adoption listing: one plant, one photo, offered directly
/// rather than through a feed post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plant {
    pub id: PlantId,
    pub owner_id: UserId,
    pub species_common_name: String,
    pub species_scientific_name: Option<String>,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,

    // Adoption sub-state
    pub adoption_status: String,
    pub adoption_requested_by: Option<UserId>,
    pub adoption_requested_at: Option<DateTime<Utc>>,
    pub adopted_by: Option<UserId>,
    pub adopted_at: Option<DateTime<Utc>>,
    pub rejected_adopters: Vec<UserId>,
    pub adoption_version: i32,

    pub created_at: DateTime<Utc>,
}

/// Fields for creating a plant listing.
#[derive(Debug, Clone)]
pub struct NewPlant {
    pub owner_id: UserId,
    pub species_common_name: String,
    pub species_scientific_name: Option<String>,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
}

impl Plant {
    pub async fn create(new: NewPlant, pool: &PgPool) -> Result<Self> {
        let plant = sqlx::query_as::<_, Plant>(
            r#"
            INSERT INTO plants (
                id, owner_id, species_common_name, species_scientific_name,
                image_url, latitude, longitude, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(PlantId::new())
        .bind(new.owner_id)
        .bind(new.species_common_name)
        .bind(new.species_scientific_name)
        .bind(new.image_url)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(new.description)
        .fetch_one(pool)
        .await?;
        Ok(plant)
    }

    pub async fn find_by_id(id: PlantId, pool: &PgPool) -> Result<Option<Self>> {
        let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(plant)
    }

    /// All listings, newest first; `only_available` narrows to adoptable ones.
    pub async fn list(
        only_available: bool,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let plants = sqlx::query_as::<_, Plant>(
            r#"
            SELECT * FROM plants
            WHERE NOT $1 OR adoption_status = 'available'
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(only_available)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(plants)
    }

    pub async fn delete(id: PlantId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM plants WHERE id = $1")
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
            owner: self.owner_id,
            status: self.adoption_status.parse()?,
            requested_by: self.adoption_requested_by,
            requested_at: self.adoption_requested_at,
            adopted_by: self.adopted_by,
            adopted_at: self.adopted_at,
            rejected_adopters: self.rejected_adopters.clone(),
        })
    }

    /// Conditionally persist a transition result (compare-and-swap on the
    /// version column).
    pub async fn store_adoption(
        id: PlantId,
        expected_version: i32,
        next: &AdoptionState,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE plants
            SET adoption_status = $3,
                adoption_requested_by = $4,
                adoption_requested_at = $5,
                adopted_by = $6,
                adopted_at = $7,
                rejected_adopters = $8,
                adoption_version = adoption_version + 1
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
}
