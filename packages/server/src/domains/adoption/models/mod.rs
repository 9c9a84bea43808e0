//! Append-only adoption history shared by both listing kinds.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::UserId;
use crate::domains::adoption::listing::ListingKind;
use crate::domains::adoption::machines::HistoryEntry;

/// One history log row: who did what to a listing, and when. Rows are only
/// ever inserted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdoptionEvent {
    pub id: Uuid,
    pub listing_kind: String,
    pub listing_id: Uuid,
    pub user_id: UserId,
    pub action: String,
    pub at: DateTime<Utc>,
}

impl AdoptionEvent {
    /// Append one entry as part of a transition's transaction.
    pub async fn append(
        kind: ListingKind,
        listing_id: Uuid,
        entry: &HistoryEntry,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, AdoptionEvent>(
            r#"
            INSERT INTO adoption_events (id, listing_kind, listing_id, user_id, action, at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(kind.to_string())
        .bind(listing_id)
        .bind(entry.user)
        .bind(entry.action.to_string())
        .bind(entry.at)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Full history of one listing, oldest first.
    pub async fn find_for_listing(
        kind: ListingKind,
        listing_id: Uuid,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, AdoptionEvent>(
            "SELECT * FROM adoption_events WHERE listing_kind = $1 AND listing_id = $2 ORDER BY at",
        )
        .bind(kind.to_string())
        .bind(listing_id)
        .fetch_all(pool)
        .await?;
        Ok(events)
    }

    /// Everything a user has done across all listings, newest first.
    pub async fn find_for_user(user: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, AdoptionEvent>(
            "SELECT * FROM adoption_events WHERE user_id = $1 ORDER BY at DESC",
        )
        .bind(user)
        .fetch_all(pool)
        .await?;
        Ok(events)
    }
}
