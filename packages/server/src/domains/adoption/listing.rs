//! The seam between the transition engine and the two listing flavors.
//!
//! Posts and standalone plants carry the same adoption sub-state; the engine
//! works against this trait so the four transitions exist exactly once.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgConnection;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domains::adoption::machines::AdoptionState;
use crate::domains::plants::models::Plant;
use crate::domains::posts::models::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Post,
    Plant,
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingKind::Post => write!(f, "post"),
            ListingKind::Plant => write!(f, "plant"),
        }
    }
}

impl FromStr for ListingKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "post" => Ok(ListingKind::Post),
            "plant" => Ok(ListingKind::Plant),
            _ => Err(anyhow::anyhow!("Invalid listing kind: {}", s)),
        }
    }
}

/// A record that can go through the adoption workflow.
#[async_trait]
pub trait AdoptionListing: Send + Sync {
    fn listing_id(&self) -> Uuid;

    fn kind(&self) -> ListingKind;

    /// Name used when rendering notification/message texts.
    fn display_name(&self) -> String;

    /// Current adoption sub-state snapshot.
    fn adoption_state(&self) -> Result<AdoptionState>;

    /// Version the snapshot was read at; the persist predicate checks it.
    fn adoption_version(&self) -> i32;

    /// Compare-and-swap persist of a transition result. Returns false when
    /// the version no longer matches (a concurrent writer won).
    async fn persist_adoption(
        &self,
        expected_version: i32,
        next: &AdoptionState,
        conn: &mut PgConnection,
    ) -> Result<bool>;
}

#[async_trait]
impl AdoptionListing for Post {
    fn listing_id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Post
    }

    fn display_name(&self) -> String {
        if self.species_common_name.is_empty() {
            "plant".to_string()
        } else {
            self.species_common_name.clone()
        }
    }

    fn adoption_state(&self) -> Result<AdoptionState> {
        Post::adoption_state(self)
    }

    fn adoption_version(&self) -> i32 {
        self.adoption_version
    }

    async fn persist_adoption(
        &self,
        expected_version: i32,
        next: &AdoptionState,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        Post::store_adoption(self.id, expected_version, next, conn).await
    }
}

#[async_trait]
impl AdoptionListing for Plant {
    fn listing_id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Plant
    }

    fn display_name(&self) -> String {
        if self.species_common_name.is_empty() {
            "plant".to_string()
        } else {
            self.species_common_name.clone()
        }
    }

    fn adoption_state(&self) -> Result<AdoptionState> {
        Plant::adoption_state(self)
    }

    fn adoption_version(&self) -> i32 {
        self.adoption_version
    }

    async fn persist_adoption(
        &self,
        expected_version: i32,
        next: &AdoptionState,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        Plant::store_adoption(self.id, expected_version, next, conn).await
    }
}
