//! Transition runner: load -> apply -> compare-and-swap persist -> history
//! -> side-effects.

use chrono::Utc;

use crate::common::{ApiError, UserId};
use crate::domains::adoption::effects::dispatch;
use crate::domains::adoption::listing::AdoptionListing;
use crate::domains::adoption::machines::{AdoptionAction, AdoptionError, AdoptionStatus};
use crate::domains::adoption::models::AdoptionEvent;
use crate::kernel::ServerDeps;

impl From<AdoptionError> for ApiError {
    fn from(err: AdoptionError) -> Self {
        match err {
            AdoptionError::InvalidRequest(msg) => ApiError::invalid(msg),
            AdoptionError::Forbidden(msg) => ApiError::forbidden(msg),
            AdoptionError::Conflict(msg) => ApiError::conflict(msg),
        }
    }
}

/// Run one adoption transition against a listing.
///
/// The mutation and the history entry commit together under the version
/// predicate; a lost race surfaces as 409. Side-effects are dispatched after
/// the commit and cannot fail the transition.
pub async fn run_transition<L: AdoptionListing>(
    listing: &L,
    actor: UserId,
    action: AdoptionAction,
    deps: &ServerDeps,
) -> Result<AdoptionStatus, ApiError> {
    let state = listing.adoption_state().map_err(ApiError::Internal)?;
    let transition = state.apply(actor, action, Utc::now())?;

    let Some(entry) = transition.history.as_ref() else {
        // Idempotent re-request: nothing changed, nothing to persist or send
        return Ok(transition.state.status);
    };

    let mut tx = deps.db_pool.begin().await?;

    let stored = listing
        .persist_adoption(listing.adoption_version(), &transition.state, &mut *tx)
        .await
        .map_err(ApiError::Internal)?;

    if !stored {
        tx.rollback().await?;
        return Err(ApiError::conflict(
            "Listing was modified concurrently, please retry",
        ));
    }

    AdoptionEvent::append(listing.kind(), listing.listing_id(), entry, &mut *tx)
        .await
        .map_err(ApiError::Internal)?;

    tx.commit().await?;

    dispatch(listing, &transition.effects, &deps.db_pool).await;

    Ok(transition.state.status)
}
