//! Side-effect dispatcher for adoption transitions.
//!
//! Runs AFTER the listing mutation is persisted. Every effect is
//! at-most-one-attempt: a failed notification or message is logged and
//! swallowed, never surfaced to the caller and never rolled back into the
//! transition.

use sqlx::PgPool;
use tracing::warn;

use crate::common::{PlantId, PostId};
use crate::domains::adoption::listing::{AdoptionListing, ListingKind};
use crate::domains::adoption::machines::{AdoptionEffect, AdoptionNotice, MessageTemplate};
use crate::domains::messaging::models::Message;
use crate::domains::notifications::models::{Notification, NotificationKind};

/// Render the direct-message text for a template and listing name.
pub fn render_message(template: MessageTemplate, plant_name: &str) -> String {
    match template {
        MessageTemplate::RequestIntro => format!(
            "Hi! I'm interested in adopting your {}. I've sent you an adoption request. 🌱",
            plant_name
        ),
        MessageTemplate::AcceptCongrats => format!(
            "Great news! I've accepted your adoption request for my {}! 🎉 Congratulations on your new plant! 🌱",
            plant_name
        ),
        MessageTemplate::RejectConsolation => format!(
            "Thank you for your interest in my {}. Unfortunately, I'm unable to proceed with the adoption at this time. I appreciate your understanding. 🌿",
            plant_name
        ),
    }
}

fn notification_kind(notice: AdoptionNotice) -> NotificationKind {
    match notice {
        AdoptionNotice::Requested => NotificationKind::AdoptionRequest,
        AdoptionNotice::Cancelled => NotificationKind::AdoptionCancelled,
        AdoptionNotice::Accepted => NotificationKind::AdoptionAccepted,
        AdoptionNotice::Rejected => NotificationKind::AdoptionRejected,
    }
}

/// Deliver the side-effects of a persisted transition.
pub async fn dispatch<L: AdoptionListing + ?Sized>(
    listing: &L,
    effects: &[AdoptionEffect],
    pool: &PgPool,
) {
    let (post_id, plant_id) = match listing.kind() {
        ListingKind::Post => (Some(PostId::from_uuid(listing.listing_id())), None),
        ListingKind::Plant => (None, Some(PlantId::from_uuid(listing.listing_id()))),
    };

    for effect in effects {
        let result = match effect {
            AdoptionEffect::Notify {
                recipient,
                actor,
                notice,
            } => Notification::create(
                *recipient,
                *actor,
                notification_kind(*notice),
                post_id,
                plant_id,
                None,
                pool,
            )
            .await
            .map(|_| ()),
            AdoptionEffect::DirectMessage { from, to, template } => {
                let body = render_message(*template, &listing.display_name());
                Message::send(*from, *to, &body, pool).await.map(|_| ())
            }
        };

        if let Err(e) = result {
            warn!(
                listing = %listing.listing_id(),
                error = %e,
                "adoption side-effect failed"
            );
        }
    }
}
