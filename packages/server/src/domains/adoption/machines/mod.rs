//! Adoption state machine.
//!
//! Pure transition logic over the adoption sub-state a listing carries. The
//! four public actions form a closed set; `apply` takes the acting user and
//! the clock and returns the next state, the history entry to append, and
//! the side-effects to dispatch - or an error from the taxonomy. Persistence
//! and side-effect delivery live elsewhere; nothing here touches I/O.
//!
//! Transitions:
//!   Request: available -> pending      (any non-owner not previously rejected)
//!   Cancel:  pending   -> available    (the requester, within 24h)
//!   Accept:  pending   -> adopted      (the owner)
//!   Reject:  pending   -> available    (the owner; requester is blacklisted)
//!
//! `adopted` is terminal. `unavailable` exists in the data shape for
//! administrative use and is never produced here, as is the `reverted`
//! history action.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::common::UserId;

/// The requester may withdraw a request for this long.
pub const CANCEL_WINDOW_HOURS: i64 = 24;

// =============================================================================
// Vocabulary
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    Available,
    Pending,
    Adopted,
    Unavailable,
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdoptionStatus::Available => write!(f, "available"),
            AdoptionStatus::Pending => write!(f, "pending"),
            AdoptionStatus::Adopted => write!(f, "adopted"),
            AdoptionStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl FromStr for AdoptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "available" => Ok(AdoptionStatus::Available),
            "pending" => Ok(AdoptionStatus::Pending),
            "adopted" => Ok(AdoptionStatus::Adopted),
            "unavailable" => Ok(AdoptionStatus::Unavailable),
            _ => Err(anyhow::anyhow!("Invalid adoption status: {}", s)),
        }
    }
}

/// The closed set of transitions. Adding a fifth is a compile-time-checked
/// change: every `apply` arm must handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionAction {
    Request,
    Cancel,
    Accept,
    Reject,
}

impl FromStr for AdoptionAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "request" => Ok(AdoptionAction::Request),
            "cancel" => Ok(AdoptionAction::Cancel),
            "accept" => Ok(AdoptionAction::Accept),
            "reject" => Ok(AdoptionAction::Reject),
            _ => Err(anyhow::anyhow!("Invalid adoption action: {}", s)),
        }
    }
}

/// History log actions. `Reverted` is part of the stored vocabulary but no
/// transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Requested,
    Cancelled,
    Accepted,
    Rejected,
    Reverted,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryAction::Requested => write!(f, "requested"),
            HistoryAction::Cancelled => write!(f, "cancelled"),
            HistoryAction::Accepted => write!(f, "accepted"),
            HistoryAction::Rejected => write!(f, "rejected"),
            HistoryAction::Reverted => write!(f, "reverted"),
        }
    }
}

impl FromStr for HistoryAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "requested" => Ok(HistoryAction::Requested),
            "cancelled" => Ok(HistoryAction::Cancelled),
            "accepted" => Ok(HistoryAction::Accepted),
            "rejected" => Ok(HistoryAction::Rejected),
            "reverted" => Ok(HistoryAction::Reverted),
            _ => Err(anyhow::anyhow!("Invalid history action: {}", s)),
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Snapshot of a listing's adoption sub-state.
#[derive(Debug, Clone, PartialEq)]
pub struct AdoptionState {
    pub owner: UserId,
    pub status: AdoptionStatus,
    pub requested_by: Option<UserId>,
    pub requested_at: Option<DateTime<Utc>>,
    pub adopted_by: Option<UserId>,
    pub adopted_at: Option<DateTime<Utc>>,
    pub rejected_adopters: Vec<UserId>,
}

impl AdoptionState {
    /// Fresh state for a newly created listing.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            status: AdoptionStatus::Available,
            requested_by: None,
            requested_at: None,
            adopted_by: None,
            adopted_at: None,
            rejected_adopters: Vec::new(),
        }
    }

    /// State/field consistency: exactly one of
    /// {pending + requester}, {adopted + adopter}, {available/unavailable + neither}.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            AdoptionStatus::Pending => {
                self.requested_by.is_some()
                    && self.requested_at.is_some()
                    && self.adopted_by.is_none()
                    && self.adopted_at.is_none()
            }
            AdoptionStatus::Adopted => {
                self.adopted_by.is_some()
                    && self.adopted_at.is_some()
                    && self.requested_by.is_none()
                    && self.requested_at.is_none()
            }
            AdoptionStatus::Available | AdoptionStatus::Unavailable => {
                self.requested_by.is_none()
                    && self.requested_at.is_none()
                    && self.adopted_by.is_none()
                    && self.adopted_at.is_none()
            }
        }
    }
}

// =============================================================================
// Transition outcome
// =============================================================================

/// One entry of the append-only history log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub user: UserId,
    pub action: HistoryAction,
    pub at: DateTime<Utc>,
}

/// Notification flavor emitted by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptionNotice {
    Requested,
    Cancelled,
    Accepted,
    Rejected,
}

/// Direct-message flavor emitted by a transition; the dispatcher renders the
/// text with the listing's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTemplate {
    RequestIntro,
    AcceptCongrats,
    RejectConsolation,
}

/// Side-effect descriptors. The machine only describes what should happen;
/// the dispatcher owns delivery (and failure swallowing).
#[derive(Debug, Clone, PartialEq)]
pub enum AdoptionEffect {
    Notify {
        recipient: UserId,
        actor: UserId,
        notice: AdoptionNotice,
    },
    DirectMessage {
        from: UserId,
        to: UserId,
        template: MessageTemplate,
    },
}

/// Result of a successful `apply`.
///
/// `history` is `None` only for the tolerated idempotent re-request, which
/// leaves the state untouched and emits nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdoptionTransition {
    pub state: AdoptionState,
    pub history: Option<HistoryEntry>,
    pub effects: Vec<AdoptionEffect>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdoptionError {
    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),
}

// =============================================================================
// Transitions
// =============================================================================

impl AdoptionState {
    /// Apply one action on behalf of `actor` at time `now`.
    pub fn apply(
        &self,
        actor: UserId,
        action: AdoptionAction,
        now: DateTime<Utc>,
    ) -> Result<AdoptionTransition, AdoptionError> {
        match action {
            AdoptionAction::Request => self.request(actor, now),
            AdoptionAction::Cancel => self.cancel(actor, now),
            AdoptionAction::Accept => self.accept(actor, now),
            AdoptionAction::Reject => self.reject(actor, now),
        }
    }

    fn request(
        &self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<AdoptionTransition, AdoptionError> {
        if actor == self.owner {
            return Err(AdoptionError::InvalidRequest(
                "You cannot adopt your own listing",
            ));
        }

        if self.rejected_adopters.contains(&actor) {
            return Err(AdoptionError::Forbidden(
                "Your previous adoption request was declined by the owner",
            ));
        }

        match self.status {
            AdoptionStatus::Adopted => Err(AdoptionError::Conflict("Already adopted")),
            AdoptionStatus::Unavailable => {
                Err(AdoptionError::Conflict("Listing is not up for adoption"))
            }
            AdoptionStatus::Pending if self.requested_by != Some(actor) => {
                Err(AdoptionError::Conflict("Another request is already pending"))
            }
            AdoptionStatus::Pending => {
                // Same requester asking again: tolerated as a silent no-op.
                // The request window is NOT refreshed.
                Ok(AdoptionTransition {
                    state: self.clone(),
                    history: None,
                    effects: Vec::new(),
                })
            }
            AdoptionStatus::Available => {
                let mut state = self.clone();
                state.status = AdoptionStatus::Pending;
                state.requested_by = Some(actor);
                state.requested_at = Some(now);

                Ok(AdoptionTransition {
                    state,
                    history: Some(HistoryEntry {
                        user: actor,
                        action: HistoryAction::Requested,
                        at: now,
                    }),
                    effects: vec![
                        AdoptionEffect::Notify {
                            recipient: self.owner,
                            actor,
                            notice: AdoptionNotice::Requested,
                        },
                        AdoptionEffect::DirectMessage {
                            from: actor,
                            to: self.owner,
                            template: MessageTemplate::RequestIntro,
                        },
                    ],
                })
            }
        }
    }

    fn cancel(
        &self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<AdoptionTransition, AdoptionError> {
        if self.status != AdoptionStatus::Pending || self.requested_by != Some(actor) {
            return Err(AdoptionError::InvalidRequest(
                "No pending request to cancel for this user",
            ));
        }

        let requested_at = self.requested_at.ok_or(AdoptionError::InvalidRequest(
            "No pending request to cancel for this user",
        ))?;

        if now - requested_at > Duration::hours(CANCEL_WINDOW_HOURS) {
            return Err(AdoptionError::Forbidden("Cancellation window passed"));
        }

        let mut state = self.clone();
        state.status = AdoptionStatus::Available;
        state.requested_by = None;
        state.requested_at = None;

        Ok(AdoptionTransition {
            state,
            history: Some(HistoryEntry {
                user: actor,
                action: HistoryAction::Cancelled,
                at: now,
            }),
            effects: vec![AdoptionEffect::Notify {
                recipient: self.owner,
                actor,
                notice: AdoptionNotice::Cancelled,
            }],
        })
    }

    fn accept(
        &self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<AdoptionTransition, AdoptionError> {
        if actor != self.owner {
            return Err(AdoptionError::Forbidden("Only the owner can accept"));
        }

        let adopter = match (self.status, self.requested_by) {
            (AdoptionStatus::Pending, Some(requester)) => requester,
            _ => return Err(AdoptionError::InvalidRequest("No pending request")),
        };

        let mut state = self.clone();
        state.status = AdoptionStatus::Adopted;
        state.adopted_by = Some(adopter);
        state.adopted_at = Some(now);
        state.requested_by = None;
        state.requested_at = None;

        Ok(AdoptionTransition {
            state,
            history: Some(HistoryEntry {
                user: adopter,
                action: HistoryAction::Accepted,
                at: now,
            }),
            effects: vec![
                AdoptionEffect::Notify {
                    recipient: adopter,
                    actor,
                    notice: AdoptionNotice::Accepted,
                },
                AdoptionEffect::DirectMessage {
                    from: actor,
                    to: adopter,
                    template: MessageTemplate::AcceptCongrats,
                },
            ],
        })
    }

    fn reject(
        &self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<AdoptionTransition, AdoptionError> {
        if actor != self.owner {
            return Err(AdoptionError::Forbidden("Only the owner can reject"));
        }

        let requester = match (self.status, self.requested_by) {
            (AdoptionStatus::Pending, Some(requester)) => requester,
            _ => return Err(AdoptionError::InvalidRequest("No pending request")),
        };

        let mut state = self.clone();
        state.status = AdoptionStatus::Available;
        state.requested_by = None;
        state.requested_at = None;
        if !state.rejected_adopters.contains(&requester) {
            state.rejected_adopters.push(requester);
        }

        Ok(AdoptionTransition {
            state,
            history: Some(HistoryEntry {
                user: requester,
                action: HistoryAction::Rejected,
                at: now,
            }),
            effects: vec![
                AdoptionEffect::Notify {
                    recipient: requester,
                    actor,
                    notice: AdoptionNotice::Rejected,
                },
                AdoptionEffect::DirectMessage {
                    from: actor,
                    to: requester,
                    template: MessageTemplate::RejectConsolation,
                },
            ],
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::from_uuid(uuid::Uuid::from_u128(1))
    }

    fn adopter() -> UserId {
        UserId::from_uuid(uuid::Uuid::from_u128(2))
    }

    fn other() -> UserId {
        UserId::from_uuid(uuid::Uuid::from_u128(3))
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn pending_state(requester: UserId, requested_at: DateTime<Utc>) -> AdoptionState {
        let state = AdoptionState::new(owner());
        state
            .apply(requester, AdoptionAction::Request, requested_at)
            .unwrap()
            .state
    }

    // ------------------------------------------------------------------
    // Request
    // ------------------------------------------------------------------

    #[test]
    fn request_moves_available_to_pending() {
        let state = AdoptionState::new(owner());
        let transition = state.apply(adopter(), AdoptionAction::Request, t0()).unwrap();

        assert_eq!(transition.state.status, AdoptionStatus::Pending);
        assert_eq!(transition.state.requested_by, Some(adopter()));
        assert_eq!(transition.state.requested_at, Some(t0()));
        assert!(transition.state.is_consistent());

        let entry = transition.history.unwrap();
        assert_eq!(entry.user, adopter());
        assert_eq!(entry.action, HistoryAction::Requested);

        assert_eq!(
            transition.effects,
            vec![
                AdoptionEffect::Notify {
                    recipient: owner(),
                    actor: adopter(),
                    notice: AdoptionNotice::Requested,
                },
                AdoptionEffect::DirectMessage {
                    from: adopter(),
                    to: owner(),
                    template: MessageTemplate::RequestIntro,
                },
            ]
        );
    }

    #[test]
    fn request_by_owner_is_invalid() {
        let state = AdoptionState::new(owner());
        let err = state
            .apply(owner(), AdoptionAction::Request, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::InvalidRequest(_)));
    }

    #[test]
    fn request_by_rejected_adopter_is_forbidden() {
        let mut state = AdoptionState::new(owner());
        state.rejected_adopters.push(adopter());

        let err = state
            .apply(adopter(), AdoptionAction::Request, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Forbidden(_)));
    }

    #[test]
    fn request_on_adopted_listing_conflicts() {
        let state = pending_state(adopter(), t0());
        let adopted = state
            .apply(owner(), AdoptionAction::Accept, t0())
            .unwrap()
            .state;

        let err = adopted
            .apply(other(), AdoptionAction::Request, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Conflict(_)));
    }

    #[test]
    fn request_while_pending_by_other_conflicts() {
        let state = pending_state(adopter(), t0());
        let err = state
            .apply(other(), AdoptionAction::Request, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Conflict(_)));
    }

    #[test]
    fn re_request_by_same_user_is_a_noop() {
        let state = pending_state(adopter(), t0());
        let later = t0() + Duration::hours(5);
        let transition = state
            .apply(adopter(), AdoptionAction::Request, later)
            .unwrap();

        assert_eq!(transition.state, state);
        // No history entry, no effects, and the original window stands
        assert!(transition.history.is_none());
        assert!(transition.effects.is_empty());
        assert_eq!(transition.state.requested_at, Some(t0()));
    }

    // ------------------------------------------------------------------
    // Cancel
    // ------------------------------------------------------------------

    #[test]
    fn cancel_within_window_restores_available() {
        let state = pending_state(adopter(), t0());
        let at = t0() + Duration::hours(23) + Duration::minutes(59);
        let transition = state.apply(adopter(), AdoptionAction::Cancel, at).unwrap();

        assert_eq!(transition.state.status, AdoptionStatus::Available);
        assert_eq!(transition.state.requested_by, None);
        assert_eq!(transition.state.requested_at, None);
        assert!(transition.state.is_consistent());

        let entry = transition.history.unwrap();
        assert_eq!(entry.action, HistoryAction::Cancelled);
        assert_eq!(entry.user, adopter());

        assert_eq!(
            transition.effects,
            vec![AdoptionEffect::Notify {
                recipient: owner(),
                actor: adopter(),
                notice: AdoptionNotice::Cancelled,
            }]
        );
    }

    #[test]
    fn cancel_window_boundary() {
        let state = pending_state(adopter(), t0());

        // 24h - 1s: allowed
        let just_inside = t0() + Duration::hours(24) - Duration::seconds(1);
        assert!(state
            .apply(adopter(), AdoptionAction::Cancel, just_inside)
            .is_ok());

        // exactly 24h: still allowed (window is inclusive)
        let exactly = t0() + Duration::hours(24);
        assert!(state
            .apply(adopter(), AdoptionAction::Cancel, exactly)
            .is_ok());

        // 24h + 1s: forbidden
        let just_outside = t0() + Duration::hours(24) + Duration::seconds(1);
        let err = state
            .apply(adopter(), AdoptionAction::Cancel, just_outside)
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Forbidden(_)));
    }

    #[test]
    fn cancel_by_non_requester_is_invalid() {
        let state = pending_state(adopter(), t0());
        let err = state
            .apply(other(), AdoptionAction::Cancel, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::InvalidRequest(_)));
    }

    #[test]
    fn cancel_with_nothing_pending_is_invalid() {
        let state = AdoptionState::new(owner());
        let err = state
            .apply(adopter(), AdoptionAction::Cancel, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::InvalidRequest(_)));
    }

    // ------------------------------------------------------------------
    // Accept
    // ------------------------------------------------------------------

    #[test]
    fn accept_moves_pending_to_adopted() {
        let state = pending_state(adopter(), t0());
        let at = t0() + Duration::hours(1);
        let transition = state.apply(owner(), AdoptionAction::Accept, at).unwrap();

        assert_eq!(transition.state.status, AdoptionStatus::Adopted);
        assert_eq!(transition.state.adopted_by, Some(adopter()));
        assert_eq!(transition.state.adopted_at, Some(at));
        assert_eq!(transition.state.requested_by, None);
        assert_eq!(transition.state.requested_at, None);
        assert!(transition.state.is_consistent());

        let entry = transition.history.unwrap();
        assert_eq!(entry.user, adopter());
        assert_eq!(entry.action, HistoryAction::Accepted);

        assert_eq!(
            transition.effects,
            vec![
                AdoptionEffect::Notify {
                    recipient: adopter(),
                    actor: owner(),
                    notice: AdoptionNotice::Accepted,
                },
                AdoptionEffect::DirectMessage {
                    from: owner(),
                    to: adopter(),
                    template: MessageTemplate::AcceptCongrats,
                },
            ]
        );
    }

    #[test]
    fn accept_by_non_owner_is_forbidden() {
        let state = pending_state(adopter(), t0());
        for actor in [adopter(), other()] {
            let err = state.apply(actor, AdoptionAction::Accept, t0()).unwrap_err();
            assert!(matches!(err, AdoptionError::Forbidden(_)));
        }
    }

    #[test]
    fn accept_with_nothing_pending_is_invalid() {
        let state = AdoptionState::new(owner());
        let err = state
            .apply(owner(), AdoptionAction::Accept, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::InvalidRequest(_)));
    }

    // ------------------------------------------------------------------
    // Reject
    // ------------------------------------------------------------------

    #[test]
    fn reject_blacklists_the_requester() {
        let state = pending_state(adopter(), t0());
        let transition = state.apply(owner(), AdoptionAction::Reject, t0()).unwrap();

        assert_eq!(transition.state.status, AdoptionStatus::Available);
        assert_eq!(transition.state.requested_by, None);
        assert_eq!(transition.state.rejected_adopters, vec![adopter()]);
        assert!(transition.state.is_consistent());

        let entry = transition.history.unwrap();
        assert_eq!(entry.user, adopter());
        assert_eq!(entry.action, HistoryAction::Rejected);

        assert_eq!(
            transition.effects,
            vec![
                AdoptionEffect::Notify {
                    recipient: adopter(),
                    actor: owner(),
                    notice: AdoptionNotice::Rejected,
                },
                AdoptionEffect::DirectMessage {
                    from: owner(),
                    to: adopter(),
                    template: MessageTemplate::RejectConsolation,
                },
            ]
        );
    }

    #[test]
    fn reject_by_non_owner_is_forbidden() {
        let state = pending_state(adopter(), t0());
        let err = state
            .apply(adopter(), AdoptionAction::Reject, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Forbidden(_)));
    }

    #[test]
    fn second_reject_in_a_row_is_invalid() {
        let state = pending_state(adopter(), t0());
        let rejected = state
            .apply(owner(), AdoptionAction::Reject, t0())
            .unwrap()
            .state;

        let err = rejected
            .apply(owner(), AdoptionAction::Reject, t0())
            .unwrap_err();
        assert!(matches!(err, AdoptionError::InvalidRequest(_)));
    }

    #[test]
    fn rejected_adopters_deduplicate() {
        let mut state = pending_state(adopter(), t0());
        state.rejected_adopters.push(other());

        let transition = state.apply(owner(), AdoptionAction::Reject, t0()).unwrap();
        assert_eq!(
            transition.state.rejected_adopters,
            vec![other(), adopter()]
        );

        // Re-rejecting the same user never duplicates the entry
        let mut again = transition.state.clone();
        again.status = AdoptionStatus::Pending;
        again.requested_by = Some(adopter());
        again.requested_at = Some(t0());
        let transition = again.apply(owner(), AdoptionAction::Reject, t0()).unwrap();
        assert_eq!(
            transition.state.rejected_adopters,
            vec![other(), adopter()]
        );
    }

    // ------------------------------------------------------------------
    // End-to-end scenarios
    // ------------------------------------------------------------------

    #[test]
    fn scenario_request_then_accept() {
        let state = AdoptionState::new(owner());

        let pending = state
            .apply(adopter(), AdoptionAction::Request, t0())
            .unwrap()
            .state;
        assert_eq!(pending.status, AdoptionStatus::Pending);
        assert_eq!(pending.requested_by, Some(adopter()));

        let adopted = pending
            .apply(owner(), AdoptionAction::Accept, t0() + Duration::hours(2))
            .unwrap()
            .state;
        assert_eq!(adopted.status, AdoptionStatus::Adopted);
        assert_eq!(adopted.adopted_by, Some(adopter()));
        assert_eq!(adopted.requested_by, None);
        assert!(adopted.is_consistent());
    }

    #[test]
    fn scenario_reject_then_blocked_re_request() {
        let state = AdoptionState::new(owner());

        let pending = state
            .apply(adopter(), AdoptionAction::Request, t0())
            .unwrap()
            .state;
        let rejected = pending
            .apply(owner(), AdoptionAction::Reject, t0() + Duration::hours(1))
            .unwrap()
            .state;
        assert_eq!(rejected.status, AdoptionStatus::Available);
        assert_eq!(rejected.rejected_adopters, vec![adopter()]);

        // The rejected user can never come back on this listing
        let err = rejected
            .apply(
                adopter(),
                AdoptionAction::Request,
                t0() + Duration::hours(2),
            )
            .unwrap_err();
        assert!(matches!(err, AdoptionError::Forbidden(_)));

        // But someone else can
        assert!(rejected
            .apply(other(), AdoptionAction::Request, t0() + Duration::hours(2))
            .is_ok());
    }

    #[test]
    fn scenario_cancel_window_resets_per_request() {
        let state = AdoptionState::new(owner());

        // Request at t0, cancel at t0+23h59m: fine
        let pending = state
            .apply(adopter(), AdoptionAction::Request, t0())
            .unwrap()
            .state;
        let cancelled = pending
            .apply(
                adopter(),
                AdoptionAction::Cancel,
                t0() + Duration::hours(23) + Duration::minutes(59),
            )
            .unwrap()
            .state;
        assert_eq!(cancelled.status, AdoptionStatus::Available);

        // Re-request at t0+24h, cancel at t0+24h01m: measured against the
        // NEW request, so it succeeds even though the original window passed
        let second_request_at = t0() + Duration::hours(24);
        let pending = cancelled
            .apply(adopter(), AdoptionAction::Request, second_request_at)
            .unwrap()
            .state;
        assert_eq!(pending.requested_at, Some(second_request_at));

        let cancel_at = t0() + Duration::hours(24) + Duration::minutes(1);
        assert!(pending
            .apply(adopter(), AdoptionAction::Cancel, cancel_at)
            .is_ok());
    }

    #[test]
    fn every_applied_transition_stays_consistent() {
        let state = AdoptionState::new(owner());
        let actions = [
            (adopter(), AdoptionAction::Request),
            (owner(), AdoptionAction::Reject),
            (other(), AdoptionAction::Request),
            (other(), AdoptionAction::Cancel),
            (other(), AdoptionAction::Request),
            (owner(), AdoptionAction::Accept),
        ];

        let mut current = state;
        let mut at = t0();
        for (actor, action) in actions {
            at = at + Duration::minutes(10);
            let transition = current.apply(actor, action, at).unwrap();
            assert!(transition.state.is_consistent(), "after {:?}", action);
            assert!(transition.history.is_some());
            current = transition.state;
        }

        assert_eq!(current.status, AdoptionStatus::Adopted);
        assert_eq!(current.adopted_by, Some(other()));
        assert_eq!(current.rejected_adopters, vec![adopter()]);
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            AdoptionStatus::Available,
            AdoptionStatus::Pending,
            AdoptionStatus::Adopted,
            AdoptionStatus::Unavailable,
        ] {
            assert_eq!(status.to_string().parse::<AdoptionStatus>().unwrap(), status);
        }
        assert!("returned".parse::<AdoptionStatus>().is_err());
    }
}
