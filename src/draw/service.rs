//! Draw trigger
//!
//! Glues authorization, locking, member loading, the pairing engine and the
//! store together for one request.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use super::lock::DrawLocks;
use super::pairing::{draw_assignment, Pairing};
use super::store;
use crate::entity::group::{self, GroupStatus};
use crate::error::DrawError;

/// Decides whether a caller may draw names for a group
pub trait DrawAuthorizer: Send + Sync {
    fn authorize(&self, caller_id: i64, group: &group::Model) -> Result<(), DrawError>;
}

/// Only the group's admin may draw
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupAdminOnly;

impl DrawAuthorizer for GroupAdminOnly {
    fn authorize(&self, caller_id: i64, group: &group::Model) -> Result<(), DrawError> {
        if group.is_admin(caller_id) {
            Ok(())
        } else {
            Err(DrawError::NotAuthorized)
        }
    }
}

/// Result of a committed draw
#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    #[serde(rename = "groupId")]
    pub group_id: i64,
    pub pairs: usize,
    /// True when an earlier draw was replaced
    pub redraw: bool,
}

#[derive(Clone)]
pub struct DrawService {
    locks: DrawLocks,
    rng: Arc<Mutex<StdRng>>,
    authorizer: Arc<dyn DrawAuthorizer>,
}

impl DrawService {
    /// Admin-only draws; `seed` makes the draw sequence reproducible
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_authorizer(seed, Arc::new(GroupAdminOnly))
    }

    pub fn with_authorizer(seed: Option<u64>, authorizer: Arc<dyn DrawAuthorizer>) -> Self {
        let rng = match seed {
            Some(seed) => {
                warn!("Draw RNG seeded from config, draws are reproducible");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        Self {
            locks: DrawLocks::new(),
            rng: Arc::new(Mutex::new(rng)),
            authorizer,
        }
    }

    /// Exclusive rights on `group_id` against draws. Membership writes hold
    /// this so a draw never commits over a member set that changed under it.
    pub async fn lock_group(&self, group_id: i64) -> OwnedMutexGuard<()> {
        self.locks.acquire(group_id).await
    }

    /// Commit a caller-built assignment for `group_id` under the group lock
    pub async fn apply_draw(
        &self,
        db: &DatabaseConnection,
        group_id: i64,
        assignment: &[Pairing<i64>],
    ) -> Result<(), DrawError> {
        let _guard = self.locks.acquire(group_id).await;
        store::apply_draw(db, group_id, assignment).await
    }

    /// Draw names for `group_id` on behalf of `caller_id` and commit them
    pub async fn draw_group(
        &self,
        db: &DatabaseConnection,
        caller_id: i64,
        group_id: i64,
    ) -> Result<DrawOutcome, DrawError> {
        let group = group::Entity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or(DrawError::GroupNotFound(group_id))?;

        self.authorizer.authorize(caller_id, &group)?;

        if group.status() == GroupStatus::Completed {
            return Err(DrawError::GroupClosed);
        }

        let _guard = self.locks.acquire(group_id).await;

        // Status may have moved while waiting for the lock
        let group = group::Entity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or(DrawError::GroupNotFound(group_id))?;
        if group.status() == GroupStatus::Completed {
            return Err(DrawError::GroupClosed);
        }
        let redraw = group.status() == GroupStatus::Drawn;

        let members = store::load_member_ids(db, group_id).await?;
        let assignment = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            draw_assignment(&members, &mut *rng)?
        };

        store::apply_draw(db, group_id, &assignment).await?;

        info!(
            "Names drawn for group {} by user {}: {} pairs{}",
            group_id,
            caller_id,
            assignment.len(),
            if redraw { " (redraw)" } else { "" }
        );

        Ok(DrawOutcome {
            group_id,
            pairs: assignment.len(),
            redraw,
        })
    }
}
