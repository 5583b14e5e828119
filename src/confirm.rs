//! Delete Confirmation Gate
//!
//! Two-step delete shared by obstacles and tricks: a request captures the
//! target without touching data, then the user confirms or cancels. Only
//! one target per kind can be pending.

use async_trait::async_trait;
use log::{info, warn};

use crate::domain::{DomainResult, ObstacleId, TrickId};
use crate::store::{DomainStore, OpenView, Removal};

/// Something the gate knows how to delete
#[async_trait]
pub trait Destructible: Clone + PartialEq + Send + Sync {
    async fn destroy(&self, store: &DomainStore) -> DomainResult<Removal>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleTarget {
    pub obstacle_id: ObstacleId,
}

impl ObstacleTarget {
    pub fn new(obstacle_id: impl Into<ObstacleId>) -> Self {
        Self {
            obstacle_id: obstacle_id.into(),
        }
    }
}

#[async_trait]
impl Destructible for ObstacleTarget {
    async fn destroy(&self, store: &DomainStore) -> DomainResult<Removal> {
        store.delete_obstacle(&self.obstacle_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrickTarget {
    pub obstacle_id: ObstacleId,
    pub trick_id: TrickId,
}

impl TrickTarget {
    pub fn new(obstacle_id: impl Into<ObstacleId>, trick_id: impl Into<TrickId>) -> Self {
        Self {
            obstacle_id: obstacle_id.into(),
            trick_id: trick_id.into(),
        }
    }
}

#[async_trait]
impl Destructible for TrickTarget {
    async fn destroy(&self, store: &DomainStore) -> DomainResult<Removal> {
        store.delete_trick(&self.obstacle_id, &self.trick_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState<T> {
    Idle,
    PendingConfirmation(T),
}

impl<T> Default for GateState<T> {
    fn default() -> Self {
        GateState::Idle
    }
}

/// Result of a confirmed delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed<T> {
    pub target: T,
    pub removal: Removal,
    /// The open detail view showed the deleted entity and must close
    pub close_view: bool,
}

#[derive(Debug)]
pub struct DeleteGate<T> {
    state: GateState<T>,
}

impl<T: Destructible> Default for DeleteGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Destructible> DeleteGate<T> {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
        }
    }

    pub fn state(&self) -> &GateState<T> {
        &self.state
    }

    pub fn pending(&self) -> Option<&T> {
        match &self.state {
            GateState::PendingConfirmation(target) => Some(target),
            GateState::Idle => None,
        }
    }

    /// Ask to delete `target`.
    ///
    /// A different target replaces the pending one; asking again for the
    /// pending target withdraws the request.
    pub fn request(&mut self, target: T) -> &GateState<T> {
        self.state = match &self.state {
            GateState::PendingConfirmation(current) if *current == target => GateState::Idle,
            _ => GateState::PendingConfirmation(target),
        };
        &self.state
    }

    /// Drop the pending request without touching the store
    pub fn cancel(&mut self) -> Option<T> {
        match std::mem::take(&mut self.state) {
            GateState::PendingConfirmation(target) => Some(target),
            GateState::Idle => None,
        }
    }

    /// Delete the pending target.
    ///
    /// The gate returns to idle whatever the outcome; a failure is handed
    /// back untouched and never retried. `Ok(None)` when nothing was pending.
    pub async fn confirm(
        &mut self,
        store: &DomainStore,
        open: Option<&OpenView>,
    ) -> DomainResult<Option<Confirmed<T>>> {
        let GateState::PendingConfirmation(target) = std::mem::take(&mut self.state) else {
            return Ok(None);
        };

        let removal = match target.destroy(store).await {
            Ok(removal) => removal,
            Err(e) => {
                warn!("Delete failed, nothing removed: {}", e);
                return Err(e);
            }
        };
        let close_view = open.is_some_and(|view| removal.closes(view));
        info!("Delete confirmed (close view: {})", close_view);

        Ok(Some(Confirmed {
            target,
            removal,
            close_view,
        }))
    }
}
