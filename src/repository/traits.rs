//! Repository Layer - Persistence Adapter Contract
//!
//! The single boundary between the domain store and storage. A backend may
//! persist the whole collection on every change or talk to per-entity
//! remote resources; the store is written once against this trait.

use async_trait::async_trait;

use crate::domain::{DomainResult, Obstacle, ObstacleId, Trick, TrickDraft, TrickId};

/// Obstacle-level write
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleWrite {
    Create { name: String },
    Rename { id: ObstacleId, name: String },
}

/// Trick-level write. `Update` replaces the whole record.
#[derive(Debug, Clone, PartialEq)]
pub enum TrickWrite {
    Create(TrickDraft),
    Update(Trick),
}

/// What a backend hands back after a trick write
#[derive(Debug, Clone, PartialEq)]
pub enum TrickSaved {
    /// The whole parent obstacle after the write
    Parent(Obstacle),
    /// Only the written trick
    Child(Trick),
}

/// Storage backend used by the domain store.
///
/// Every call either resolves with the canonical post-mutation record or
/// fails; timeouts are the backend's own concern.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Load the full collection; called once at startup
    async fn load_all(&self) -> DomainResult<Vec<Obstacle>>;

    /// Create or rename an obstacle
    async fn save_obstacle(&self, write: ObstacleWrite) -> DomainResult<Obstacle>;

    /// Delete an obstacle together with its tricks
    async fn remove_obstacle(&self, id: &ObstacleId) -> DomainResult<()>;

    /// Create or replace a trick under its obstacle
    async fn save_trick(&self, obstacle_id: &ObstacleId, write: TrickWrite) -> DomainResult<TrickSaved>;

    async fn remove_trick(&self, obstacle_id: &ObstacleId, trick_id: &TrickId) -> DomainResult<()>;

    /// Short backend name for logs
    fn kind(&self) -> &'static str;
}
