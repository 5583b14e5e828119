//! Skate Notes Core
//!
//! Layered architecture:
//! - domain: Obstacles, tricks, status lanes and input rules
//! - repository: Persistence adapter contract and its backends
//! - store: The canonical collection, persisted before it is committed
//! - autosave: Debounced, serialized writes of trick notes
//! - confirm: Two-step delete gate
//! - config / bootstrap: Wiring for a running app

pub mod autosave;
pub mod bootstrap;
pub mod config;
pub mod confirm;
pub mod domain;
pub mod repository;
pub mod store;

pub use autosave::{AutosaveNotice, NoteAutosave, TrickKey, DEFAULT_DEBOUNCE};
pub use bootstrap::App;
pub use config::{AppConfig, BackendConfig};
pub use confirm::{Confirmed, DeleteGate, Destructible, GateState, ObstacleTarget, TrickTarget};
pub use domain::{
    lane_across, lane_counts, tricks_in_lane, DomainError, DomainResult, LaneEntry, LaneSelection,
    Obstacle, ObstacleId, Trick, TrickDraft, TrickId, TrickStatus,
};
pub use repository::{PersistenceAdapter, ResourceStore, SnapshotStore};
pub use store::{DomainStore, OpenView, Removal};
