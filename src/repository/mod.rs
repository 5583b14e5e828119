//! Repository Layer
//!
//! The persistence adapter contract and its two reference backends.

mod db;
mod resource_repo;
mod snapshot_repo;
mod traits;

pub use db::open_db;
pub use resource_repo::{RemoteLaneTrick, ResourceStore};
pub use snapshot_repo::{SnapshotStore, SNAPSHOT_KEY};
pub use traits::{ObstacleWrite, PersistenceAdapter, TrickSaved, TrickWrite};

use crate::domain::DomainError;

/// Classify a JSON decode failure: well-formed JSON carrying values outside
/// the model (an unknown status, say) is a validation error, anything else
/// is a storage fault.
pub(crate) fn decode_error(context: &str, e: serde_json::Error) -> DomainError {
    match e.classify() {
        serde_json::error::Category::Data => {
            DomainError::Validation(format!("{}: {}", context, e))
        }
        _ => DomainError::Persistence(format!("{}: {}", context, e)),
    }
}
