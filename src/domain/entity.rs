//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have an identifier and be thread-safe.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's identifier
    fn id(&self) -> &Self::Id;
}

/// Index of the entity whose id equals `id`
pub fn position_of<E, Q>(entities: &[E], id: &Q) -> Option<usize>
where
    E: Entity,
    E::Id: Borrow<Q>,
    Q: Eq + ?Sized,
{
    entities.iter().position(|e| e.id().borrow() == id)
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    /// Blank, oversize or out-of-range input. Never retried automatically.
    Validation(String),
    /// Obstacle name already taken
    Conflict(String),
    /// Target id is absent from the collection
    NotFound(String),
    /// Backend failure, reason passed through as-is
    Persistence(String),
}

impl DomainError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, DomainError::Persistence(_))
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Named(String);

    impl Entity for Named {
        type Id = String;

        fn id(&self) -> &String {
            &self.0
        }
    }

    #[test]
    fn test_position_of_looks_up_by_id() {
        let items = vec![Named("a".into()), Named("b".into())];
        assert_eq!(position_of(items.as_slice(), "b"), Some(1));
        assert_eq!(position_of(items.as_slice(), "z"), None);
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::Conflict("Obstacle 'Rail' already exists".to_string());
        assert_eq!(err.to_string(), "Conflict: Obstacle 'Rail' already exists");
        assert!(!err.is_persistence());
        assert!(DomainError::Persistence("disk full".into()).is_persistence());
    }
}
