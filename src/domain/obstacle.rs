//! Obstacle Entity
//!
//! A named skate feature (rail, ledge, stair set) owning its tricks.

use serde::{Deserialize, Serialize};

use super::entity::{position_of, Entity};
use super::trick::{Trick, TrickId};

/// Obstacle identifier
pub type ObstacleId = String;

/// An obstacle and its tricks, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(alias = "_id")]
    pub id: ObstacleId,
    /// Unique across the collection
    pub name: String,
    #[serde(default)]
    pub tricks: Vec<Trick>,
}

impl Obstacle {
    pub fn new(id: ObstacleId, name: String) -> Self {
        Self {
            id,
            name,
            tricks: Vec::new(),
        }
    }

    pub fn trick(&self, trick_id: &str) -> Option<&Trick> {
        position_of(self.tricks.as_slice(), trick_id).map(|i| &self.tricks[i])
    }

    pub fn trick_mut(&mut self, trick_id: &str) -> Option<&mut Trick> {
        position_of(self.tricks.as_slice(), trick_id).map(|i| &mut self.tricks[i])
    }

    /// Remove a trick, keeping the order of the rest
    pub fn remove_trick(&mut self, trick_id: &str) -> Option<Trick> {
        let index = position_of(self.tricks.as_slice(), trick_id)?;
        Some(self.tricks.remove(index))
    }

    pub fn trick_ids(&self) -> Vec<TrickId> {
        self.tricks.iter().map(|t| t.id.clone()).collect()
    }
}

impl Entity for Obstacle {
    type Id = ObstacleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
