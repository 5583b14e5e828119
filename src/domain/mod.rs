//! Domain Layer
//!
//! Contains the domain entities, their input rules and the status lane
//! projections. This layer has NO external dependencies (except serde and
//! chrono for serialization).

mod entity;
mod lane;
mod obstacle;
mod trick;
pub mod validation;

pub use entity::{position_of, DomainError, DomainResult, Entity};
pub use lane::{lane_across, lane_counts, tricks_in_lane, LaneEntry, LaneSelection};
pub use obstacle::{Obstacle, ObstacleId};
pub use trick::{Trick, TrickDraft, TrickId, TrickStatus};
