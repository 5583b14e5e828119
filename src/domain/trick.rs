//! Trick Entity
//!
//! A maneuver practiced on an obstacle, moving through three status lanes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity};

/// Trick identifier, unique within its parent obstacle
pub type TrickId = String;

/// Practice stage of a trick.
///
/// Serialized with the labels the app has always stored; the English
/// identifiers are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrickStatus {
    #[default]
    #[serde(rename = "Aprender", alias = "Learning")]
    Learning,
    #[serde(rename = "Aprimorar", alias = "Improving")]
    Improving,
    #[serde(rename = "Na Base", alias = "Mastered")]
    Mastered,
}

impl TrickStatus {
    /// All lanes in display order
    pub const ALL: [TrickStatus; 3] = [
        TrickStatus::Learning,
        TrickStatus::Improving,
        TrickStatus::Mastered,
    ];

    /// Stored label
    pub fn as_str(&self) -> &'static str {
        match self {
            TrickStatus::Learning => "Aprender",
            TrickStatus::Improving => "Aprimorar",
            TrickStatus::Mastered => "Na Base",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrickStatus::Learning => "Learning",
            TrickStatus::Improving => "Improving",
            TrickStatus::Mastered => "Mastered",
        }
    }
}

impl FromStr for TrickStatus {
    type Err = DomainError;

    /// Unknown values are rejected, never coerced to a default lane
    fn from_str(s: &str) -> DomainResult<Self> {
        TrickStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s || status.name() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown trick status '{}'", s)))
    }
}

impl std::fmt::Display for TrickStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trick owned by exactly one obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trick {
    #[serde(alias = "_id")]
    pub id: TrickId,
    pub name: String,
    #[serde(default)]
    pub status: TrickStatus,
    /// Free-text practice notes
    #[serde(default)]
    pub observations: String,
    /// 1..=5; only the remote backend fills it in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Stamped on every update, never on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<DateTime<Utc>>,
}

impl Trick {
    pub fn new(id: TrickId, name: String, status: TrickStatus) -> Self {
        Self {
            id,
            name,
            status,
            observations: String::new(),
            difficulty: None,
            created_at: None,
            last_practiced: None,
        }
    }

    /// Copy of this trick moved to another lane
    pub fn with_status(&self, status: TrickStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Copy of this trick carrying new notes
    pub fn with_observations(&self, observations: impl Into<String>) -> Self {
        Self {
            observations: observations.into(),
            ..self.clone()
        }
    }
}

impl Entity for Trick {
    type Id = TrickId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a trick; the backend assigns the id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrickDraft {
    pub name: String,
    pub status: TrickStatus,
    pub observations: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

impl TrickDraft {
    pub fn new(name: impl Into<String>, status: TrickStatus) -> Self {
        Self {
            name: name.into(),
            status,
            observations: String::new(),
            difficulty: None,
        }
    }

    /// Materialize the draft under a client-generated id
    pub fn into_trick(self, id: TrickId) -> Trick {
        Trick {
            id,
            name: self.name,
            status: self.status,
            observations: self.observations,
            difficulty: self.difficulty,
            created_at: Some(Utc::now()),
            last_practiced: None,
        }
    }
}
