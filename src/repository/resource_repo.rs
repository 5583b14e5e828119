//! Resource Store
//!
//! Per-entity REST backend. Each write is one HTTP call against the
//! obstacle/trick resources; the server assigns ids and stamps
//! `lastPracticed` on trick updates.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::decode_error;
use super::traits::{ObstacleWrite, PersistenceAdapter, TrickSaved, TrickWrite};
use crate::domain::validation::DEFAULT_DIFFICULTY;
use crate::domain::{DomainError, DomainResult, Obstacle, ObstacleId, Trick, TrickId, TrickStatus};

pub struct ResourceStore {
    client: Client,
    base_url: String,
}

/// Error payload returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct TrickBody<'a> {
    name: &'a str,
    status: TrickStatus,
    observations: &'a str,
    difficulty: u8,
}

/// A trick from the cross-obstacle status query, tagged with its obstacle
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLaneTrick {
    #[serde(flatten)]
    pub trick: Trick,
    pub obstacle_name: String,
    pub obstacle_id: ObstacleId,
}

impl ResourceStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Persistence(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Persistence(format!("Request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::Persistence(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(map_error(status, &body));
        }
        decode_body(&body)
    }

    async fn send_empty(&self, request: RequestBuilder) -> DomainResult<()> {
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    /// Obstacles holding at least one trick in `status` (server-side filter)
    pub async fn obstacles_with_status(&self, status: TrickStatus) -> DomainResult<Vec<Obstacle>> {
        let request = self
            .client
            .get(self.url("/obstacles"))
            .query(&[("status", status.as_str())]);
        self.send(request).await
    }

    /// Every trick in `status`, across obstacles (server-side filter)
    pub async fn tricks_with_status(&self, status: TrickStatus) -> DomainResult<Vec<RemoteLaneTrick>> {
        let request = self
            .client
            .get(self.url("/tricks"))
            .query(&[("status", status.as_str())]);
        self.send(request).await
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> DomainResult<T> {
    serde_json::from_str(body).map_err(|e| decode_error("Unexpected response", e))
}

/// Server reply for a name that is already taken, either from the
/// explicit check or from the unique index
fn is_duplicate_name(message: &str) -> bool {
    const MARKERS: [&str; 3] = ["Já existe", "E11000", "duplicate key"];
    MARKERS.iter().any(|marker| message.contains(marker))
}

/// Translate a non-success response into a domain error
fn map_error(status: StatusCode, body: &str) -> DomainError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error, details: Some(details) }) => format!("{}: {}", error, details),
        Ok(ErrorBody { error, details: None }) => error,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body.trim().to_string(),
    };

    match status {
        StatusCode::NOT_FOUND => DomainError::NotFound(message),
        StatusCode::CONFLICT => DomainError::Conflict(message),
        _ if is_duplicate_name(&message) => DomainError::Conflict(message),
        StatusCode::BAD_REQUEST => DomainError::Validation(message),
        _ => DomainError::Persistence(message),
    }
}

#[async_trait]
impl PersistenceAdapter for ResourceStore {
    async fn load_all(&self) -> DomainResult<Vec<Obstacle>> {
        self.send(self.client.get(self.url("/obstacles"))).await
    }

    async fn save_obstacle(&self, write: ObstacleWrite) -> DomainResult<Obstacle> {
        let request = match &write {
            ObstacleWrite::Create { name } => self
                .client
                .post(self.url("/obstacles"))
                .json(&NameBody { name }),
            ObstacleWrite::Rename { id, name } => self
                .client
                .put(self.url(&format!("/obstacles/{}", id)))
                .json(&NameBody { name }),
        };
        self.send(request).await
    }

    async fn remove_obstacle(&self, id: &ObstacleId) -> DomainResult<()> {
        self.send_empty(self.client.delete(self.url(&format!("/obstacles/{}", id))))
            .await
    }

    async fn save_trick(&self, obstacle_id: &ObstacleId, write: TrickWrite) -> DomainResult<TrickSaved> {
        match write {
            TrickWrite::Create(draft) => {
                let body = TrickBody {
                    name: &draft.name,
                    status: draft.status,
                    observations: &draft.observations,
                    difficulty: draft.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
                };
                let request = self
                    .client
                    .post(self.url(&format!("/obstacles/{}/tricks", obstacle_id)))
                    .json(&body);
                self.send(request).await.map(TrickSaved::Parent)
            }
            TrickWrite::Update(trick) => {
                let body = TrickBody {
                    name: &trick.name,
                    status: trick.status,
                    observations: &trick.observations,
                    difficulty: trick.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
                };
                let request = self
                    .client
                    .put(self.url(&format!("/obstacles/{}/tricks/{}", obstacle_id, trick.id)))
                    .json(&body);
                self.send(request).await.map(TrickSaved::Child)
            }
        }
    }

    async fn remove_trick(&self, obstacle_id: &ObstacleId, trick_id: &TrickId) -> DomainResult<()> {
        let url = self.url(&format!("/obstacles/{}/tricks/{}", obstacle_id, trick_id));
        self.send_empty(self.client.delete(url)).await
    }

    fn kind(&self) -> &'static str {
        "resource"
    }
}
