//! Snapshot Store
//!
//! Whole-collection persistence: every write re-serializes the entire
//! obstacle list and stores it as one JSON blob in SQLite. Ids are
//! generated on the client.

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::db::{open_db, read_blob, write_blob};
use super::decode_error;
use super::traits::{ObstacleWrite, PersistenceAdapter, TrickSaved, TrickWrite};
use crate::domain::{position_of, DomainError, DomainResult, Obstacle, ObstacleId, TrickId};

/// Storage key of the collection blob
pub const SNAPSHOT_KEY: &str = "@SkateNotes:obstacles";

pub struct SnapshotStore {
    conn: Arc<Mutex<Option<Connection>>>,
    /// Last collection known to be stored; `None` until first read
    mirror: Mutex<Option<Vec<Obstacle>>>,
}

impl SnapshotStore {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self {
            conn,
            mirror: Mutex::new(None),
        }
    }

    /// Open the database file and wrap it
    pub fn open(db_path: &Path) -> DomainResult<Self> {
        let conn = open_db(db_path)?;
        Ok(Self::new(Arc::new(Mutex::new(Some(conn)))))
    }

    async fn read_stored(&self) -> DomainResult<Vec<Obstacle>> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or(DomainError::Persistence("Database not initialized".to_string()))?;

        match read_blob(conn, SNAPSHOT_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| decode_error("Corrupt snapshot", e)),
            None => Ok(Vec::new()),
        }
    }

    async fn store(&self, obstacles: &[Obstacle]) -> DomainResult<()> {
        let json = serde_json::to_string(obstacles)
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or(DomainError::Persistence("Database not initialized".to_string()))?;
        write_blob(conn, SNAPSHOT_KEY, &json)
    }

    /// Apply `change` to a copy of the collection, store the copy, then adopt it.
    ///
    /// If `change` or the write fails the mirror is left as it was.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Obstacle>) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut mirror = self.mirror.lock().await;
        let mut next = match mirror.as_ref() {
            Some(current) => current.clone(),
            None => self.read_stored().await?,
        };

        let result = change(&mut next)?;
        self.store(&next).await?;
        *mirror = Some(next);
        Ok(result)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn find_obstacle<'a>(obstacles: &'a mut [Obstacle], id: &str) -> DomainResult<&'a mut Obstacle> {
    let index = position_of(obstacles, id)
        .ok_or_else(|| DomainError::NotFound(format!("Obstacle {} not found", id)))?;
    Ok(&mut obstacles[index])
}

#[async_trait]
impl PersistenceAdapter for SnapshotStore {
    async fn load_all(&self) -> DomainResult<Vec<Obstacle>> {
        let stored = self.read_stored().await?;
        *self.mirror.lock().await = Some(stored.clone());
        Ok(stored)
    }

    async fn save_obstacle(&self, write: ObstacleWrite) -> DomainResult<Obstacle> {
        self.mutate(|obstacles| match write {
            ObstacleWrite::Create { name } => {
                let obstacle = Obstacle::new(new_id(), name);
                obstacles.push(obstacle.clone());
                Ok(obstacle)
            }
            ObstacleWrite::Rename { id, name } => {
                let obstacle = find_obstacle(obstacles, &id)?;
                obstacle.name = name;
                Ok(obstacle.clone())
            }
        })
        .await
    }

    async fn remove_obstacle(&self, id: &ObstacleId) -> DomainResult<()> {
        self.mutate(|obstacles| {
            let index = position_of(obstacles.as_slice(), id.as_str())
                .ok_or_else(|| DomainError::NotFound(format!("Obstacle {} not found", id)))?;
            obstacles.remove(index);
            Ok(())
        })
        .await
    }

    async fn save_trick(&self, obstacle_id: &ObstacleId, write: TrickWrite) -> DomainResult<TrickSaved> {
        self.mutate(|obstacles| {
            let obstacle = find_obstacle(obstacles, obstacle_id)?;
            match write {
                TrickWrite::Create(draft) => {
                    let trick = draft.into_trick(new_id());
                    obstacle.tricks.push(trick.clone());
                    Ok(TrickSaved::Child(trick))
                }
                TrickWrite::Update(trick) => {
                    let slot = obstacle.trick_mut(&trick.id).ok_or_else(|| {
                        DomainError::NotFound(format!("Trick {} not found", trick.id))
                    })?;
                    *slot = trick.clone();
                    Ok(TrickSaved::Child(trick))
                }
            }
        })
        .await
    }

    async fn remove_trick(&self, obstacle_id: &ObstacleId, trick_id: &TrickId) -> DomainResult<()> {
        self.mutate(|obstacles| {
            let obstacle = find_obstacle(obstacles, obstacle_id)?;
            obstacle
                .remove_trick(trick_id)
                .map(|_| ())
                .ok_or_else(|| DomainError::NotFound(format!("Trick {} not found", trick_id)))
        })
        .await
    }

    fn kind(&self) -> &'static str {
        "snapshot"
    }
}
