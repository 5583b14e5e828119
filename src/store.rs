//! Domain Store
//!
//! Owns the canonical obstacle collection. Every mutation is validated,
//! persisted through the adapter, and only then committed in memory, so a
//! failed write leaves the collection exactly as it was.
//!
//! One async lock is held across each adapter call: operations from one
//! caller are applied in order and validate-then-persist cannot interleave.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};

use crate::domain::validation::{check_difficulty, check_observations, clean_name};
use crate::domain::{
    position_of, DomainError, DomainResult, Obstacle, ObstacleId, Trick, TrickDraft, TrickId,
    TrickStatus,
};
use crate::repository::{ObstacleWrite, PersistenceAdapter, TrickSaved, TrickWrite};

/// The detail view the presentation layer currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenView {
    Obstacle(ObstacleId),
    Trick(ObstacleId, TrickId),
}

/// What a successful delete took out of the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Obstacle {
        obstacle_id: ObstacleId,
        trick_ids: Vec<TrickId>,
    },
    Trick {
        obstacle_id: ObstacleId,
        trick_id: TrickId,
    },
}

impl Removal {
    /// Whether `view` showed something that no longer exists
    pub fn closes(&self, view: &OpenView) -> bool {
        match (self, view) {
            (Removal::Obstacle { obstacle_id, .. }, OpenView::Obstacle(open)) => obstacle_id == open,
            (Removal::Obstacle { obstacle_id, .. }, OpenView::Trick(open, _)) => obstacle_id == open,
            (Removal::Trick { obstacle_id, trick_id }, OpenView::Trick(open_obstacle, open_trick)) => {
                obstacle_id == open_obstacle && trick_id == open_trick
            }
            (Removal::Trick { .. }, OpenView::Obstacle(_)) => false,
        }
    }
}

pub struct DomainStore {
    adapter: Arc<dyn PersistenceAdapter>,
    obstacles: Mutex<Vec<Obstacle>>,
    /// Bumped after every committed mutation
    revision: watch::Sender<u64>,
}

impl DomainStore {
    /// Load the collection from the adapter and wrap it
    pub async fn open(adapter: Arc<dyn PersistenceAdapter>) -> DomainResult<Self> {
        let obstacles = adapter.load_all().await?;
        info!(
            "Loaded {} obstacles from {} backend",
            obstacles.len(),
            adapter.kind()
        );

        for (i, obstacle) in obstacles.iter().enumerate() {
            if obstacles[..i].iter().any(|o| o.name == obstacle.name) {
                warn!("Stored collection has duplicate obstacle name '{}'", obstacle.name);
            }
        }

        let (revision, _) = watch::channel(0);
        Ok(Self {
            adapter,
            obstacles: Mutex::new(obstacles),
            revision,
        })
    }

    // ========================
    // Queries
    // ========================

    /// Snapshot of the collection in display order
    pub async fn list_obstacles(&self) -> Vec<Obstacle> {
        self.obstacles.lock().await.clone()
    }

    pub async fn obstacle(&self, id: &str) -> Option<Obstacle> {
        let obstacles = self.obstacles.lock().await;
        position_of(obstacles.as_slice(), id).map(|i| obstacles[i].clone())
    }

    pub async fn trick(&self, obstacle_id: &str, trick_id: &str) -> Option<Trick> {
        let obstacles = self.obstacles.lock().await;
        position_of(obstacles.as_slice(), obstacle_id)
            .and_then(|i| obstacles[i].trick(trick_id))
            .cloned()
    }

    /// Receiver that changes after every committed mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    // ========================
    // Obstacles
    // ========================

    pub async fn create_obstacle(&self, name: &str) -> DomainResult<Obstacle> {
        let name = clean_name("Obstacle", name)?;
        let mut obstacles = self.obstacles.lock().await;
        ensure_name_free(&obstacles, &name, None)?;

        let created = self
            .adapter
            .save_obstacle(ObstacleWrite::Create { name })
            .await?;
        debug!("Created obstacle {} '{}'", created.id, created.name);
        obstacles.push(created.clone());
        self.bump();
        Ok(created)
    }

    pub async fn rename_obstacle(&self, id: &str, new_name: &str) -> DomainResult<Obstacle> {
        let name = clean_name("Obstacle", new_name)?;
        let mut obstacles = self.obstacles.lock().await;
        let index = obstacle_index(&obstacles, id)?;
        ensure_name_free(&obstacles, &name, Some(id))?;

        let renamed = self
            .adapter
            .save_obstacle(ObstacleWrite::Rename {
                id: id.to_string(),
                name,
            })
            .await?;
        obstacles[index] = renamed.clone();
        self.bump();
        Ok(renamed)
    }

    /// Remove an obstacle and every trick it owns
    pub async fn delete_obstacle(&self, id: &str) -> DomainResult<Removal> {
        let mut obstacles = self.obstacles.lock().await;
        let index = obstacle_index(&obstacles, id)?;

        self.adapter.remove_obstacle(&id.to_string()).await?;
        let removed = obstacles.remove(index);
        info!(
            "Deleted obstacle '{}' with {} tricks",
            removed.name,
            removed.tricks.len()
        );
        self.bump();
        Ok(Removal::Obstacle {
            trick_ids: removed.trick_ids(),
            obstacle_id: removed.id,
        })
    }

    // ========================
    // Tricks
    // ========================

    pub async fn add_trick(
        &self,
        obstacle_id: &str,
        name: &str,
        status: TrickStatus,
    ) -> DomainResult<Trick> {
        self.add_trick_with(obstacle_id, TrickDraft::new(name, status))
            .await
    }

    /// Add a trick with optional notes and difficulty
    pub async fn add_trick_with(&self, obstacle_id: &str, draft: TrickDraft) -> DomainResult<Trick> {
        let draft = TrickDraft {
            name: clean_name("Trick", &draft.name)?,
            ..draft
        };
        check_observations(&draft.observations)?;
        check_difficulty(draft.difficulty)?;

        let mut obstacles = self.obstacles.lock().await;
        let index = obstacle_index(&obstacles, obstacle_id)?;
        let before = obstacles[index].trick_ids();

        let saved = self
            .adapter
            .save_trick(&obstacle_id.to_string(), TrickWrite::Create(draft))
            .await?;

        let trick = match saved {
            TrickSaved::Child(trick) => {
                obstacles[index].tricks.push(trick.clone());
                trick
            }
            TrickSaved::Parent(parent) => {
                let trick = parent
                    .tricks
                    .iter()
                    .find(|t| !before.contains(&t.id))
                    .cloned()
                    .ok_or_else(|| {
                        DomainError::Persistence("Backend returned no new trick".to_string())
                    })?;
                obstacles[index] = parent;
                trick
            }
        };
        debug!("Added trick {} '{}' to {}", trick.id, trick.name, obstacle_id);
        self.bump();
        Ok(trick)
    }

    pub async fn rename_trick(
        &self,
        obstacle_id: &str,
        trick_id: &str,
        new_name: &str,
    ) -> DomainResult<Trick> {
        let name = clean_name("Trick", new_name)?;
        let mut obstacles = self.obstacles.lock().await;
        let current = find_trick(&obstacles, obstacle_id, trick_id)?;
        let renamed = Trick {
            name,
            ..current.clone()
        };
        self.replace_trick(&mut obstacles, obstacle_id, renamed).await
    }

    /// Replace a trick's whole record; used for status moves and note commits
    pub async fn update_trick(&self, obstacle_id: &str, trick: Trick) -> DomainResult<Trick> {
        let trick = Trick {
            name: clean_name("Trick", &trick.name)?,
            ..trick
        };
        let mut obstacles = self.obstacles.lock().await;
        find_trick(&obstacles, obstacle_id, &trick.id)?;
        self.replace_trick(&mut obstacles, obstacle_id, trick).await
    }

    /// Move a trick to another lane
    pub async fn move_trick(
        &self,
        obstacle_id: &str,
        trick_id: &str,
        status: TrickStatus,
    ) -> DomainResult<Trick> {
        let mut obstacles = self.obstacles.lock().await;
        let moved = find_trick(&obstacles, obstacle_id, trick_id)?.with_status(status);
        self.replace_trick(&mut obstacles, obstacle_id, moved).await
    }

    /// Write new notes into the current record of a trick.
    ///
    /// Read and write happen under one lock, so a concurrent status move is
    /// never reverted by a stale copy. Text equal to the stored notes is not
    /// written; the current record is returned as-is.
    pub async fn set_observations(
        &self,
        obstacle_id: &str,
        trick_id: &str,
        text: &str,
    ) -> DomainResult<Trick> {
        let mut obstacles = self.obstacles.lock().await;
        let current = find_trick(&obstacles, obstacle_id, trick_id)?;
        if current.observations == text {
            debug!("Notes for {} unchanged, skipping write", trick_id);
            return Ok(current.clone());
        }
        let updated = current.with_observations(text);
        self.replace_trick(&mut obstacles, obstacle_id, updated).await
    }

    pub async fn delete_trick(&self, obstacle_id: &str, trick_id: &str) -> DomainResult<Removal> {
        let mut obstacles = self.obstacles.lock().await;
        find_trick(&obstacles, obstacle_id, trick_id)?;

        self.adapter
            .remove_trick(&obstacle_id.to_string(), &trick_id.to_string())
            .await?;
        let index = obstacle_index(&obstacles, obstacle_id)?;
        obstacles[index].remove_trick(trick_id);
        debug!("Deleted trick {} from {}", trick_id, obstacle_id);
        self.bump();
        Ok(Removal::Trick {
            obstacle_id: obstacle_id.to_string(),
            trick_id: trick_id.to_string(),
        })
    }

    /// Validate, stamp, persist and commit a full trick record.
    /// Caller holds the collection lock.
    async fn replace_trick(
        &self,
        obstacles: &mut [Obstacle],
        obstacle_id: &str,
        mut trick: Trick,
    ) -> DomainResult<Trick> {
        check_observations(&trick.observations)?;
        check_difficulty(trick.difficulty)?;
        trick.last_practiced = Some(Utc::now());

        let index = obstacle_index(obstacles, obstacle_id)?;
        let trick_id = trick.id.clone();
        let saved = self
            .adapter
            .save_trick(&obstacle_id.to_string(), TrickWrite::Update(trick))
            .await?;

        let committed = match saved {
            TrickSaved::Child(saved) => {
                let slot = obstacles[index].trick_mut(&trick_id).ok_or_else(|| {
                    DomainError::NotFound(format!("Trick {} not found", trick_id))
                })?;
                *slot = saved.clone();
                saved
            }
            TrickSaved::Parent(parent) => {
                let saved = parent.trick(&trick_id).cloned().ok_or_else(|| {
                    DomainError::Persistence(format!("Backend dropped trick {}", trick_id))
                })?;
                obstacles[index] = parent;
                saved
            }
        };
        self.bump();
        Ok(committed)
    }
}

fn obstacle_index(obstacles: &[Obstacle], id: &str) -> DomainResult<usize> {
    position_of(obstacles, id)
        .ok_or_else(|| DomainError::NotFound(format!("Obstacle {} not found", id)))
}

fn find_trick<'a>(obstacles: &'a [Obstacle], obstacle_id: &str, trick_id: &str) -> DomainResult<&'a Trick> {
    let index = obstacle_index(obstacles, obstacle_id)?;
    obstacles[index]
        .trick(trick_id)
        .ok_or_else(|| DomainError::NotFound(format!("Trick {} not found", trick_id)))
}

/// Case-sensitive uniqueness check; `except` skips the obstacle being renamed
fn ensure_name_free(obstacles: &[Obstacle], name: &str, except: Option<&str>) -> DomainResult<()> {
    let taken = obstacles
        .iter()
        .any(|o| o.name == name && except.map_or(true, |id| o.id != id));
    if taken {
        return Err(DomainError::Conflict(format!(
            "Obstacle '{}' already exists",
            name
        )));
    }
    Ok(())
}
