//! Test adapters for both persistence shapes.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use skate_notes::domain::validation::DEFAULT_DIFFICULTY;
use skate_notes::domain::{DomainError, DomainResult, Obstacle, ObstacleId, TrickId};
use skate_notes::repository::{
    ObstacleWrite, PersistenceAdapter, SnapshotStore, TrickSaved, TrickWrite,
};
use skate_notes::store::DomainStore;

/// In-memory stand-in for the REST backend: server-assigned ids, the
/// parent obstacle returned on trick creation, `lastPracticed` stamped on
/// trick updates.
#[derive(Default)]
pub struct FakeResourceStore {
    obstacles: Mutex<Vec<Obstacle>>,
    next_id: AtomicU64,
}

impl FakeResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles: Mutex::new(obstacles),
            next_id: AtomicU64::new(0),
        }
    }

    fn new_id(&self) -> String {
        format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn stored(&self) -> Vec<Obstacle> {
        self.obstacles.lock().unwrap().clone()
    }
}

fn not_found(what: &str, id: &str) -> DomainError {
    DomainError::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl PersistenceAdapter for FakeResourceStore {
    async fn load_all(&self) -> DomainResult<Vec<Obstacle>> {
        Ok(self.stored())
    }

    async fn save_obstacle(&self, write: ObstacleWrite) -> DomainResult<Obstacle> {
        let mut obstacles = self.obstacles.lock().unwrap();
        match write {
            ObstacleWrite::Create { name } => {
                if obstacles.iter().any(|o| o.name == name) {
                    return Err(DomainError::Conflict(
                        "Já existe um obstáculo com este nome".to_string(),
                    ));
                }
                let obstacle = Obstacle::new(self.new_id(), name);
                obstacles.push(obstacle.clone());
                Ok(obstacle)
            }
            ObstacleWrite::Rename { id, name } => {
                let obstacle = obstacles
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or_else(|| not_found("Obstacle", &id))?;
                obstacle.name = name;
                Ok(obstacle.clone())
            }
        }
    }

    async fn remove_obstacle(&self, id: &ObstacleId) -> DomainResult<()> {
        let mut obstacles = self.obstacles.lock().unwrap();
        let index = obstacles
            .iter()
            .position(|o| &o.id == id)
            .ok_or_else(|| not_found("Obstacle", id))?;
        obstacles.remove(index);
        Ok(())
    }

    async fn save_trick(&self, obstacle_id: &ObstacleId, write: TrickWrite) -> DomainResult<TrickSaved> {
        let mut obstacles = self.obstacles.lock().unwrap();
        let obstacle = obstacles
            .iter_mut()
            .find(|o| &o.id == obstacle_id)
            .ok_or_else(|| not_found("Obstacle", obstacle_id))?;
        match write {
            TrickWrite::Create(draft) => {
                let mut trick = draft.into_trick(self.new_id());
                trick.difficulty.get_or_insert(DEFAULT_DIFFICULTY);
                obstacle.tricks.push(trick);
                Ok(TrickSaved::Parent(obstacle.clone()))
            }
            TrickWrite::Update(mut trick) => {
                let slot = obstacle
                    .trick_mut(&trick.id)
                    .ok_or_else(|| not_found("Trick", &trick.id))?;
                trick.last_practiced = Some(Utc::now());
                trick.difficulty.get_or_insert(DEFAULT_DIFFICULTY);
                *slot = trick.clone();
                Ok(TrickSaved::Child(trick))
            }
        }
    }

    async fn remove_trick(&self, obstacle_id: &ObstacleId, trick_id: &TrickId) -> DomainResult<()> {
        let mut obstacles = self.obstacles.lock().unwrap();
        let obstacle = obstacles
            .iter_mut()
            .find(|o| &o.id == obstacle_id)
            .ok_or_else(|| not_found("Obstacle", obstacle_id))?;
        obstacle
            .remove_trick(trick_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Trick", trick_id))
    }

    fn kind(&self) -> &'static str {
        "fake-resource"
    }
}

/// A call seen by [`Recording`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadAll,
    SaveObstacle(ObstacleWrite),
    RemoveObstacle(ObstacleId),
    SaveTrick(ObstacleId, TrickWrite),
    RemoveTrick(ObstacleId, TrickId),
}

/// Wraps an adapter with a call log, optional latency and a failure switch
pub struct Recording<A> {
    inner: A,
    calls: Mutex<Vec<Call>>,
    latency: Mutex<Duration>,
    failing: AtomicBool,
    /// Trick updates running right now, and the most ever seen at once
    active: Mutex<(usize, usize)>,
}

impl<A: PersistenceAdapter> Recording<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
            failing: AtomicBool::new(false),
            active: Mutex::new((0, 0)),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Writes that changed something
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| *c != Call::LoadAll)
            .collect()
    }

    /// Notes carried by each trick update, in call order
    pub fn note_writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SaveTrick(_, TrickWrite::Update(trick)) => Some(trick.observations),
                _ => None,
            })
            .collect()
    }

    pub fn max_concurrent_updates(&self) -> usize {
        self.active.lock().unwrap().1
    }

    async fn before(&self, call: Call) -> DomainResult<()> {
        self.calls.lock().unwrap().push(call);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Persistence("backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<A: PersistenceAdapter> PersistenceAdapter for Recording<A> {
    async fn load_all(&self) -> DomainResult<Vec<Obstacle>> {
        self.before(Call::LoadAll).await?;
        self.inner.load_all().await
    }

    async fn save_obstacle(&self, write: ObstacleWrite) -> DomainResult<Obstacle> {
        self.before(Call::SaveObstacle(write.clone())).await?;
        self.inner.save_obstacle(write).await
    }

    async fn remove_obstacle(&self, id: &ObstacleId) -> DomainResult<()> {
        self.before(Call::RemoveObstacle(id.clone())).await?;
        self.inner.remove_obstacle(id).await
    }

    async fn save_trick(&self, obstacle_id: &ObstacleId, write: TrickWrite) -> DomainResult<TrickSaved> {
        let update = matches!(write, TrickWrite::Update(_));
        if update {
            let mut active = self.active.lock().unwrap();
            active.0 += 1;
            active.1 = active.1.max(active.0);
        }
        let result = match self.before(Call::SaveTrick(obstacle_id.clone(), write.clone())).await {
            Ok(()) => self.inner.save_trick(obstacle_id, write).await,
            Err(e) => Err(e),
        };
        if update {
            self.active.lock().unwrap().0 -= 1;
        }
        result
    }

    async fn remove_trick(&self, obstacle_id: &ObstacleId, trick_id: &TrickId) -> DomainResult<()> {
        self.before(Call::RemoveTrick(obstacle_id.clone(), trick_id.clone()))
            .await?;
        self.inner.remove_trick(obstacle_id, trick_id).await
    }

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }
}

pub fn snapshot_backend() -> Arc<Recording<SnapshotStore>> {
    let store = SnapshotStore::open(Path::new(":memory:")).expect("Failed to init test DB");
    Arc::new(Recording::new(store))
}

pub fn resource_backend() -> Arc<Recording<FakeResourceStore>> {
    Arc::new(Recording::new(FakeResourceStore::new()))
}

pub async fn open_store<A: PersistenceAdapter + 'static>(adapter: &Arc<Recording<A>>) -> Arc<DomainStore> {
    let adapter: Arc<dyn PersistenceAdapter> = adapter.clone();
    Arc::new(DomainStore::open(adapter).await.expect("store opens"))
}
