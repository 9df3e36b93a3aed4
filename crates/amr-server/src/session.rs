//! In-memory run registry (teacher's `SessionManager` pattern): one entry
//! per active run, holding the shared bus and the task handles driving it.
//! No database — persistence is explicitly external (spec.md §6).

use std::collections::HashMap;
use std::sync::Arc;

use amr_core::TopicBus;
use amr_scenario::{Mode, Scale};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub struct RunHandle {
    pub run_id: String,
    pub mode: Mode,
    pub seed: u64,
    pub scale: Scale,
    pub bus: Arc<TopicBus>,
    _simulator_task: JoinHandle<()>,
    _dispatcher_task: JoinHandle<()>,
}

impl RunHandle {
    pub fn new(
        run_id: String,
        mode: Mode,
        seed: u64,
        scale: Scale,
        bus: Arc<TopicBus>,
        simulator_task: JoinHandle<()>,
        dispatcher_task: JoinHandle<()>,
    ) -> Self {
        Self {
            run_id,
            mode,
            seed,
            scale,
            bus,
            _simulator_task: simulator_task,
            _dispatcher_task: dispatcher_task,
        }
    }
}

#[derive(Default, Clone)]
pub struct SessionManager {
    runs: Arc<Mutex<HashMap<String, Arc<RunHandle>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: RunHandle) {
        self.runs.lock().await.insert(handle.run_id.clone(), Arc::new(handle));
    }

    pub async fn get(&self, run_id: &str) -> Option<Arc<RunHandle>> {
        self.runs.lock().await.get(run_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.runs.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_run_id_returns_none() {
        let sessions = SessionManager::new();
        assert!(sessions.get("missing").await.is_none());
        assert_eq!(sessions.len().await, 0);
    }
}
