use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use tokio::sync::Mutex;

use crate::cards::WeekSchedule;
use crate::client::ContentApiClient;
use crate::filters::Filters;
use crate::models::TrainingSession;
use crate::store::WeekDataStore;
use crate::view::ScheduleView;
use crate::week::WeekWindow;

/// One schedule explorer: a view plus the sessions it has accumulated.
#[derive(Debug, Clone)]
pub struct Explorer {
    view: ScheduleView,
    store: WeekDataStore,
}

impl Explorer {
    pub fn new(view: ScheduleView, seed: Vec<TrainingSession>) -> Self {
        Self {
            view,
            store: WeekDataStore::with_sessions(seed),
        }
    }

    pub fn view(&self) -> &ScheduleView {
        &self.view
    }

    pub fn refresh(&mut self) -> Option<WeekWindow> {
        self.view.refresh(&self.store)
    }

    pub fn complete_fetch(
        &mut self,
        window: WeekWindow,
        sessions: Vec<TrainingSession>,
    ) -> Option<WeekWindow> {
        self.view.complete_fetch(&mut self.store, window, sessions)
    }

    pub fn go_to_week(&mut self, date: NaiveDate) -> Option<WeekWindow> {
        self.view.go_to_week(date, &self.store)
    }

    pub fn go_to_previous_week(&mut self) -> Option<WeekWindow> {
        self.view.go_to_previous_week(&self.store)
    }

    pub fn go_to_next_week(&mut self) -> Option<WeekWindow> {
        self.view.go_to_next_week(&self.store)
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.view.set_filters(filters);
    }

    pub fn reset_filters(&mut self) {
        self.view.reset_filters();
    }

    pub fn schedule(&self) -> WeekSchedule {
        WeekSchedule::render(&self.view, &self.store)
    }
}

pub type ExplorerHandle = Arc<Mutex<Explorer>>;

/// Runs fetches requested by an explorer until it has nothing left to ask for.
///
/// The lock is released while a fetch is in flight, so other operations on
/// the same explorer proceed against the current store and a fetch may
/// complete after the explorer has moved to another week.
pub async fn settle(handle: &ExplorerHandle, client: &ContentApiClient, first: Option<WeekWindow>) {
    let mut next = first;
    while let Some(window) = next {
        let sessions = client.fetch_week(window).await;
        next = handle.lock().await.complete_fetch(window, sessions);
    }
}

/// Live explorers keyed by id. Idle explorers are evicted.
#[derive(Clone)]
pub struct ExplorerRegistry {
    explorers: Cache<u64, ExplorerHandle>,
    next_id: Arc<AtomicU64>,
}

impl ExplorerRegistry {
    pub fn new(max_explorers: u64, idle: Duration) -> Self {
        Self {
            explorers: Cache::builder()
                .max_capacity(max_explorers)
                .time_to_idle(idle)
                .build(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn insert(&self, explorer: Explorer) -> (u64, ExplorerHandle) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(Mutex::new(explorer));
        self.explorers.insert(id, handle.clone()).await;
        (id, handle)
    }

    pub async fn get(&self, id: u64) -> Option<ExplorerHandle> {
        self.explorers.get(&id).await
    }

    pub async fn remove(&self, id: u64) -> bool {
        self.explorers.remove(&id).await.is_some()
    }
}
