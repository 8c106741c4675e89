use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use crate::models::{SessionKey, TrainingSession, TrainingType};
use crate::week::WeekWindow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub replaced: usize,
}

/// Deduplicated collection of sessions accumulated from several fetches.
///
/// Sessions are keyed by [`SessionKey`], whose ordering puts `(date,
/// start_time)` first, so iteration is always sorted regardless of the order
/// batches were merged in.
#[derive(Debug, Clone, Default)]
pub struct WeekDataStore {
    sessions: BTreeMap<SessionKey, TrainingSession>,
    fetched: BTreeSet<NaiveDate>,
}

impl WeekDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(seed: impl IntoIterator<Item = TrainingSession>) -> Self {
        let mut store = Self::new();
        store.merge(seed);
        store
    }

    /// Inserts new occurrences and replaces known ones; the incoming snapshot
    /// wins on key collision.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = TrainingSession>) -> MergeStats {
        let mut stats = MergeStats::default();
        for session in incoming {
            match self.sessions.insert(session.key(), session) {
                Some(_) => stats.replaced += 1,
                None => stats.inserted += 1,
            }
        }
        stats
    }

    /// True when at least one known session falls inside `window`. A week with
    /// no sessions on the server looks the same as a week never fetched.
    pub fn has_coverage(&self, window: &WeekWindow) -> bool {
        self.in_window(window).next().is_some()
    }

    pub fn mark_fetched(&mut self, window: &WeekWindow) {
        self.fetched.insert(window.start());
    }

    pub fn was_fetched(&self, window: &WeekWindow) -> bool {
        self.fetched.contains(&window.start())
    }

    /// Covered, or already fetched (possibly empty).
    pub fn is_settled(&self, window: &WeekWindow) -> bool {
        self.has_coverage(window) || self.was_fetched(window)
    }

    pub fn in_window(&self, window: &WeekWindow) -> impl Iterator<Item = &TrainingSession> {
        let from = SessionKey::first_on(window.start());
        let until = SessionKey::first_on(window.end() + Duration::days(1));
        self.sessions.range(from..until).map(|(_, session)| session)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingSession> {
        self.sessions.values()
    }

    /// Full snapshot sorted by `(date, start_time)`.
    pub fn all(&self) -> Vec<TrainingSession> {
        self.iter().cloned().collect()
    }

    pub fn earliest(&self) -> Option<&TrainingSession> {
        self.sessions.values().next()
    }

    pub fn available_types(&self) -> BTreeSet<TrainingType> {
        self.iter().map(|session| session.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
