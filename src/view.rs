use std::collections::BTreeSet;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

use crate::filters::{FilterError, FilterField, Filters};
use crate::models::TrainingSession;
use crate::store::WeekDataStore;
use crate::week::WeekWindow;

/// Sessions of one calendar day, ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket<'a> {
    pub date: NaiveDate,
    pub sessions: Vec<&'a TrainingSession>,
}

/// Navigation and filtering state of one schedule explorer.
///
/// The view never owns sessions. Every method that needs data borrows the
/// store, so the rendered week is always a function of `(anchor, filters,
/// store)`. Methods that may need more data return the window to fetch; the
/// caller performs the fetch and hands the result back through
/// [`ScheduleView::complete_fetch`].
#[derive(Debug, Clone)]
pub struct ScheduleView {
    anchor: WeekWindow,
    filters: Filters,
    auto_adjust_armed: bool,
    auto_adjusted: bool,
    pending: BTreeSet<WeekWindow>,
}

impl ScheduleView {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor: WeekWindow::containing(anchor),
            filters: Filters::default(),
            auto_adjust_armed: true,
            auto_adjusted: false,
            pending: BTreeSet::new(),
        }
    }

    pub fn starting_this_week(tz: Tz) -> Self {
        Self::new(WeekWindow::current(tz).start())
    }

    pub fn window(&self) -> WeekWindow {
        self.anchor
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn auto_adjusted(&self) -> bool {
        self.auto_adjusted
    }

    pub fn is_pending(&self, window: &WeekWindow) -> bool {
        self.pending.contains(window)
    }

    /// Turns off the one-time jump to the first known week, for views opened
    /// on a week the user picked.
    pub fn disable_auto_adjust(&mut self) {
        self.auto_adjust_armed = false;
    }

    /// Sessions of the current week that pass every active filter.
    pub fn visible<'a>(&self, store: &'a WeekDataStore) -> Vec<&'a TrainingSession> {
        store
            .in_window(&self.anchor)
            .filter(|session| self.filters.matches(session))
            .collect()
    }

    /// Re-evaluates the view against the store and returns the window to fetch
    /// if the week it was showing is neither covered, fetched, nor already
    /// being fetched.
    ///
    /// The first evaluation (unless the user navigated before it) may jump to
    /// the week of the earliest known session when nothing is visible. The
    /// fetch decision is still made for the week shown before the jump; the
    /// week jumped to always holds that earliest session. Later evaluations
    /// never move the anchor.
    pub fn refresh(&mut self, store: &WeekDataStore) -> Option<WeekWindow> {
        let window = self.anchor;
        let armed = std::mem::replace(&mut self.auto_adjust_armed, false);
        if armed
            && self.visible(store).is_empty()
            && let Some(first) = store.earliest()
        {
            let target = WeekWindow::containing(first.date);
            debug!(
                from = %self.anchor.start(),
                to = %target.start(),
                first_session = %first.date,
                "auto-adjust week start"
            );
            self.anchor = target;
            self.auto_adjusted = true;
        }

        if store.has_coverage(&window) {
            debug!(week_start = %window.start(), week_end = %window.end(), "skip fetch, week already cached");
            return None;
        }
        if store.was_fetched(&window) || self.pending.contains(&window) {
            return None;
        }

        debug!(start = %window.start(), end = %window.end(), "fetch week requested");
        self.pending.insert(window);
        Some(window)
    }

    /// Applies the result of a fetch for `window`, which may arrive after the
    /// view has moved elsewhere.
    pub fn complete_fetch(
        &mut self,
        store: &mut WeekDataStore,
        window: WeekWindow,
        sessions: Vec<TrainingSession>,
    ) -> Option<WeekWindow> {
        self.pending.remove(&window);
        store.mark_fetched(&window);
        if sessions.is_empty() {
            debug!(start = %window.start(), end = %window.end(), "fetch week returned empty");
        } else {
            let added = sessions.len();
            let stats = store.merge(sessions);
            debug!(
                added,
                inserted = stats.inserted,
                replaced = stats.replaced,
                total = store.len(),
                start = %window.start(),
                "merged new sessions"
            );
        }
        self.refresh(store)
    }

    pub fn go_to_week(&mut self, date: NaiveDate, store: &WeekDataStore) -> Option<WeekWindow> {
        self.auto_adjust_armed = false;
        self.anchor = WeekWindow::containing(date);
        debug!(
            week_start = %self.anchor.start(),
            visible = self.visible(store).len(),
            total = store.len(),
            "week start updated"
        );
        self.refresh(store)
    }

    pub fn go_to_previous_week(&mut self, store: &WeekDataStore) -> Option<WeekWindow> {
        self.go_to_week(self.anchor.previous().start(), store)
    }

    pub fn go_to_next_week(&mut self, store: &WeekDataStore) -> Option<WeekWindow> {
        self.go_to_week(self.anchor.next().start(), store)
    }

    /// Filters narrow already-fetched data, so they never trigger a fetch.
    pub fn set_filter(&mut self, field: FilterField, raw: &str) -> Result<(), FilterError> {
        self.filters.set(field, raw)
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
    }

    /// Seven buckets for the current week, empty days included.
    pub fn days<'a>(&self, store: &'a WeekDataStore) -> Vec<DayBucket<'a>> {
        let visible = self.visible(store);
        self.anchor
            .days()
            .map(|date| {
                let mut sessions: Vec<&TrainingSession> =
                    visible.iter().copied().filter(|s| s.date == date).collect();
                sessions.sort_by_key(|s| s.start_time);
                DayBucket { date, sessions }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{date, session};

    fn non_empty_days(view: &ScheduleView, store: &WeekDataStore) -> usize {
        view.days(store)
            .iter()
            .filter(|day| !day.sessions.is_empty())
            .count()
    }

    #[test]
    fn test_first_fetch_then_no_refetch() {
        let mut store = WeekDataStore::new();
        let mut view = ScheduleView::new(date("2026-10-19"));

        let request = view.refresh(&store);
        let week = WeekWindow::containing(date("2026-10-19"));
        assert_eq!(request, Some(week));
        assert!(view.is_pending(&week));
        assert_eq!(view.refresh(&store), None, "outstanding fetch is not repeated");

        let follow_up = view.complete_fetch(
            &mut store,
            week,
            vec![
                session(1, "2026-10-19", "07:00"),
                session(2, "2026-10-21", "18:00"),
                session(3, "2026-10-24", "10:00"),
            ],
        );
        assert_eq!(follow_up, None);
        assert_eq!(view.refresh(&store), None);

        let days = view.days(&store);
        assert_eq!(days.len(), 7);
        assert_eq!(non_empty_days(&view, &store), 3);
        assert!(!view.auto_adjusted());
    }

    #[test]
    fn test_empty_next_week_keeps_previous_sessions() {
        let mut store = WeekDataStore::with_sessions([
            session(1, "2026-10-19", "07:00"),
            session(2, "2026-10-20", "07:00"),
        ]);
        let mut view = ScheduleView::new(date("2026-10-19"));
        assert_eq!(view.refresh(&store), None);

        let next = view.go_to_next_week(&store).expect("next week is fetched");
        assert_eq!(next.start(), date("2026-10-26"));
        assert_eq!(view.complete_fetch(&mut store, next, Vec::new()), None);

        assert!(view.days(&store).iter().all(|day| day.sessions.is_empty()));
        assert_eq!(store.len(), 2);
        assert_eq!(view.refresh(&store), None, "empty week is not fetched again");
    }

    #[test]
    fn test_auto_adjust_happens_once() {
        let mut store = WeekDataStore::with_sessions([
            session(1, "2026-11-10", "07:00"),
            session(2, "2026-11-12", "07:00"),
        ]);
        let mut view = ScheduleView::new(date("2026-10-19"));

        let request = view.refresh(&store);
        let opening_week = WeekWindow::containing(date("2026-10-19"));
        assert_eq!(request, Some(opening_week), "opening week is still fetched");
        assert!(view.auto_adjusted());
        assert_eq!(view.window().start(), date("2026-11-09"));
        assert_eq!(non_empty_days(&view, &store), 2);

        let follow_up = view.complete_fetch(
            &mut store,
            opening_week,
            vec![session(3, "2026-10-19", "08:00")],
        );
        assert_eq!(follow_up, None);
        assert_eq!(store.len(), 3);
        assert_eq!(
            view.window().start(),
            date("2026-11-09"),
            "completion does not move the anchor"
        );

        let request = view.go_to_next_week(&store);
        assert_eq!(request.map(|w| w.start()), Some(date("2026-11-16")));
        assert_eq!(view.window().start(), date("2026-11-16"), "no second jump");
    }

    #[test]
    fn test_no_auto_adjust_on_empty_store() {
        let mut view = ScheduleView::new(date("2026-10-21"));
        let store = WeekDataStore::new();
        view.refresh(&store);
        assert!(!view.auto_adjusted());
        assert_eq!(view.window().start(), date("2026-10-19"));
    }

    #[test]
    fn test_no_auto_adjust_after_first_render() {
        let store = WeekDataStore::with_sessions([session(1, "2026-10-19", "07:00")]);
        let mut view = ScheduleView::new(date("2026-10-19"));
        view.refresh(&store);
        view.set_filter(FilterField::Coach, "77").unwrap();
        view.refresh(&store);
        assert!(!view.auto_adjusted());
        assert_eq!(view.window().start(), date("2026-10-19"));
    }

    #[test]
    fn test_disabled_auto_adjust_stays_put() {
        let store = WeekDataStore::with_sessions([session(1, "2026-11-10", "07:00")]);
        let mut view = ScheduleView::new(date("2026-10-19"));
        view.disable_auto_adjust();
        let request = view.refresh(&store);
        assert_eq!(request.map(|w| w.start()), Some(date("2026-10-19")));
    }

    #[test]
    fn test_navigation_keeps_filters() {
        let store = WeekDataStore::with_sessions([session(1, "2026-10-19", "07:00")]);
        let mut view = ScheduleView::new(date("2026-10-19"));
        view.set_filter(FilterField::Direction, "1").unwrap();
        view.go_to_previous_week(&store);
        view.go_to_next_week(&store);
        assert_eq!(view.filters().direction, Some(1));
        assert_eq!(view.visible(&store).len(), 1);
    }

    #[test]
    fn test_filters_narrow_without_fetching() {
        let store = WeekDataStore::with_sessions([
            session(1, "2026-10-19", "07:00"),
            session(2, "2026-10-20", "07:00"),
        ]);
        let mut view = ScheduleView::new(date("2026-10-19"));
        view.refresh(&store);
        view.set_filter(FilterField::Direction, "42").unwrap();
        assert!(view.visible(&store).is_empty());
        assert_eq!(view.window().start(), date("2026-10-19"));
        view.reset_filters();
        assert_eq!(view.visible(&store).len(), 2);
    }

    #[test]
    fn test_late_completion_for_other_week_is_merged() {
        let mut store = WeekDataStore::new();
        let mut view = ScheduleView::new(date("2026-10-19"));
        let first = view.refresh(&store).unwrap();
        let second = view.go_to_next_week(&store).unwrap();

        view.complete_fetch(&mut store, second, vec![session(2, "2026-10-27", "09:00")]);
        view.complete_fetch(&mut store, first, vec![session(1, "2026-10-20", "09:00")]);

        assert_eq!(store.len(), 2);
        assert_eq!(view.window(), second);
        assert_eq!(view.visible(&store).len(), 1);
    }

    #[test]
    fn test_day_buckets_sorted_by_start_time() {
        let store = WeekDataStore::with_sessions([
            session(3, "2026-10-20", "19:00"),
            session(1, "2026-10-20", "07:00"),
            session(2, "2026-10-20", "12:00"),
        ]);
        let view = ScheduleView::new(date("2026-10-19"));
        let days = view.days(&store);
        let tuesday: Vec<u64> = days[1].sessions.iter().map(|s| s.id).collect();
        assert_eq!(tuesday, vec![1, 2, 3]);
        assert_eq!(days[1].date, date("2026-10-20"));
    }
}
