//! Display-ready shapes of the explorer state.
//!
//! Everything here is derived from [`ScheduleView`] and [`WeekDataStore`];
//! nothing is cached.

use chrono::{Datelike, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::filters::Filters;
use crate::models::{TrainingSession, TrainingType};
use crate::store::WeekDataStore;
use crate::view::{DayBucket, ScheduleView};

const LONG_WORD_LIMIT: usize = 12;
const DEFAULT_TITLE: &str = "Тренировка";
const COACH_PLACEHOLDER: &str = "Тренер уточняется";
const LOCATION_PLACEHOLDER: &str = "Локация уточняется";

static RUSSIAN_CONSONANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[бвгджзйклмнпрстфхцчшщ]$").expect("regex compiles"));

const WEEKDAYS: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "вс"];
const MONTHS: [&str; 12] = [
    "янв.", "февр.", "мар.", "апр.", "мая", "июн.", "июл.", "авг.", "сент.", "окт.", "нояб.",
    "дек.",
];

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `5 окт.`
pub fn format_day_label(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS[date.month0() as usize])
}

pub fn format_weekday(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// Cuts every word longer than the limit right after its last consonant
/// within the limit and marks the cut with a dot.
pub fn shorten_long_words(title: Option<&str>) -> String {
    let source = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    source
        .split_whitespace()
        .map(|word| {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() <= LONG_WORD_LIMIT {
                return word.to_string();
            }
            let mut cutoff = LONG_WORD_LIMIT;
            while cutoff > 1 && !is_consonant(chars[cutoff - 1]) {
                cutoff -= 1;
            }
            let head: String = chars[..cutoff].iter().collect();
            format!("{head}.")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_consonant(c: char) -> bool {
    let mut buf = [0u8; 4];
    RUSSIAN_CONSONANT.is_match(c.encode_utf8(&mut buf))
}

/// What the "book now" action hands to the lead form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeadHandoff {
    #[schema(value_type = String)]
    pub source: &'static str,
    pub preferred_direction: String,
    pub date: String,
    pub time: String,
    pub message: String,
}

impl LeadHandoff {
    pub fn for_session(session: &TrainingSession) -> Self {
        let preferred_direction = session
            .direction
            .as_ref()
            .map(|d| d.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let date = format_day_label(session.date);
        let time = format_time(session.start_time);
        let message = format!("Хочу записаться на занятие {date} в {time}");
        Self {
            source: "schedule",
            preferred_direction,
            date,
            time,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionCard {
    pub id: u64,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TrainingType,
    #[schema(value_type = String)]
    pub type_label: &'static str,
    pub coach: String,
    pub location: String,
    pub levels: Vec<String>,
    pub spots_total: Option<u32>,
    pub spots_available: Option<u32>,
    pub is_open: bool,
    pub duration_minutes: Option<i64>,
    pub color: Option<String>,
    pub registration_link: Option<String>,
    pub lead: LeadHandoff,
}

impl SessionCard {
    pub fn new(session: &TrainingSession) -> Self {
        let title = session
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(session.direction.as_ref().map(|d| d.title.as_str()));
        Self {
            id: session.id,
            date: session.date,
            start_time: format_time(session.start_time),
            end_time: session.end_time.map(format_time),
            title: shorten_long_words(title),
            kind: session.kind,
            type_label: session.kind.label(),
            coach: session
                .coach
                .as_ref()
                .map(|c| c.full_name.clone())
                .unwrap_or_else(|| COACH_PLACEHOLDER.to_string()),
            location: session
                .location
                .as_ref()
                .map(|l| l.title.clone())
                .unwrap_or_else(|| LOCATION_PLACEHOLDER.to_string()),
            levels: session.levels.iter().map(|l| l.name.clone()).collect(),
            spots_total: session.spots_total,
            spots_available: session.spots_left(),
            is_open: session.is_open(),
            duration_minutes: session.duration_minutes(),
            color: session.color.clone(),
            registration_link: session
                .registration_link
                .clone()
                .filter(|link| !link.is_empty()),
            lead: LeadHandoff::for_session(session),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayCard {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub weekday: &'static str,
    pub label: String,
    pub sessions: Vec<SessionCard>,
}

impl From<DayBucket<'_>> for DayCard {
    fn from(bucket: DayBucket<'_>) -> Self {
        Self {
            date: bucket.date,
            weekday: format_weekday(bucket.date),
            label: format_day_label(bucket.date),
            sessions: bucket.sessions.into_iter().map(SessionCard::new).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TypeOption {
    pub value: TrainingType,
    #[schema(value_type = String)]
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeekSchedule {
    #[schema(value_type = String, format = Date)]
    pub week_start: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub week_end: NaiveDate,
    pub filters: Filters,
    pub has_active_filters: bool,
    pub auto_adjusted: bool,
    pub available_types: Vec<TypeOption>,
    pub total_sessions: usize,
    pub visible_sessions: usize,
    pub days: Vec<DayCard>,
}

impl WeekSchedule {
    pub fn render(view: &ScheduleView, store: &WeekDataStore) -> Self {
        let window = view.window();
        let days: Vec<DayCard> = view.days(store).into_iter().map(DayCard::from).collect();
        Self {
            week_start: window.start(),
            week_end: window.end(),
            filters: view.filters().clone(),
            has_active_filters: view.filters().is_active(),
            auto_adjusted: view.auto_adjusted(),
            available_types: store
                .available_types()
                .into_iter()
                .map(|kind| TypeOption {
                    value: kind,
                    label: kind.label(),
                })
                .collect(),
            total_sessions: store.len(),
            visible_sessions: days.iter().map(|day| day.sessions.len()).sum(),
            days,
        }
    }
}
