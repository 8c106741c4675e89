use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Session format as reported by the content API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    Group,
    MiniGroup,
    Open,
    Personal,
}

impl TrainingType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingType::Group => "group",
            TrainingType::MiniGroup => "mini_group",
            TrainingType::Open => "open",
            TrainingType::Personal => "personal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrainingType::Group => "Групповая",
            TrainingType::MiniGroup => "Мини-группа",
            TrainingType::Open => "Открытая",
            TrainingType::Personal => "Индивидуальная",
        }
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(TrainingType::Group),
            "mini_group" => Ok(TrainingType::MiniGroup),
            "open" => Ok(TrainingType::Open),
            "personal" => Ok(TrainingType::Personal),
            other => Err(format!("unknown training type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Direction {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Coach {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LevelTag {
    pub id: u64,
    pub tag: String,
    pub name: String,
}

/// A single scheduled class occurrence.
///
/// Sessions are only ever replaced wholesale by a newer snapshot of the same
/// occurrence, see [`SessionKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrainingSession {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[schema(value_type = String, format = Date, example = "2026-10-19")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "time_of_day::required")]
    #[schema(value_type = String, example = "07:00:00")]
    pub start_time: NaiveTime,
    #[serde(default, deserialize_with = "time_of_day::optional")]
    #[schema(value_type = Option<String>, example = "08:00:00")]
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub kind: TrainingType,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub coach: Option<Coach>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub levels: Vec<LevelTag>,
    #[serde(default)]
    pub spots_total: Option<u32>,
    #[serde(default)]
    pub spots_available: Option<u32>,
    #[serde(default)]
    pub intensity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub registration_link: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TrainingSession {
    pub fn key(&self) -> SessionKey {
        SessionKey {
            date: self.date,
            start_time: self.start_time,
            id: self.id,
            end_time: self.end_time,
        }
    }

    /// Free places, never above the declared total.
    pub fn spots_left(&self) -> Option<u32> {
        match (self.spots_available, self.spots_total) {
            (Some(available), Some(total)) => Some(available.min(total)),
            (available, _) => available,
        }
    }

    /// Unknown capacity counts as open.
    pub fn is_open(&self) -> bool {
        self.spots_left().is_none_or(|left| left > 0)
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        let end = self.end_time?;
        Some((end - self.start_time).num_minutes())
    }

    pub fn has_level(&self, tag: &str) -> bool {
        self.levels.iter().any(|level| level.tag == tag)
    }
}

/// Identity of a session occurrence.
///
/// The content API reuses ids across recurring templates, so the date and
/// times are part of the identity. Field order makes the derived `Ord` sort by
/// `(date, start_time)` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub id: u64,
    pub end_time: Option<NaiveTime>,
}

impl SessionKey {
    /// Smallest possible key on `date`.
    pub fn first_on(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: NaiveTime::MIN,
            id: 0,
            end_time: None,
        }
    }
}

/// Filter vocabulary served by `/trainings/meta/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrainingMeta {
    #[serde(default)]
    pub directions: Vec<Direction>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub levels: Vec<LevelTag>,
    #[serde(default)]
    pub coaches: Vec<Coach>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The API sends `HH:MM:SS`, hand-written fixtures often use `HH:MM`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, de::Error};

    fn parse<E: Error>(raw: &str) -> Result<NaiveTime, E> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|err| E::custom(format!("invalid time `{raw}`: {err}")))
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(raw.trim())
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse(raw.trim()).map(Some),
            _ => Ok(None),
        }
    }
}
