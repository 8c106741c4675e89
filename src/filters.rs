use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{TrainingSession, TrainingType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter `{0}`")]
    UnknownField(String),
    #[error("Invalid value `{value}` for filter `{field}`")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Type,
    Direction,
    Coach,
    Location,
    Level,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Type,
        FilterField::Direction,
        FilterField::Coach,
        FilterField::Location,
        FilterField::Level,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Type => "type",
            FilterField::Direction => "direction",
            FilterField::Coach => "coach",
            FilterField::Location => "location",
            FilterField::Level => "level",
        }
    }
}

impl FromStr for FilterField {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| FilterError::UnknownField(s.to_string()))
    }
}

/// Equality constraints over the schedule. Unset fields match everything,
/// set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Filters {
    #[serde(rename = "type")]
    pub kind: Option<TrainingType>,
    pub direction: Option<u64>,
    pub coach: Option<u64>,
    pub location: Option<u64>,
    pub level: Option<String>,
}

impl Filters {
    pub fn matches(&self, session: &TrainingSession) -> bool {
        if self.kind.is_some_and(|kind| kind != session.kind) {
            return false;
        }
        if let Some(id) = self.direction
            && session.direction.as_ref().map(|d| d.id) != Some(id)
        {
            return false;
        }
        if let Some(id) = self.coach
            && session.coach.as_ref().map(|c| c.id) != Some(id)
        {
            return false;
        }
        if let Some(id) = self.location
            && session.location.as_ref().map(|l| l.id) != Some(id)
        {
            return false;
        }
        if let Some(tag) = &self.level
            && !session.has_level(tag)
        {
            return false;
        }
        true
    }

    pub fn is_active(&self) -> bool {
        *self != Filters::default()
    }

    /// Replaces one field. An empty (or blank) value clears it.
    pub fn set(&mut self, field: FilterField, raw: &str) -> Result<(), FilterError> {
        let value = raw.trim();
        if value.is_empty() {
            self.clear(field);
            return Ok(());
        }
        let invalid = || FilterError::InvalidValue {
            field: field.as_str(),
            value: value.to_string(),
        };
        match field {
            FilterField::Type => self.kind = Some(value.parse().map_err(|_| invalid())?),
            FilterField::Direction => self.direction = Some(value.parse().map_err(|_| invalid())?),
            FilterField::Coach => self.coach = Some(value.parse().map_err(|_| invalid())?),
            FilterField::Location => self.location = Some(value.parse().map_err(|_| invalid())?),
            FilterField::Level => self.level = Some(value.to_string()),
        }
        Ok(())
    }

    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::Type => self.kind = None,
            FilterField::Direction => self.direction = None,
            FilterField::Coach => self.coach = None,
            FilterField::Location => self.location = None,
            FilterField::Level => self.level = None,
        }
    }

    /// Applies every recognised `field=value` pair, skipping keys that are not
    /// filter names.
    pub fn apply_params<'a, I>(&mut self, params: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in params {
            if let Ok(field) = key.parse::<FilterField>() {
                self.set(field, value)?;
            }
        }
        Ok(())
    }
}
