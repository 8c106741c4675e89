use chrono::{Datelike, NaiveDate};

use crate::error::ApiError;
use crate::week::WeekWindow;

pub fn validate_weeks(value: u8) -> Result<u8, ApiError> {
    if (1..=6).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest("weeks must be between 1 and 6".into()))
    }
}

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

/// Any day of the wanted week, as `YYYY-MM-DD`, between years 1900 and 9999.
pub fn parse_week(value: &str) -> Result<WeekWindow, ApiError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("week must be a YYYY-MM-DD date, got `{value}`")))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(ApiError::BadRequest(format!(
            "week must fall between years {MIN_YEAR} and {MAX_YEAR}, got `{value}`"
        )));
    }
    Ok(WeekWindow::containing(date))
}
