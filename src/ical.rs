use chrono::{Duration, NaiveDateTime};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

use crate::cards::shorten_long_words;
use crate::models::TrainingSession;

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
    timezone: Tz,
}

impl ICalExporter {
    pub fn new(calendar_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            calendar_name: calendar_name.into(),
            timezone,
        }
    }

    /// Session times are the club's wall clock, so they carry its TZID.
    fn local(&self, date_time: NaiveDateTime) -> CalendarDateTime {
        CalendarDateTime::WithTimezone {
            date_time,
            tzid: self.timezone.name().to_string(),
        }
    }

    pub fn generate<'a>(&self, sessions: impl IntoIterator<Item = &'a TrainingSession>) -> Vec<u8> {
        let mut calendar = Calendar::new();
        calendar.name(&self.calendar_name);

        let mut events = 0;
        for session in sessions {
            let start = NaiveDateTime::new(session.date, session.start_time);
            let end = match session.end_time {
                Some(end_time) if end_time > session.start_time => {
                    NaiveDateTime::new(session.date, end_time)
                }
                _ => start + Duration::hours(1),
            };
            let title = session
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .or(session.direction.as_ref().map(|d| d.title.as_str()));

            let mut event = Event::new();
            event.summary(&format!(
                "{}: {}",
                self.calendar_name,
                shorten_long_words(title)
            ));
            event.starts(self.local(start));
            event.ends(self.local(end));
            if let Some(location) = &session.location {
                event.location(&location.title);
            }
            let coach = session
                .coach
                .as_ref()
                .map(|c| c.full_name.as_str())
                .unwrap_or("-");
            event.description(&format!(
                "{}\nCoach: {}",
                session.kind.label(),
                coach
            ));
            event.uid(&format!(
                "{}-{}-{}-gabi-schedule",
                session.id,
                session.date.format("%Y%m%d"),
                session.start_time.format("%H%M%S")
            ));
            calendar.push(event);
            events += 1;
        }

        if events == 0 {
            return Vec::new();
        }
        calendar.to_string().into_bytes()
    }
}
