//! Conversational queries over the cached schedule.
//!
//! Each function answers one kind of question and updates the
//! conversational fields of the state (watermark, current category,
//! pending follow-up).  Phrasing is left to the front-end.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use bc_domain::day::start_of_day;
use bc_domain::trace::TraceEvent;
use bc_domain::{CachedState, Category, CollectionEvent, RelativeDay};

use crate::selector::next_event;

/// A collection reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub event: CollectionEvent,
    /// The category the question was about (or the event's first one).
    pub category: Category,
    pub relative: RelativeDay,
    pub colours: String,
    /// The collection is today; the user is being asked whether they
    /// missed it.
    pub follow_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "answer", rename_all = "snake_case")]
pub enum Answer {
    Collection(Report),
    /// Nothing qualifying in the cached schedule yet.
    NotKnownYet,
    /// "Yes"/"no" when no question was asked.
    NoQuestion,
    Goodbye,
    /// A forced refresh completed with this many upcoming collections.
    Refreshed { events: usize },
}

/// Answers questions relative to `now` in the household's zone.
#[derive(Debug, Clone, Copy)]
pub struct Dialogue {
    now: DateTime<Utc>,
    tz: Tz,
}

impl Dialogue {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }

    /// "Which bin is it today?"  The next collection of any kind.
    pub fn next_collection(&self, state: &mut CachedState) -> Answer {
        state.reset_watermark();
        let answer = self.report(state, None, false);
        state.missed_question = false;
        answer
    }

    /// "When is the blue bin?"  Starts a new line of questioning about
    /// one category; asks a follow-up if it is today.
    pub fn next_of_category(&self, state: &mut CachedState, category: Category) -> Answer {
        state.reset_watermark();
        state.current_category = Some(category);
        self.report(state, Some(category), true)
    }

    /// "I missed it": the one after the last reported, same category.
    pub fn missed(&self, state: &mut CachedState) -> Answer {
        let answer = match state.current_category {
            Some(category) => self.report(state, Some(category), false),
            // Nothing was reported yet, so there is nothing to follow on from.
            None => Answer::NotKnownYet,
        };
        state.missed_question = false;
        state.mark_dirty();
        answer
    }

    pub fn yes(&self, state: &mut CachedState) -> Answer {
        if state.missed_question {
            self.missed(state)
        } else {
            Answer::NoQuestion
        }
    }

    pub fn no(&self, state: &mut CachedState) -> Answer {
        if state.missed_question {
            state.missed_question = false;
            state.mark_dirty();
            Answer::Goodbye
        } else {
            Answer::NoQuestion
        }
    }

    fn report(&self, state: &mut CachedState, filter: Option<Category>, ask_if_today: bool) -> Answer {
        let midnight = start_of_day(self.now, self.tz);
        let Some(event) = next_event(state, filter, midnight).cloned() else {
            return Answer::NotKnownYet;
        };

        let category = filter.unwrap_or_else(|| event.primary_category());
        let relative = event.relative_to(self.now, self.tz);
        let follow_up = ask_if_today && relative == RelativeDay::Today;

        state.mark_reported(&event, category);
        state.missed_question = follow_up;

        TraceEvent::CollectionReported {
            category: category.to_string(),
            date: event.instant().to_rfc3339(),
            follow_up,
        }
        .emit();

        Answer::Collection(Report {
            colours: event.colours_label(),
            event,
            category,
            relative,
            follow_up,
        })
    }
}
