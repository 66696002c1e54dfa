use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::app::events::{ChangeEvent, EventBus};
use crate::app::lock;
use crate::model::task::{DayTask, Priority};

/// The displayed month's days, shared between the calendar controller and
/// the override engine's timer threads. Cloning shares the same days.
#[derive(Debug, Clone)]
pub struct DayBoard {
    days: Arc<Mutex<Vec<DayTask>>>,
    events: Arc<EventBus>,
}

impl DayBoard {
    pub fn new(events: Arc<EventBus>) -> Self {
        DayBoard {
            days: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Copy of the current days, in date order
    pub fn snapshot(&self) -> Vec<DayTask> {
        lock(&self.days).clone()
    }

    pub fn replace(&self, days: Vec<DayTask>) {
        *lock(&self.days) = days;
    }

    pub fn get(&self, date: NaiveDate) -> Option<DayTask> {
        lock(&self.days).iter().find(|d| d.date == date).cloned()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        lock(&self.days).iter().any(|d| d.date == date)
    }

    pub fn priority(&self, date: NaiveDate) -> Option<Priority> {
        lock(&self.days)
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.priority)
    }

    /// Set a day's priority and publish the change. Returns false for an
    /// unknown date.
    pub fn set_priority(&self, date: NaiveDate, priority: Priority) -> bool {
        {
            let mut days = lock(&self.days);
            let Some(day) = days.iter_mut().find(|d| d.date == date) else {
                return false;
            };
            day.priority = priority;
        }
        self.events
            .publish(ChangeEvent::PriorityChanged { date, priority });
        true
    }

    /// Edit a day's text in place and publish `DayEdited`. Returns false for
    /// an unknown date.
    pub fn edit(&self, date: NaiveDate, f: impl FnOnce(&mut DayTask)) -> bool {
        {
            let mut days = lock(&self.days);
            let Some(day) = days.iter_mut().find(|d| d.date == date) else {
                return false;
            };
            f(day);
        }
        self.events.publish(ChangeEvent::DayEdited { date });
        true
    }
}
