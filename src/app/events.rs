use std::sync::Mutex;
use std::sync::mpsc;

use chrono::NaiveDate;

use crate::app::lock;
use crate::model::task::Priority;

/// Change notifications published by the controllers and the override engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A day's priority changed, directly or through an override
    PriorityChanged { date: NaiveDate, priority: Priority },
    /// A day's plan or done text changed
    DayEdited { date: NaiveDate },
    /// A new month was generated and loaded
    MonthLoaded { year: i32, month: u32 },
    /// Quarterly and yearly reports were recomputed
    ReportsUpdated,
}

/// Fan-out of change events to any number of subscribers.
///
/// Publishing never blocks; subscribers whose receiver was dropped are
/// pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    pub fn publish(&self, event: ChangeEvent) {
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

/// Drain every event currently queued on a receiver.
pub fn drain(rx: &mpsc::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    while let Ok(evt) = rx.try_recv() {
        events.push(evt);
    }
    events
}
