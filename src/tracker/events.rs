use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::{db::SleepNight, log_error};

const ENABLE_LOGS: bool = true;

/// One-shot signals from the tracker screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "payload")]
pub enum TrackerEvent {
    /// A night was just stopped; ask the user to rate it.
    NavigateToSleepQuality(SleepNight),
    /// History was cleared.
    ShowSnackbar,
    /// A history row was picked.
    NavigateToSleepDetail(i64),
}

/// One-shot signals from the rating screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum QualityEvent {
    NavigateToSleepTracker,
}

/// Outbound queue: every pushed event is handed out exactly once.
pub struct EventQueue<E> {
    sender: mpsc::UnboundedSender<E>,
    receiver: Mutex<mpsc::UnboundedReceiver<E>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn push(&self, event: E) {
        if self.sender.send(event).is_err() {
            log_error!("Event receiver dropped before delivery");
        }
    }

    /// Waits for the next event.
    pub async fn next(&self) -> Option<E> {
        self.receiver.lock().await.recv().await
    }

    /// Takes every event queued so far without waiting.
    pub async fn drain(&self) -> Vec<E> {
        let mut receiver = self.receiver.lock().await;
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
