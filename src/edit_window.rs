use crate::date_key::{Clock, DateKey};
use crate::errors::HabitError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditWindow {
    Past,
    Current,
    Future,
}

pub fn classify_at(key: &DateKey, today: &DateKey) -> EditWindow {
    match key.compare(today) {
        Ordering::Less => EditWindow::Past,
        Ordering::Equal => EditWindow::Current,
        Ordering::Greater => EditWindow::Future,
    }
}

/// Completion may only be written for the current local day. "Today" is read
/// from the clock on every decision, so a session left open past midnight
/// sees the new day immediately.
#[derive(Clone)]
pub struct EditWindowPolicy {
    clock: Arc<dyn Clock>,
}

impl EditWindowPolicy {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn classify(&self, key: &DateKey) -> EditWindow {
        classify_at(key, &self.clock.today())
    }

    pub fn can_mutate(&self, key: &DateKey) -> bool {
        self.classify(key) == EditWindow::Current
    }

    pub fn ensure_mutable(&self, key: &DateKey) -> Result<(), HabitError> {
        match self.classify(key) {
            EditWindow::Current => Ok(()),
            window => Err(HabitError::WindowViolation {
                key: key.clone(),
                window,
            }),
        }
    }
}
