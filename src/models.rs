use crate::date_key::DateKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tracked habit. `logs` is sparse: a missing key means "not completed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub logs: BTreeMap<DateKey, bool>,
}

impl Habit {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            logs: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self, key: &DateKey) -> bool {
        self.logs.get(key).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub habit_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TitleRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest<'a> {
    pub name: &'a str,
    pub habit_titles: &'a [String],
}

/// The signed-in user as returned by `GET /users/me`. Fields the client does
/// not use are kept in `extra` so a profile update sends them back intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// The name to greet the user with: their own name when set, otherwise
    /// the username.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Completion figures for one day across the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u8,
}

impl DaySummary {
    pub fn of(habits: &[Habit], key: &DateKey) -> Self {
        let total = habits.len();
        let completed = habits.iter().filter(|habit| habit.is_completed(key)).count();
        let completion_rate = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            completed,
            completion_rate,
        }
    }
}
