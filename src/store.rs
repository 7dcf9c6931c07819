//! The in-memory habit collection and every operation that may change it.
//!
//! Nothing else writes habits or their logs. Each write goes through
//! [`OptimisticController`]; a remote failure undoes that write and only that
//! write, so changes confirmed in the meantime survive.

use crate::api::HabitApi;
use crate::date_key::{Clock, DateKey};
use crate::edit_window::EditWindowPolicy;
use crate::errors::HabitError;
use crate::events::{Event, EventBus, HabitsEvent, ProfileEvent, Theme, ThemeEvent};
use crate::models::{DaySummary, Habit, HabitTemplate, UserProfile};
use crate::optimistic::{Mutation, MutationKey, OptimisticController};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub struct HabitStore<A> {
    api: A,
    policy: EditWindowPolicy,
    controller: OptimisticController<Vec<Habit>>,
    events: EventBus,
    theme: watch::Sender<Theme>,
}

impl<A: HabitApi> HabitStore<A> {
    pub fn new(api: A, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            policy: EditWindowPolicy::new(clock),
            controller: OptimisticController::new(Vec::new()),
            events: EventBus::new(),
            theme: watch::Sender::new(Theme::Light),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn policy(&self) -> &EditWindowPolicy {
        &self.policy
    }

    pub fn today(&self) -> DateKey {
        self.policy.today()
    }

    /// Habits in insertion order.
    pub fn list(&self) -> Vec<Habit> {
        self.controller.current()
    }

    pub fn get(&self, id: &str) -> Option<Habit> {
        self.controller
            .read(|habits| habits.iter().find(|habit| habit.id == id).cloned())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Habit>> {
        self.controller.subscribe()
    }

    pub fn is_completed(&self, id: &str, key: &DateKey) -> bool {
        self.controller.read(|habits| {
            habits
                .iter()
                .any(|habit| habit.id == id && habit.is_completed(key))
        })
    }

    pub fn summary(&self, key: &DateKey) -> DaySummary {
        self.controller.read(|habits| DaySummary::of(habits, key))
    }

    pub async fn refresh(&self) -> Result<usize, HabitError> {
        let habits = self.api.list_habits().await?;
        let count = habits.len();
        self.controller.replace(habits);
        info!(count, "habits loaded");
        self.events
            .publish(Event::Habits(HabitsEvent::Loaded { count }));
        Ok(count)
    }

    pub async fn create(&self, title: &str) -> Result<Habit, HabitError> {
        let title = validate_title(title)?;
        let mutation = CreateHabit {
            title: title.clone(),
        };
        let key = mutation.key();
        let result = self
            .controller
            .execute(mutation, self.api.create_habit(&title))
            .await;
        self.report(key, &result);
        result
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<Habit, HabitError> {
        let title = validate_title(title)?;
        let mutation = RenameHabit {
            id: id.to_string(),
            title: title.clone(),
        };
        let key = mutation.key();
        let result = self
            .controller
            .execute(mutation, self.api.rename_habit(id, &title))
            .await;
        self.report(key, &result);
        result
    }

    pub async fn delete(&self, id: &str) -> Result<(), HabitError> {
        let mutation = DeleteHabit { id: id.to_string() };
        let key = mutation.key();
        let result = self
            .controller
            .execute(mutation, self.api.delete_habit(id))
            .await;
        self.report(key, &result);
        result
    }

    /// Flips completion of `id` on `date` and returns the new value. Only the
    /// current local day is writable; anything else fails before any request
    /// is made.
    pub async fn toggle(&self, id: &str, date: &DateKey) -> Result<bool, HabitError> {
        self.policy.ensure_mutable(date)?;

        let mutation = ToggleCompletion {
            habit_id: id.to_string(),
            date: date.clone(),
        };
        let key = mutation.key();
        let result = self
            .controller
            .execute(mutation, self.api.toggle_habit(id, date))
            .await;
        self.report(key, &result);
        result.map(|()| self.is_completed(id, date))
    }

    pub async fn toggle_today(&self, id: &str) -> Result<bool, HabitError> {
        let today = self.today();
        self.toggle(id, &today).await
    }

    pub async fn templates(&self) -> Result<Vec<HabitTemplate>, HabitError> {
        self.api.list_templates().await
    }

    pub async fn create_template(
        &self,
        name: &str,
        habit_titles: &[String],
    ) -> Result<HabitTemplate, HabitError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HabitError::malformed("template name cannot be empty"));
        }
        let titles = habit_titles
            .iter()
            .map(|title| validate_title(title))
            .collect::<Result<Vec<_>, _>>()?;
        if titles.is_empty() {
            return Err(HabitError::malformed("a template needs at least one habit"));
        }
        self.api.create_template(name, &titles).await
    }

    pub async fn delete_template(&self, id: &str) -> Result<(), HabitError> {
        self.api.delete_template(id).await
    }

    /// Asks the service to add the template's habits and adopts the returned
    /// collection wholesale.
    pub async fn apply_template(&self, id: &str) -> Result<usize, HabitError> {
        let mutation = ReplaceCollection;
        let key = mutation.key();
        let result = self
            .controller
            .execute(mutation, self.api.apply_template(id))
            .await;
        self.report(key, &result);
        result.map(|habits| habits.len())
    }

    pub async fn analytics(&self) -> Result<serde_json::Value, HabitError> {
        self.api.analytics().await
    }

    pub async fn profile(&self) -> Result<UserProfile, HabitError> {
        self.api.profile().await
    }

    /// Saves the profile and announces the new display name on the
    /// `profile` topic.
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, HabitError> {
        if profile.username.trim().is_empty() {
            return Err(HabitError::malformed("username cannot be empty"));
        }
        let saved = self.api.update_profile(profile).await?;
        info!(username = %saved.username, "profile updated");
        self.events.publish(Event::Profile(ProfileEvent::Updated {
            display_name: saved.display_name().to_string(),
        }));
        Ok(saved)
    }

    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    /// Returns whether the theme changed. Only a change is published.
    pub fn set_theme(&self, theme: Theme) -> bool {
        let changed = self.theme.send_if_modified(|current| {
            let changed = *current != theme;
            *current = theme;
            changed
        });
        if changed {
            self.events.publish(Event::Theme(ThemeEvent::Changed(theme)));
        }
        changed
    }

    fn report<T>(&self, key: MutationKey, result: &Result<T, HabitError>) {
        let event = match result {
            Ok(_) => HabitsEvent::Confirmed { key },
            Err(err) if err.is_remote() => HabitsEvent::RolledBack {
                key,
                notice: err.to_string(),
            },
            Err(_) => return,
        };
        self.events.publish(Event::Habits(event));
    }
}

fn validate_title(title: &str) -> Result<String, HabitError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(HabitError::malformed("habit title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn position(habits: &[Habit], id: &str) -> Result<usize, HabitError> {
    habits
        .iter()
        .position(|habit| habit.id == id)
        .ok_or_else(|| HabitError::UnknownHabit(id.to_string()))
}

struct ToggleCompletion {
    habit_id: String,
    date: DateKey,
}

impl Mutation<Vec<Habit>> for ToggleCompletion {
    type Output = ();

    fn key(&self) -> MutationKey {
        MutationKey::Toggle {
            habit_id: self.habit_id.clone(),
            date: self.date.clone(),
        }
    }

    fn apply(&self, habits: &mut Vec<Habit>) -> Result<bool, HabitError> {
        let index = position(habits, &self.habit_id)?;
        let logs = &mut habits[index].logs;
        let done = logs.get(&self.date).copied().unwrap_or(false);
        logs.insert(self.date.clone(), !done);
        Ok(true)
    }

    // Only this (habit, date) entry is restored, so toggles of other days
    // that resolve meanwhile keep their own outcome.
    fn rollback(&self, habits: &mut Vec<Habit>, snapshot: &Vec<Habit>) {
        let previous = snapshot
            .iter()
            .find(|habit| habit.id == self.habit_id)
            .and_then(|habit| habit.logs.get(&self.date).copied());
        if let Some(habit) = habits.iter_mut().find(|habit| habit.id == self.habit_id) {
            match previous {
                Some(done) => habit.logs.insert(self.date.clone(), done),
                None => habit.logs.remove(&self.date),
            };
        }
    }
}

struct CreateHabit {
    title: String,
}

impl Mutation<Vec<Habit>> for CreateHabit {
    type Output = Habit;

    fn key(&self) -> MutationKey {
        MutationKey::Create(self.title.clone())
    }

    // Ids come from the service, so there is nothing to guess locally.
    fn apply(&self, _habits: &mut Vec<Habit>) -> Result<bool, HabitError> {
        Ok(false)
    }

    fn rollback(&self, _habits: &mut Vec<Habit>, _snapshot: &Vec<Habit>) {}

    fn reconcile(&self, habits: &mut Vec<Habit>, created: &Habit) -> bool {
        if habits.iter().any(|habit| habit.id == created.id) {
            return false;
        }
        habits.push(created.clone());
        true
    }
}

struct RenameHabit {
    id: String,
    title: String,
}

impl Mutation<Vec<Habit>> for RenameHabit {
    type Output = Habit;

    fn key(&self) -> MutationKey {
        MutationKey::Habit(self.id.clone())
    }

    fn apply(&self, habits: &mut Vec<Habit>) -> Result<bool, HabitError> {
        let index = position(habits, &self.id)?;
        habits[index].title = self.title.clone();
        Ok(true)
    }

    fn rollback(&self, habits: &mut Vec<Habit>, snapshot: &Vec<Habit>) {
        let Some(previous) = snapshot.iter().find(|habit| habit.id == self.id) else {
            return;
        };
        if let Some(habit) = habits.iter_mut().find(|habit| habit.id == self.id) {
            habit.title = previous.title.clone();
        }
    }

    // Logs are left alone: toggles of this habit may still be in flight.
    fn reconcile(&self, habits: &mut Vec<Habit>, renamed: &Habit) -> bool {
        match habits.iter_mut().find(|habit| habit.id == renamed.id) {
            Some(habit) if habit.title != renamed.title => {
                habit.title = renamed.title.clone();
                true
            }
            _ => false,
        }
    }
}

struct DeleteHabit {
    id: String,
}

impl Mutation<Vec<Habit>> for DeleteHabit {
    type Output = ();

    fn key(&self) -> MutationKey {
        MutationKey::Habit(self.id.clone())
    }

    fn apply(&self, habits: &mut Vec<Habit>) -> Result<bool, HabitError> {
        let index = position(habits, &self.id)?;
        habits.remove(index);
        Ok(true)
    }

    fn rollback(&self, habits: &mut Vec<Habit>, snapshot: &Vec<Habit>) {
        if habits.iter().any(|habit| habit.id == self.id) {
            return;
        }
        if let Some(index) = snapshot.iter().position(|habit| habit.id == self.id) {
            let restored = snapshot[index].clone();
            habits.insert(index.min(habits.len()), restored);
        }
    }
}

struct ReplaceCollection;

impl Mutation<Vec<Habit>> for ReplaceCollection {
    type Output = Vec<Habit>;

    fn key(&self) -> MutationKey {
        MutationKey::Collection
    }

    fn apply(&self, _habits: &mut Vec<Habit>) -> Result<bool, HabitError> {
        Ok(false)
    }

    fn rollback(&self, _habits: &mut Vec<Habit>, _snapshot: &Vec<Habit>) {}

    fn reconcile(&self, habits: &mut Vec<Habit>, replacement: &Vec<Habit>) -> bool {
        *habits = replacement.clone();
        true
    }
}
