//! Local-first mutation with server reconciliation.
//!
//! A mutation is applied to the shared state synchronously and published to
//! every [`watch::Receiver`] before its remote operation is even polled. The
//! remote outcome then either confirms the optimistic state (optionally
//! reconciling it with the server's representation) or rolls it back to the
//! snapshot taken just before the local write.
//!
//! Only one mutation per [`MutationKey`] may be in flight, and keys that touch
//! the same habit (see [`MutationKey::conflicts_with`]) exclude each other. A
//! conflicting request is refused with [`HabitError::InFlight`] and leaves
//! state untouched, so a late rollback can never clobber a newer optimistic
//! write.
//!
//! A mutation whose future is dropped before the remote outcome is known is
//! rolled back as if the remote had failed.

use crate::date_key::DateKey;
use crate::errors::HabitError;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey {
    Toggle { habit_id: String, date: DateKey },
    Habit(String),
    Create(String),
    Collection,
}

impl MutationKey {
    /// Whether two mutations may not be in flight together. A toggle
    /// conflicts with a rename or delete of the same habit.
    pub fn conflicts_with(&self, other: &MutationKey) -> bool {
        match (self, other) {
            (MutationKey::Toggle { habit_id, .. }, MutationKey::Habit(id))
            | (MutationKey::Habit(id), MutationKey::Toggle { habit_id, .. }) => habit_id == id,
            _ => self == other,
        }
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKey::Toggle { habit_id, date } => write!(f, "toggle of {habit_id} on {date}"),
            MutationKey::Habit(id) => write!(f, "update of habit {id}"),
            MutationKey::Create(title) => write!(f, "creation of `{title}`"),
            MutationKey::Collection => f.write_str("collection replacement"),
        }
    }
}

pub trait Mutation<S: Clone> {
    /// What the remote operation resolves to.
    type Output;

    fn key(&self) -> MutationKey;

    /// Local guess. Returns whether `state` changed; on `Err` it must leave
    /// `state` untouched.
    fn apply(&self, state: &mut S) -> Result<bool, HabitError>;

    /// Undo after a remote failure or an abandoned request. `snapshot` is the
    /// state captured right before `apply`; other mutations may have changed
    /// `state` since, so only this mutation's own write should be reverted.
    fn rollback(&self, state: &mut S, snapshot: &S);

    /// Fold the authoritative server result back in. Returns whether `state`
    /// changed.
    fn reconcile(&self, _state: &mut S, _output: &Self::Output) -> bool {
        false
    }
}

pub struct OptimisticController<S> {
    state: watch::Sender<S>,
    in_flight: Mutex<HashSet<MutationKey>>,
}

impl<S: Clone> OptimisticController<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: watch::Sender::new(initial),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn current(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Installs an authoritative state that did not come from a mutation,
    /// e.g. a fresh fetch.
    pub fn replace(&self, state: S) {
        self.state.send_replace(state);
    }

    pub fn is_in_flight(&self, key: &MutationKey) -> bool {
        self.lock_in_flight().contains(key)
    }

    pub async fn execute<M, F>(&self, mutation: M, op: F) -> Result<M::Output, HabitError>
    where
        M: Mutation<S>,
        F: Future<Output = Result<M::Output, HabitError>>,
    {
        let mut pending = self.begin(mutation)?;

        let mut applied = Ok(false);
        self.state.send_if_modified(|state| {
            applied = pending.mutation.apply(state);
            matches!(applied, Ok(true))
        });
        applied?;
        pending.armed = true;
        debug!(key = %pending.key, "optimistic state applied");

        let outcome = op.await;
        pending.armed = false;
        match outcome {
            Ok(output) => {
                self.state
                    .send_if_modified(|state| pending.mutation.reconcile(state, &output));
                debug!(key = %pending.key, "mutation confirmed");
                Ok(output)
            }
            Err(err) => {
                self.state
                    .send_modify(|state| pending.mutation.rollback(state, &pending.snapshot));
                warn!(key = %pending.key, error = %err, "mutation rejected, local state rolled back");
                Err(err)
            }
        }
    }

    fn begin<M: Mutation<S>>(&self, mutation: M) -> Result<Pending<'_, S, M>, HabitError> {
        let key = mutation.key();
        let mut in_flight = self.lock_in_flight();
        if in_flight.iter().any(|busy| busy.conflicts_with(&key)) {
            debug!(%key, "ignoring mutation that conflicts with one in flight");
            return Err(HabitError::InFlight(key));
        }
        in_flight.insert(key.clone());
        drop(in_flight);
        Ok(Pending {
            controller: self,
            key,
            snapshot: self.current(),
            mutation,
            armed: false,
        })
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashSet<MutationKey>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds a key in flight. Once armed (the optimistic write is visible and
/// the remote has not answered) dropping it rolls the write back, which
/// covers callers that give up on the future. The key is released either way.
struct Pending<'a, S: Clone, M: Mutation<S>> {
    controller: &'a OptimisticController<S>,
    key: MutationKey,
    snapshot: S,
    mutation: M,
    armed: bool,
}

impl<S: Clone, M: Mutation<S>> Drop for Pending<'_, S, M> {
    fn drop(&mut self) {
        if self.armed {
            self.controller
                .state
                .send_modify(|state| self.mutation.rollback(state, &self.snapshot));
            warn!(key = %self.key, "mutation abandoned before the remote answered, rolled back");
        }
        self.controller.lock_in_flight().remove(&self.key);
    }
}
