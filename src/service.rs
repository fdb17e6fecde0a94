//! Orchestration layer: mutations, re-aggregation, and event publication.
//!
//! Every list or todo mutation runs under a per-user guard, applies the store
//! change, recomputes that user's stats from all of their lists (full
//! recomputation, not incremental counters), persists the result, and then
//! publishes a change event. Readers go straight to the store.

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::leaderboard;
use crate::stats;
use crate::subscriptions::{ChangeEvent, EventBus, MutationKind};
use crate::types::{ListColor, TaskList, UserStats};
use crate::window::{Window, WindowKind};
use chrono::{DateTime, Local, TimeZone};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Service facade over the store and the event bus.
#[derive(Clone)]
pub struct TaskService {
    db: Database,
    events: EventBus,
    /// Per-user guards: aggregation for one user is serialized so two racing
    /// mutations cannot interleave their read-aggregate-write cycles.
    guards: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            events: EventBus::default(),
            guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Like [`new`], with an explicit event channel capacity.
    pub fn with_event_capacity(db: Database, capacity: usize) -> Self {
        Self {
            db,
            events: EventBus::new(capacity),
            guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    // ---- users ----

    /// Register a user (idempotent) and seed a zeroed stats record.
    pub fn register_user(&self, user_id: &str, email: &str) -> StoreResult<UserStats> {
        let stats = self.db.register_user(user_id, email)?;
        self.events.publish(MutationKind::UserChanged, user_id);
        Ok(stats)
    }

    /// A user's persisted stats record.
    pub fn user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        self.db
            .get_user(user_id)?
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    /// All users ranked by completed tasks.
    pub fn leaderboard(&self) -> StoreResult<Vec<UserStats>> {
        Ok(leaderboard::rank(self.db.all_user_stats()?))
    }

    // ---- lists ----

    pub fn create_list(
        &self,
        user_id: &str,
        name: &str,
        color: ListColor,
        due_at: Option<i64>,
    ) -> StoreResult<TaskList> {
        let list = self.mutate(user_id, |db| db.create_list(user_id, name, color, due_at))?;
        self.events.publish(MutationKind::ListChanged, user_id);
        Ok(list)
    }

    pub fn update_list(
        &self,
        user_id: &str,
        list_id: &str,
        name: Option<&str>,
        color: Option<ListColor>,
        due_at: Option<Option<i64>>,
    ) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| {
            db.update_list(list_id, name, color, due_at)
        })?;
        self.events.publish(MutationKind::ListChanged, user_id);
        Ok(list)
    }

    pub fn delete_list(&self, user_id: &str, list_id: &str) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| db.delete_list(list_id))?;
        self.events.publish(MutationKind::ListChanged, user_id);
        Ok(list)
    }

    /// All of a user's lists, ordered by name.
    pub fn lists(&self, user_id: &str) -> StoreResult<Vec<TaskList>> {
        self.db.lists_for_owner(user_id)
    }

    /// Lists whose due date falls in the named window around `reference`.
    pub fn lists_in_window<Tz: TimeZone>(
        &self,
        user_id: &str,
        kind: WindowKind,
        reference: &DateTime<Tz>,
    ) -> StoreResult<Vec<TaskList>> {
        let lists = self.db.lists_for_owner(user_id)?;
        let window = kind.window_of(reference);
        Ok(stats::select_by_window(&lists, &window)
            .into_iter()
            .cloned()
            .collect())
    }

    // ---- todos ----

    pub fn add_todo(
        &self,
        user_id: &str,
        list_id: &str,
        title: &str,
        scheduled_at: Option<i64>,
    ) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| {
            db.add_todo(list_id, title, scheduled_at)
        })?;
        self.events.publish(MutationKind::TodoChanged, user_id);
        Ok(list)
    }

    pub fn update_todo(
        &self,
        user_id: &str,
        list_id: &str,
        index: usize,
        title: Option<&str>,
        scheduled_at: Option<Option<i64>>,
    ) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| {
            db.update_todo(list_id, index, title, scheduled_at)
        })?;
        self.events.publish(MutationKind::TodoChanged, user_id);
        Ok(list)
    }

    pub fn toggle_todo(&self, user_id: &str, list_id: &str, index: usize) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| db.toggle_todo(list_id, index))?;
        self.events.publish(MutationKind::TodoChanged, user_id);
        Ok(list)
    }

    pub fn remove_todo(&self, user_id: &str, list_id: &str, index: usize) -> StoreResult<TaskList> {
        let list = self.mutate_owned(user_id, list_id, |db| db.remove_todo(list_id, index))?;
        self.events.publish(MutationKind::TodoChanged, user_id);
        Ok(list)
    }

    // ---- aggregation ----

    /// Recompute a user's stats from their lists and persist the result.
    pub fn recount(&self, user_id: &str) -> StoreResult<UserStats> {
        let stats = self.recount_at(user_id, &Local::now())?;
        self.events.publish(MutationKind::UserChanged, user_id);
        Ok(stats)
    }

    /// Recompute with an explicit reference instant (the "today" window is
    /// taken from the reference's timezone).
    pub fn recount_at<Tz: TimeZone>(
        &self,
        user_id: &str,
        reference: &DateTime<Tz>,
    ) -> StoreResult<UserStats> {
        let guard = self.user_guard(user_id);
        let _held = guard.lock().unwrap();
        self.recompute_locked(user_id, &Window::day_of(reference))
    }

    /// Run a mutation and re-aggregate under the user's guard.
    fn mutate<F>(&self, user_id: &str, op: F) -> StoreResult<TaskList>
    where
        F: FnOnce(&Database) -> StoreResult<TaskList>,
    {
        let guard = self.user_guard(user_id);
        let _held = guard.lock().unwrap();
        let list = op(&self.db)?;
        self.recompute_locked(user_id, &Window::day_of(&Local::now()))?;
        Ok(list)
    }

    /// Like [`mutate`], but first checks that `user_id` owns `list_id`.
    fn mutate_owned<F>(&self, user_id: &str, list_id: &str, op: F) -> StoreResult<TaskList>
    where
        F: FnOnce(&Database) -> StoreResult<TaskList>,
    {
        let guard = self.user_guard(user_id);
        let _held = guard.lock().unwrap();

        let list = self
            .db
            .get_list(list_id)?
            .ok_or_else(|| StoreError::ListNotFound(list_id.to_string()))?;
        if list.owner_id != user_id {
            return Err(StoreError::PermissionDenied {
                user_id: user_id.to_string(),
                list_id: list_id.to_string(),
            });
        }

        let list = op(&self.db)?;
        self.recompute_locked(user_id, &Window::day_of(&Local::now()))?;
        Ok(list)
    }

    /// Aggregate and upsert. Caller must hold the user's guard.
    fn recompute_locked(&self, user_id: &str, day: &Window) -> StoreResult<UserStats> {
        let lists = self.db.lists_for_owner(user_id)?;
        let email = self
            .db
            .get_user(user_id)?
            .map(|u| u.email)
            .unwrap_or_default();

        let stats = stats::aggregate(user_id, &email, &lists, day);
        self.db.upsert_stats(&stats)?;
        debug!(
            user_id,
            total = stats.total_tasks,
            completed = stats.completed_tasks,
            "recomputed user stats"
        );
        Ok(stats)
    }

    fn user_guard(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().unwrap();
        guards.entry(user_id.to_string()).or_default().clone()
    }
}
