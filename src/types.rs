//! Core types for the taskboard server.

use serde::{Deserialize, Serialize};

/// Color tag for a task list.
///
/// The palette is fixed; clients pick from the same set, so unknown values
/// are a deserialization error rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListColor {
    #[default]
    Blue,
    Purple,
    Green,
    Red,
    Orange,
    Yellow,
}

impl ListColor {
    /// Display hex value for UI clients.
    pub fn hex(&self) -> &'static str {
        match self {
            ListColor::Blue => "#24A6D9",
            ListColor::Purple => "#8022D9",
            ListColor::Green => "#5CD859",
            ListColor::Red => "#D85963",
            ListColor::Orange => "#FF8C42",
            ListColor::Yellow => "#FFD43B",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListColor::Blue => "blue",
            ListColor::Purple => "purple",
            ListColor::Green => "green",
            ListColor::Red => "red",
            ListColor::Orange => "orange",
            ListColor::Yellow => "yellow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "blue" => Some(ListColor::Blue),
            "purple" => Some(ListColor::Purple),
            "green" => Some(ListColor::Green),
            "red" => Some(ListColor::Red),
            "orange" => Some(ListColor::Orange),
            "yellow" => Some(ListColor::Yellow),
            _ => None,
        }
    }
}

/// A single todo item inside a task list.
///
/// Invariant: `completed_at` is `Some` if and only if `completed` is true.
/// Construction goes through [`TodoItem::new`] and completion changes go
/// through [`TodoItem::toggle`], which keep the two in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub title: String,
    pub completed: bool,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// When the item is scheduled to be done. Items without a scheduled time
    /// fall outside every day/week/month window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<i64>,
}

impl TodoItem {
    /// Create an open todo item.
    pub fn new(title: impl Into<String>, created_at: i64, scheduled_at: Option<i64>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            created_at,
            completed_at: None,
            scheduled_at,
        }
    }

    /// Flip completion state, keeping `completed_at` in sync.
    pub fn toggle(&mut self, at: i64) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(at) } else { None };
    }
}

/// A named, colored collection of todo items owned by one user.
///
/// Todos are an ordered sequence; order is insertion order and items are
/// addressed by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub color: ListColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
    pub todos: Vec<TodoItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskList {
    /// Number of completed todos in this list.
    pub fn completed_count(&self) -> i64 {
        self.todos.iter().filter(|t| t.completed).count() as i64
    }
}

/// Derived per-user counters used for progress display and leaderboard
/// ranking. Always recomputable from the user's lists; never independently
/// authoritative.
///
/// Serialized camelCase: this is the externally meaningful record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub email: String,
    pub completed_tasks: i64,
    pub total_tasks: i64,
    pub today_completed_tasks: i64,
    pub today_total_tasks: i64,
}

impl UserStats {
    /// Zeroed stats for a freshly registered user.
    pub fn empty(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: email.into(),
            completed_tasks: 0,
            total_tasks: 0,
            today_completed_tasks: 0,
            today_total_tasks: 0,
        }
    }
}
