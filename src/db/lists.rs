//! Task-list CRUD and todo operations.
//!
//! Lists are stored one row per list with the todo sequence embedded as a
//! JSON column, mirroring the document shape the API exposes. Todo edits are
//! read-modify-write inside a transaction.

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::types::{ListColor, TaskList, TodoItem};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

pub fn parse_list_row(row: &Row) -> rusqlite::Result<TaskList> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    let name: String = row.get("name")?;
    let color_str: String = row.get("color")?;
    let due_at: Option<i64> = row.get("due_at")?;
    let todos_json: String = row.get("todos")?;
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;

    let todos: Vec<TodoItem> = serde_json::from_str(&todos_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(TaskList {
        id,
        owner_id,
        name,
        color: ListColor::from_str(&color_str).unwrap_or_default(),
        due_at,
        todos,
        created_at,
        updated_at,
    })
}

/// Internal helper to get a list using an existing connection.
fn get_list_internal(conn: &Connection, list_id: &str) -> StoreResult<Option<TaskList>> {
    let mut stmt = conn.prepare("SELECT * FROM lists WHERE id = ?1")?;

    let result = stmt.query_row(params![list_id], parse_list_row);

    match result {
        Ok(list) => Ok(Some(list)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist the full list row after an in-memory edit.
fn store_list(conn: &Connection, list: &TaskList) -> StoreResult<()> {
    let todos_json = serde_json::to_string(&list.todos)?;
    conn.execute(
        "UPDATE lists SET name = ?2, color = ?3, due_at = ?4, todos = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            &list.id,
            &list.name,
            list.color.as_str(),
            list.due_at,
            todos_json,
            list.updated_at,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Create a new task list for `owner_id`.
    pub fn create_list(
        &self,
        owner_id: &str,
        name: &str,
        color: ListColor,
        due_at: Option<i64>,
    ) -> StoreResult<TaskList> {
        if name.trim().is_empty() {
            return Err(StoreError::invalid_value("name", "must not be empty"));
        }

        let list = TaskList {
            id: Uuid::now_v7().to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            color,
            due_at,
            todos: Vec::new(),
            created_at: now_ms(),
            updated_at: now_ms(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lists (id, owner_id, name, color, due_at, todos, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &list.id,
                    &list.owner_id,
                    &list.name,
                    list.color.as_str(),
                    list.due_at,
                    "[]",
                    list.created_at,
                    list.updated_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(list)
    }

    /// Get a list by id.
    pub fn get_list(&self, list_id: &str) -> StoreResult<Option<TaskList>> {
        self.with_conn(|conn| get_list_internal(conn, list_id))
    }

    /// All lists owned by `owner_id`, ordered by name.
    pub fn lists_for_owner(&self, owner_id: &str) -> StoreResult<Vec<TaskList>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM lists WHERE owner_id = ?1 ORDER BY name")?;
            let lists = stmt
                .query_map(params![owner_id], parse_list_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lists)
        })
    }

    /// Update list metadata. `None` fields are left unchanged; `due_at` uses
    /// a nested option so the due date can be cleared.
    pub fn update_list(
        &self,
        list_id: &str,
        name: Option<&str>,
        color: Option<ListColor>,
        due_at: Option<Option<i64>>,
    ) -> StoreResult<TaskList> {
        if let Some(name) = name
            && name.trim().is_empty()
        {
            return Err(StoreError::invalid_value("name", "must not be empty"));
        }

        self.with_list_mut(list_id, |list| {
            if let Some(name) = name {
                list.name = name.to_string();
            }
            if let Some(color) = color {
                list.color = color;
            }
            if let Some(due_at) = due_at {
                list.due_at = due_at;
            }
            Ok(())
        })
    }

    /// Delete a list. Returns the deleted list so the caller can re-aggregate
    /// for its owner.
    pub fn delete_list(&self, list_id: &str) -> StoreResult<TaskList> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let list = get_list_internal(&tx, list_id)?
                .ok_or_else(|| StoreError::ListNotFound(list_id.to_string()))?;
            tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;
            tx.commit()?;
            Ok(list)
        })
    }

    /// Append a todo to the list.
    pub fn add_todo(
        &self,
        list_id: &str,
        title: &str,
        scheduled_at: Option<i64>,
    ) -> StoreResult<TaskList> {
        if title.trim().is_empty() {
            return Err(StoreError::invalid_value("title", "must not be empty"));
        }

        self.with_list_mut(list_id, |list| {
            list.todos.push(TodoItem::new(title, now_ms(), scheduled_at));
            Ok(())
        })
    }

    /// Edit a todo's title and/or scheduled time by index.
    pub fn update_todo(
        &self,
        list_id: &str,
        index: usize,
        title: Option<&str>,
        scheduled_at: Option<Option<i64>>,
    ) -> StoreResult<TaskList> {
        if let Some(title) = title
            && title.trim().is_empty()
        {
            return Err(StoreError::invalid_value("title", "must not be empty"));
        }

        self.with_list_mut(list_id, |list| {
            let todo = list.todos.get_mut(index).ok_or(StoreError::TodoIndexOutOfBounds {
                list_id: list_id.to_string(),
                index,
            })?;
            if let Some(title) = title {
                todo.title = title.to_string();
            }
            if let Some(scheduled_at) = scheduled_at {
                todo.scheduled_at = scheduled_at;
            }
            Ok(())
        })
    }

    /// Flip a todo's completion state by index.
    pub fn toggle_todo(&self, list_id: &str, index: usize) -> StoreResult<TaskList> {
        self.with_list_mut(list_id, |list| {
            let todo = list.todos.get_mut(index).ok_or(StoreError::TodoIndexOutOfBounds {
                list_id: list_id.to_string(),
                index,
            })?;
            todo.toggle(now_ms());
            Ok(())
        })
    }

    /// Remove a todo by index, shifting later items down.
    pub fn remove_todo(&self, list_id: &str, index: usize) -> StoreResult<TaskList> {
        self.with_list_mut(list_id, |list| {
            if index >= list.todos.len() {
                return Err(StoreError::TodoIndexOutOfBounds {
                    list_id: list_id.to_string(),
                    index,
                });
            }
            list.todos.remove(index);
            Ok(())
        })
    }

    /// Load a list, apply `f`, and persist the result in one transaction.
    fn with_list_mut<F>(&self, list_id: &str, f: F) -> StoreResult<TaskList>
    where
        F: FnOnce(&mut TaskList) -> StoreResult<()>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut list = get_list_internal(&tx, list_id)?
                .ok_or_else(|| StoreError::ListNotFound(list_id.to_string()))?;
            f(&mut list)?;
            list.updated_at = now_ms();
            store_list(&tx, &list)?;
            tx.commit()?;
            Ok(list)
        })
    }
}
