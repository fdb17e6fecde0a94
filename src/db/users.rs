//! Per-user records: registration and stats upsert.

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::types::UserStats;
use rusqlite::{Row, params};

fn parse_user_row(row: &Row) -> rusqlite::Result<UserStats> {
    Ok(UserStats {
        user_id: Some(row.get("id")?),
        email: row.get("email")?,
        completed_tasks: row.get("completed_tasks")?,
        total_tasks: row.get("total_tasks")?,
        today_completed_tasks: row.get("today_completed_tasks")?,
        today_total_tasks: row.get("today_total_tasks")?,
    })
}

impl Database {
    /// Register a user with zeroed counters. Registering an existing id only
    /// refreshes the email.
    pub fn register_user(&self, user_id: &str, email: &str) -> StoreResult<UserStats> {
        if user_id.trim().is_empty() {
            return Err(StoreError::invalid_value("user_id", "must not be empty"));
        }
        if email.trim().is_empty() {
            return Err(StoreError::invalid_value("email", "must not be empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET email = excluded.email",
                params![user_id, email, now_ms()],
            )?;
            Ok(())
        })?;

        self.get_user(user_id)?
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    /// Fetch a user's persisted stats record.
    pub fn get_user(&self, user_id: &str) -> StoreResult<Option<UserStats>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;
            let result = stmt.query_row(params![user_id], parse_user_row);
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Write back aggregated stats: create the record if absent, otherwise
    /// overwrite it.
    pub fn upsert_stats(&self, stats: &UserStats) -> StoreResult<()> {
        let user_id = stats
            .user_id
            .as_deref()
            .ok_or_else(|| StoreError::invalid_value("user_id", "required for upsert"))?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (
                    id, email, completed_tasks, total_tasks,
                    today_completed_tasks, today_total_tasks, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    completed_tasks = excluded.completed_tasks,
                    total_tasks = excluded.total_tasks,
                    today_completed_tasks = excluded.today_completed_tasks,
                    today_total_tasks = excluded.today_total_tasks,
                    updated_at = excluded.updated_at",
                params![
                    user_id,
                    &stats.email,
                    stats.completed_tasks,
                    stats.total_tasks,
                    stats.today_completed_tasks,
                    stats.today_total_tasks,
                    now_ms(),
                ],
            )?;
            Ok(())
        })
    }

    /// All user records, most completed tasks first. The database order is
    /// refined by [`crate::leaderboard::rank`], which defines tie-breaking.
    pub fn all_user_stats(&self) -> StoreResult<Vec<UserStats>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY completed_tasks DESC")?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }
}
