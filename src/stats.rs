//! Pure aggregation over a user's task lists.
//!
//! Aggregation takes a snapshot of lists and produces counters; it performs
//! no IO. Persisting the result (and deciding when to recompute) is the
//! caller's job; see [`crate::service::TaskService`].

use crate::types::{TaskList, UserStats};
use crate::window::Window;

/// Compute total/completed counters over `lists`, with the today counters
/// restricted to todos whose scheduled time falls inside `day`.
///
/// Todos without a scheduled time count toward the overall totals but never
/// toward a window.
pub fn aggregate(user_id: &str, email: &str, lists: &[TaskList], day: &Window) -> UserStats {
    let mut stats = UserStats::empty(user_id, email);

    for list in lists {
        stats.total_tasks += list.todos.len() as i64;
        stats.completed_tasks += list.completed_count();
        for todo in &list.todos {
            if day.contains_opt(todo.scheduled_at) {
                stats.today_total_tasks += 1;
                if todo.completed {
                    stats.today_completed_tasks += 1;
                }
            }
        }
    }

    stats
}

/// Filter `lists` to those whose due date falls within `window`.
///
/// Drives the today/week/month views. Lists without a due date are excluded.
pub fn select_by_window<'a>(lists: &'a [TaskList], window: &Window) -> Vec<&'a TaskList> {
    lists
        .iter()
        .filter(|list| window.contains_opt(list.due_at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListColor, TodoItem};
    use chrono::{TimeZone, Utc};

    fn list_with(todos: Vec<TodoItem>) -> TaskList {
        TaskList {
            id: "list".to_string(),
            owner_id: "u1".to_string(),
            name: "Chores".to_string(),
            color: ListColor::Blue,
            due_at: None,
            todos,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn done(scheduled_at: Option<i64>) -> TodoItem {
        TodoItem {
            title: "t".to_string(),
            completed: true,
            created_at: 0,
            completed_at: Some(0),
            scheduled_at,
        }
    }

    fn open(scheduled_at: Option<i64>) -> TodoItem {
        TodoItem::new("t", 0, scheduled_at)
    }

    fn any_day() -> Window {
        Window::day_of(&Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn empty_input_yields_zero_counters() {
        let stats = aggregate("u1", "a@example.com", &[], &any_day());
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
        assert_eq!(stats.today_total_tasks, 0);
        assert_eq!(stats.today_completed_tasks, 0);
    }

    #[test]
    fn counts_across_multiple_lists() {
        // Two lists, three todos, two completed.
        let lists = vec![
            list_with(vec![done(None), open(None)]),
            list_with(vec![done(None)]),
        ];
        let stats = aggregate("u1", "a@example.com", &lists, &any_day());
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
    }

    #[test]
    fn completed_never_exceeds_total() {
        let lists = vec![
            list_with(vec![done(None), done(Some(1)), open(None)]),
            list_with(vec![]),
            list_with(vec![open(Some(2))]),
        ];
        let stats = aggregate("u1", "a@example.com", &lists, &any_day());
        assert!(stats.completed_tasks <= stats.total_tasks);
        assert!(stats.today_completed_tasks <= stats.today_total_tasks);
    }

    #[test]
    fn today_counters_respect_day_boundaries() {
        let day = any_day();
        let lists = vec![list_with(vec![
            open(Some(day.start_ms)),        // midnight, included
            done(Some(day.end_ms)),          // 23:59:59.999, included
            open(Some(day.end_ms + 1)),      // next day midnight, excluded
            open(None),                      // unscheduled, excluded
        ])];
        let stats = aggregate("u1", "a@example.com", &lists, &day);
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.today_total_tasks, 2);
        assert_eq!(stats.today_completed_tasks, 1);
    }

    #[test]
    fn select_by_window_filters_on_due_date() {
        let day = any_day();
        let mut due_today = list_with(vec![]);
        due_today.id = "a".to_string();
        due_today.due_at = Some(day.start_ms + 1000);
        let mut due_later = list_with(vec![]);
        due_later.id = "b".to_string();
        due_later.due_at = Some(day.end_ms + 1);
        let undated = list_with(vec![]);

        let lists = vec![due_today, due_later, undated];
        let selected = select_by_window(&lists, &day);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "a");
    }
}
