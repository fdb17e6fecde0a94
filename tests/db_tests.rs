//! Integration tests for the SQLite store: list CRUD, todo edits, and
//! per-user records.

use taskboard::db::Database;
use taskboard::error::StoreError;
use taskboard::types::{ListColor, UserStats};

fn setup_db() -> Database {
    Database::open_in_memory().unwrap()
}

#[test]
fn test_create_and_fetch_list() {
    let db = setup_db();

    let list = db
        .create_list("u1", "Groceries", ListColor::Green, None)
        .unwrap();
    assert_eq!(list.owner_id, "u1");
    assert_eq!(list.name, "Groceries");
    assert_eq!(list.color, ListColor::Green);
    assert!(list.todos.is_empty());

    let fetched = db.get_list(&list.id).unwrap().unwrap();
    assert_eq!(fetched.id, list.id);
    assert_eq!(fetched.name, "Groceries");
    assert_eq!(fetched.color, ListColor::Green);
}

#[test]
fn test_get_missing_list_returns_none() {
    let db = setup_db();
    assert!(db.get_list("nope").unwrap().is_none());
}

#[test]
fn test_lists_for_owner_ordered_by_name() {
    let db = setup_db();
    db.create_list("u1", "Work", ListColor::Blue, None).unwrap();
    db.create_list("u1", "Errands", ListColor::Red, None)
        .unwrap();
    db.create_list("u1", "Plans", ListColor::Purple, None)
        .unwrap();
    db.create_list("u2", "Other", ListColor::Blue, None)
        .unwrap();

    let lists = db.lists_for_owner("u1").unwrap();
    let names: Vec<&str> = lists.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Errands", "Plans", "Work"]);
}

#[test]
fn test_create_list_rejects_empty_name() {
    let db = setup_db();
    let err = db
        .create_list("u1", "   ", ListColor::Blue, None)
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));
}

#[test]
fn test_update_list_fields() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Old", ListColor::Blue, Some(1_000))
        .unwrap();

    let updated = db
        .update_list(&list.id, Some("New"), Some(ListColor::Orange), None)
        .unwrap();
    assert_eq!(updated.name, "New");
    assert_eq!(updated.color, ListColor::Orange);
    assert_eq!(updated.due_at, Some(1_000));

    // Nested option clears the due date.
    let cleared = db.update_list(&list.id, None, None, Some(None)).unwrap();
    assert_eq!(cleared.name, "New");
    assert_eq!(cleared.due_at, None);
}

#[test]
fn test_update_missing_list_fails() {
    let db = setup_db();
    let err = db.update_list("nope", Some("x"), None, None).unwrap_err();
    assert!(matches!(err, StoreError::ListNotFound(_)));
}

#[test]
fn test_delete_list_returns_deleted_row() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Ephemeral", ListColor::Blue, None)
        .unwrap();

    let deleted = db.delete_list(&list.id).unwrap();
    assert_eq!(deleted.id, list.id);
    assert!(db.get_list(&list.id).unwrap().is_none());

    let err = db.delete_list(&list.id).unwrap_err();
    assert!(matches!(err, StoreError::ListNotFound(_)));
}

#[test]
fn test_add_todo_appends_in_order() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();

    db.add_todo(&list.id, "first", None).unwrap();
    let list = db.add_todo(&list.id, "second", Some(5_000)).unwrap();

    assert_eq!(list.todos.len(), 2);
    assert_eq!(list.todos[0].title, "first");
    assert_eq!(list.todos[1].title, "second");
    assert_eq!(list.todos[1].scheduled_at, Some(5_000));
    assert!(!list.todos[0].completed);
}

#[test]
fn test_add_todo_rejects_empty_title() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();
    let err = db.add_todo(&list.id, "", None).unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));
}

#[test]
fn test_toggle_todo_tracks_completion_time() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();
    db.add_todo(&list.id, "dishes", None).unwrap();

    let toggled = db.toggle_todo(&list.id, 0).unwrap();
    assert!(toggled.todos[0].completed);
    assert!(toggled.todos[0].completed_at.is_some());

    let toggled_back = db.toggle_todo(&list.id, 0).unwrap();
    assert!(!toggled_back.todos[0].completed);
    assert!(toggled_back.todos[0].completed_at.is_none());
}

#[test]
fn test_update_todo_by_index() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();
    db.add_todo(&list.id, "old title", None).unwrap();

    let updated = db
        .update_todo(&list.id, 0, Some("new title"), Some(Some(9_000)))
        .unwrap();
    assert_eq!(updated.todos[0].title, "new title");
    assert_eq!(updated.todos[0].scheduled_at, Some(9_000));
}

#[test]
fn test_todo_index_out_of_bounds() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();
    db.add_todo(&list.id, "only one", None).unwrap();

    let err = db.toggle_todo(&list.id, 1).unwrap_err();
    assert!(matches!(
        err,
        StoreError::TodoIndexOutOfBounds { index: 1, .. }
    ));

    let err = db.remove_todo(&list.id, 5).unwrap_err();
    assert!(matches!(
        err,
        StoreError::TodoIndexOutOfBounds { index: 5, .. }
    ));
}

#[test]
fn test_remove_todo_shifts_later_items() {
    let db = setup_db();
    let list = db
        .create_list("u1", "Chores", ListColor::Blue, None)
        .unwrap();
    db.add_todo(&list.id, "a", None).unwrap();
    db.add_todo(&list.id, "b", None).unwrap();
    db.add_todo(&list.id, "c", None).unwrap();

    let list = db.remove_todo(&list.id, 1).unwrap();
    let titles: Vec<&str> = list.todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "c"]);
}

#[test]
fn test_register_user_is_idempotent() {
    let db = setup_db();

    let first = db.register_user("u1", "a@example.com").unwrap();
    assert_eq!(first.email, "a@example.com");
    assert_eq!(first.completed_tasks, 0);
    assert_eq!(first.total_tasks, 0);

    // Seed some counters, then re-register with a new email.
    let mut stats = first.clone();
    stats.completed_tasks = 4;
    stats.total_tasks = 7;
    db.upsert_stats(&stats).unwrap();

    let again = db.register_user("u1", "b@example.com").unwrap();
    assert_eq!(again.email, "b@example.com");
    // Re-registration refreshes the email but keeps the counters.
    assert_eq!(again.completed_tasks, 4);
    assert_eq!(again.total_tasks, 7);
}

#[test]
fn test_register_user_validates_input() {
    let db = setup_db();
    assert!(matches!(
        db.register_user("", "a@example.com").unwrap_err(),
        StoreError::InvalidValue { .. }
    ));
    assert!(matches!(
        db.register_user("u1", " ").unwrap_err(),
        StoreError::InvalidValue { .. }
    ));
}

#[test]
fn test_get_missing_user_returns_none() {
    let db = setup_db();
    assert!(db.get_user("ghost").unwrap().is_none());
}

#[test]
fn test_upsert_stats_overwrites() {
    let db = setup_db();
    db.register_user("u1", "a@example.com").unwrap();

    let mut stats = UserStats::empty("u1", "a@example.com");
    stats.completed_tasks = 2;
    stats.total_tasks = 5;
    stats.today_completed_tasks = 1;
    stats.today_total_tasks = 2;
    db.upsert_stats(&stats).unwrap();

    let fetched = db.get_user("u1").unwrap().unwrap();
    assert_eq!(fetched.completed_tasks, 2);
    assert_eq!(fetched.total_tasks, 5);
    assert_eq!(fetched.today_completed_tasks, 1);
    assert_eq!(fetched.today_total_tasks, 2);

    stats.completed_tasks = 3;
    db.upsert_stats(&stats).unwrap();
    let fetched = db.get_user("u1").unwrap().unwrap();
    assert_eq!(fetched.completed_tasks, 3);
}

#[test]
fn test_upsert_stats_requires_user_id() {
    let db = setup_db();
    let mut stats = UserStats::empty("u1", "a@example.com");
    stats.user_id = None;
    let err = db.upsert_stats(&stats).unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { .. }));
}

#[test]
fn test_all_user_stats_most_completed_first() {
    let db = setup_db();
    for (id, email, completed) in [
        ("u1", "a@example.com", 1),
        ("u2", "b@example.com", 9),
        ("u3", "c@example.com", 4),
    ] {
        db.register_user(id, email).unwrap();
        let mut stats = UserStats::empty(id, email);
        stats.completed_tasks = completed;
        stats.total_tasks = completed;
        db.upsert_stats(&stats).unwrap();
    }

    let users = db.all_user_stats().unwrap();
    let completed: Vec<i64> = users.iter().map(|u| u.completed_tasks).collect();
    assert_eq!(completed, vec![9, 4, 1]);
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskboard.db");

    {
        let db = Database::open(&path).unwrap();
        db.register_user("u1", "a@example.com").unwrap();
        let list = db
            .create_list("u1", "Persistent", ListColor::Yellow, None)
            .unwrap();
        db.add_todo(&list.id, "survive restart", None).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let lists = db.lists_for_owner("u1").unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Persistent");
    assert_eq!(lists[0].todos[0].title, "survive restart");
    assert!(db.get_user("u1").unwrap().is_some());
}
