//! Leaderboard ranking over per-user stats records.

use crate::types::UserStats;

/// Sort stats by completed tasks, most first.
///
/// Ties break on total tasks descending, then email ascending, so the
/// ordering is fully determined by the input and re-ranking is idempotent.
pub fn rank(mut stats: Vec<UserStats>) -> Vec<UserStats> {
    stats.sort_by(|a, b| {
        b.completed_tasks
            .cmp(&a.completed_tasks)
            .then_with(|| b.total_tasks.cmp(&a.total_tasks))
            .then_with(|| a.email.cmp(&b.email))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(email: &str, completed: i64, total: i64) -> UserStats {
        UserStats {
            user_id: None,
            email: email.to_string(),
            completed_tasks: completed,
            total_tasks: total,
            today_completed_tasks: 0,
            today_total_tasks: 0,
        }
    }

    #[test]
    fn ranks_by_completed_descending() {
        let ranked = rank(vec![
            stats("low@example.com", 1, 10),
            stats("high@example.com", 9, 10),
            stats("mid@example.com", 5, 10),
        ]);
        let emails: Vec<_> = ranked.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["high@example.com", "mid@example.com", "low@example.com"]
        );
    }

    #[test]
    fn ties_break_on_total_then_email() {
        let ranked = rank(vec![
            stats("b@example.com", 3, 5),
            stats("a@example.com", 3, 5),
            stats("c@example.com", 3, 8),
        ]);
        let emails: Vec<_> = ranked.iter().map(|s| s.email.as_str()).collect();
        // Same completed count: more total tasks first, then email order.
        assert_eq!(
            emails,
            vec!["c@example.com", "a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn ranking_is_idempotent() {
        let input = vec![
            stats("b@example.com", 3, 5),
            stats("a@example.com", 7, 9),
            stats("c@example.com", 3, 5),
        ];
        let once = rank(input.clone());
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_ranks_to_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
