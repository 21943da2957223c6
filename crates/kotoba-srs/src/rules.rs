//! Fixed queue-transition and schedule rule tables.
//!
//! These are immutable lookup functions, initialized at compile time. The
//! base interval is *before* ease scaling; callers scale REVIEW intervals
//! by the entry's ease factor (see [`crate::apply_action`]).

use crate::{ActionType, QueueType, Timedelta};

/// `QUEUE_RULES[current][action] -> next queue`.
pub const fn next_queue(current: QueueType, action: ActionType) -> QueueType {
    match (current, action) {
        (QueueType::New, ActionType::Easy) => QueueType::Review,
        (QueueType::New, _) => QueueType::Learn,
        (QueueType::Learn, ActionType::Again | ActionType::Hard) => QueueType::Learn,
        (QueueType::Learn, ActionType::Good | ActionType::Easy) => QueueType::Review,
        (QueueType::Review, ActionType::Again) => QueueType::Learn,
        (QueueType::Review, _) => QueueType::Review,
    }
}

/// `SCHEDULE_RULES[current][action] -> base delta`.
pub const fn base_interval(current: QueueType, action: ActionType) -> Timedelta {
    match (current, action) {
        (QueueType::New | QueueType::Learn, ActionType::Again) => Timedelta::minutes(1),
        (QueueType::New | QueueType::Learn, ActionType::Hard) => Timedelta::minutes(5),
        (QueueType::New | QueueType::Learn, _) => Timedelta::days(1),
        (QueueType::Review, ActionType::Again) => Timedelta::minutes(10),
        (QueueType::Review, ActionType::Hard) => Timedelta::hours(1),
        (QueueType::Review, _) => Timedelta::days(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_rules_match_the_table() {
        let expected = [
            // (current, AGAIN, HARD, GOOD, EASY)
            (
                QueueType::New,
                [
                    QueueType::Learn,
                    QueueType::Learn,
                    QueueType::Learn,
                    QueueType::Review,
                ],
            ),
            (
                QueueType::Learn,
                [
                    QueueType::Learn,
                    QueueType::Learn,
                    QueueType::Review,
                    QueueType::Review,
                ],
            ),
            (
                QueueType::Review,
                [
                    QueueType::Learn,
                    QueueType::Review,
                    QueueType::Review,
                    QueueType::Review,
                ],
            ),
        ];
        for (current, row) in expected {
            for (action, next) in ActionType::ALL.into_iter().zip(row) {
                assert_eq!(next_queue(current, action), next, "{current} + {action}");
            }
        }
    }

    #[test]
    fn schedule_rules_match_the_table() {
        let expected = [
            (
                QueueType::New,
                [
                    Timedelta::minutes(1),
                    Timedelta::minutes(5),
                    Timedelta::days(1),
                    Timedelta::days(1),
                ],
            ),
            (
                QueueType::Learn,
                [
                    Timedelta::minutes(1),
                    Timedelta::minutes(5),
                    Timedelta::days(1),
                    Timedelta::days(1),
                ],
            ),
            (
                QueueType::Review,
                [
                    Timedelta::minutes(10),
                    Timedelta::hours(1),
                    Timedelta::days(1),
                    Timedelta::days(1),
                ],
            ),
        ];
        for (current, row) in expected {
            for (action, delta) in ActionType::ALL.into_iter().zip(row) {
                assert_eq!(base_interval(current, action), delta, "{current} + {action}");
            }
        }
    }
}
