use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::backend::Backend;
use crate::error::Result;
use crate::task::Task;

/// The active view filter. Transient UI state, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Pending,
    Completed,
    Today,
    Overdue,
    Tag { id: String, name: String },
}

impl Selector {
    pub fn label(&self) -> String {
        match self {
            Selector::All => "All Tasks".to_string(),
            Selector::Pending => "Pending".to_string(),
            Selector::Completed => "Completed".to_string(),
            Selector::Today => "Due Today".to_string(),
            Selector::Overdue => "Overdue".to_string(),
            Selector::Tag { name, .. } => format!("#{name}"),
        }
    }

    pub fn tag_id(&self) -> Option<&str> {
        match self {
            Selector::Tag { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Recompute the visible subset from the full task list. Order is
/// preserved from the input, which arrives sorted descending by creation
/// time. Returns `None` for a tag selector whose membership set has not
/// been resolved yet; the caller keeps showing its previous result.
pub fn visible(
    tasks: &[Task],
    selector: &Selector,
    members: Option<&HashSet<String>>,
    now: DateTime<Utc>,
) -> Option<Vec<Task>> {
    let rows = match selector {
        Selector::All => tasks.to_vec(),
        Selector::Pending => keep(tasks, |task| !task.is_completed()),
        Selector::Completed => keep(tasks, |task| task.is_completed()),
        Selector::Today => keep(tasks, |task| task.is_due_today(now)),
        Selector::Overdue => keep(tasks, |task| task.is_overdue(now)),
        Selector::Tag { .. } => {
            let members = members?;
            keep(tasks, |task| members.contains(&task.id))
        }
    };
    Some(rows)
}

fn keep(tasks: &[Task], predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
    tasks.iter().filter(|task| predicate(task)).cloned().collect()
}

/// Recompute including the association round trip a tag selector needs.
/// Suspends on the lookup; the caller decides what to do with a failure
/// (log it and keep the previous result).
#[instrument(skip(backend, tasks, now))]
pub async fn resolve(
    backend: &dyn Backend,
    tasks: &[Task],
    selector: &Selector,
    now: DateTime<Utc>,
) -> Result<Vec<Task>> {
    let members = match selector.tag_id() {
        Some(tag_id) => Some(crate::tags::tag_members(backend, tag_id).await?),
        None => None,
    };
    let rows = visible(tasks, selector, members.as_ref(), now).unwrap_or_default();
    debug!(total = tasks.len(), visible = rows.len(), "filter recomputed");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone, Utc};

    use super::{Selector, visible};
    use crate::task::{CompletionFlag, Task};

    fn fixture() -> (chrono::DateTime<Utc>, Vec<Task>) {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).single().expect("timestamp");

        let mut open = Task::new("user_1", "open", now);
        open.created_at = now;

        let mut done = Task::new("user_1", "done", now);
        done.completed = CompletionFlag::SET;
        done.created_at = now - Duration::minutes(1);

        let mut due_today = Task::new("user_1", "due today", now);
        due_today.deadline = Some(now);
        due_today.created_at = now - Duration::minutes(2);

        let mut late = Task::new("user_1", "late", now);
        late.deadline = Some(now - Duration::days(1));
        late.created_at = now - Duration::minutes(3);

        (now, vec![open, done, due_today, late])
    }

    #[test]
    fn pending_and_completed_partition_the_list() {
        let (now, tasks) = fixture();
        let pending = visible(&tasks, &Selector::Pending, None, now).expect("pending");
        let completed = visible(&tasks, &Selector::Completed, None, now).expect("completed");

        assert_eq!(pending.len() + completed.len(), tasks.len());
        for task in &tasks {
            let in_pending = pending.iter().any(|t| t.id == task.id);
            let in_completed = completed.iter().any(|t| t.id == task.id);
            assert!(in_pending ^ in_completed, "{} must be in exactly one", task.title);
        }
    }

    #[test]
    fn overdue_is_a_subset_of_pending() {
        let (now, mut tasks) = fixture();
        let overdue = visible(&tasks, &Selector::Overdue, None, now).expect("overdue");
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "late");

        // Completing the late task removes it from overdue regardless of
        // its deadline.
        for task in &mut tasks {
            if task.title == "late" {
                task.completed = CompletionFlag::SET;
            }
        }
        let overdue = visible(&tasks, &Selector::Overdue, None, now).expect("overdue");
        assert!(overdue.is_empty());
    }

    #[test]
    fn today_requires_a_deadline_on_the_current_date() {
        let (now, tasks) = fixture();
        let today = visible(&tasks, &Selector::Today, None, now).expect("today");
        let titles: Vec<&str> = today.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["due today"]);
    }

    #[test]
    fn all_preserves_input_order() {
        let (now, tasks) = fixture();
        let all = visible(&tasks, &Selector::All, None, now).expect("all");
        let ids: Vec<&str> = all.iter().map(|task| task.id.as_str()).collect();
        let expected: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn tag_selector_intersects_membership() {
        let (now, tasks) = fixture();
        let selector = Selector::Tag {
            id: "tag_a".to_string(),
            name: "errands".to_string(),
        };

        let members: HashSet<String> =
            [tasks[0].id.clone(), tasks[3].id.clone()].into_iter().collect();
        let rows = visible(&tasks, &selector, Some(&members), now).expect("tag rows");
        let titles: Vec<&str> = rows.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["open", "late"]);
    }

    #[test]
    fn unresolved_tag_membership_yields_no_result() {
        let (now, tasks) = fixture();
        let selector = Selector::Tag {
            id: "tag_a".to_string(),
            name: "errands".to_string(),
        };
        assert!(visible(&tasks, &selector, None, now).is_none());
    }
}
