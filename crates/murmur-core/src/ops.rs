use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::task::{Task, TaskPatch};

/// Task mutations. Each call is a single round trip (plus the manual
/// association cascade on delete); the caller re-fetches the full list
/// afterwards, so nothing here is applied optimistically.

#[instrument(skip(backend, title, now))]
pub async fn create_task(
    backend: &dyn Backend,
    user_id: &str,
    title: &str,
    now: DateTime<Utc>,
) -> Result<Task> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::EmptyTitle);
    }

    let task = Task::new(user_id, title, now);
    backend.create_task(&task).await?;
    info!(task_id = %task.id, "task created");
    Ok(task)
}

/// Strict flip: calling twice returns the flag to its original value.
#[instrument(skip(backend, task, now), fields(task_id = %task.id))]
pub async fn toggle_complete(backend: &dyn Backend, task: &Task, now: DateTime<Utc>) -> Result<()> {
    let patch = TaskPatch {
        completed: Some(task.completed.toggled()),
        updated_at: Some(now),
        ..TaskPatch::default()
    };
    backend.update_task(&task.id, &patch).await?;
    info!(completed = task.completed.toggled().is_set(), "completion toggled");
    Ok(())
}

#[instrument(skip(backend, title, now))]
pub async fn rename_task(
    backend: &dyn Backend,
    task_id: &str,
    title: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::EmptyTitle);
    }

    let patch = TaskPatch {
        title: Some(title.to_string()),
        updated_at: Some(now),
        ..TaskPatch::default()
    };
    backend.update_task(task_id, &patch).await
}

/// `None` clears the deadline.
#[instrument(skip(backend, now))]
pub async fn set_deadline(
    backend: &dyn Backend,
    task_id: &str,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<()> {
    let patch = TaskPatch {
        deadline: Some(deadline),
        updated_at: Some(now),
        ..TaskPatch::default()
    };
    backend.update_task(task_id, &patch).await
}

/// Associations go first: the store enforces no referential integrity,
/// so the cascade is manual and sequential. A failure between the two
/// steps leaves orphaned rows behind; nothing reconciles them.
#[instrument(skip(backend))]
pub async fn delete_task(backend: &dyn Backend, task_id: &str) -> Result<()> {
    let associations = backend.list_task_associations(task_id).await?;
    for association in &associations {
        backend.delete_association(&association.id).await?;
    }
    backend.delete_task(task_id).await?;
    info!(task_id, cascaded = associations.len(), "task deleted");
    Ok(())
}

pub async fn load_tasks(backend: &dyn Backend, user_id: &str) -> Result<Vec<Task>> {
    backend.list_tasks(user_id).await
}
