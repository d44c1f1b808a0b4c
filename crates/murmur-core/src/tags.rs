use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::tag::{Tag, TagPatch, TaskTag, palette_color};

/// Tag lifecycle and the task↔tag association manager.

#[instrument(skip(backend, name, color, now))]
pub async fn create_tag(
    backend: &dyn Backend,
    user_id: &str,
    name: &str,
    color: &str,
    now: DateTime<Utc>,
) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyTagName);
    }
    let color = palette_color(color)?;

    let tag = Tag::new(user_id, name, &color, now);
    backend.create_tag(&tag).await?;
    info!(tag_id = %tag.id, "tag created");
    Ok(tag)
}

/// Rename and/or recolor in place.
#[instrument(skip(backend, name, color, now))]
pub async fn update_tag(
    backend: &dyn Backend,
    tag_id: &str,
    name: Option<&str>,
    color: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let name = match name {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::EmptyTagName);
            }
            Some(name.to_string())
        }
        None => None,
    };
    let color = match color {
        Some(color) => Some(palette_color(color)?),
        None => None,
    };

    let patch = TagPatch {
        name,
        color,
        updated_at: Some(now),
    };
    backend.update_tag(tag_id, &patch).await
}

/// Same manual cascade as task deletion: every association referencing
/// the tag goes first, then the tag itself.
#[instrument(skip(backend))]
pub async fn delete_tag(backend: &dyn Backend, tag_id: &str) -> Result<()> {
    let associations = backend.list_tag_associations(tag_id).await?;
    for association in &associations {
        backend.delete_association(&association.id).await?;
    }
    backend.delete_tag(tag_id).await?;
    info!(tag_id, cascaded = associations.len(), "tag deleted");
    Ok(())
}

/// Full replace of a task's tag set: delete every existing association
/// for the task, then insert one fresh row per desired tag. Deletes run
/// strictly before inserts; there is no transaction, so a failure
/// mid-sequence leaves the associations partially updated. The desired
/// set is deduplicated so the replace never produces duplicate rows.
#[instrument(skip(backend, desired, now), fields(desired = desired.len()))]
pub async fn replace_task_tags(
    backend: &dyn Backend,
    task_id: &str,
    desired: &[String],
    now: DateTime<Utc>,
) -> Result<()> {
    let existing = backend.list_task_associations(task_id).await?;
    for association in &existing {
        backend.delete_association(&association.id).await?;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut inserted = 0_usize;
    for tag_id in desired {
        if !seen.insert(tag_id.as_str()) {
            continue;
        }
        backend
            .create_association(&TaskTag::new(task_id, tag_id, now))
            .await?;
        inserted += 1;
    }

    info!(task_id, removed = existing.len(), inserted, "task tags replaced");
    Ok(())
}

/// Task-id membership set for one tag; what the filter engine intersects
/// against.
pub async fn tag_members(backend: &dyn Backend, tag_id: &str) -> Result<HashSet<String>> {
    let associations = backend.list_tag_associations(tag_id).await?;
    Ok(associations
        .into_iter()
        .map(|association| association.task_id)
        .collect())
}

pub async fn load_tags(backend: &dyn Backend, user_id: &str) -> Result<Vec<Tag>> {
    backend.list_tags(user_id).await
}
