use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tag::{Tag, TagPatch, TaskTag};
use crate::task::{Task, TaskPatch};

use super::{AuthState, Backend, User};

/// In-memory rendition of the hosted store: the three collections behind
/// a mutex, with the same descending-creation-time list ordering. Backs
/// the test suite and `--offline` sessions. Deliberately as permissive as
/// the hosted store: no unique constraint on (task, tag) pairs and no
/// transactions across calls.
pub struct MemoryBackend {
    user: Option<User>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    associations: Vec<TaskTag>,
}

impl MemoryBackend {
    pub fn new(user: User) -> Self {
        Self {
            user: Some(user),
            state: Mutex::new(State::default()),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory backend state poisoned")
    }
}

fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn auth_state(&self) -> Result<AuthState> {
        Ok(match &self.user {
            Some(user) => AuthState::signed_in(user.clone()),
            None => AuthState::signed_out(),
        })
    }

    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let state = self.lock();
        let mut rows: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |task| task.created_at);
        Ok(rows)
    }

    async fn create_task(&self, task: &Task) -> Result<()> {
        self.lock().tasks.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        let mut state = self.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::NotFound {
                collection: "tasks",
                id: id.to_string(),
            })?;
        patch.apply(task);
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != id);
        if state.tasks.len() == before {
            return Err(Error::NotFound {
                collection: "tasks",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>> {
        let state = self.lock();
        let mut rows: Vec<Tag> = state
            .tags
            .iter()
            .filter(|tag| tag.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |tag| tag.created_at);
        Ok(rows)
    }

    async fn create_tag(&self, tag: &Tag) -> Result<()> {
        self.lock().tags.push(tag.clone());
        Ok(())
    }

    async fn update_tag(&self, id: &str, patch: &TagPatch) -> Result<()> {
        let mut state = self.lock();
        let tag = state
            .tags
            .iter_mut()
            .find(|tag| tag.id == id)
            .ok_or_else(|| Error::NotFound {
                collection: "tags",
                id: id.to_string(),
            })?;
        patch.apply(tag);
        Ok(())
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let before = state.tags.len();
        state.tags.retain(|tag| tag.id != id);
        if state.tags.len() == before {
            return Err(Error::NotFound {
                collection: "tags",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_task_associations(&self, task_id: &str) -> Result<Vec<TaskTag>> {
        let state = self.lock();
        let mut rows: Vec<TaskTag> = state
            .associations
            .iter()
            .filter(|association| association.task_id == task_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |association| association.created_at);
        Ok(rows)
    }

    async fn list_tag_associations(&self, tag_id: &str) -> Result<Vec<TaskTag>> {
        let state = self.lock();
        let mut rows: Vec<TaskTag> = state
            .associations
            .iter()
            .filter(|association| association.tag_id == tag_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |association| association.created_at);
        Ok(rows)
    }

    async fn create_association(&self, association: &TaskTag) -> Result<()> {
        self.lock().associations.push(association.clone());
        Ok(())
    }

    async fn delete_association(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let before = state.associations.len();
        state.associations.retain(|association| association.id != id);
        if state.associations.len() == before {
            return Err(Error::NotFound {
                collection: "task_tags",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn transcribe(&self, audio: &Path, _language: &str) -> Result<String> {
        debug!(audio = %audio.display(), "transcription requested against memory backend");
        Err(Error::Transcription(
            "speech-to-text requires the hosted backend".to_string(),
        ))
    }
}
