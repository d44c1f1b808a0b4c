pub mod http;
pub mod memory;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tag::{Tag, TagPatch, TaskTag};
use crate::task::{Task, TaskPatch};

pub use http::HttpBackend;
pub use memory::MemoryBackend;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// The part of the email before the `@`, used for greetings.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("there")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
        }
    }
}

/// The capability contract the hosted service exposes: auth state, CRUD
/// over the three collections, and audio transcription. Everything above
/// this trait is backend-agnostic.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn auth_state(&self) -> Result<AuthState>;

    /// Tasks owned by `user_id`, sorted descending by creation time.
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>>;
    async fn create_task(&self, task: &Task) -> Result<()>;
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()>;
    async fn delete_task(&self, id: &str) -> Result<()>;

    /// Tags owned by `user_id`, sorted descending by creation time.
    async fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>>;
    async fn create_tag(&self, tag: &Tag) -> Result<()>;
    async fn update_tag(&self, id: &str, patch: &TagPatch) -> Result<()>;
    async fn delete_tag(&self, id: &str) -> Result<()>;

    async fn list_task_associations(&self, task_id: &str) -> Result<Vec<TaskTag>>;
    async fn list_tag_associations(&self, tag_id: &str) -> Result<Vec<TaskTag>>;
    async fn create_association(&self, association: &TaskTag) -> Result<()>;
    async fn delete_association(&self, id: &str) -> Result<()>;

    /// Speech-to-text over a recorded audio file. Returns the raw
    /// transcript; callers decide what an empty transcript means.
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String>;
}
