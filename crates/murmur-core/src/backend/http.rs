use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::tag::{Tag, TagPatch, TaskTag};
use crate::task::{Task, TaskPatch};

use super::{AuthState, Backend, User};

/// JSON client for the hosted document store. One instance per session;
/// authentication is a bearer token issued out of band.
pub struct HttpBackend {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Backend { status, body })
    }

    async fn list<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(collection))
            .bearer_auth(&self.token)
            .query(&[(field, value), ("order_by", "-created_at")])
            .send()
            .await?;
        let rows: Vec<T> = Self::check(response).await?.json().await?;
        debug!(collection, field, count = rows.len(), "listed records");
        Ok(rows)
    }

    async fn create<T: serde::Serialize + Sync>(&self, collection: &str, record: &T) -> Result<()> {
        let response = self
            .client
            .post(self.url(collection))
            .bearer_auth(&self.token)
            .json(record)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update<T: serde::Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        patch: &T,
    ) -> Result<()> {
        let response = self
            .client
            .patch(self.url(&format!("{collection}/{id}")))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("{collection}/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self))]
    async fn auth_state(&self) -> Result<AuthState> {
        let response = self
            .client
            .get(self.url("auth/me"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(AuthState::signed_out());
        }

        let me: MeResponse = Self::check(response).await?.json().await?;
        Ok(match me.user {
            Some(user) => AuthState::signed_in(user),
            None => AuthState::signed_out(),
        })
    }

    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        self.list("tasks", "user_id", user_id).await
    }

    async fn create_task(&self, task: &Task) -> Result<()> {
        self.create("tasks", task).await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        self.update("tasks", id, patch).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.delete("tasks", id).await
    }

    async fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>> {
        self.list("tags", "user_id", user_id).await
    }

    async fn create_tag(&self, tag: &Tag) -> Result<()> {
        self.create("tags", tag).await
    }

    async fn update_tag(&self, id: &str, patch: &TagPatch) -> Result<()> {
        self.update("tags", id, patch).await
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        self.delete("tags", id).await
    }

    async fn list_task_associations(&self, task_id: &str) -> Result<Vec<TaskTag>> {
        self.list("task_tags", "task_id", task_id).await
    }

    async fn list_tag_associations(&self, tag_id: &str) -> Result<Vec<TaskTag>> {
        self.list("task_tags", "tag_id", tag_id).await
    }

    async fn create_association(&self, association: &TaskTag) -> Result<()> {
        self.create("task_tags", association).await
    }

    async fn delete_association(&self, id: &str) -> Result<()> {
        self.delete("task_tags", id).await
    }

    #[instrument(skip(self))]
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string());

        let form = multipart::Form::new()
            .part("audio", multipart::Part::bytes(bytes).file_name(file_name))
            .text("language", language.to_string());

        let response = self
            .client
            .post(self.url("ai/transcribe"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        let transcribed: TranscribeResponse = match Self::check(response).await {
            Ok(response) => response.json().await?,
            Err(Error::Backend { status, body }) => {
                return Err(Error::Transcription(format!("backend returned {status}: {body}")));
            }
            Err(err) => return Err(err),
        };

        debug!(chars = transcribed.text.len(), "transcription round trip finished");
        Ok(transcribed.text)
    }
}
