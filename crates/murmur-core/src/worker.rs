use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use crate::backend::{AuthState, Backend};
use crate::error::{Error, Result};
use crate::filter::Selector;
use crate::tag::Tag;
use crate::task::Task;
use crate::{ops, tags};

/// Requests the shell sends to the backend worker.
#[derive(Debug, Clone)]
pub enum Command {
    Refresh,
    RefreshTags,
    Select(Selector),
    CreateTask {
        title: String,
    },
    ToggleComplete {
        task: Task,
    },
    RenameTask {
        task_id: String,
        title: String,
    },
    SetDeadline {
        task_id: String,
        deadline: Option<DateTime<Utc>>,
    },
    DeleteTask {
        task_id: String,
    },
    CreateTag {
        name: String,
        color: String,
    },
    UpdateTag {
        tag_id: String,
        name: Option<String>,
        color: Option<String>,
    },
    DeleteTag {
        tag_id: String,
    },
    ReplaceTaskTags {
        task_id: String,
        tag_ids: Vec<String>,
    },
    LoadTaskTags {
        task_id: String,
    },
    Transcribe {
        audio: PathBuf,
    },
    Shutdown,
}

/// What the worker reports back. The shell folds these into its state on
/// every tick.
#[derive(Debug, Clone)]
pub enum Event {
    Auth(AuthState),
    Tasks(Vec<Task>),
    Tags(Vec<Tag>),
    TagMembers {
        tag_id: String,
        members: HashSet<String>,
    },
    TaskCreated,
    /// The tag ids currently associated with one task; seeds the tag
    /// picker.
    TaskTags {
        task_id: String,
        tag_ids: HashSet<String>,
    },
    /// The in-flight operation on this task finished, successfully or
    /// not; the row becomes interactive again.
    OpSettled {
        task_id: String,
    },
    Transcribed {
        text: String,
    },
    Failed {
        action: &'static str,
        message: String,
    },
}

pub struct WorkerHandle {
    pub commands: Sender<Command>,
    pub events: Receiver<Event>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Dedicated worker thread owning a tokio runtime. Commands are handled
/// strictly one at a time; every round trip suspends here, never on the
/// interface thread. There is no cancellation: once issued, a command
/// runs to completion or failure.
pub fn spawn(backend: Arc<dyn Backend>, language: String) -> Result<WorkerHandle> {
    let (command_tx, command_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    let worker = Worker {
        backend,
        language,
        user_id: None,
        event_tx,
        command_rx,
    };

    let thread = std::thread::Builder::new()
        .name("murmur-backend".to_string())
        .spawn(move || worker.run())?;

    Ok(WorkerHandle {
        commands: command_tx,
        events: event_rx,
        thread: Some(thread),
    })
}

struct Worker {
    backend: Arc<dyn Backend>,
    language: String,
    user_id: Option<String>,
    event_tx: Sender<Event>,
    command_rx: Receiver<Command>,
}

impl Worker {
    fn run(mut self) {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(err) => {
                error!(error = %err, "failed to build worker runtime");
                self.send(Event::Failed {
                    action: "start backend worker",
                    message: err.to_string(),
                });
                return;
            }
        };

        info!("backend worker started");
        self.resolve_auth(&rt);

        while let Ok(command) = self.command_rx.recv() {
            if matches!(command, Command::Shutdown) {
                break;
            }
            self.handle(&rt, command);
        }

        info!("backend worker stopped");
    }

    /// Identity is resolved once at startup and passed into every
    /// operation afterwards.
    fn resolve_auth(&mut self, rt: &Runtime) {
        self.send(Event::Auth(AuthState::loading()));

        match rt.block_on(self.backend.auth_state()) {
            Ok(state) => {
                self.user_id = state.user.as_ref().map(|user| user.id.clone());
                let signed_in = state.user.is_some();
                info!(signed_in, "auth state resolved");
                self.send(Event::Auth(state));
                if signed_in {
                    self.refresh_tasks(rt);
                    self.refresh_tags(rt);
                }
            }
            Err(err) => {
                error!(error = %err, "auth state lookup failed");
                self.send(Event::Failed {
                    action: "sign in",
                    message: err.to_string(),
                });
                self.send(Event::Auth(AuthState::signed_out()));
            }
        }
    }

    fn handle(&mut self, rt: &Runtime, command: Command) {
        debug!(?command, "handling command");
        let now = Utc::now();

        match command {
            Command::Refresh => self.refresh_tasks(rt),
            Command::RefreshTags => self.refresh_tags(rt),

            Command::Select(selector) => {
                // Only tag selectors need a round trip; the shell filters
                // the status and date views locally.
                let Some(tag_id) = selector.tag_id() else {
                    return;
                };
                match rt.block_on(tags::tag_members(&*self.backend, tag_id)) {
                    Ok(members) => self.send(Event::TagMembers {
                        tag_id: tag_id.to_string(),
                        members,
                    }),
                    // Logged only: the shell keeps showing the previous
                    // filtered result.
                    Err(err) => {
                        error!(tag_id, error = %err, "tag membership lookup failed");
                    }
                }
            }

            Command::CreateTask { title } => {
                let result = self.user_id().and_then(|user_id| {
                    rt.block_on(ops::create_task(&*self.backend, &user_id, &title, now))
                });
                match result {
                    Ok(_) => self.send(Event::TaskCreated),
                    Err(err) => self.fail("create task", &err),
                }
                self.refresh_tasks(rt);
            }

            Command::ToggleComplete { task } => {
                if let Err(err) = rt.block_on(ops::toggle_complete(&*self.backend, &task, now)) {
                    self.fail("update task", &err);
                }
                self.settle(rt, task.id);
            }

            Command::RenameTask { task_id, title } => {
                if let Err(err) =
                    rt.block_on(ops::rename_task(&*self.backend, &task_id, &title, now))
                {
                    self.fail("update task", &err);
                }
                self.settle(rt, task_id);
            }

            Command::SetDeadline { task_id, deadline } => {
                if let Err(err) =
                    rt.block_on(ops::set_deadline(&*self.backend, &task_id, deadline, now))
                {
                    self.fail("set deadline", &err);
                }
                self.settle(rt, task_id);
            }

            Command::DeleteTask { task_id } => {
                if let Err(err) = rt.block_on(ops::delete_task(&*self.backend, &task_id)) {
                    self.fail("delete task", &err);
                }
                self.settle(rt, task_id);
            }

            Command::CreateTag { name, color } => {
                let result = self.user_id().and_then(|user_id| {
                    rt.block_on(tags::create_tag(&*self.backend, &user_id, &name, &color, now))
                });
                if let Err(err) = result {
                    self.fail("create tag", &err);
                }
                self.refresh_tags(rt);
            }

            Command::UpdateTag { tag_id, name, color } => {
                if let Err(err) = rt.block_on(tags::update_tag(
                    &*self.backend,
                    &tag_id,
                    name.as_deref(),
                    color.as_deref(),
                    now,
                )) {
                    self.fail("update tag", &err);
                }
                self.refresh_tags(rt);
            }

            Command::DeleteTag { tag_id } => {
                if let Err(err) = rt.block_on(tags::delete_tag(&*self.backend, &tag_id)) {
                    self.fail("delete tag", &err);
                }
                self.refresh_tags(rt);
            }

            Command::ReplaceTaskTags { task_id, tag_ids } => {
                if let Err(err) =
                    rt.block_on(tags::replace_task_tags(&*self.backend, &task_id, &tag_ids, now))
                {
                    self.fail("update task tags", &err);
                }
                self.settle(rt, task_id);
            }

            Command::LoadTaskTags { task_id } => {
                match rt.block_on(self.backend.list_task_associations(&task_id)) {
                    Ok(associations) => self.send(Event::TaskTags {
                        task_id,
                        tag_ids: associations
                            .into_iter()
                            .map(|association| association.tag_id)
                            .collect(),
                    }),
                    Err(err) => self.fail("load task tags", &err),
                }
            }

            Command::Transcribe { audio } => {
                match rt.block_on(self.backend.transcribe(&audio, &self.language)) {
                    Ok(text) => {
                        let text = text.trim().to_string();
                        if text.is_empty() {
                            self.fail("transcribe", &Error::NoSpeech);
                        } else {
                            self.send(Event::Transcribed { text });
                        }
                    }
                    Err(err) => self.fail("transcribe", &err),
                }
            }

            Command::Shutdown => {}
        }
    }

    fn user_id(&self) -> Result<String> {
        self.user_id.clone().ok_or(Error::NotSignedIn)
    }

    /// Mutations are followed by a full list re-fetch before the next
    /// command is taken.
    fn settle(&self, rt: &Runtime, task_id: String) {
        self.refresh_tasks(rt);
        self.send(Event::OpSettled { task_id });
    }

    fn refresh_tasks(&self, rt: &Runtime) {
        let Ok(user_id) = self.user_id() else {
            return;
        };
        match rt.block_on(ops::load_tasks(&*self.backend, &user_id)) {
            Ok(rows) => self.send(Event::Tasks(rows)),
            Err(err) => self.fail("load tasks", &err),
        }
    }

    fn refresh_tags(&self, rt: &Runtime) {
        let Ok(user_id) = self.user_id() else {
            return;
        };
        match rt.block_on(tags::load_tags(&*self.backend, &user_id)) {
            Ok(rows) => self.send(Event::Tags(rows)),
            Err(err) => self.fail("load tags", &err),
        }
    }

    fn fail(&self, action: &'static str, err: &Error) {
        if err.is_validation() {
            warn!(action, error = %err, "rejected before any round trip");
        } else {
            error!(action, error = %err, "operation failed");
        }
        self.send(Event::Failed {
            action,
            message: err.to_string(),
        });
    }

    fn send(&self, event: Event) {
        // The shell may already be gone during teardown.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::{MemoryBackend, User};

    use super::{Command, Event, spawn};

    fn test_user() -> User {
        User {
            id: "user_1".to_string(),
            email: Some("ada@example.com".to_string()),
        }
    }

    fn next(events: &std::sync::mpsc::Receiver<Event>) -> Event {
        events
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should keep emitting events")
    }

    #[test]
    fn startup_resolves_auth_then_loads_collections() {
        let backend = Arc::new(MemoryBackend::new(test_user()));
        let handle = spawn(backend, "en".to_string()).expect("spawn worker");

        let Event::Auth(loading) = next(&handle.events) else {
            panic!("expected loading auth state first");
        };
        assert!(loading.is_loading);

        let Event::Auth(resolved) = next(&handle.events) else {
            panic!("expected resolved auth state");
        };
        assert_eq!(resolved.user, Some(test_user()));

        let Event::Tasks(tasks) = next(&handle.events) else {
            panic!("expected initial task list");
        };
        assert!(tasks.is_empty());

        let Event::Tags(tags) = next(&handle.events) else {
            panic!("expected initial tag list");
        };
        assert!(tags.is_empty());

        handle.shutdown();
    }

    #[test]
    fn create_task_emits_banner_then_refreshed_list() {
        let backend = Arc::new(MemoryBackend::new(test_user()));
        let handle = spawn(backend, "en".to_string()).expect("spawn worker");

        // Skip the startup sequence.
        for _ in 0..4 {
            next(&handle.events);
        }

        handle
            .commands
            .send(Command::CreateTask {
                title: "Buy milk".to_string(),
            })
            .expect("send command");

        assert!(matches!(next(&handle.events), Event::TaskCreated));
        let Event::Tasks(tasks) = next(&handle.events) else {
            panic!("expected refreshed task list");
        };
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");

        handle.shutdown();
    }

    #[test]
    fn empty_title_fails_without_persisting() {
        let backend = Arc::new(MemoryBackend::new(test_user()));
        let handle = spawn(backend, "en".to_string()).expect("spawn worker");
        for _ in 0..4 {
            next(&handle.events);
        }

        handle
            .commands
            .send(Command::CreateTask {
                title: "   ".to_string(),
            })
            .expect("send command");

        let Event::Failed { action, .. } = next(&handle.events) else {
            panic!("expected validation failure");
        };
        assert_eq!(action, "create task");

        let Event::Tasks(tasks) = next(&handle.events) else {
            panic!("expected refreshed task list");
        };
        assert!(tasks.is_empty());

        handle.shutdown();
    }
}
