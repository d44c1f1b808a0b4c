use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use tracing::{debug, warn};

use murmur_core::backend::AuthState;
use murmur_core::filter::{self, Selector};
use murmur_core::settings::Settings;
use murmur_core::tag::{TAG_PALETTE, Tag};
use murmur_core::task::Task;
use murmur_core::worker::{Command, Event};

/// How long the create-success banner stays up.
pub const BANNER_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Voice,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagManagerMode {
    List,
    Create,
    Rename,
    Recolor,
}

#[derive(Debug, Clone)]
pub struct TagManagerState {
    pub mode: TagManagerMode,
    pub selected: usize,
    pub name_buffer: String,
    pub color_index: usize,
}

impl TagManagerState {
    pub fn new() -> Self {
        Self {
            mode: TagManagerMode::List,
            selected: 0,
            name_buffer: String::new(),
            color_index: 0,
        }
    }
}

impl Default for TagManagerState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct TagPickerState {
    pub task_id: String,
    pub selected: usize,
    /// None until the worker reports the task's current tag set.
    pub chosen: Option<HashSet<String>>,
}

#[derive(Debug, Clone)]
pub struct SettingsState {
    pub field: usize,
    pub api_key_buffer: String,
    pub show_key: bool,
    pub ai_enabled: bool,
    pub dark_theme: bool,
}

pub const SETTINGS_FIELDS: usize = 4; // api key, ai toggle, theme, save

#[derive(Debug, Clone)]
pub enum Modal {
    ConfirmDeleteTask { task_id: String, title: String },
    ConfirmDeleteTag { tag_id: String, name: String },
    EditTitle { task_id: String, buffer: String },
    DeadlinePicker { task_id: String, has_deadline: bool, index: usize },
    TagManager(TagManagerState),
    TagPicker(TagPickerState),
    Settings(SettingsState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineChoice {
    Today,
    Tomorrow,
    NextWeek,
    Remove,
}

impl DeadlineChoice {
    pub fn options(has_deadline: bool) -> Vec<DeadlineChoice> {
        let mut options = vec![
            DeadlineChoice::Today,
            DeadlineChoice::Tomorrow,
            DeadlineChoice::NextWeek,
        ];
        if has_deadline {
            options.push(DeadlineChoice::Remove);
        }
        options
    }

    pub fn label(self) -> &'static str {
        match self {
            DeadlineChoice::Today => "Today",
            DeadlineChoice::Tomorrow => "Tomorrow",
            DeadlineChoice::NextWeek => "Next week",
            DeadlineChoice::Remove => "Remove deadline",
        }
    }

    /// Chosen deadlines land on local end of day, like the original
    /// picker.
    pub fn resolve(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            DeadlineChoice::Today => 0,
            DeadlineChoice::Tomorrow => 1,
            DeadlineChoice::NextWeek => 7,
            DeadlineChoice::Remove => return None,
        };
        Some(end_of_local_day(now, days))
    }
}

fn end_of_local_day(now: DateTime<Utc>, days_ahead: i64) -> DateTime<Utc> {
    let date = now.with_timezone(&Local).date_naive() + ChronoDuration::days(days_ahead);
    date.and_hms_opt(23, 59, 59)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(now)
}

pub struct App {
    pub running: bool,

    pub auth: AuthState,

    /// Full list, newest first, as the backend returned it.
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,

    pub selector: Selector,
    /// Filter-engine output; kept unchanged while a tag membership
    /// lookup is outstanding or has failed.
    pub visible: Vec<Task>,
    tag_members: HashMap<String, HashSet<String>>,

    /// Rows with an operation in flight are not interactive.
    pub in_flight: HashSet<String>,
    pub creating: bool,
    pub transcribing: bool,

    pub selected: usize,
    pub sidebar_open: bool,
    pub sidebar_index: usize,

    pub input_mode: InputMode,
    pub input: String,
    pub input_focused: bool,

    pub modal: Option<Modal>,
    /// Blocking alert; rendered above everything until dismissed.
    pub alert: Option<String>,
    banner_until: Option<Instant>,

    pub settings: Settings,

    commands: Sender<Command>,
}

impl App {
    pub fn new(commands: Sender<Command>, settings: Settings) -> Self {
        let input_mode = if settings.ai_enabled {
            InputMode::Voice
        } else {
            InputMode::Text
        };
        Self {
            running: true,
            auth: AuthState::loading(),
            tasks: Vec::new(),
            tags: Vec::new(),
            selector: Selector::All,
            visible: Vec::new(),
            tag_members: HashMap::new(),
            in_flight: HashSet::new(),
            creating: false,
            transcribing: false,
            selected: 0,
            sidebar_open: false,
            sidebar_index: 0,
            input_mode,
            input: String::new(),
            input_focused: false,
            modal: None,
            alert: None,
            banner_until: None,
            settings,
            commands,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn dispatch(&self, command: Command) {
        // The worker outlives the loop; a send can only fail during
        // teardown.
        if self.commands.send(command).is_err() {
            warn!("backend worker is gone, dropping command");
        }
    }

    /// Fold one worker event into the shell state.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Auth(state) => {
                self.auth = state;
            }

            Event::Tasks(rows) => {
                self.tasks = rows;
                self.refresh_visible();
            }

            Event::Tags(rows) => {
                self.tags = rows;
                // The active tag filter may just have been deleted.
                if let Some(tag_id) = self.selector.tag_id() {
                    if !self.tags.iter().any(|tag| tag.id == tag_id) {
                        self.selector = Selector::All;
                        self.refresh_visible();
                    }
                }
                self.clamp_sidebar();
            }

            Event::TagMembers { tag_id, members } => {
                self.tag_members.insert(tag_id, members);
                self.refresh_visible();
            }

            Event::TaskTags { task_id, tag_ids } => {
                if let Some(Modal::TagPicker(picker)) = &mut self.modal {
                    if picker.task_id == task_id {
                        picker.chosen = Some(tag_ids);
                    }
                }
            }

            Event::TaskCreated => {
                self.creating = false;
                self.banner_until = Some(Instant::now() + BANNER_DURATION);
            }

            Event::OpSettled { task_id } => {
                self.in_flight.remove(&task_id);
                // Membership may have changed under a tag filter.
                if self.selector.tag_id().is_some() {
                    self.dispatch(Command::Select(self.selector.clone()));
                }
            }

            Event::Transcribed { text } => {
                self.transcribing = false;
                self.creating = true;
                self.dispatch(Command::CreateTask { title: text });
            }

            Event::Failed { action, message } => {
                debug!(action, message = %message, "surfacing failure alert");
                self.creating = false;
                self.transcribing = false;
                self.alert = Some(format!("Failed to {action}: {message}"));
            }
        }
    }

    /// Per-frame upkeep: expire the success banner.
    pub fn tick(&mut self) {
        if let Some(until) = self.banner_until {
            if Instant::now() >= until {
                self.banner_until = None;
            }
        }
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_until.is_some()
    }

    #[cfg(test)]
    pub fn force_banner_expiry(&mut self) {
        self.banner_until = Some(Instant::now() - Duration::from_millis(1));
    }

    pub fn select_filter(&mut self, selector: Selector) {
        debug!(filter = %selector.label(), "filter selected");
        if let Some(tag_id) = selector.tag_id() {
            if !self.tag_members.contains_key(tag_id) {
                self.dispatch(Command::Select(selector.clone()));
            }
        }
        self.selector = selector;
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        let now = Utc::now();
        let members = self
            .selector
            .tag_id()
            .and_then(|tag_id| self.tag_members.get(tag_id));
        if let Some(rows) = filter::visible(&self.tasks, &self.selector, members, now) {
            self.visible = rows;
        }
        let total = self.rows().len();
        if self.selected >= total {
            self.selected = total.saturating_sub(1);
        }
    }

    /// Display order: open tasks first, then completed, preserving the
    /// engine's order within each section.
    pub fn rows(&self) -> Vec<&Task> {
        self.visible
            .iter()
            .filter(|task| !task.is_completed())
            .chain(self.visible.iter().filter(|task| task.is_completed()))
            .collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.rows().get(self.selected).copied()
    }

    pub fn is_row_busy(&self, task: &Task) -> bool {
        self.in_flight.contains(&task.id)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_completed()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed()).count()
    }

    pub fn completion_rate(&self) -> u32 {
        if self.tasks.is_empty() {
            return 0;
        }
        (self.completed_count() * 100 / self.tasks.len()) as u32
    }

    /// Sidebar entries: the five navigation filters, then one per tag.
    pub fn sidebar_entries(&self) -> Vec<Selector> {
        let mut entries = vec![
            Selector::All,
            Selector::Pending,
            Selector::Completed,
            Selector::Today,
            Selector::Overdue,
        ];
        entries.extend(self.tags.iter().map(|tag| Selector::Tag {
            id: tag.id.clone(),
            name: tag.name.clone(),
        }));
        entries
    }

    fn clamp_sidebar(&mut self) {
        let total = self.sidebar_entries().len();
        if self.sidebar_index >= total {
            self.sidebar_index = total.saturating_sub(1);
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let total = self.rows().len();
        if total == 0 {
            return;
        }
        let current = self.selected as isize;
        self.selected = (current + delta).clamp(0, total as isize - 1) as usize;
    }

    /// Space on the selected row. Skips rows with an operation already in
    /// flight.
    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if self.is_row_busy(task) {
            return;
        }
        let task = task.clone();
        self.in_flight.insert(task.id.clone());
        self.dispatch(Command::ToggleComplete { task });
    }

    /// Enter in the input bar. Text mode submits a title; voice mode
    /// submits the path of a recorded audio file.
    pub fn submit_input(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        match self.input_mode {
            InputMode::Text => {
                if self.creating {
                    return;
                }
                self.creating = true;
                self.dispatch(Command::CreateTask { title: text });
            }
            InputMode::Voice => {
                if self.transcribing {
                    return;
                }
                self.transcribing = true;
                self.dispatch(Command::Transcribe { audio: text.into() });
            }
        }
        self.input.clear();
    }

    pub fn toggle_input_mode(&mut self) {
        self.input_mode = match self.input_mode {
            InputMode::Voice => InputMode::Text,
            InputMode::Text if self.settings.ai_enabled => InputMode::Voice,
            InputMode::Text => InputMode::Text,
        };
    }

    pub fn open_tag_picker(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if self.is_row_busy(task) {
            return;
        }
        let task_id = task.id.clone();
        self.dispatch(Command::LoadTaskTags {
            task_id: task_id.clone(),
        });
        self.modal = Some(Modal::TagPicker(TagPickerState {
            task_id,
            selected: 0,
            chosen: None,
        }));
    }

    pub fn open_settings(&mut self) {
        self.modal = Some(Modal::Settings(SettingsState {
            field: 0,
            api_key_buffer: self.settings.transcription_api_key.clone(),
            show_key: false,
            ai_enabled: self.settings.ai_enabled,
            dark_theme: self.settings.dark_theme,
        }));
    }

    pub fn save_settings(&mut self, state: &SettingsState) {
        self.settings.transcription_api_key = state.api_key_buffer.clone();
        self.settings.ai_enabled = state.ai_enabled;
        self.settings.dark_theme = state.dark_theme;
        if !self.settings.ai_enabled && self.input_mode == InputMode::Voice {
            self.input_mode = InputMode::Text;
        }
        match self.settings.save(None) {
            Ok(()) => self.alert = Some("Settings saved successfully!".to_string()),
            Err(err) => self.alert = Some(format!("Failed to save settings: {err:#}")),
        }
    }

    pub fn palette_color(index: usize) -> &'static str {
        TAG_PALETTE[index % TAG_PALETTE.len()]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::mpsc;

    use chrono::Utc;

    use murmur_core::filter::Selector;
    use murmur_core::settings::Settings;
    use murmur_core::task::{CompletionFlag, Task};
    use murmur_core::worker::{Command, Event};

    use super::{App, InputMode};

    fn app() -> (App, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel();
        (App::new(tx, Settings::default()), rx)
    }

    fn task(title: &str, completed: bool) -> Task {
        let mut task = Task::new("user_1", title, Utc::now());
        if completed {
            task.completed = CompletionFlag::SET;
        }
        task
    }

    #[test]
    fn tasks_event_recomputes_visible_rows() {
        let (mut app, _rx) = app();
        app.apply(Event::Tasks(vec![task("a", false), task("b", true)]));

        assert_eq!(app.visible.len(), 2);
        app.select_filter(Selector::Pending);
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.visible[0].title, "a");
    }

    #[test]
    fn unresolved_tag_filter_keeps_previous_rows() {
        let (mut app, rx) = app();
        app.apply(Event::Tasks(vec![task("a", false)]));
        assert_eq!(app.visible.len(), 1);

        app.select_filter(Selector::Tag {
            id: "tag_x".to_string(),
            name: "errands".to_string(),
        });
        // Lookup not resolved yet: previous rows stay, and the worker was
        // asked to resolve.
        assert_eq!(app.visible.len(), 1);
        assert!(matches!(rx.try_recv(), Ok(Command::Select(_))));

        app.apply(Event::TagMembers {
            tag_id: "tag_x".to_string(),
            members: HashSet::new(),
        });
        assert!(app.visible.is_empty());
    }

    #[test]
    fn deleting_the_filtered_tag_falls_back_to_all() {
        let (mut app, _rx) = app();
        app.select_filter(Selector::Tag {
            id: "tag_x".to_string(),
            name: "errands".to_string(),
        });
        app.apply(Event::Tags(vec![]));
        assert_eq!(app.selector, Selector::All);
    }

    #[test]
    fn busy_rows_are_not_toggled_twice() {
        let (mut app, rx) = app();
        app.apply(Event::Tasks(vec![task("a", false)]));

        app.toggle_selected();
        app.toggle_selected();
        let sent: Vec<Command> = rx.try_iter().collect();
        assert_eq!(
            sent.iter()
                .filter(|command| matches!(command, Command::ToggleComplete { .. }))
                .count(),
            1
        );

        let task_id = app.tasks[0].id.clone();
        app.apply(Event::OpSettled {
            task_id: task_id.clone(),
        });
        assert!(!app.in_flight.contains(&task_id));
    }

    #[test]
    fn banner_expires_after_its_window() {
        let (mut app, _rx) = app();
        app.apply(Event::TaskCreated);
        assert!(app.banner_visible());

        app.force_banner_expiry();
        app.tick();
        assert!(!app.banner_visible());
    }

    #[test]
    fn failure_clears_busy_flags_and_raises_alert() {
        let (mut app, _rx) = app();
        app.creating = true;
        app.transcribing = true;
        app.apply(Event::Failed {
            action: "create task",
            message: "boom".to_string(),
        });

        assert!(!app.creating);
        assert!(!app.transcribing);
        assert!(app.alert.as_deref().is_some_and(|a| a.contains("create task")));
    }

    #[test]
    fn transcription_feeds_task_creation() {
        let (mut app, rx) = app();
        app.apply(Event::Transcribed {
            text: "Buy milk".to_string(),
        });
        assert!(app.creating);
        let Ok(Command::CreateTask { title }) = rx.try_recv() else {
            panic!("expected a create command");
        };
        assert_eq!(title, "Buy milk");
    }

    #[test]
    fn voice_mode_is_gated_by_the_ai_toggle() {
        let (tx, _rx) = mpsc::channel();
        let mut settings = Settings::default();
        settings.ai_enabled = false;
        let mut app = App::new(tx, settings);

        assert_eq!(app.input_mode, InputMode::Text);
        app.toggle_input_mode();
        assert_eq!(app.input_mode, InputMode::Text);
    }
}
