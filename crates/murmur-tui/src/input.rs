use crossterm::event::{KeyCode, KeyEvent};

use murmur_core::worker::Command;

use crate::app::{
    App, DeadlineChoice, Modal, SettingsState, TagManagerMode, TagManagerState, TagPickerState,
};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // A failure alert blocks everything until dismissed.
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.alert = None;
        }
        return;
    }

    if app.auth.is_loading {
        return;
    }
    if app.auth.user.is_none() {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            app.quit();
        }
        return;
    }

    if app.modal.is_some() {
        handle_modal_key(app, key);
        return;
    }
    if app.sidebar_open {
        handle_sidebar_key(app, key);
        return;
    }
    if app.input_focused {
        handle_input_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('m') => {
            app.sidebar_open = true;
            app.sidebar_index = app
                .sidebar_entries()
                .iter()
                .position(|entry| *entry == app.selector)
                .unwrap_or(0);
        }
        KeyCode::Char('r') => {
            app.dispatch(Command::Refresh);
            app.dispatch(Command::RefreshTags);
        }
        KeyCode::Char('i') | KeyCode::Char('/') => app.input_focused = true,
        KeyCode::Tab => app.toggle_input_mode(),
        KeyCode::Char('g') => app.modal = Some(Modal::TagManager(TagManagerState::new())),
        KeyCode::Char('s') => app.open_settings(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('e') => {
            let target = app
                .selected_task()
                .filter(|task| !app.is_row_busy(task))
                .map(|task| (task.id.clone(), task.title.clone()));
            if let Some((task_id, buffer)) = target {
                app.modal = Some(Modal::EditTitle { task_id, buffer });
            }
        }
        KeyCode::Char('d') => {
            let target = app
                .selected_task()
                .filter(|task| !app.is_row_busy(task))
                .map(|task| (task.id.clone(), task.deadline.is_some()));
            if let Some((task_id, has_deadline)) = target {
                app.modal = Some(Modal::DeadlinePicker {
                    task_id,
                    has_deadline,
                    index: 0,
                });
            }
        }
        KeyCode::Char('t') => app.open_tag_picker(),
        KeyCode::Char('x') | KeyCode::Delete => {
            let target = app
                .selected_task()
                .filter(|task| !app.is_row_busy(task))
                .map(|task| (task.id.clone(), task.title.clone()));
            if let Some((task_id, title)) = target {
                app.modal = Some(Modal::ConfirmDeleteTask { task_id, title });
            }
        }
        _ => {}
    }
}

fn handle_sidebar_key(app: &mut App, key: KeyEvent) {
    let entries = app.sidebar_entries();
    match key.code {
        KeyCode::Esc | KeyCode::Char('m') => app.sidebar_open = false,
        KeyCode::Up | KeyCode::Char('k') => {
            app.sidebar_index = app.sidebar_index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.sidebar_index + 1 < entries.len() {
                app.sidebar_index += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(selector) = entries.get(app.sidebar_index) {
                app.select_filter(selector.clone());
            }
            app.sidebar_open = false;
        }
        _ => {}
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_focused = false,
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Tab => app.toggle_input_mode(),
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) {
    let Some(modal) = app.modal.take() else {
        return;
    };

    match modal {
        Modal::ConfirmDeleteTask { task_id, title } => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                app.in_flight.insert(task_id.clone());
                app.dispatch(Command::DeleteTask { task_id });
            }
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => app.modal = Some(Modal::ConfirmDeleteTask { task_id, title }),
        },

        Modal::ConfirmDeleteTag { tag_id, name } => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                app.dispatch(Command::DeleteTag { tag_id });
            }
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => app.modal = Some(Modal::ConfirmDeleteTag { tag_id, name }),
        },

        Modal::EditTitle { task_id, mut buffer } => match key.code {
            KeyCode::Enter => {
                app.in_flight.insert(task_id.clone());
                app.dispatch(Command::RenameTask {
                    task_id,
                    title: buffer,
                });
            }
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                buffer.pop();
                app.modal = Some(Modal::EditTitle { task_id, buffer });
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                app.modal = Some(Modal::EditTitle { task_id, buffer });
            }
            _ => app.modal = Some(Modal::EditTitle { task_id, buffer }),
        },

        Modal::DeadlinePicker {
            task_id,
            has_deadline,
            mut index,
        } => {
            let options = DeadlineChoice::options(has_deadline);
            match key.code {
                KeyCode::Enter => {
                    if let Some(choice) = options.get(index) {
                        app.in_flight.insert(task_id.clone());
                        app.dispatch(Command::SetDeadline {
                            task_id,
                            deadline: choice.resolve(chrono::Utc::now()),
                        });
                    }
                }
                KeyCode::Esc => {}
                KeyCode::Up | KeyCode::Char('k') => {
                    index = index.saturating_sub(1);
                    app.modal = Some(Modal::DeadlinePicker {
                        task_id,
                        has_deadline,
                        index,
                    });
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if index + 1 < options.len() {
                        index += 1;
                    }
                    app.modal = Some(Modal::DeadlinePicker {
                        task_id,
                        has_deadline,
                        index,
                    });
                }
                _ => {
                    app.modal = Some(Modal::DeadlinePicker {
                        task_id,
                        has_deadline,
                        index,
                    });
                }
            }
        }

        Modal::TagManager(state) => handle_tag_manager_key(app, state, key),

        Modal::TagPicker(state) => handle_tag_picker_key(app, state, key),

        Modal::Settings(state) => handle_settings_key(app, state, key),
    }
}

fn handle_tag_manager_key(app: &mut App, mut state: TagManagerState, key: KeyEvent) {
    let tag_count = app.tags.len();
    if state.selected >= tag_count {
        state.selected = tag_count.saturating_sub(1);
    }

    match state.mode {
        TagManagerMode::List => match key.code {
            KeyCode::Esc => return,
            KeyCode::Up | KeyCode::Char('k') => state.selected = state.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if state.selected + 1 < tag_count {
                    state.selected += 1;
                }
            }
            KeyCode::Char('n') => {
                state.mode = TagManagerMode::Create;
                state.name_buffer.clear();
                state.color_index = 0;
            }
            KeyCode::Char('e') => {
                if let Some(tag) = app.tags.get(state.selected) {
                    state.name_buffer = tag.name.clone();
                    state.mode = TagManagerMode::Rename;
                }
            }
            KeyCode::Char('c') => {
                if let Some(tag) = app.tags.get(state.selected) {
                    state.color_index = murmur_core::tag::TAG_PALETTE
                        .iter()
                        .position(|swatch| swatch.eq_ignore_ascii_case(&tag.color))
                        .unwrap_or(0);
                    state.mode = TagManagerMode::Recolor;
                }
            }
            KeyCode::Char('x') => {
                if let Some(tag) = app.tags.get(state.selected) {
                    app.modal = Some(Modal::ConfirmDeleteTag {
                        tag_id: tag.id.clone(),
                        name: tag.name.clone(),
                    });
                    return;
                }
            }
            _ => {}
        },

        TagManagerMode::Create => match key.code {
            KeyCode::Esc => state.mode = TagManagerMode::List,
            KeyCode::Enter => {
                // Validation (empty name) happens before any network
                // call and comes back as an alert.
                app.dispatch(Command::CreateTag {
                    name: state.name_buffer.clone(),
                    color: App::palette_color(state.color_index).to_string(),
                });
                state.mode = TagManagerMode::List;
            }
            KeyCode::Left => {
                state.color_index = state
                    .color_index
                    .checked_sub(1)
                    .unwrap_or(murmur_core::tag::TAG_PALETTE.len() - 1);
            }
            KeyCode::Right => {
                state.color_index = (state.color_index + 1) % murmur_core::tag::TAG_PALETTE.len();
            }
            KeyCode::Backspace => {
                state.name_buffer.pop();
            }
            KeyCode::Char(c) => state.name_buffer.push(c),
            _ => {}
        },

        TagManagerMode::Rename => match key.code {
            KeyCode::Esc => state.mode = TagManagerMode::List,
            KeyCode::Enter => {
                if let Some(tag) = app.tags.get(state.selected) {
                    app.dispatch(Command::UpdateTag {
                        tag_id: tag.id.clone(),
                        name: Some(state.name_buffer.clone()),
                        color: None,
                    });
                }
                state.mode = TagManagerMode::List;
            }
            KeyCode::Backspace => {
                state.name_buffer.pop();
            }
            KeyCode::Char(c) => state.name_buffer.push(c),
            _ => {}
        },

        TagManagerMode::Recolor => match key.code {
            KeyCode::Esc => state.mode = TagManagerMode::List,
            KeyCode::Enter => {
                if let Some(tag) = app.tags.get(state.selected) {
                    app.dispatch(Command::UpdateTag {
                        tag_id: tag.id.clone(),
                        name: None,
                        color: Some(App::palette_color(state.color_index).to_string()),
                    });
                }
                state.mode = TagManagerMode::List;
            }
            KeyCode::Left => {
                state.color_index = state
                    .color_index
                    .checked_sub(1)
                    .unwrap_or(murmur_core::tag::TAG_PALETTE.len() - 1);
            }
            KeyCode::Right => {
                state.color_index = (state.color_index + 1) % murmur_core::tag::TAG_PALETTE.len();
            }
            _ => {}
        },
    }

    app.modal = Some(Modal::TagManager(state));
}

fn handle_tag_picker_key(app: &mut App, mut state: TagPickerState, key: KeyEvent) {
    let tag_count = app.tags.len();
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Up | KeyCode::Char('k') => state.selected = state.selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected + 1 < tag_count {
                state.selected += 1;
            }
        }
        KeyCode::Char(' ') => {
            if let (Some(chosen), Some(tag)) = (&mut state.chosen, app.tags.get(state.selected)) {
                if !chosen.remove(&tag.id) {
                    chosen.insert(tag.id.clone());
                }
            }
        }
        KeyCode::Enter => {
            if let Some(chosen) = state.chosen {
                app.in_flight.insert(state.task_id.clone());
                app.dispatch(Command::ReplaceTaskTags {
                    task_id: state.task_id,
                    tag_ids: chosen.into_iter().collect(),
                });
            }
            return;
        }
        _ => {}
    }
    app.modal = Some(Modal::TagPicker(state));
}

fn handle_settings_key(app: &mut App, mut state: SettingsState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Up => state.field = state.field.saturating_sub(1),
        KeyCode::Down => {
            if state.field + 1 < crate::app::SETTINGS_FIELDS {
                state.field += 1;
            }
        }
        KeyCode::Tab if state.field == 0 => state.show_key = !state.show_key,
        KeyCode::Backspace if state.field == 0 => {
            state.api_key_buffer.pop();
        }
        KeyCode::Char(' ') if state.field == 1 => state.ai_enabled = !state.ai_enabled,
        KeyCode::Char(' ') if state.field == 2 => state.dark_theme = !state.dark_theme,
        KeyCode::Enter => match state.field {
            1 => state.ai_enabled = !state.ai_enabled,
            2 => state.dark_theme = !state.dark_theme,
            3 => {
                app.save_settings(&state);
                return;
            }
            _ => {}
        },
        KeyCode::Char(c) if state.field == 0 => state.api_key_buffer.push(c),
        _ => {}
    }
    app.modal = Some(Modal::Settings(state));
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crossterm::event::{KeyCode, KeyEvent};

    use murmur_core::backend::{AuthState, User};
    use murmur_core::settings::Settings;
    use murmur_core::task::Task;
    use murmur_core::worker::{Command, Event};

    use crate::app::{App, Modal};

    use super::handle_key;

    fn signed_in_app() -> (App, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(tx, Settings::default());
        app.apply(Event::Auth(AuthState::signed_in(User {
            id: "user_1".to_string(),
            email: None,
        })));
        (app, rx)
    }

    #[test]
    fn alert_blocks_every_other_key() {
        let (mut app, rx) = signed_in_app();
        app.alert = Some("Failed to create task".to_string());

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('q')));
        assert!(app.running, "alert must swallow the quit key");

        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));
        assert!(app.alert.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut app, rx) = signed_in_app();
        app.apply(Event::Tasks(vec![Task::new(
            "user_1",
            "doomed",
            chrono::Utc::now(),
        )]));

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('x')));
        assert!(matches!(app.modal, Some(Modal::ConfirmDeleteTask { .. })));
        assert!(rx.try_recv().is_err(), "nothing deleted before confirmation");

        handle_key(&mut app, KeyEvent::from(KeyCode::Esc));
        assert!(app.modal.is_none());
        assert!(rx.try_recv().is_err(), "cancel must not delete");

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('x')));
        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));
        assert!(matches!(rx.try_recv(), Ok(Command::DeleteTask { .. })));
    }

    #[test]
    fn refresh_refetches_both_collections() {
        let (mut app, rx) = signed_in_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('r')));
        let sent: Vec<Command> = rx.try_iter().collect();
        assert!(sent.iter().any(|c| matches!(c, Command::Refresh)));
        assert!(sent.iter().any(|c| matches!(c, Command::RefreshTags)));
    }

    #[test]
    fn text_submit_sends_create_and_clears_input() {
        let (mut app, rx) = signed_in_app();
        app.toggle_input_mode(); // voice -> text
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('i')));
        for c in "Buy milk".chars() {
            handle_key(&mut app, KeyEvent::from(KeyCode::Char(c)));
        }
        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));

        let Ok(Command::CreateTask { title }) = rx.try_recv() else {
            panic!("expected create command");
        };
        assert_eq!(title, "Buy milk");
        assert!(app.input.is_empty());
        assert!(app.creating);
    }
}
