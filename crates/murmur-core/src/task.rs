use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record identifiers are opaque strings with a collection prefix,
/// e.g. `task_6fb2…`.
pub fn record_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Completion state as the store keeps it: a numeric flag, truthy when
/// greater than zero. The wire value may be a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionFlag(pub u8);

impl CompletionFlag {
    pub const SET: CompletionFlag = CompletionFlag(1);
    pub const CLEAR: CompletionFlag = CompletionFlag(0);

    pub fn is_set(self) -> bool {
        self.0 > 0
    }

    pub fn toggled(self) -> Self {
        if self.is_set() { Self::CLEAR } else { Self::SET }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,

    pub user_id: String,

    pub title: String,

    #[serde(with = "completion_flag_serde")]
    pub completed: CompletionFlag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(user_id: &str, title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: record_id("task"),
            user_id: user_id.to_string(),
            title: title.to_string(),
            completed: CompletionFlag::CLEAR,
            deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_set()
    }

    /// Deadline falls on the current calendar date in the local zone.
    pub fn is_due_today(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| {
            deadline.with_timezone(&Local).date_naive() == now.with_timezone(&Local).date_naive()
        })
    }

    /// Deadline instant strictly in the past and the task still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.deadline.is_some_and(|deadline| deadline < now)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        with = "completion_flag_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed: Option<CompletionFlag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<DateTime<Utc>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = updated_at;
        }
    }
}

pub mod completion_flag_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::CompletionFlag;

    pub fn serialize<S>(flag: &CompletionFlag, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if flag.is_set() { "1" } else { "0" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CompletionFlag, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let truthy = match &raw {
            Value::Number(n) => n.as_f64().is_some_and(|n| n > 0.0),
            // Unparseable strings coerce to 0, matching the store's
            // numeric reading of the flag.
            Value::String(s) => s.trim().parse::<f64>().is_ok_and(|n| n > 0.0),
            Value::Bool(b) => *b,
            _ => false,
        };
        Ok(if truthy {
            CompletionFlag::SET
        } else {
            CompletionFlag::CLEAR
        })
    }

    pub mod option {
        use serde::Serializer;

        use super::super::CompletionFlag;

        pub fn serialize<S>(flag: &Option<CompletionFlag>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match flag {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{CompletionFlag, Task};

    fn sample(now: chrono::DateTime<Utc>) -> Task {
        Task::new("user_1", "Buy milk", now)
    }

    #[test]
    fn flag_codec_accepts_strings_and_numbers() {
        for (raw, expected) in [
            (r#""0""#, false),
            (r#""1""#, true),
            ("0", false),
            ("1", true),
            ("2", true),
            (r#""not-a-number""#, false),
        ] {
            let json = format!(
                r#"{{"id":"task_x","user_id":"user_1","title":"t","completed":{raw},
                    "created_at":"2026-03-01T10:00:00Z","updated_at":"2026-03-01T10:00:00Z"}}"#
            );
            let task: Task = serde_json::from_str(&json).expect("task should parse");
            assert_eq!(task.is_completed(), expected, "raw flag {raw}");
        }
    }

    #[test]
    fn flag_serializes_as_string() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).single().expect("timestamp");
        let task = sample(now);
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["completed"], serde_json::json!("0"));
    }

    #[test]
    fn toggle_twice_is_identity() {
        let flag = CompletionFlag::CLEAR;
        assert_eq!(flag.toggled().toggled(), flag);
        assert!(flag.toggled().is_set());
    }

    #[test]
    fn overdue_requires_open_task() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).single().expect("timestamp");
        let mut task = sample(now);
        task.deadline = Some(now - Duration::days(1));
        assert!(task.is_overdue(now));

        task.completed = CompletionFlag::SET;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn due_today_compares_local_calendar_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).single().expect("timestamp");
        let mut task = sample(now);
        assert!(!task.is_due_today(now));

        task.deadline = Some(now);
        assert!(task.is_due_today(now));

        task.deadline = Some(now - Duration::days(3));
        assert!(!task.is_due_today(now));
    }
}
