use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::record_id;

/// The fixed swatch palette tags are colored from.
pub const TAG_PALETTE: [&str; 12] = [
    "#6366F1", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#EC4899", "#06B6D4", "#84CC16",
    "#F97316", "#6B7280", "#14B8A6", "#F43F5E",
];

pub fn palette_color(color: &str) -> Result<String> {
    let wanted = color.trim();
    TAG_PALETTE
        .iter()
        .find(|swatch| swatch.eq_ignore_ascii_case(wanted))
        .map(|swatch| swatch.to_string())
        .ok_or_else(|| Error::UnknownColor(color.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: String,

    pub user_id: String,

    pub name: String,

    pub color: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(user_id: &str, name: &str, color: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: record_id("tag"),
            user_id: user_id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TagPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TagPatch {
    pub fn apply(&self, tag: &mut Tag) {
        if let Some(name) = &self.name {
            tag.name = name.clone();
        }
        if let Some(color) = &self.color {
            tag.color = color.clone();
        }
        if let Some(updated_at) = self.updated_at {
            tag.updated_at = updated_at;
        }
    }
}

/// Join row linking one task to one tag. No independent meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskTag {
    pub id: String,

    pub task_id: String,

    pub tag_id: String,

    pub created_at: DateTime<Utc>,
}

impl TaskTag {
    pub fn new(task_id: &str, tag_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: record_id("tasktag"),
            task_id: task_id.to_string(),
            tag_id: tag_id.to_string(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TAG_PALETTE, palette_color};

    #[test]
    fn palette_lookup_is_case_insensitive() {
        let color = palette_color("#ef4444").expect("known swatch");
        assert_eq!(color, "#EF4444");
    }

    #[test]
    fn unknown_colors_are_rejected() {
        assert!(palette_color("#123456").is_err());
        assert!(palette_color("").is_err());
    }

    #[test]
    fn palette_has_no_duplicates() {
        let mut swatches: Vec<&str> = TAG_PALETTE.to_vec();
        swatches.sort_unstable();
        swatches.dedup();
        assert_eq!(swatches.len(), TAG_PALETTE.len());
    }
}
