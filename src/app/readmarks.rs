use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::db::Database;

pub(crate) const READ_NEWS_KEY: &str = "read_news";

/// Read tracking: which item ids have been opened at least once. The whole
/// set is serialized to one state key on every mark, matching the stored
/// format `[1,2,3]`.
#[derive(Debug, Default)]
pub(crate) struct ReadMarks {
    ids: HashSet<i64>,
}

#[derive(Debug, Default)]
pub(crate) struct ReadMarksRead {
    pub(crate) marks: ReadMarks,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn load_read_marks(db: &Database) -> ReadMarksRead {
    let raw = match db.get_state(READ_NEWS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ReadMarksRead::default(),
        Err(err) => {
            return ReadMarksRead {
                marks: ReadMarks::default(),
                warnings: vec![format!("failed to read stored read marks: {err}")],
            };
        }
    };

    match parse_read_ids(&raw) {
        Ok(ids) => ReadMarksRead {
            marks: ReadMarks { ids },
            warnings: Vec::new(),
        },
        Err(detail) => ReadMarksRead {
            marks: ReadMarks::default(),
            warnings: vec![format!(
                "stored read marks are unreadable ({detail}); starting with none"
            )],
        },
    }
}

pub(crate) fn parse_read_ids(raw: &str) -> Result<HashSet<i64>, String> {
    serde_json::from_str::<Vec<i64>>(raw)
        .map(HashSet::from_iter)
        .map_err(|err| err.to_string())
}

impl ReadMarks {
    pub(crate) fn is_read(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub(crate) fn count_unread(&self, ids: impl Iterator<Item = i64>) -> usize {
        ids.filter(|id| !self.ids.contains(id)).count()
    }

    /// Marks `id` and persists the full set. Marking an already-read id is
    /// observably a no-op, but the write still happens.
    pub(crate) fn mark_as_read(&mut self, db: &Database, id: i64) -> Result<()> {
        self.ids.insert(id);
        db.set_state(READ_NEWS_KEY, &self.serialize())
            .context("failed to persist read marks")
    }

    pub(crate) fn serialize(&self) -> String {
        let mut sorted: Vec<i64> = self.ids.iter().copied().collect();
        sorted.sort_unstable();
        serde_json::to_string(&sorted).unwrap_or_else(|_| "[]".to_string())
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> &HashSet<i64> {
        &self.ids
    }
}
