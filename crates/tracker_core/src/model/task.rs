use time::OffsetDateTime;

/// A to-do item. `done` is derived from `completed_at`, so a task is done
/// exactly when it carries a completion timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    text: String,
    created_at: OffsetDateTime,
    completed_at: Option<OffsetDateTime>,
}

impl Task {
    /// Returns `None` when `text` is empty after trimming.
    pub fn new(text: &str, created_at: OffsetDateTime) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self {
            text: trimmed.to_string(),
            created_at,
            completed_at: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.completed_at
    }

    /// Flips completion, stamping `at` when the task becomes done.
    pub fn toggled(&self, at: OffsetDateTime) -> Self {
        let completed_at = match self.completed_at {
            Some(_) => None,
            None => Some(at),
        };

        Self {
            text: self.text.clone(),
            created_at: self.created_at,
            completed_at,
        }
    }
}
