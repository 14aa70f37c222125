use std::collections::HashSet;

use crate::catalog::Sprint;

/// Session-scoped record of completed lessons. Grows monotonically; there is
/// no un-complete operation and nothing is persisted across sessions.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    completed: HashSet<String>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: marking the same lesson twice is a no-op.
    pub fn mark_completed(&mut self, lesson_id: &str) {
        self.completed.insert(lesson_id.to_string());
    }

    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// How many of this sprint's lessons have been completed.
    pub fn completed_in(&self, sprint: &Sprint) -> usize {
        sprint
            .lessons
            .iter()
            .filter(|l| self.completed.contains(&l.id))
            .count()
    }

    /// Fraction of the sprint's lessons completed, in [0, 1].
    /// A sprint with no lessons reports 0.
    pub fn completion_ratio(&self, sprint: &Sprint) -> f64 {
        if sprint.lessons.is_empty() {
            return 0.0;
        }
        self.completed_in(sprint) as f64 / sprint.lessons.len() as f64
    }
}
