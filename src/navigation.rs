use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Catalog, Lesson, Sprint};
use crate::progress::Progress;

/// Label shown when nothing is selected.
pub const HOME_LABEL: &str = "All Sprints";

const BREADCRUMB_SEPARATOR: &str = " > ";

#[derive(Debug, Error, PartialEq)]
pub enum NavError {
    #[error("unknown sprint: {0}")]
    SprintNotFound(String),
    #[error("unknown lesson: {0}")]
    LessonNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Prev,
    Next,
}

/// The screen derived from the current selection.
#[derive(Debug)]
pub enum ScreenView<'a> {
    Home,
    SprintView(&'a Sprint),
    LessonView(&'a Sprint, &'a Lesson),
}

/// Current selection within the catalog. The only writer is the event loop;
/// everything the UI shows is derived from this on read.
///
/// Invariant: a selected lesson implies a selected sprint, and the lesson
/// belongs to that sprint. All mutation goes through the transition methods
/// below, which keep the invariant by construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NavState {
    selected_sprint: Option<String>,
    selected_lesson: Option<String>,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_sprint_id(&self) -> Option<&str> {
        self.selected_sprint.as_deref()
    }

    pub fn selected_lesson_id(&self) -> Option<&str> {
        self.selected_lesson.as_deref()
    }

    /// Valid from any state. Clears any selected lesson.
    pub fn select_sprint(&mut self, catalog: &Catalog, sprint_id: &str) -> Result<(), NavError> {
        if catalog.sprint(sprint_id).is_none() {
            return Err(NavError::SprintNotFound(sprint_id.to_string()));
        }
        self.selected_sprint = Some(sprint_id.to_string());
        self.selected_lesson = None;
        Ok(())
    }

    /// Valid once a sprint is selected; the lesson must belong to it.
    pub fn select_lesson(&mut self, catalog: &Catalog, lesson_id: &str) -> Result<(), NavError> {
        let sprint = self
            .selected_sprint
            .as_deref()
            .and_then(|id| catalog.sprint(id))
            .ok_or_else(|| NavError::LessonNotFound(lesson_id.to_string()))?;
        if sprint.lesson(lesson_id).is_none() {
            return Err(NavError::LessonNotFound(lesson_id.to_string()));
        }
        self.selected_lesson = Some(lesson_id.to_string());
        Ok(())
    }

    /// LessonView drops the lesson, SprintView drops the sprint, Home is a no-op.
    pub fn go_back(&mut self) {
        if self.selected_lesson.take().is_none() {
            self.selected_sprint = None;
        }
    }

    /// Step to the previous/next lesson in the sprint's ordered list.
    ///
    /// Moving forward marks the lesson being left as completed; moving back
    /// has no progress side effect. Past either end the call is a silent
    /// no-op: no wraparound, no error, the caller is expected to have
    /// disabled the control. Returns whether the position changed.
    pub fn navigate(
        &mut self,
        catalog: &Catalog,
        progress: &mut Progress,
        direction: Direction,
    ) -> bool {
        let (sprint, lesson) = match self.current(catalog) {
            Some(pair) => pair,
            None => return false,
        };
        let idx = match sprint.lesson_index(&lesson.id) {
            Some(idx) => idx,
            None => return false,
        };

        match direction {
            Direction::Next => {
                if idx + 1 >= sprint.lessons.len() {
                    return false;
                }
                progress.mark_completed(&lesson.id);
                self.selected_lesson = Some(sprint.lessons[idx + 1].id.clone());
                true
            }
            Direction::Prev => {
                if idx == 0 {
                    return false;
                }
                self.selected_lesson = Some(sprint.lessons[idx - 1].id.clone());
                true
            }
        }
    }

    /// Pure derivation of the visible screen.
    pub fn screen<'a>(&self, catalog: &'a Catalog) -> ScreenView<'a> {
        match self.current(catalog) {
            Some((sprint, lesson)) => ScreenView::LessonView(sprint, lesson),
            None => match self
                .selected_sprint
                .as_deref()
                .and_then(|id| catalog.sprint(id))
            {
                Some(sprint) => ScreenView::SprintView(sprint),
                None => ScreenView::Home,
            },
        }
    }

    /// Pure derivation of the header breadcrumb.
    pub fn breadcrumb(&self, catalog: &Catalog) -> String {
        match self.screen(catalog) {
            ScreenView::Home => HOME_LABEL.to_string(),
            ScreenView::SprintView(sprint) => sprint.title.clone(),
            ScreenView::LessonView(sprint, lesson) => {
                format!("{}{}{}", sprint.title, BREADCRUMB_SEPARATOR, lesson.title)
            }
        }
    }

    fn current<'a>(&self, catalog: &'a Catalog) -> Option<(&'a Sprint, &'a Lesson)> {
        let sprint = catalog.sprint(self.selected_sprint.as_deref()?)?;
        let lesson = sprint.lesson(self.selected_lesson.as_deref()?)?;
        Some((sprint, lesson))
    }
}
