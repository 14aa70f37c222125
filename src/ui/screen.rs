use ratatui::Frame;

use crate::{App, ScreenKind};

/// A UI Screen boundary: renders one of the three navigation screens
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Home screen - the grid of sprint cards with progress gauges
pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let body = super::render_chrome(app, f);
        super::render_home(app, f, body);
    }
}

/// Sprint screen - the lesson list for the selected sprint
pub struct SprintScreen;

impl Screen for SprintScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let body = super::render_chrome(app, f);
        super::render_sprint(app, f, body);
    }
}

/// Lesson screen - lesson content plus the diagram and assistant panes
pub struct LessonScreen;

impl Screen for LessonScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let body = super::render_chrome(app, f);
        super::render_lesson(app, f, body);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match app.screen_kind() {
        ScreenKind::Home => Box::new(HomeScreen),
        ScreenKind::Sprint => Box::new(SprintScreen),
        ScreenKind::Lesson => Box::new(LessonScreen),
    }
}
