use ratatui::Frame;

use crate::{ui::results_table::render_results_table, App, AppState};

/// A UI screen boundary: one per [`AppState`]
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Playfield screen, drawn by the `App` widget
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_results_table(app, f);
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
