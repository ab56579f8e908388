use ratatui::Frame;

use crate::{
    ui::{render_empty, render_loading, render_question, render_results},
    App, AppState,
};
use quizr::QuizState;

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Spinner while the question fetch is in flight
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_loading(app, f);
    }
}

/// Shown when no questions could be loaded
pub struct EmptyScreen;

impl Screen for EmptyScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_empty(app, f);
    }
}

pub struct QuestionScreen;

impl Screen for QuestionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_question(app, f);
    }
}

/// Reads back what was submitted and shows the score
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_results(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match (app.state, app.session.state()) {
        (AppState::Results, _) => Box::new(ResultsScreen),
        (AppState::Quiz, QuizState::Loading) => Box::new(LoadingScreen),
        (AppState::Quiz, QuizState::Empty) => Box::new(EmptyScreen),
        (AppState::Quiz, QuizState::Ready(_) | QuizState::Answered(_)) => Box::new(QuestionScreen),
    }
}
