// Library surface for headless/integration tests and reuse.
// Terminal rendering and the App live in main.rs.
pub mod app_dirs;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod pagination;
pub mod question;
pub mod question_source;
pub mod runtime;
pub mod session;
pub mod shuffle;
pub mod store;
pub mod trivia_api;

pub use error::{FetchError, StoreError};
pub use question::{Question, QuestionSet};
pub use session::{QuizInput, QuizSession, QuizState};
