//! The quiz session as an explicit state machine.
//!
//! Derived view state (the shuffled answers and whether the current question is
//! answered) is recomputed on every index change rather than cached per
//! question.

use crate::ledger::{ScoringLedger, SelectOutcome};
use crate::pagination::Pager;
use crate::question::{Question, QuestionSet};
use crate::shuffle::AnswerShuffler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Loading,
    Ready(usize),
    Answered(usize),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizInput {
    QuestionsLoaded(QuestionSet),
    LoadFailed,
    SelectAnswer(String),
    Next,
    Back,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    state: QuizState,
    questions: QuestionSet,
    pager: Option<Pager>,
    shuffler: AnswerShuffler,
    answers: Vec<String>,
    ledger: ScoringLedger,
    last_outcome: Option<SelectOutcome>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self::with_shuffler(AnswerShuffler::new())
    }

    pub fn with_shuffler(shuffler: AnswerShuffler) -> Self {
        Self {
            state: QuizState::Loading,
            questions: QuestionSet::default(),
            pager: None,
            shuffler,
            answers: Vec::new(),
            ledger: ScoringLedger::default(),
            last_outcome: None,
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == QuizState::Loading
    }

    pub fn has_questions(&self) -> bool {
        matches!(self.state, QuizState::Ready(_) | QuizState::Answered(_))
    }

    /// Applies one event. Returns true if anything changed.
    pub fn handle(&mut self, input: QuizInput) -> bool {
        match (self.state, input) {
            (QuizState::Loading, QuizInput::QuestionsLoaded(questions)) => {
                self.begin(questions);
                true
            }
            (QuizState::Loading, QuizInput::LoadFailed) => {
                self.state = QuizState::Empty;
                true
            }
            (QuizState::Ready(index), QuizInput::SelectAnswer(answer)) => {
                let outcome = self.ledger.select(&self.questions, index, &answer);
                self.last_outcome = Some(outcome);
                match outcome {
                    SelectOutcome::Recorded { correct } => {
                        tracing::debug!(index, correct, "answer recorded");
                        self.state = QuizState::Answered(index);
                        true
                    }
                    SelectOutcome::AlreadyAnswered | SelectOutcome::OutOfRange => false,
                }
            }
            (QuizState::Ready(_) | QuizState::Answered(_), QuizInput::Next) => {
                self.move_by(Pager::next)
            }
            (QuizState::Ready(_) | QuizState::Answered(_), QuizInput::Back) => {
                self.move_by(Pager::back)
            }
            (state, input) => {
                tracing::trace!(?state, ?input, "ignored quiz input");
                false
            }
        }
    }

    /// Selects the answer shown at `slot` (0-based) of the current view
    pub fn select_slot(&mut self, slot: usize) -> bool {
        match self.answers.get(slot).cloned() {
            Some(answer) => self.handle(QuizInput::SelectAnswer(answer)),
            None => false,
        }
    }

    fn begin(&mut self, questions: QuestionSet) {
        self.ledger = ScoringLedger::new(questions.len());
        self.pager = Pager::new(questions.len());
        self.questions = questions;
        self.last_outcome = None;
        if self.pager.is_some() {
            self.visit();
        } else {
            self.answers.clear();
            self.state = QuizState::Empty;
        }
    }

    fn move_by(&mut self, step: fn(&mut Pager) -> bool) -> bool {
        let moved = self.pager.as_mut().is_some_and(step);
        if moved {
            self.last_outcome = None;
            self.visit();
        }
        moved
    }

    // Reshuffles and re-derives the answered state for the current index.
    fn visit(&mut self) {
        let Some(index) = self.pager.map(|p| p.index()) else {
            return;
        };
        self.answers = match self.questions.get(index) {
            Some(question) => self.shuffler.shuffle(question),
            None => Vec::new(),
        };
        self.state = if self.ledger.is_answered(index) {
            QuizState::Answered(index)
        } else {
            QuizState::Ready(index)
        };
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn current_index(&self) -> Option<usize> {
        self.pager.map(|p| p.index())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    /// Answers of the current question in display order
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn pager(&self) -> Option<&Pager> {
        self.pager.as_ref()
    }

    pub fn ledger(&self) -> &ScoringLedger {
        &self.ledger
    }

    pub fn score(&self) -> u32 {
        self.ledger.score()
    }

    pub fn last_outcome(&self) -> Option<SelectOutcome> {
        self.last_outcome
    }
}
