use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::question::Question;

/// Produces a fresh random answer order each time a question is shown.
#[derive(Debug, Clone)]
pub struct AnswerShuffler {
    rng: StdRng,
}

impl Default for AnswerShuffler {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl AnswerShuffler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible order, for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn shuffle(&mut self, question: &Question) -> Vec<String> {
        let mut answers = question.all_answers();
        answers.shuffle(&mut self.rng);
        answers
    }
}
