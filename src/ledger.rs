use itertools::Itertools;

use crate::question::QuestionSet;

/// What a call to [`ScoringLedger::select`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Recorded { correct: bool },
    AlreadyAnswered,
    OutOfRange,
}

/// Selected answer per question index plus the running score.
///
/// A question counts as answered once it has an entry; later selections for
/// the same index are ignored, so each question scores at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringLedger {
    selections: Vec<Option<String>>,
    score: u32,
}

impl ScoringLedger {
    pub fn new(len: usize) -> Self {
        Self {
            selections: vec![None; len],
            score: 0,
        }
    }

    pub fn select(
        &mut self,
        questions: &QuestionSet,
        index: usize,
        answer: &str,
    ) -> SelectOutcome {
        let (Some(question), Some(slot)) = (questions.get(index), self.selections.get_mut(index))
        else {
            return SelectOutcome::OutOfRange;
        };
        if slot.is_some() {
            return SelectOutcome::AlreadyAnswered;
        }
        *slot = Some(answer.to_string());
        let correct = question.is_correct(answer);
        if correct {
            self.score += 1;
        }
        SelectOutcome::Recorded { correct }
    }

    pub fn is_answered(&self, index: usize) -> bool {
        matches!(self.selections.get(index), Some(Some(_)))
    }

    pub fn selection(&self, index: usize) -> Option<&str> {
        self.selections.get(index).and_then(|s| s.as_deref())
    }

    /// The selection record, indexed by question order
    pub fn selections(&self) -> &[Option<String>] {
        &self.selections
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answered_count(&self) -> usize {
        self.selections.iter().flatten().count()
    }

    pub fn unanswered(&self) -> Vec<usize> {
        self.selections.iter().positions(Option::is_none).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Question;
    use assert_matches::assert_matches;

    fn two_plus_two() -> QuestionSet {
        QuestionSet::new(vec![Question::new("2+2?", "4", ["3", "5", "6"])])
    }

    fn three_questions() -> QuestionSet {
        QuestionSet::new(vec![
            Question::new("2+2?", "4", ["3", "5", "6"]),
            Question::new("Capital of France?", "Paris", ["Rome", "Berlin", "Madrid"]),
            Question::new("Largest planet?", "Jupiter", ["Mars", "Venus", "Earth"]),
        ])
    }

    #[test]
    fn correct_selection_scores() {
        let set = two_plus_two();
        let mut ledger = ScoringLedger::new(set.len());
        assert_matches!(
            ledger.select(&set, 0, "4"),
            SelectOutcome::Recorded { correct: true }
        );
        assert_eq!(ledger.score(), 1);
        assert_eq!(ledger.selections(), &[Some("4".to_string())]);
    }

    #[test]
    fn second_selection_is_ignored() {
        let set = two_plus_two();
        let mut ledger = ScoringLedger::new(set.len());
        assert_matches!(
            ledger.select(&set, 0, "3"),
            SelectOutcome::Recorded { correct: false }
        );
        assert_matches!(ledger.select(&set, 0, "4"), SelectOutcome::AlreadyAnswered);
        assert_eq!(ledger.score(), 0);
        assert_eq!(ledger.selection(0), Some("3"));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let set = two_plus_two();
        let mut ledger = ScoringLedger::new(set.len());
        assert_matches!(ledger.select(&set, 1, "4"), SelectOutcome::OutOfRange);
        assert_eq!(ledger.answered_count(), 0);
    }

    #[test]
    fn answered_flag_follows_the_record() {
        let set = three_questions();
        let mut ledger = ScoringLedger::new(set.len());
        ledger.select(&set, 1, "Paris");
        assert!(!ledger.is_answered(0));
        assert!(ledger.is_answered(1));
        assert!(!ledger.is_answered(2));
        assert_eq!(ledger.unanswered(), vec![0, 2]);
    }

    #[test]
    fn score_matches_correct_selection_count() {
        let set = three_questions();
        let mut ledger = ScoringLedger::new(set.len());
        ledger.select(&set, 0, "4");
        ledger.select(&set, 1, "Rome");
        ledger.select(&set, 2, "Jupiter");
        ledger.select(&set, 1, "Paris");

        let expected = ledger
            .selections()
            .iter()
            .zip(set.iter())
            .filter(|(sel, q)| sel.as_deref() == Some(q.correct_answer.as_str()))
            .count();
        assert_eq!(ledger.score() as usize, expected);
        assert_eq!(ledger.score(), 2);
        assert_eq!(ledger.answered_count(), 3);
    }
}
