use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::ledger::ScoringLedger;
use crate::store::{read_json, write_json, SessionStore, SCORE_KEY, SELECTED_ANSWERS_KEY};

pub const EXPORT_FILE_NAME: &str = "selectedAnswers.json";

/// Writes the selection record as a JSON array to `dir/selectedAnswers.json`.
///
/// Overwrites any earlier export; the session carries on afterwards.
pub fn save_to_file(dir: &Path, selections: &[Option<String>]) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    let data = serde_json::to_vec_pretty(selections)?;
    fs::write(&path, data)?;
    tracing::info!(path = %path.display(), answers = selections.len(), "exported selected answers");
    Ok(path)
}

/// Final answers and score, as handed over to the results screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub selected_answers: Vec<Option<String>>,
    pub score: u32,
}

impl ResultSummary {
    pub fn total(&self) -> usize {
        self.selected_answers.len()
    }

    /// `None` until something has been submitted
    pub fn load(store: &dyn SessionStore) -> Result<Option<Self>, StoreError> {
        let Some(raw_score) = store.get(SCORE_KEY)? else {
            return Ok(None);
        };
        let score = raw_score
            .trim()
            .parse::<u32>()
            .map_err(|_| StoreError::Corrupt {
                key: SCORE_KEY,
                value: raw_score.clone(),
            })?;
        let selected_answers = read_json(store, SELECTED_ANSWERS_KEY)?.unwrap_or_default();
        Ok(Some(Self {
            selected_answers,
            score,
        }))
    }
}

/// Persists the selection record and score for the results screen.
pub fn submit(
    store: &mut dyn SessionStore,
    ledger: &ScoringLedger,
) -> Result<ResultSummary, StoreError> {
    let summary = ResultSummary {
        selected_answers: ledger.selections().to_vec(),
        score: ledger.score(),
    };
    write_json(store, SELECTED_ANSWERS_KEY, &summary.selected_answers)?;
    store.set(SCORE_KEY, &summary.score.to_string())?;
    tracing::info!(
        score = summary.score,
        answered = ledger.answered_count(),
        total = summary.total(),
        "submitted quiz"
    );
    Ok(summary)
}
