use std::sync::mpsc::Sender;
use std::thread;

use crate::cache::{CacheEntry, QuestionCache};
use crate::error::FetchError;
use crate::question::QuestionSet;
use crate::runtime::QuizEvent;
use crate::store::SessionStore;
use crate::trivia_api::Fetcher;

/// Where a loaded question set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Cache { fetched_at_epoch_millis: i64 },
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedQuestions {
    pub questions: QuestionSet,
    pub origin: LoadOrigin,
}

impl From<CacheEntry> for LoadedQuestions {
    fn from(entry: CacheEntry) -> Self {
        Self {
            questions: entry.question_set,
            origin: LoadOrigin::Cache {
                fetched_at_epoch_millis: entry.fetched_at_epoch_millis,
            },
        }
    }
}

/// Obtains a question set from the persisted cache or the trivia API.
#[derive(Debug, Clone)]
pub struct QuestionSource {
    fetcher: Fetcher,
    cache: QuestionCache,
}

impl QuestionSource {
    pub fn new(fetcher: Fetcher, cache: QuestionCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &QuestionCache {
        &self.cache
    }

    pub fn cached(&self, store: &dyn SessionStore) -> Option<LoadedQuestions> {
        self.cache.lookup(store).map(LoadedQuestions::from)
    }

    /// Writes a freshly fetched set back to the cache. Failing to cache is not
    /// fatal to the session, so it is only logged.
    pub fn remember(&self, store: &mut dyn SessionStore, questions: &QuestionSet) {
        if let Err(e) = self.cache.remember(store, questions) {
            tracing::warn!(error = %e, "failed to cache fetched questions");
        }
    }

    /// Blocking load: a fresh cache entry, else a network fetch that is then cached.
    pub fn load(
        &self,
        store: &mut dyn SessionStore,
        bypass_cache: bool,
    ) -> Result<LoadedQuestions, FetchError> {
        if !bypass_cache {
            if let Some(hit) = self.cached(store) {
                return Ok(hit);
            }
        }
        let questions = self.fetcher.fetch()?;
        self.remember(store, &questions);
        Ok(LoadedQuestions {
            questions,
            origin: LoadOrigin::Network,
        })
    }

    /// Runs the network fetch on a worker thread and posts the outcome as a
    /// [`QuizEvent::Loaded`]. The result is dropped if nobody is listening.
    pub fn spawn_fetch(&self, events: Sender<QuizEvent>) -> thread::JoinHandle<()> {
        let fetcher = self.fetcher.clone();
        thread::spawn(move || {
            let outcome = fetcher.fetch();
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "question fetch failed");
            }
            if events.send(QuizEvent::Loaded(outcome)).is_err() {
                tracing::debug!("fetch finished after the quiz was closed");
            }
        })
    }
}
