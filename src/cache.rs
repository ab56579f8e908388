use crate::clock::Clock;
use crate::error::StoreError;
use crate::question::QuestionSet;
use crate::store::{read_json, write_json, SessionStore, QUESTIONS_KEY, QUESTIONS_TIMESTAMP_KEY};

/// One hour
pub const DEFAULT_TTL_MILLIS: i64 = 3_600_000;

/// A fetched question set together with when it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub question_set: QuestionSet,
    pub fetched_at_epoch_millis: i64,
}

impl CacheEntry {
    pub fn new(question_set: QuestionSet, fetched_at_epoch_millis: i64) -> Self {
        Self {
            question_set,
            fetched_at_epoch_millis,
        }
    }

    /// Saturates, so an absurd stored timestamp reads as very old
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.fetched_at_epoch_millis)
    }

    /// Valid strictly below the ttl; an entry exactly `ttl` old is expired.
    pub fn is_fresh(&self, now_millis: i64, ttl_millis: i64) -> bool {
        self.age_millis(now_millis) < ttl_millis
    }

    /// Reads the persisted entry. Anything missing or unreadable is a miss.
    pub fn load(store: &dyn SessionStore) -> Option<Self> {
        let raw_timestamp = store.get(QUESTIONS_TIMESTAMP_KEY).ok()??;
        let Ok(fetched_at) = raw_timestamp.trim().parse::<i64>() else {
            tracing::debug!(value = %raw_timestamp, "ignoring unparsable cache timestamp");
            return None;
        };
        match read_json::<QuestionSet>(store, QUESTIONS_KEY) {
            Ok(Some(set)) if !set.is_empty() => Some(Self::new(set, fetched_at)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable cached questions");
                None
            }
        }
    }

    pub fn save(&self, store: &mut dyn SessionStore) -> Result<(), StoreError> {
        write_json(store, QUESTIONS_KEY, &self.question_set)?;
        store.set(
            QUESTIONS_TIMESTAMP_KEY,
            &self.fetched_at_epoch_millis.to_string(),
        )
    }
}

/// Cache policy: a ttl and the clock to judge it by
#[derive(Debug, Clone, Copy)]
pub struct QuestionCache {
    pub ttl_millis: i64,
    pub clock: Clock,
}

impl Default for QuestionCache {
    fn default() -> Self {
        Self {
            ttl_millis: DEFAULT_TTL_MILLIS,
            clock: Clock::System,
        }
    }
}

impl QuestionCache {
    pub fn new(ttl_millis: i64, clock: Clock) -> Self {
        Self { ttl_millis, clock }
    }

    /// The persisted entry if it is still within the ttl
    pub fn lookup(&self, store: &dyn SessionStore) -> Option<CacheEntry> {
        let entry = CacheEntry::load(store)?;
        let now = self.clock.now_millis();
        if entry.is_fresh(now, self.ttl_millis) {
            tracing::info!(
                age_ms = entry.age_millis(now),
                questions = entry.question_set.len(),
                "using cached questions"
            );
            Some(entry)
        } else {
            tracing::info!(age_ms = entry.age_millis(now), "cached questions expired");
            None
        }
    }

    /// Persists `set` stamped with the current time
    pub fn remember(
        &self,
        store: &mut dyn SessionStore,
        set: &QuestionSet,
    ) -> Result<CacheEntry, StoreError> {
        let entry = CacheEntry::new(set.clone(), self.clock.now_millis());
        entry.save(store)?;
        Ok(entry)
    }
}
