use std::sync::{mpsc, Arc};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quizr::cache::{CacheEntry, QuestionCache, DEFAULT_TTL_MILLIS};
use quizr::clock::Clock;
use quizr::export::{self, ResultSummary};
use quizr::question_source::{LoadOrigin, QuestionSource};
use quizr::runtime::{FixedTicker, QuizEvent, Runner, TestEventSource};
use quizr::store::{
    MemorySessionStore, SessionStore, QUESTIONS_TIMESTAMP_KEY, SCORE_KEY, SELECTED_ANSWERS_KEY,
};
use quizr::trivia_api::{
    Fetcher, HttpReply, RecordingSleeper, RetryPolicy, ScriptedTransport, TriviaRequest,
};
use quizr::{Question, QuestionSet, QuizInput, QuizSession, QuizState};

// Headless end-to-end flows: cache, fetch worker, session and submit without a TTY.

const NOW: i64 = 1_700_000_000_000;
const ONE_QUESTION: &str = r#"{"response_code":0,"results":[{"question":"2+2?","correct_answer":"4","incorrect_answers":["3","5","6"]}]}"#;

fn source(transport: Arc<ScriptedTransport>) -> QuestionSource {
    let fetcher = Fetcher::new(
        transport,
        Arc::new(RecordingSleeper::new()),
        RetryPolicy::default(),
        TriviaRequest::default(),
    );
    QuestionSource::new(
        fetcher,
        QuestionCache::new(DEFAULT_TTL_MILLIS, Clock::fixed(NOW)),
    )
}

fn loaded_session(store: &mut MemorySessionStore) -> QuizSession {
    let transport = Arc::new(ScriptedTransport::new([HttpReply::ok(ONE_QUESTION)]));
    let loaded = source(transport).load(store, false).unwrap();
    let mut session = QuizSession::new();
    session.handle(QuizInput::QuestionsLoaded(loaded.questions));
    session
}

#[test]
fn correct_answer_is_scored_and_submitted() {
    let mut store = MemorySessionStore::new();
    let mut session = loaded_session(&mut store);
    assert_eq!(session.state(), QuizState::Ready(0));

    assert!(session.handle(QuizInput::SelectAnswer("4".to_string())));
    assert_eq!(session.score(), 1);
    assert_eq!(session.state(), QuizState::Answered(0));

    export::submit(&mut store, session.ledger()).unwrap();
    assert_eq!(store.get(SCORE_KEY).unwrap().as_deref(), Some("1"));
    assert_eq!(
        store.get(SELECTED_ANSWERS_KEY).unwrap().as_deref(),
        Some(r#"["4"]"#)
    );
    let summary = ResultSummary::load(&store).unwrap().unwrap();
    assert_eq!(summary.score, 1);
    assert_eq!(summary.selected_answers, vec![Some("4".to_string())]);
}

#[test]
fn first_answer_sticks() {
    let mut store = MemorySessionStore::new();
    let mut session = loaded_session(&mut store);

    assert!(session.handle(QuizInput::SelectAnswer("3".to_string())));
    assert!(!session.handle(QuizInput::SelectAnswer("4".to_string())));
    assert_eq!(session.score(), 0);
    assert_eq!(session.ledger().selection(0), Some("3"));
}

#[test]
fn recent_cache_is_reused_without_network() {
    let transport = Arc::new(ScriptedTransport::new([HttpReply::ok(ONE_QUESTION)]));
    let cached = QuestionSet::new(vec![Question::new("Cached?", "yes", ["no", "maybe"])]);
    let mut store = MemorySessionStore::new();
    CacheEntry::new(cached.clone(), NOW - 2_000_000)
        .save(&mut store)
        .unwrap();

    let loaded = source(transport.clone()).load(&mut store, false).unwrap();
    assert_eq!(loaded.questions, cached);
    assert_eq!(transport.requests(), 0);
}

#[test]
fn stale_cache_is_refetched_and_overwritten() {
    let transport = Arc::new(ScriptedTransport::new([HttpReply::ok(ONE_QUESTION)]));
    let cached = QuestionSet::new(vec![Question::new("Cached?", "yes", ["no", "maybe"])]);
    let mut store = MemorySessionStore::new();
    CacheEntry::new(cached.clone(), NOW - 4_000_000)
        .save(&mut store)
        .unwrap();

    let loaded = source(transport.clone()).load(&mut store, false).unwrap();
    assert_eq!(loaded.origin, LoadOrigin::Network);
    assert_ne!(loaded.questions, cached);
    assert_eq!(transport.requests(), 1);
    assert_eq!(
        store.get(QUESTIONS_TIMESTAMP_KEY).unwrap(),
        Some(NOW.to_string())
    );
}

#[test]
fn runner_delivers_background_fetch() {
    let transport = Arc::new(ScriptedTransport::new([
        HttpReply::rate_limited(Some("0")),
        HttpReply::ok(ONE_QUESTION),
    ]));
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let mut session = QuizSession::new();
    source(transport.clone()).spawn_fetch(tx.clone());

    // keys pressed while loading are ignored by the session
    tx.send(QuizEvent::Key(KeyEvent::new(
        KeyCode::Right,
        KeyModifiers::NONE,
    )))
    .unwrap();

    for _ in 0..1000u32 {
        match runner.step() {
            QuizEvent::Tick | QuizEvent::Resize => {}
            QuizEvent::Key(_) => {
                assert!(!session.handle(QuizInput::Next));
            }
            QuizEvent::Loaded(result) => {
                session.handle(QuizInput::QuestionsLoaded(result.unwrap()));
                break;
            }
        }
    }

    assert_eq!(session.state(), QuizState::Ready(0));
    assert_eq!(transport.requests(), 2);
}

#[test]
fn failed_fetch_leaves_session_empty() {
    let transport = Arc::new(ScriptedTransport::new([HttpReply::rate_limited(None)]));
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let mut session = QuizSession::new();
    source(transport.clone()).spawn_fetch(tx);

    for _ in 0..1000u32 {
        if let QuizEvent::Loaded(result) = runner.step() {
            assert!(result.is_err());
            session.handle(QuizInput::LoadFailed);
            break;
        }
    }

    assert_eq!(session.state(), QuizState::Empty);
    assert_eq!(transport.requests(), 6);
}
