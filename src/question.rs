use serde::{Deserialize, Serialize};

/// A single multiple-choice question as delivered by the trivia API.
///
/// Text fields keep the API's raw form (HTML entities included) so that
/// stored and compared answers match the source exactly. Use [`plain_text`]
/// for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub question_text: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Question {
    pub fn new(
        question_text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers: incorrect_answers.into_iter().map(Into::into).collect(),
            category: None,
            difficulty: None,
        }
    }

    /// Correct answer followed by the incorrect ones, in source order
    pub fn all_answers(&self) -> Vec<String> {
        std::iter::once(self.correct_answer.clone())
            .chain(self.incorrect_answers.iter().cloned())
            .collect()
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// The fixed, ordered batch of questions for one quiz session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet(Vec<Question>);

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self(questions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.0.iter()
    }
}

impl From<Vec<Question>> for QuestionSet {
    fn from(questions: Vec<Question>) -> Self {
        Self(questions)
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Decodes HTML entities and drops markup so API text can be shown in a terminal.
pub fn plain_text(raw: &str) -> String {
    if !raw.contains(['&', '<']) {
        return raw.to_string();
    }
    unescape_markdown(&html2md::parse_html(raw))
}

// html2md backslash-escapes every literal `*`, `_` and `~`, so bare ones are
// emphasis it emitted for <b>, <i>, <u> or <s> and get dropped. Escaped ones are restored.
fn unescape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '<' | '>' | '*' | '\\' | '_' | '~' | '=' | '+' | '-' | '#') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        if matches!(c, '*' | '_' | '~') {
            continue;
        }
        out.push(c);
    }
    out
}
