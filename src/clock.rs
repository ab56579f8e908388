use chrono::Utc;

/// Wall clock in epoch milliseconds, fixable for deterministic tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(i64),
}

impl Clock {
    pub fn fixed(epoch_millis: i64) -> Self {
        Self::Fixed(epoch_millis)
    }

    pub fn now_millis(&self) -> i64 {
        match self {
            Clock::System => Utc::now().timestamp_millis(),
            Clock::Fixed(t) => *t,
        }
    }
}

/// Short human description of an age, e.g. "12 minutes ago".
pub fn describe_age(age_millis: i64) -> String {
    let secs = age_millis.max(0) / 1000;
    match secs {
        0..=59 => "just now".to_string(),
        60..=119 => "a minute ago".to_string(),
        120..=3599 => format!("{} minutes ago", secs / 60),
        3600..=7199 => "an hour ago".to_string(),
        _ => format!("{} hours ago", secs / 3600),
    }
}
