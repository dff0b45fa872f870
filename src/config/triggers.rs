//! Trigger phrases.
//!
//! A trigger set is configured as a comma-separated list of
//! `<phrase>:<count>` entries, for example `lgtm:1,:+1::1`. The phrase may
//! contain any character except `,`; the *last* `:` of an entry separates the
//! phrase from its count, so phrases such as `:+1:` need no escaping.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Normalizes a phrase or a comment body for matching.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Normalized phrase, never empty.
    pub phrase: String,
    /// Number of occurrences the configuration asks for, at least 1.
    ///
    /// Matching only tests for the presence of the phrase; the count is kept
    /// so that it round-trips through the configuration.
    pub count: u32,
}

/// An immutable, ordered set of trigger phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Triggers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn required_count(&self, phrase: &str) -> Option<u32> {
        let phrase = normalize(phrase);
        self.triggers
            .iter()
            .find(|t| t.phrase == phrase)
            .map(|t| t.count)
    }

    /// Returns the first trigger that both starts and ends `body`.
    ///
    /// `body` must already be normalized with [`normalize`].
    pub fn find_bracketing(&self, body: &str) -> Option<&Trigger> {
        self.triggers
            .iter()
            .find(|t| body.starts_with(&t.phrase) && body.ends_with(&t.phrase))
    }

    fn insert(&mut self, phrase: String, count: u32) {
        match self.triggers.iter_mut().find(|t| t.phrase == phrase) {
            Some(existing) => existing.count = count,
            None => self.triggers.push(Trigger { phrase, count }),
        }
    }
}

impl FromStr for TriggerSet {
    type Err = TriggerError;

    fn from_str(value: &str) -> Result<TriggerSet, TriggerError> {
        let mut set = TriggerSet::default();
        if value.is_empty() {
            return Ok(set);
        }

        for entry in value.split(',') {
            let Some(sep) = entry.rfind(':') else {
                return Err(TriggerError::MissingSeparator {
                    entry: entry.to_string(),
                });
            };
            let (phrase, count) = (&entry[..sep], entry[sep + 1..].trim());
            if count.is_empty() {
                return Err(TriggerError::MissingCount {
                    entry: entry.to_string(),
                });
            }
            let count = count
                .parse::<u32>()
                .map_err(|source| TriggerError::InvalidCount {
                    entry: entry.to_string(),
                    source,
                })?;
            if count == 0 {
                return Err(TriggerError::ZeroCount {
                    entry: entry.to_string(),
                });
            }
            let phrase = normalize(phrase);
            if phrase.is_empty() {
                return Err(TriggerError::EmptyPhrase {
                    entry: entry.to_string(),
                });
            }
            set.insert(phrase, count);
        }

        Ok(set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    MissingSeparator { entry: String },
    MissingCount { entry: String },
    InvalidCount { entry: String, source: ParseIntError },
    ZeroCount { entry: String },
    EmptyPhrase { entry: String },
}

impl std::error::Error for TriggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TriggerError::InvalidCount { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriggerError::MissingSeparator { entry } => write!(
                f,
                "invalid trigger `{entry}`: expected `<phrase>:<count>`"
            ),
            TriggerError::MissingCount { entry } => {
                write!(f, "invalid trigger `{entry}`: missing count after `:`")
            }
            TriggerError::InvalidCount { entry, source } => {
                write!(f, "invalid trigger `{entry}`: count is not a number ({source})")
            }
            TriggerError::ZeroCount { entry } => {
                write!(f, "invalid trigger `{entry}`: count must be at least 1")
            }
            TriggerError::EmptyPhrase { entry } => {
                write!(f, "invalid trigger `{entry}`: phrase is empty")
            }
        }
    }
}
