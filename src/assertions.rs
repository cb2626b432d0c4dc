//! Field and header checks over a fetched [`Message`].

use crate::{Error, Message, Result};
use regex::Regex;

/// String field of a message an assertion inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Text,
    Subject,
    Html,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Text => "text",
            Field::Subject => "subject",
            Field::Html => "html",
        }
    }

    fn of(self, message: &Message) -> &str {
        match self {
            Field::Text => &message.text,
            Field::Subject => &message.subject,
            Field::Html => &message.html,
        }
    }
}

pub(crate) fn equals(id: &str, message: &Message, field: Field, expected: &str) -> Result<()> {
    let actual = field.of(message);
    if actual == expected {
        return Ok(());
    }
    Err(failure(id, format!("{} to equal", field.name()), expected, actual))
}

pub(crate) fn contains(id: &str, message: &Message, field: Field, needle: &str) -> Result<()> {
    let actual = field.of(message);
    if actual.contains(needle) {
        return Ok(());
    }
    Err(failure(id, format!("{} to contain", field.name()), needle, actual))
}

pub(crate) fn compile(id: &str, field: Field, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern {
        id: id.to_string(),
        check: format!("{} to match", field.name()),
        source,
    })
}

pub(crate) fn matches(id: &str, message: &Message, field: Field, pattern: &Regex) -> Result<()> {
    let actual = field.of(message);
    if pattern.is_match(actual) {
        return Ok(());
    }
    Err(failure(
        id,
        format!("{} to match", field.name()),
        pattern.as_str(),
        actual,
    ))
}

/// Every expected `(name, value)` pair must be present; extra headers are ignored.
pub(crate) fn has_headers<I, K, V>(id: &str, message: &Message, expected: I) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (name, value) in expected {
        let (name, value) = (name.as_ref(), value.as_ref());
        if message.headers.contains(name, value) {
            continue;
        }
        let actual = match message.headers.get(name) {
            Some(values) => values.join(", "),
            None => "<absent>".to_string(),
        };
        return Err(failure(
            id,
            format!("header {name} to contain"),
            value,
            &actual,
        ));
    }
    Ok(())
}

fn failure(id: &str, check: String, expected: &str, actual: &str) -> Error {
    Error::Assertion {
        id: id.to_string(),
        check,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
