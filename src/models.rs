//! Request and response models for the Mailpit API.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Query the Mailpit search grammar treats as "match everything".
///
/// Mailpit rejects an empty query, so two literal single quotes are sent instead.
pub const MATCH_ALL_QUERY: &str = "''";

/// Result ordering requested from the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recent first.
    #[default]
    Desc,
    /// Oldest first.
    Asc,
}

/// Parameters for `GET /api/v1/search`.
///
/// Serialized directly as the request query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    query: String,
    limit: u32,
    sort: SortOrder,
}

impl SearchCriteria {
    /// Search for `query` with `limit = 1` and most-recent-first ordering.
    ///
    /// A blank query is replaced by [`MATCH_ALL_QUERY`].
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let query = if query.trim().is_empty() {
            MATCH_ALL_QUERY.to_string()
        } else {
            query
        };
        Self {
            query,
            limit: 1,
            sort: SortOrder::Desc,
        }
    }

    /// Criteria matching the most recent message regardless of content.
    pub fn latest() -> Self {
        Self::new(MATCH_ALL_QUERY)
    }

    /// Override the result limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Override the sort order.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// The query string sent to the service.
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::latest()
    }
}

/// One entry of the `messages` list returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageSummary {
    /// Mailpit database identifier, used for fetching.
    #[serde(rename = "ID")]
    pub id: String,
    /// RFC 5322 `Message-ID` header. Not usable with the fetch endpoint.
    #[serde(rename = "MessageID", default, deserialize_with = "nullable")]
    pub message_id: String,
    /// Subject line.
    #[serde(rename = "Subject", default, deserialize_with = "nullable")]
    pub subject: String,
    /// Short plain-text preview.
    #[serde(rename = "Snippet", default, deserialize_with = "nullable")]
    pub snippet: String,
    /// Creation timestamp as reported by Mailpit.
    #[serde(rename = "Created", default, deserialize_with = "nullable")]
    pub created: String,
}

/// Full message returned by `GET /api/v1/message/{id}`.
///
/// Absent or `null` fields decode as empty values. The HTML body is read from
/// `Html`, falling back to Mailpit's `HTML` key when `Html` is absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawMessage")]
pub struct Message {
    /// Mailpit database identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// RFC 5322 `Message-ID` header.
    #[serde(rename = "MessageID")]
    pub message_id: String,
    /// Subject line.
    #[serde(rename = "Subject")]
    pub subject: String,
    /// Plain-text body.
    #[serde(rename = "Text")]
    pub text: String,
    /// HTML body.
    #[serde(rename = "Html")]
    pub html: String,
    /// Message headers.
    #[serde(rename = "Headers")]
    pub headers: Headers,
}

/// Wire shape of [`Message`], keeping both HTML spellings apart.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "ID", default, deserialize_with = "nullable")]
    id: String,
    #[serde(rename = "MessageID", default, deserialize_with = "nullable")]
    message_id: String,
    #[serde(rename = "Subject", default, deserialize_with = "nullable")]
    subject: String,
    #[serde(rename = "Text", default, deserialize_with = "nullable")]
    text: String,
    #[serde(rename = "Html", default)]
    html: Option<String>,
    #[serde(rename = "HTML", default)]
    html_upper: Option<String>,
    #[serde(rename = "Headers", default)]
    headers: Headers,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        Message {
            id: raw.id,
            message_id: raw.message_id,
            subject: raw.subject,
            text: raw.text,
            html: raw.html.or(raw.html_upper).unwrap_or_default(),
            headers: raw.headers,
        }
    }
}

/// Header name to one or more values.
///
/// Accepts both `"Name": "value"` and `"Name": ["a", "b"]` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(HashMap<String, Vec<String>>);

impl Headers {
    /// Values of the header `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Whether header `name` carries exactly `value` among its values.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Iterate over header names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no headers are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Headers(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<HashMap<String, OneOrMany>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|(name, values)| match values {
                OneOrMany::One(value) => (name, vec![value]),
                OneOrMany::Many(values) => (name, values),
            })
            .collect())
    }
}

/// Treat JSON `null` like an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
