//! Mailpit async client implementation.

use crate::assertions::{self, Field};
use crate::{Error, Message, MessageSummary, Result, SearchCriteria};
use log::{debug, warn};
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Async client for the Mailpit search and message APIs.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] for custom settings
/// like the request timeout, a proxy, or a custom user agent. The client holds
/// no state besides its configuration, so one instance can serve many tests.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for the Mailpit instance at `base_url` with default settings.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::Client;
    /// # fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().base_url(base_url).build()
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Search for messages and return the identifier of the first result.
    ///
    /// The service orders results per `criteria`; no local re-sorting happens.
    /// Only the first entry of the result list is decoded.
    ///
    /// # Errors
    /// [`Error::NotFound`] when the `messages` list is absent or empty,
    /// [`Error::Transport`] on HTTP failure, [`Error::Parse`] on an undecodable body
    /// or when the first entry has no usable `ID`.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::{Client, SearchCriteria};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// let id = client.search(&SearchCriteria::new("subject:Welcome")).await?;
    /// println!("{id}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<String> {
        let (messages, context) = self.search_messages(criteria).await?;
        let first = messages
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("{context} returned no messages")))?;
        let first: MessageSummary =
            serde_json::from_value(first).map_err(|e| Error::parse(context.as_str(), e))?;
        if !is_usable_id(&first.id) {
            return Err(Error::parse(
                context,
                format!("first message has unusable ID {:?}", first.id),
            ));
        }
        debug!("query {:?} resolved to message {}", criteria.query(), first.id);
        Ok(first.id)
    }

    /// Search for messages and return every summary in service order.
    ///
    /// Every entry is decoded, so one malformed entry fails the whole call with
    /// [`Error::Parse`]. Otherwise fails the same way as [`Client::search`];
    /// never returns an empty list.
    pub async fn search_summaries(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<MessageSummary>> {
        let (messages, context) = self.search_messages(criteria).await?;
        messages
            .into_iter()
            .map(|v| {
                serde_json::from_value::<MessageSummary>(v)
                    .map_err(|e| Error::parse(context.as_str(), e))
            })
            .collect()
    }

    /// Raw non-empty `messages` list of a search, with the request context.
    async fn search_messages(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<serde_json::Value>, String)> {
        let url = self.endpoint(&["api", "v1", "search"])?;
        let context = format!("search {:?} at {url}", criteria.query());
        let mut response: serde_json::Value =
            self.get_json(url, Some(criteria), &context).await?;

        match response.get_mut("messages").map(serde_json::Value::take) {
            Some(serde_json::Value::Array(messages)) if !messages.is_empty() => {
                Ok((messages, context))
            }
            _ => {
                warn!("{context} returned no messages");
                Err(Error::NotFound(format!("{context} returned no messages")))
            }
        }
    }

    /// Fetch the full message with the given identifier.
    ///
    /// Empty `Text` or `Html` parts are valid and come back as empty strings.
    ///
    /// # Errors
    /// [`Error::NotFound`] for an empty, `.` or `..` identifier (no request is
    /// made), [`Error::Transport`] on HTTP failure, [`Error::Parse`] when the
    /// body is empty or not a JSON message.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::{Client, SearchCriteria};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// let id = client.search(&SearchCriteria::latest()).await?;
    /// let message = client.fetch(&id).await?;
    /// println!("{}: {}", message.subject, message.text);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch(&self, id: &str) -> Result<Message> {
        if !is_usable_id(id) {
            return Err(Error::NotFound(format!("invalid message identifier {id:?}")));
        }
        let url = self.endpoint(&["api", "v1", "message", id])?;
        let context = format!("fetch message {id} at {url}");
        self.get_json(url, None, &context).await
    }

    /// Fetch the most recent message.
    pub async fn last_email(&self) -> Result<Message> {
        let id = self.last_email_id().await?;
        self.fetch(&id).await
    }

    /// Plain-text body of the most recent message.
    pub async fn last_email_content(&self) -> Result<String> {
        Ok(self.last_email().await?.text)
    }

    /// Identifier of the most recent message.
    pub async fn last_email_id(&self) -> Result<String> {
        self.search(&SearchCriteria::latest()).await
    }

    /// Identifier of the most recent message matching `subject`.
    ///
    /// `subject` is passed through as a search query, so Mailpit's search
    /// syntax applies.
    pub async fn email_by_subject(&self, subject: &str) -> Result<String> {
        self.search(&SearchCriteria::new(subject)).await
    }

    /// Assert the plain-text body of a message equals an expected value.
    ///
    /// # Arguments
    /// * `id` - The message identifier, usually from [`Client::search`]
    /// * `expected` - The exact plain-text body; an absent body compares as `""`
    ///
    /// # Returns
    /// `Ok(())` on a match, [`Error::Assertion`] naming the message and both
    /// values otherwise
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// let id = client.email_by_subject("Order #42").await?;
    /// client.assert_email_text_equals(&id, "Thanks for your order").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn assert_email_text_equals(&self, id: &str, expected: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::equals(id, &message, Field::Text, expected)
    }

    /// Assert the plain-text body of message `id` contains `needle`.
    pub async fn assert_email_text_contains(&self, id: &str, needle: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::contains(id, &message, Field::Text, needle)
    }

    /// Assert the plain-text body of message `id` matches the regex `pattern`.
    ///
    /// The pattern is compiled before any request is made.
    pub async fn assert_email_text_matches(&self, id: &str, pattern: &str) -> Result<()> {
        let pattern = assertions::compile(id, Field::Text, pattern)?;
        let message = self.fetch(id).await?;
        assertions::matches(id, &message, Field::Text, &pattern)
    }

    /// Assert the subject of a message equals an expected value.
    ///
    /// # Arguments
    /// * `id` - The message identifier, usually from [`Client::search`]
    /// * `expected` - The exact subject line
    ///
    /// # Returns
    /// `Ok(())` on a match, [`Error::Assertion`] naming the message and both
    /// values otherwise
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// let id = client.last_email_id().await?;
    /// client.assert_email_subject_equals(&id, "Welcome aboard!").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn assert_email_subject_equals(&self, id: &str, expected: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::equals(id, &message, Field::Subject, expected)
    }

    /// Assert the subject of message `id` contains `needle`.
    pub async fn assert_email_subject_contains(&self, id: &str, needle: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::contains(id, &message, Field::Subject, needle)
    }

    /// Assert the HTML body of a message equals an expected value.
    ///
    /// # Arguments
    /// * `id` - The message identifier, usually from [`Client::search`]
    /// * `expected` - The exact HTML body; an absent body compares as `""`
    ///
    /// # Returns
    /// `Ok(())` on a match, [`Error::Assertion`] naming the message and both
    /// values otherwise
    pub async fn assert_email_html_equals(&self, id: &str, expected: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::equals(id, &message, Field::Html, expected)
    }

    /// Assert the HTML body of message `id` contains `needle`.
    pub async fn assert_email_html_contains(&self, id: &str, needle: &str) -> Result<()> {
        let message = self.fetch(id).await?;
        assertions::contains(id, &message, Field::Html, needle)
    }

    /// Assert the HTML body of message `id` matches the regex `pattern`.
    pub async fn assert_email_html_matches(&self, id: &str, pattern: &str) -> Result<()> {
        let pattern = assertions::compile(id, Field::Html, pattern)?;
        let message = self.fetch(id).await?;
        assertions::matches(id, &message, Field::Html, &pattern)
    }

    /// Assert a message carries every expected header name/value pair.
    ///
    /// This is a subset check: other headers may be present. Names compare
    /// case-insensitively, values exactly.
    ///
    /// # Arguments
    /// * `id` - The message identifier, usually from [`Client::search`]
    /// * `expected` - Header `(name, value)` pairs, e.g. an array or a `HashMap`
    ///
    /// # Returns
    /// `Ok(())` when every pair is present, [`Error::Assertion`] for the first
    /// missing or different header otherwise
    ///
    /// # Examples
    /// ```no_run
    /// # use mailpit_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailpit_client::Error> {
    /// let client = Client::new("http://localhost:8025/")?;
    /// let id = client.last_email_id().await?;
    /// client.assert_email_has_headers(&id, [("X-Test", "1")]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn assert_email_has_headers<I, K, V>(&self, id: &str, expected: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let message = self.fetch(id).await?;
        assertions::has_headers(id, &message, expected)
    }

    /// Common GET + JSON decode pattern.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        criteria: Option<&SearchCriteria>,
        context: &str,
    ) -> Result<T> {
        debug!("GET {url}");
        let mut request = self.http.get(url).headers(self.headers());
        if let Some(criteria) = criteria {
            request = request.query(criteria);
        }

        let body = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport(context, e))?
            .text()
            .await
            .map_err(|e| Error::transport(context, e))?;

        if body.trim().is_empty() {
            return Err(Error::parse(context, "empty response body"));
        }
        serde_json::from_str(&body).map_err(|e| Error::parse(context, e))
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Configuration(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build headers for API requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers
    }
}

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BASE_URL_ENV: &str = "MAILPIT_BASE_URI";
const TIMEOUT_ENV: &str = "MAILPIT_TIMEOUT_SECS";
const USER_AGENT_VALUE: &str = concat!("mailpit-client/", env!("CARGO_PKG_VERSION"));

/// Builder for configuring a Mailpit client.
///
/// Start with [`Client::builder`] or [`ClientBuilder::from_env`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    proxy: Option<String>,
    user_agent: String,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No base URL (must be set before [`ClientBuilder::build`])
    /// - 10 second request timeout
    /// - No proxy
    /// - `mailpit-client/<version>` user agent
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            user_agent: USER_AGENT_VALUE.to_string(),
        }
    }

    /// Builder seeded from `MAILPIT_BASE_URI` and optional `MAILPIT_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// [`Error::Configuration`] when the base URI is unset or blank, or the
    /// timeout is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Configuration(format!("{BASE_URL_ENV} is not set")))?;

        let mut builder = Self::new().base_url(base_url);
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "{TIMEOUT_ENV} must be a positive integer, got {raw:?}"
                    ))
                })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    /// Set the Mailpit base URL (e.g., "http://localhost:8025/").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a proxy URL (e.g., "socks5://127.0.0.1:1080").
    ///
    /// This uses reqwest's proxy support for all requests.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration and build the client.
    ///
    /// No network request is made.
    ///
    /// # Errors
    /// [`Error::Configuration`] when the base URL is missing, blank, or not an
    /// absolute http(s) URL, when the timeout is zero, or when the proxy or HTTP
    /// client cannot be built.
    pub fn build(self) -> Result<Client> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Configuration("base URL is required".to_string()))?;

        let base_url = Url::parse(raw)
            .map_err(|e| Error::Configuration(format!("invalid base URL {raw:?}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "base URL {raw:?} must be an absolute http(s) URL"
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Configuration("timeout must be greater than zero".to_string()));
        }

        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::Configuration(format!("invalid proxy {proxy_url:?}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;

        debug!("mailpit client for {base_url} (timeout {:?})", self.timeout);
        Ok(Client {
            http,
            base_url,
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}

/// `.` and `..` would be dropped as path segments and hit another endpoint.
fn is_usable_id(id: &str) -> bool {
    !id.trim().is_empty() && id != "." && id != ".."
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
