//! # Mailpit Client
//! Asynchronous wrapper around the Mailpit email-capture HTTP API, providing lookups of captured messages and test assertions over them using [`Client`] and [`ClientBuilder`].
//!
//! ## Audience and uses
//! For Rust developers whose integration tests send mail into a local Mailpit instance: configure with [`ClientBuilder`], look up a message with [`Client::search`] or [`Client::last_email_id`], fetch it as a [`Message`], then assert on its subject, bodies, or headers.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. Each call performs at most two sequential requests (search, then fetch) and keeps no state between calls.
//!
//! ## Out of scope
//! Not a mail sender or mailbox manager. No retries, no polling for a message to arrive, and no caching of results: every call queries the service again.
//!
//! ## Errors
//! Missing configuration is [`Error::Configuration`]; network failures, timeouts, and non-2xx statuses are [`Error::Transport`]; searches without hits are [`Error::NotFound`]; bad bodies are [`Error::Parse`]; failed checks are [`Error::Assertion`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use mailpit_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailpit_client::Error> {
//!     let client = Client::new("http://localhost:8025/")?;
//!     let id = client.email_by_subject("Order #42").await?;
//!
//!     client.assert_email_subject_equals(&id, "Order #42").await?;
//!     client.assert_email_text_contains(&id, "Thanks").await?;
//!     client.assert_email_has_headers(&id, [("X-Test", "1")]).await?;
//!     Ok(())
//! }
//! ```

mod assertions;
mod client;
mod error;
mod models;

pub use client::{Client, ClientBuilder, DEFAULT_TIMEOUT};
pub use error::Error;
pub use models::{Headers, MATCH_ALL_QUERY, Message, MessageSummary, SearchCriteria, SortOrder};

/// Result type alias for Mailpit operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
