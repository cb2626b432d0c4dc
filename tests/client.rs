//! Client behavior against a mocked Mailpit API.

use httpmock::prelude::*;
use mailpit_client::{Client, Error, SearchCriteria, SortOrder};
use serde_json::{Value, json};
use std::time::Duration;

fn client(server: &MockServer) -> Client {
    Client::new(server.base_url()).unwrap()
}

fn summary(id: &str, subject: &str) -> Value {
    json!({
        "ID": id,
        "MessageID": format!("<{id}@mailer.example.com>"),
        "Subject": subject,
        "Snippet": "",
        "Created": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn last_email_id_sends_match_all_query_and_returns_id() {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/search")
                .query_param("query", "''")
                .query_param("limit", "1")
                .query_param("sort", "desc");
            then.status(200).json_body(json!({
                "total": 2,
                "messages": [summary("newest", "Second"), summary("older", "First")]
            }));
        })
        .await;

    let id = client(&server).last_email_id().await.unwrap();
    assert_eq!(id, "newest");
    search.assert_async().await;
}

#[tokio::test]
async fn search_without_messages_is_not_found() {
    for body in [
        json!({ "messages": [] }),
        json!({ "total": 0 }),
        json!({ "messages": "none" }),
    ] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/search");
                then.status(200).json_body(body.clone());
            })
            .await;

        let err = client(&server)
            .search(&SearchCriteria::new("nothing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{body}: {err}");
        assert!(err.to_string().contains("/api/v1/search"), "{err}");
    }
}

#[tokio::test]
async fn search_with_blank_id_is_parse_error() {
    for id in ["", "  ", ".."] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/search");
                then.status(200)
                    .json_body(json!({ "messages": [{ "ID": id, "MessageID": "<x@example.com>" }] }));
            })
            .await;

        let err = client(&server).last_email_id().await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{id:?}: {err}");
    }
}

#[tokio::test]
async fn search_decodes_only_first_entry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/search");
            then.status(200).json_body(json!({
                "messages": [summary("first", "Good"), { "MessageID": "<broken@example.com>" }]
            }));
        })
        .await;

    let client = client(&server);
    let criteria = SearchCriteria::new("Good").limit(2);
    assert_eq!(client.search(&criteria).await.unwrap(), "first");

    let err = client.search_summaries(&criteria).await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
}

#[tokio::test]
async fn search_summaries_keep_service_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/search")
                .query_param("query", "from:shop")
                .query_param("limit", "3")
                .query_param("sort", "asc");
            then.status(200).json_body(json!({
                "messages": [summary("a", "One"), summary("b", "Two"), summary("c", "Three")]
            }));
        })
        .await;

    let criteria = SearchCriteria::new("from:shop").limit(3).sort(SortOrder::Asc);
    let summaries = client(&server).search_summaries(&criteria).await.unwrap();
    let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(summaries[1].subject, "Two");
    assert_eq!(summaries[0].message_id, "<a@mailer.example.com>");
}

#[tokio::test]
async fn summary_without_id_is_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/search");
            then.status(200)
                .json_body(json!({ "messages": [{ "MessageID": "<x@example.com>" }] }));
        })
        .await;

    let err = client(&server).last_email_id().await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
}

#[tokio::test]
async fn http_error_status_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/search");
            then.status(500).body("boom");
        })
        .await;

    let err = client(&server).last_email_id().await.unwrap_err();
    assert!(err.is_transport(), "{err}");
    assert!(err.to_string().contains("/api/v1/search"), "{err}");
}

#[tokio::test]
async fn unknown_message_is_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/message/missing");
            then.status(404).body("message not found");
        })
        .await;

    let err = client(&server).fetch("missing").await.unwrap_err();
    assert!(err.is_transport(), "{err}");
    assert!(err.to_string().contains("missing"), "{err}");
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/search");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "messages": [summary("late", "Late")] }));
        })
        .await;

    let client = Client::builder()
        .base_url(server.base_url())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = client.last_email_id().await.unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn undecodable_message_is_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/message/garbled");
            then.status(200).body("<html>not json</html>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/message/blank");
            then.status(200).body("");
        })
        .await;

    let client = client(&server);
    let err = client.fetch("garbled").await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
    let err = client.fetch("blank").await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
}

#[tokio::test]
async fn empty_identifier_is_rejected_without_request() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({}));
        })
        .await;

    let err = client(&server).fetch("").await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    any.assert_hits_async(0).await;
}

#[tokio::test]
async fn dot_segment_identifiers_are_rejected_without_request() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200)
                .json_body(json!({ "ID": "wrong", "Text": "other endpoint" }));
        })
        .await;

    let client = client(&server);
    for id in [".", ".."] {
        let err = client.fetch(id).await.unwrap_err();
        assert!(err.is_not_found(), "{id}: {err}");
    }
    any.assert_hits_async(0).await;
}

#[tokio::test]
async fn fetch_decodes_message_with_empty_parts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/message/plain");
            then.status(200).json_body(json!({
                "ID": "plain",
                "Subject": "Text only",
                "Text": "hello",
                "HTML": ""
            }));
        })
        .await;

    let message = client(&server).fetch("plain").await.unwrap();
    assert_eq!(message.id, "plain");
    assert_eq!(message.text, "hello");
    assert_eq!(message.html, "");
    assert!(message.headers.is_empty());
}

#[tokio::test]
async fn last_email_content_returns_text_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/search");
            then.status(200)
                .json_body(json!({ "messages": [summary("latest", "Reset")] }));
        })
        .await;
    let fetch = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/message/latest");
            then.status(200).json_body(json!({
                "ID": "latest",
                "Subject": "Reset",
                "Text": "Click the link to reset your password"
            }));
        })
        .await;

    let content = client(&server).last_email_content().await.unwrap();
    assert_eq!(content, "Click the link to reset your password");
    fetch.assert_async().await;
}

#[tokio::test]
async fn base_url_web_root_is_preserved() {
    let server = MockServer::start_async().await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET).path("/mailpit/api/v1/search");
            then.status(200)
                .json_body(json!({ "messages": [summary("rooted", "Hi")] }));
        })
        .await;

    let client = Client::new(format!("{}/mailpit/", server.base_url())).unwrap();
    assert_eq!(client.last_email_id().await.unwrap(), "rooted");
    search.assert_async().await;
}
