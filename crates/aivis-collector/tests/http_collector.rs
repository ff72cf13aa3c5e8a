//! Integration tests for `HttpAnswerCollector::collect`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Tests cover the happy path, retry
//! behaviour, terminal errors, the overall deadline, and citation
//! extraction limits.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aivis_collector::{AnswerEngineCollector, CollectorErrorKind, HttpAnswerCollector};

/// Builds a collector suitable for tests: 5-second deadline, no retries.
fn test_collector(url: &str) -> HttpAnswerCollector {
    HttpAnswerCollector::new("test-engine", url, 5, "aivis-test/0.1", 0, 0)
        .expect("failed to build test collector")
}

/// Builds a collector with retries enabled and zero backoff.
fn test_collector_with_retries(url: &str, max_retries: u32) -> HttpAnswerCollector {
    HttpAnswerCollector::new("test-engine", url, 5, "aivis-test/0.1", max_retries, 0)
        .expect("failed to build test collector")
}

fn answer_payload(text: &str) -> serde_json::Value {
    json!({
        "answer": text,
        "citations": [
            {"url": "https://source.example.com/report", "title": "Report"}
        ]
    })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_returns_normalized_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"prompt": "best crm tools"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&answer_payload("Acme is widely used.")),
        )
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let answer = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect("collect should succeed");

    assert_eq!(answer.engine_id, "test-engine");
    assert_eq!(answer.prompt_id, "p1");
    assert_eq!(answer.query_text, "best crm tools");
    assert_eq!(answer.answer_text, "Acme is widely used.");
    assert_eq!(answer.cited_links.len(), 1);
    assert_eq!(answer.cited_links[0].rank, 1);
    assert_eq!(answer.cited_links[0].title.as_deref(), Some("Report"));
}

// ---------------------------------------------------------------------------
// Retry behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&answer_payload("recovered")))
        .mount(&server)
        .await;

    let collector = test_collector_with_retries(&server.uri(), 3);
    let answer = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect("collect should recover after retries");

    assert_eq!(answer.answer_text, "recovered");
}

#[tokio::test]
async fn collect_reports_retry_count_when_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let collector = test_collector_with_retries(&server.uri(), 2);
    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("collect should fail after exhausting retries");

    assert_eq!(err.engine, "test-engine");
    assert_eq!(err.prompt_id, "p1");
    assert_eq!(err.retry_count, 2);
    assert!(!err.is_timeout());
    assert!(matches!(
        err.kind,
        CollectorErrorKind::UnexpectedStatus { status: 503 }
    ));
}

#[tokio::test]
async fn collect_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let collector = test_collector_with_retries(&server.uri(), 3);
    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("404 should fail immediately");

    assert_eq!(err.retry_count, 0);
    assert!(matches!(
        err.kind,
        CollectorErrorKind::UnexpectedStatus { status: 404 }
    ));
}

// ---------------------------------------------------------------------------
// Extraction failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_reports_empty_extraction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"irrelevant": 1})))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("empty payload should be reportable, not a silent success");

    assert!(matches!(err.kind, CollectorErrorKind::EmptyExtraction));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn collect_rejects_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let collector = test_collector_with_retries(&server.uri(), 3);
    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("non-JSON body should fail without retries");

    assert_eq!(err.retry_count, 0);
    assert!(matches!(err.kind, CollectorErrorKind::Malformed(_)));
}

// ---------------------------------------------------------------------------
// Overall deadline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_times_out_against_slow_engine() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&answer_payload("too late"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let collector = HttpAnswerCollector::new(
        "test-engine",
        server.uri(),
        1, // 1-second overall deadline
        "aivis-test/0.1",
        3,
        0,
    )
    .expect("failed to build collector");

    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("slow engine should hit the overall deadline");

    assert!(err.is_timeout());
    assert!(matches!(
        err.kind,
        CollectorErrorKind::Timeout { timeout_secs: 1 }
    ));
}

// ---------------------------------------------------------------------------
// Citation handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collect_caps_and_filters_citations() {
    let mut citations: Vec<serde_json::Value> = (0..15)
        .map(|i| json!({"url": format!("https://site{i}.example.com/page")}))
        .collect();
    citations.insert(0, json!({"url": "https://cdn.example.com/file.pdf"}));
    citations.insert(1, json!({"url": "https://stats.doubleclick.net/x"}));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "answer": "Plenty of sources.",
            "citations": citations,
        })))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let answer = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect("collect should succeed");

    assert_eq!(answer.cited_links.len(), 10);
    assert!(answer
        .cited_links
        .iter()
        .all(|l| !l.url.ends_with(".pdf") && !l.url.contains("doubleclick")));
    let ranks: Vec<u32> = answer.cited_links.iter().map(|l| l.rank).collect();
    assert_eq!(ranks, (1..=10).collect::<Vec<u32>>());
}

#[tokio::test]
async fn empty_extraction_is_retried_before_surfacing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"answer": ""})))
        .expect(3)
        .mount(&server)
        .await;

    let collector = test_collector_with_retries(&server.uri(), 2);
    let err = collector
        .collect("best crm tools", "p1", "en")
        .await
        .expect_err("persistent empty extraction should surface after retries");

    assert_eq!(err.retry_count, 2);
    assert!(matches!(err.kind, CollectorErrorKind::EmptyExtraction));
}
