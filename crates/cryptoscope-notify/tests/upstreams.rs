//! wiremock tests for the Resend sender and the automation platform client.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cryptoscope_core::TaskDescriptor;
use cryptoscope_notify::{AutomationClient, NotificationSender, NotifyError, ResendSender};

// ---------------------------------------------------------------------------
// Resend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resend_posts_single_recipient_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test"))
        .and(body_json(json!({
            "from": "CryptoScope <alerts@example.com>",
            "to": ["owner@example.com"],
            "subject": "hello",
            "html": "<p>hi</p>"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "em_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let sender = ResendSender::with_base_url(
        "re_test",
        "CryptoScope <alerts@example.com>",
        5,
        &server.uri(),
    )
    .unwrap();
    sender
        .send("owner@example.com", "hello", "<p>hi</p>")
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn resend_rejection_keeps_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid `to` field"))
        .mount(&server)
        .await;

    let sender = ResendSender::with_base_url("re_test", "a@example.com", 5, &server.uri()).unwrap();
    let err = sender.send("bad", "s", "h").await.unwrap_err();
    assert!(
        matches!(err, NotifyError::UpstreamFailure { status: 422, ref body } if body == "invalid `to` field"),
        "got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Automation platform
// ---------------------------------------------------------------------------

fn post_task() -> TaskDescriptor {
    TaskDescriptor::PostTweet {
        account_id: 3,
        text: "gm".to_owned(),
        thread: Vec::new(),
    }
}

#[tokio::test]
async fn submit_sends_type_and_payload_with_agent_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tasks"))
        .and(header("authorization", "Bearer agent-key"))
        .and(body_json(json!({
            "type": "post_tweet",
            "payload": {"account_id": 3, "text": "gm", "thread": []}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "task_77"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = AutomationClient::new(&server.uri(), 5).unwrap();
    let receipt = client.submit("agent-key", &post_task()).await.unwrap();
    assert_eq!(receipt.external_task_id.as_deref(), Some("task_77"));
}

#[tokio::test]
async fn submit_accepts_empty_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = AutomationClient::new(&server.uri(), 5).unwrap();
    let receipt = client.submit("agent-key", &post_task()).await.unwrap();
    assert_eq!(receipt.external_task_id, None);
}

#[tokio::test]
async fn submit_non_2xx_is_upstream_failure_with_verbatim_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent offline"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AutomationClient::new(&server.uri(), 5).unwrap();
    let err = client.submit("agent-key", &post_task()).await.unwrap_err();
    assert!(
        matches!(err, NotifyError::UpstreamFailure { status: 500, ref body } if body == "agent offline"),
        "got: {err:?}"
    );
}
