//! End-to-end traversal tests against live handler sockets

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::Status;

use common::{sample_graph, single_node_graph, spawn_handler, ScriptedHandler};
use weft_gateway::{
    Context, GatewayError, HttpRequest, NodeHandler, RequestRouter, RouterOptions,
};
use weft_graph::RESPONSE_KEY;

fn inbound(path: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        path: path.to_string(),
        body: Vec::new(),
    }
}

#[tokio::test]
async fn test_sample_graph_traversal() {
    let handler = ScriptedHandler::new();
    let addr = spawn_handler(handler.clone()).await;
    let router = RequestRouter::connect(sample_graph(&addr.to_string()), RouterOptions::new())
        .await
        .expect("Failed to connect router");

    let response = router.handle(inbound("/")).await.expect("Traversal failed");

    // Bobik answers last; its reply owns the terminal key
    assert_eq!(response.body, "hello from Bobik");

    let mut invoked = handler.invocations();
    assert_eq!(invoked.len(), 7);
    invoked.sort();
    assert_eq!(
        invoked,
        vec!["Bar", "Bobik", "Echo", "Foo", "Hui", "Spam", "Zhopa"]
    );

    // The origin is invoked with the raw HTTP request, which decodes as an
    // empty context on the handler side
    assert!(handler.keys_seen_by("Echo").is_empty());

    // Siblings of one wave see the same snapshot, not each other's replies
    let wave_snapshot = vec![
        "bar_mark".to_string(),
        "echo_data".to_string(),
        "foo_mark".to_string(),
        "http_response".to_string(),
        "hui_mark".to_string(),
    ];
    assert_eq!(handler.keys_seen_by("Zhopa"), wave_snapshot);
    assert_eq!(handler.keys_seen_by("Spam"), wave_snapshot);

    // The final node sees everything accumulated before it
    assert_eq!(
        handler.keys_seen_by("Bobik"),
        vec![
            "bar_mark".to_string(),
            "echo_data".to_string(),
            "foo_mark".to_string(),
            "http_response".to_string(),
            "hui_mark".to_string(),
            "spam_mark".to_string(),
            "zhopa_mark".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_requests_are_isolated() {
    let handler = ScriptedHandler::new();
    let addr = spawn_handler(handler.clone()).await;
    let router = RequestRouter::connect(sample_graph(&addr.to_string()), RouterOptions::new())
        .await
        .expect("Failed to connect router");

    let first = router.handle(inbound("/a")).await.expect("First traversal failed");
    let second = router.handle(inbound("/b")).await.expect("Second traversal failed");

    assert_eq!(first.body, second.body);
    assert_eq!(handler.invocations().len(), 14);

    // No context leaked from the first request into the second
    assert_eq!(handler.keys_seen_by("Bobik").len(), 7);
}

#[tokio::test]
async fn test_failing_node_aborts_traversal() {
    let handler = ScriptedHandler::new();
    let addr = spawn_handler(handler.clone()).await;
    let router = RequestRouter::connect(sample_graph(&addr.to_string()), RouterOptions::new())
        .await
        .expect("Failed to connect router");

    handler.fail_next("Spam");
    let err = router.handle(inbound("/")).await.unwrap_err();
    match err {
        GatewayError::Invoke { node, status } => {
            assert_eq!(node, "Spam");
            assert_eq!(status.code(), tonic::Code::Unavailable);
        }
        other => panic!("expected invoke error, got {other:?}"),
    }

    // Nothing downstream of the failed wave ran
    assert!(!handler.invocations().contains(&"Bobik".to_string()));

    // The handler recovered, so the next request succeeds on the same channels
    let response = router.handle(inbound("/")).await.expect("Retry failed");
    assert_eq!(response.body, "hello from Bobik");
    assert_eq!(
        handler
            .invocations()
            .iter()
            .filter(|name| *name == "Bobik")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_missing_terminal_response_fails() {
    struct Silent;

    #[async_trait]
    impl NodeHandler for Silent {
        async fn serve(&self, _node: &str, _context: Context) -> Result<Context, Status> {
            Ok(Context::default())
        }
    }

    let addr = spawn_handler(Arc::new(Silent)).await;
    let router = RequestRouter::connect(single_node_graph(&addr.to_string()), RouterOptions::new())
        .await
        .expect("Failed to connect router");

    let err = router.handle(inbound("/")).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingResponse(key) if key == RESPONSE_KEY));
}

#[tokio::test]
async fn test_mistyped_terminal_response_fails() {
    struct WrongType;

    #[async_trait]
    impl NodeHandler for WrongType {
        async fn serve(&self, _node: &str, _context: Context) -> Result<Context, Status> {
            let mut reply = Context::default();
            reply
                .insert(RESPONSE_KEY, &HttpRequest::default())
                .map_err(|e| Status::internal(e.to_string()))?;
            Ok(reply)
        }
    }

    let addr = spawn_handler(Arc::new(WrongType)).await;
    let router = RequestRouter::connect(single_node_graph(&addr.to_string()), RouterOptions::new())
        .await
        .expect("Failed to connect router");

    let err = router.handle(inbound("/")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { key, .. } if key == RESPONSE_KEY));
}

#[tokio::test]
async fn test_one_unreachable_handler_fails_connect() {
    let handler = ScriptedHandler::new();
    let addr = spawn_handler(handler.clone()).await;

    let mut graph = sample_graph(&addr.to_string());
    graph.nodes[3].host = "127.0.0.1:1".to_string();

    let options = RouterOptions::new().with_connect_timeout(Duration::from_millis(500));
    let err = RequestRouter::connect(graph, options).await.unwrap_err();
    assert!(matches!(err, GatewayError::Dial { node, .. } if node == "Hui"));

    // Startup failed before any traversal could run
    assert!(handler.invocations().is_empty());
}
