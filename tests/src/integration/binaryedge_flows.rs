//! # BinaryEdge Flows
//!
//! Drives the key-gated BinaryEdge source against a mocked API and checks
//! what reaches the bus:
//!
//! 1. Heartbeat and "Querying" log precede the request
//! 2. Only names under the target domain are published
//! 3. Failures produce exactly one error log and no discoveries
//! 4. No key, no context or a cancelled token means no request at all
//! 5. Consecutive lookups are spaced by the source's interval

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use datasrcs::sources::binaryedge::RATE_INTERVAL;
    use datasrcs::{BinaryEdge, QueryService, RequestContext};
    use shared_bus::{HarvestEvent, Severity};
    use shared_types::{DiscoveryRequest, ScanConfig, ServiceState, SourceKind};

    use crate::integration::fixtures::{discoveries, error_logs, http, names, scan_config, Harness};

    const KEY: &str = "be-test-key";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn started_source(server: &MockServer, config: Arc<ScanConfig>) -> BinaryEdge {
        let source = BinaryEdge::with_base_url(config, http(), server.uri());
        source.start().await.unwrap();
        source
    }

    fn keyed_config() -> Arc<ScanConfig> {
        scan_config(&["example.com"], &[("BinaryEdge", KEY)])
    }

    async fn mount_events(server: &MockServer, body: serde_json::Value, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/subdomain/example.com"))
            .and(header("X-Key", KEY))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected)
            .mount(server)
            .await;
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_publishes_only_names_under_domain() {
        let server = MockServer::start().await;
        mount_events(
            &server,
            json!({"events": ["www.example.com", "evil.other.com", "api.example.com"]}),
            1,
        )
        .await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        let events = harness.drain();
        assert_eq!(events[0], HarvestEvent::active("BinaryEdge"));
        assert_eq!(
            events[1],
            HarvestEvent::log(
                "BinaryEdge",
                Severity::Info,
                "Querying BinaryEdge for example.com subdomains"
            )
        );

        let found = discoveries(&events);
        assert_eq!(
            found,
            vec![
                DiscoveryRequest::discovered(
                    "www.example.com",
                    "example.com",
                    SourceKind::Api,
                    "BinaryEdge"
                ),
                DiscoveryRequest::discovered(
                    "api.example.com",
                    "example.com",
                    SourceKind::Api,
                    "BinaryEdge"
                ),
            ]
        );
        assert!(error_logs(&events).is_empty());
    }

    #[tokio::test]
    async fn test_missing_events_field_is_empty_result() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"query": "example.com", "total": 0}), 1).await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        let events = harness.drain();
        assert!(discoveries(&events).is_empty());
        assert!(error_logs(&events).is_empty());
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_invalid_json_is_one_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subdomain/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(1)
            .mount(&server)
            .await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        let events = harness.drain();
        assert!(discoveries(&events).is_empty());
        assert_eq!(error_logs(&events).len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_one_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        let events = harness.drain();
        let errors = error_logs(&events);
        assert!(discoveries(&events).is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            format!(
                "BinaryEdge: {}/subdomain/example.com: unexpected status 500",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_one_failure() {
        // Nothing listens on the discard port.
        let config = keyed_config();
        let source = BinaryEdge::with_base_url(Arc::clone(&config), http(), "http://127.0.0.1:9");
        source.start().await.unwrap();
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        let events = harness.drain();
        assert!(discoveries(&events).is_empty());
        assert_eq!(error_logs(&events).len(), 1);
    }

    // =============================================================================
    // GUARDS
    // =============================================================================

    #[tokio::test]
    async fn test_without_key_nothing_happens() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 0).await;

        let config = scan_config(&["example.com"], &[]);
        let source = started_source(&server, Arc::clone(&config)).await;
        assert_eq!(source.state(), ServiceState::Running);

        let mut harness = Harness::new(config);
        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_missing_context_parts_do_nothing() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 0).await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(Arc::clone(&config));
        let req = DiscoveryRequest::lookup("example.com");

        let no_bus = RequestContext {
            bus: None,
            ..harness.ctx.clone()
        };
        source.handle(&no_bus, &req).await;

        let no_config = RequestContext {
            config: None,
            ..harness.ctx.clone()
        };
        source.handle(&no_config, &req).await;

        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_scope_domain_does_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.org"))
            .await;

        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_source_ignores_lookups() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 0).await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        source.stop().await.unwrap();
        let mut harness = Harness::new(config);

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        assert!(harness.drain().is_empty());
        assert!(source.start().await.is_err());
    }

    // =============================================================================
    // RATE LIMITING AND CANCELLATION
    // =============================================================================

    #[tokio::test]
    async fn test_cancelled_before_dispatch_makes_no_request() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 0).await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);
        harness.ctx.cancel.cancel();

        source
            .handle(&harness.ctx, &DiscoveryRequest::lookup("example.com"))
            .await;

        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_while_rate_limited() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 1).await;

        let config = keyed_config();
        let source = Arc::new(started_source(&server, Arc::clone(&config)).await);
        let mut harness = Harness::new(config);
        let req = DiscoveryRequest::lookup("example.com");

        // First lookup takes the slot.
        source.handle(&harness.ctx, &req).await;
        assert_eq!(names(&harness.drain()), vec!["www.example.com"]);

        // Second lookup waits on the limiter until cancelled.
        let waiting = {
            let source = Arc::clone(&source);
            let ctx = harness.ctx.clone();
            let req = req.clone();
            tokio::spawn(async move { source.handle(&ctx, &req).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.ctx.cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("cancelled lookup should return promptly")
            .unwrap();

        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_consecutive_lookups_are_spaced() {
        let server = MockServer::start().await;
        mount_events(&server, json!({"events": ["www.example.com"]}), 2).await;

        let config = keyed_config();
        let source = started_source(&server, Arc::clone(&config)).await;
        let mut harness = Harness::new(config);
        let req = DiscoveryRequest::lookup("example.com");

        let started = Instant::now();
        source.handle(&harness.ctx, &req).await;
        source.handle(&harness.ctx, &req).await;
        assert!(started.elapsed() >= RATE_INTERVAL);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(names(&harness.drain()).len(), 2);
    }
}
