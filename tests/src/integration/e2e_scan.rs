//! # End-to-End Scans
//!
//! Runs the whole runtime (container, registry, event routing) against
//! mocked providers:
//!
//! ```text
//! HarvestRuntime::run
//!     ├── start_all      (BinaryEdge without a key stays inert)
//!     ├── dispatch_all   (every domain × every source)
//!     ├── stop_all + bus close
//!     └── ScanReport     (discoveries, queried sources, failures)
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use datasrcs::{BinaryEdge, CrtSh, HackerTarget, QueryService};
    use harvest_runtime::container::ServiceContainer;
    use harvest_runtime::HarvestRuntime;
    use shared_types::{ScanConfig, ServiceState};

    use crate::integration::fixtures::{http, scan_config};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Providers {
        binaryedge: MockServer,
        crtsh: MockServer,
        hackertarget: MockServer,
    }

    impl Providers {
        async fn start() -> Self {
            Self {
                binaryedge: MockServer::start().await,
                crtsh: MockServer::start().await,
                hackertarget: MockServer::start().await,
            }
        }

        fn sources(&self, config: &Arc<ScanConfig>) -> Vec<Arc<dyn QueryService>> {
            vec![
                Arc::new(BinaryEdge::with_base_url(
                    Arc::clone(config),
                    http(),
                    self.binaryedge.uri(),
                )),
                Arc::new(CrtSh::with_base_url(
                    Arc::clone(config),
                    http(),
                    self.crtsh.uri(),
                )),
                Arc::new(HackerTarget::with_base_url(
                    Arc::clone(config),
                    http(),
                    self.hackertarget.uri(),
                )),
            ]
        }

        fn runtime(&self, config: Arc<ScanConfig>, only: &[String]) -> HarvestRuntime {
            let container =
                ServiceContainer::with_sources(Arc::clone(&config), self.sources(&config), only)
                    .unwrap();
            HarvestRuntime::with_container(container, None)
        }
    }

    // =============================================================================
    // SCANS
    // =============================================================================

    #[tokio::test]
    async fn test_full_scan_collects_every_source() {
        let providers = Providers::start().await;

        Mock::given(method("GET"))
            .and(path("/subdomain/example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"events": ["api.example.com", "cdn.other.net"]})),
            )
            .expect(1)
            .mount(&providers.binaryedge)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "%.example.com"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"name_value": "www.example.com"}])),
            )
            .expect(1)
            .mount(&providers.crtsh)
            .await;
        Mock::given(method("GET"))
            .and(path("/hostsearch/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("www.example.com,93.184.216.34"),
            )
            .expect(1)
            .mount(&providers.hackertarget)
            .await;

        let config = scan_config(&["example.com"], &[("BinaryEdge", "k")]);
        let runtime = providers.runtime(config, &[]);

        let report = runtime.run().await.unwrap();

        assert_eq!(report.discoveries.len(), 3);
        assert_eq!(
            report.unique_names().into_iter().collect::<Vec<_>>(),
            vec!["api.example.com", "www.example.com"]
        );
        assert_eq!(report.queried.len(), 3);
        assert_eq!(report.failures, 0);

        assert!(runtime.container().bus.is_closed());
        assert_eq!(
            runtime.container().registry.state("CrtSh"),
            Some(ServiceState::Stopped)
        );
    }

    #[tokio::test]
    async fn test_scan_without_key_and_with_failing_source() {
        let providers = Providers::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
            .expect(0)
            .mount(&providers.binaryedge)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&providers.crtsh)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("mx.example.com,10.1.1.1"))
            .expect(1)
            .mount(&providers.hackertarget)
            .await;

        let runtime = providers.runtime(scan_config(&["example.com"], &[]), &[]);
        let report = runtime.run().await.unwrap();

        let names: Vec<&str> = report.discoveries.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["mx.example.com"]);
        assert_eq!(report.failures, 1);
        assert!(!report.queried.contains("BinaryEdge"));
    }

    #[tokio::test]
    async fn test_every_domain_reaches_selected_source() {
        let providers = Providers::start().await;

        Mock::given(method("GET"))
            .and(query_param("q", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a.example.com,1.1.1.1"))
            .expect(1)
            .mount(&providers.hackertarget)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_string("b.example.org,1.1.1.2"))
            .expect(1)
            .mount(&providers.hackertarget)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&providers.crtsh)
            .await;

        let config = scan_config(&["example.com", "example.org"], &[]);
        let runtime = providers.runtime(config, &["hackertarget".to_string()]);

        let report = runtime.run().await.unwrap();

        let mut pairs: Vec<(String, String)> = report
            .discoveries
            .iter()
            .map(|d| (d.name.clone(), d.domain.clone()))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("a.example.com".to_string(), "example.com".to_string()),
                ("b.example.org".to_string(), "example.org".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_scan_finishes_without_requests() {
        let providers = Providers::start().await;
        for server in [&providers.binaryedge, &providers.crtsh, &providers.hackertarget] {
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(server)
                .await;
        }

        let config = scan_config(&["example.com"], &[("BinaryEdge", "k")]);
        let runtime = providers.runtime(config, &[]);
        runtime.shutdown();

        let report = tokio::time::timeout(Duration::from_secs(5), runtime.run())
            .await
            .expect("a cancelled scan still terminates")
            .unwrap();

        assert!(report.discoveries.is_empty());
        assert!(report.queried.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_cuts_slow_provider() {
        let providers = Providers::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow.example.com,1.1.1.1")
                    .set_delay(Duration::from_secs(4)),
            )
            .mount(&providers.hackertarget)
            .await;

        let config = scan_config(&["example.com"], &[]);
        let runtime = providers.runtime(config, &["HackerTarget".to_string()]);
        let cancel = runtime.cancel_token();

        tokio::spawn(harvest_runtime::cancel_on_shutdown(
            cancel,
            Some(Duration::from_millis(200)),
        ));

        let report = tokio::time::timeout(Duration::from_secs(2), runtime.run())
            .await
            .expect("deadline should abort the in-flight request")
            .unwrap();

        assert!(report.discoveries.is_empty());
        assert_eq!(report.failures, 0);
        assert_eq!(report.queried.len(), 1);
    }
}
