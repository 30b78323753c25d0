//! Full-stack exporter tests: router → coordinator → ARM client → mocked Azure.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use azx_arm::ArmClient;
use azx_core::{Credentials, ExporterConfig};
use azx_metrics::MetricsSnapshot;
use azx_scrape::ScrapeCoordinator;

async fn exporter_router(server: &MockServer) -> axum::Router {
    let config = ExporterConfig {
        request_timeout: Duration::from_secs(5),
        cycle_deadline: Duration::from_secs(10),
        login_base_url: server.uri(),
        management_base_url: server.uri(),
        ..Default::default()
    };
    let credentials = Credentials::new("sub-1", "client-1", "s3cret", "tenant-1").unwrap();
    let client = ArmClient::connect(credentials, &config).await.unwrap();
    let coordinator = ScrapeCoordinator::new(
        Arc::new(client),
        Arc::new(MetricsSnapshot::new()),
        config.cycle_deadline,
    );
    azx_api::build_router(Arc::new(coordinator), &config.namespace, "/metrics")
}

async fn scrape(router: axum::Router) -> String {
    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn exporter_serves_vpn_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"T1","expires_on":"9999999999"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-1/providers/Microsoft.Network/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"value":[{"id":"/subscriptions/sub-1/resourceGroups/RG1/providers/Microsoft.Network/connections/Conn1"}]}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/subscriptions/sub-1/resourceGroups/RG1/providers/Microsoft.Network/connections/Conn1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"properties":{"connectionStatus":"Connected","ingressBytesTransferred":100,"egressBytesTransferred":40}}"#,
        ))
        .expect(2)
        .mount(&server)
        .await;

    let router = exporter_router(&server).await;

    let first = scrape(router.clone()).await;
    assert!(first.contains("azure_up 1\n"));
    assert!(first.contains("azure_vpn_status{name=\"conn1\",group=\"rg1\"} 1\n"));
    assert!(first.contains("azure_vpn_ingress_bytes{name=\"conn1\",group=\"rg1\"} 100\n"));

    let second = scrape(router).await;
    assert!(second.contains("azure_vpn_ingress_bytes{name=\"conn1\",group=\"rg1\"} 200\n"));
    assert!(second.contains("azure_vpn_egress_bytes{name=\"conn1\",group=\"rg1\"} 80\n"));
}

#[tokio::test]
async fn expired_token_is_refreshed_before_scrape() {
    let server = MockServer::start().await;
    // Tokens without expires_on are already expired, so every request re-authenticates.
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"T1"}"#))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-1/providers/Microsoft.Network/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let router = exporter_router(&server).await;
    let body = scrape(router).await;
    assert!(body.contains("azure_up 1\n"));
}
