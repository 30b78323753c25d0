//! API client — authenticated requests against Azure Resource Manager.
//!
//! Every request first checks the current token against the clock and
//! re-authenticates when it has expired. The check and the refresh run
//! under the token lock, so concurrent requests trigger at most one
//! refresh. Non-2xx responses are handed back untouched; the caller finds
//! out while decoding.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, Url};
use tokio::sync::Mutex;
use tracing::{debug, error};

use azx_core::{Credentials, ExporterConfig};

use crate::error::{ArmError, ArmResult};
use crate::token::{ClientCredentialsSource, Clock, SystemClock, Token, TokenSource};

/// Client for the Resource Manager API of a single subscription.
pub struct ArmClient {
    http: reqwest::Client,
    token: Mutex<Token>,
    token_source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    subscription_id: String,
    management_base: Url,
}

impl ArmClient {
    /// Authenticate with the service principal and build a client.
    ///
    /// Fails with [`ArmError::Auth`] when no initial token can be obtained.
    pub async fn connect(credentials: Credentials, config: &ExporterConfig) -> ArmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ArmError::Network(format!("unable to build http client: {e}")))?;
        let subscription_id = credentials.subscription_id().to_string();
        let source = ClientCredentialsSource::new(http.clone(), &config.login_base_url, credentials);

        let client = Self::with_token_source(
            http,
            subscription_id,
            &config.management_base_url,
            Arc::new(source),
            Arc::new(SystemClock),
        )
        .await
        .inspect_err(|e| error!(error = %e, "failed to create client while getting token"))?;
        Ok(client)
    }

    /// Build a client around an arbitrary token source and clock.
    ///
    /// An initial token is acquired immediately.
    pub async fn with_token_source(
        http: reqwest::Client,
        subscription_id: impl Into<String>,
        management_base_url: &str,
        token_source: Arc<dyn TokenSource>,
        clock: Arc<dyn Clock>,
    ) -> ArmResult<Self> {
        let management_base = Url::parse(management_base_url).map_err(|e| ArmError::InvalidUrl {
            url: management_base_url.to_string(),
            reason: e.to_string(),
        })?;
        let token = token_source.acquire().await?;

        Ok(Self {
            http,
            token: Mutex::new(token),
            token_source,
            clock,
            subscription_id: subscription_id.into(),
            management_base,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Build a versioned Resource Manager URL.
    ///
    /// Without a resource group (or with an empty one) the URL is
    /// subscription-scoped; otherwise it is scoped to the group.
    pub fn build_url(&self, group: Option<&str>, provider_path: &str, api_version: &str) -> Url {
        let path = match group.filter(|g| !g.is_empty()) {
            Some(group) => format!(
                "/subscriptions/{}/resourceGroups/{}/providers/{}",
                self.subscription_id, group, provider_path
            ),
            None => format!(
                "/subscriptions/{}/providers/{}",
                self.subscription_id, provider_path
            ),
        };

        let mut url = self.management_base.clone();
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", api_version);
        url
    }

    /// Return a bearer value that is valid now, re-authenticating if needed.
    pub async fn current_bearer(&self) -> ArmResult<String> {
        let mut token = self.token.lock().await;
        let now = self.clock.now_unix();
        debug!(now, expires_on = token.expires_on, "checking token expiry");

        if token.is_expired(now) {
            debug!("auth token has expired, re-authenticating");
            let fresh = self
                .token_source
                .acquire()
                .await
                .inspect_err(|e| error!(error = %e, "unable to authenticate with azure"))?;
            *token = fresh;
        }

        Ok(token.bearer.clone())
    }

    /// Issue an authenticated request.
    ///
    /// Auth failures surface as [`ArmError::Auth`] without touching the
    /// network; transport failures as [`ArmError::Network`] or
    /// [`ArmError::Timeout`]. The HTTP status is not inspected.
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> ArmResult<Response> {
        let bearer = self.current_bearer().await?;
        debug!(%method, %url, "resource manager request");

        let mut req = self
            .http
            .request(method, url)
            .bearer_auth(bearer)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.body(body.to_string());
        }

        req.send().await.map_err(ArmError::transport)
    }

    pub async fn get(&self, url: Url) -> ArmResult<Response> {
        self.request(Method::GET, url, None).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Hands out tokens `T1`, `T2`, ... each expiring at a fixed time.
    pub(crate) struct FakeTokenSource {
        pub calls: AtomicUsize,
        pub expires_on: AtomicI64,
        pub fail_after: Option<usize>,
    }

    impl FakeTokenSource {
        pub(crate) fn new(expires_on: i64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expires_on: AtomicI64::new(expires_on),
                fail_after: None,
            }
        }
    }

    #[async_trait]
    impl TokenSource for FakeTokenSource {
        async fn acquire(&self) -> ArmResult<Token> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_after.is_some_and(|limit| n > limit) {
                return Err(ArmError::Auth("identity endpoint unreachable".to_string()));
            }
            Ok(Token {
                token_type: "Bearer".to_string(),
                scope: String::new(),
                resource: String::new(),
                bearer: format!("T{n}"),
                expires_in: 3600,
                expires_on: self.expires_on.load(Ordering::SeqCst),
                not_before: 0,
            })
        }
    }

    pub(crate) struct FakeClock(pub AtomicI64);

    impl Clock for FakeClock {
        fn now_unix(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    pub(crate) async fn test_client(
        base: &str,
        source: Arc<FakeTokenSource>,
        clock: Arc<FakeClock>,
    ) -> ArmClient {
        ArmClient::with_token_source(reqwest::Client::new(), "sub-1", base, source, clock)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn build_url_subscription_scoped() {
        let client = test_client(
            "https://management.azure.com",
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;

        let url = client.build_url(None, "Microsoft.Network/connections", "2015-06-15");
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-1/providers/Microsoft.Network/connections?api-version=2015-06-15"
        );

        let empty = client.build_url(Some(""), "Microsoft.Network/connections", "2015-06-15");
        assert_eq!(empty, url);
        assert!(!empty.as_str().contains("resourceGroups"));
    }

    #[tokio::test]
    async fn build_url_group_scoped() {
        let client = test_client(
            "https://management.azure.com",
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;

        let url = client.build_url(Some("rg1"), "Microsoft.Network/connections/conn1", "2015-06-15");
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Network/connections/conn1?api-version=2015-06-15"
        );
        assert_eq!(url.as_str().matches("/resourceGroups/").count(), 1);
    }

    #[tokio::test]
    async fn valid_token_is_reused() {
        let source = Arc::new(FakeTokenSource::new(2000));
        let clock = Arc::new(FakeClock(AtomicI64::new(1000)));
        let client = test_client("http://localhost", source.clone(), clock).await;

        assert_eq!(client.current_bearer().await.unwrap(), "T1");
        assert_eq!(client.current_bearer().await.unwrap(), "T1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed() {
        let source = Arc::new(FakeTokenSource::new(2000));
        let clock = Arc::new(FakeClock(AtomicI64::new(1000)));
        let client = test_client("http://localhost", source.clone(), clock.clone()).await;

        // Exactly at expires_on counts as expired.
        clock.0.store(2000, Ordering::SeqCst);
        assert_eq!(client.current_bearer().await.unwrap(), "T2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_requests_refresh_once() {
        let source = Arc::new(FakeTokenSource::new(2000));
        let clock = Arc::new(FakeClock(AtomicI64::new(1000)));
        let client = Arc::new(test_client("http://localhost", source.clone(), clock.clone()).await);

        source.expires_on.store(10_000, Ordering::SeqCst);
        clock.0.store(3000, Ordering::SeqCst);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move { client.current_bearer().await }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "T2");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_skips_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut fake = FakeTokenSource::new(2000);
        fake.fail_after = Some(1);
        let source = Arc::new(fake);
        let clock = Arc::new(FakeClock(AtomicI64::new(3000)));
        let client = test_client(&server.uri(), source, clock).await;

        let url = client.build_url(None, "Microsoft.Network/connections", "2015-06-15");
        let err = client.get(url).await.unwrap_err();
        assert!(err.is_auth(), "got {err}");
    }

    #[tokio::test]
    async fn request_carries_bearer_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/providers/Microsoft.Network/connections"))
            .and(query_param("api-version", "2015-06-15"))
            .and(header("authorization", "Bearer T1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(
            &server.uri(),
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;
        let url = client.build_url(None, "Microsoft.Network/connections", "2015-06-15");
        let resp = client.get(url).await.unwrap();
        assert!(resp.status().is_success());
    }

    #[tokio::test]
    async fn request_sends_json_body_with_method() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({"properties": {"connectionStatus": "Connected"}});
        Mock::given(method("POST"))
            .and(path("/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Network/connections"))
            .and(query_param("api-version", "2015-06-15"))
            .and(header("authorization", "Bearer T1"))
            .and(header("content-type", "application/json"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(
            &server.uri(),
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;
        let url = client.build_url(Some("rg1"), "Microsoft.Network/connections", "2015-06-15");
        let resp = client.request(Method::POST, url, Some(&payload)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 201);
    }

    #[tokio::test]
    async fn non_success_status_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = test_client(
            &server.uri(),
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;
        let url = client.build_url(None, "Microsoft.Network/connections", "2015-06-15");
        let resp = client.get(url).await.unwrap();
        assert_eq!(resp.status().as_u16(), 403);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = test_client(
            "http://127.0.0.1:1",
            Arc::new(FakeTokenSource::new(i64::MAX)),
            Arc::new(FakeClock(AtomicI64::new(0))),
        )
        .await;
        let url = client.build_url(None, "Microsoft.Network/connections", "2015-06-15");
        let err = client.get(url).await.unwrap_err();
        assert!(err.is_network(), "got {err}");
    }
}
