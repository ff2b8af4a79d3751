//! Integration tests for the HTTP transport using wiremock
//!
//! These tests drive the resource graph through a real reqwest client
//! against mocked broker endpoints.

mod support;

use openshift_client::{Api, ClientConfig, ClientError, HttpTransport, RequestExecutor};
use std::sync::Arc;
use std::time::Duration;
use support::sample;
use url::Url;
use wiremock::matchers::{basic_auth, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_PATH: &str = "/broker/rest";

fn base_of(server: &MockServer) -> String {
    format!("{}{}", server.uri(), SERVICE_PATH)
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        server_url: server.uri(),
        service_path: SERVICE_PATH.to_string(),
        timeout_secs: 5,
        ..ClientConfig::default()
    }
}

async fn mount_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/broker/rest/api"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sample("get-rest-api.json", &base_of(server))),
        )
        .expect(1)
        .mount(server)
        .await;
}

mod http_transport_tests {
    use super::*;

    /// Bootstrap followed by a list, both over HTTP
    #[tokio::test]
    async fn test_bootstrap_and_list_domains() {
        let server = MockServer::start().await;
        mount_root(&server).await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/domains"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sample("get-domains.json", &base_of(&server))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).expect("client should build");
        let domains = api.domains().await.expect("domains should load");

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0].id().await.unwrap(), "alpha");
        assert_eq!(domains[1].id().await.unwrap(), "beta");

        // served from the cache; the mocks' expectations verify the counts
        api.domains().await.unwrap();
    }

    /// Credentials travel as HTTP basic auth
    #[tokio::test]
    async fn test_basic_auth_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/api"))
            .and(basic_auth("dev@example.com", "s3cret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sample("get-rest-api.json", &base_of(&server))),
            )
            .expect(1)
            .mount(&server)
            .await;

        // the stored login is paired with the password
        let config = ClientConfig {
            login: Some("dev@example.com".to_string()),
            ..config_for(&server)
        };
        let api = Api::connect(&config, config.credentials("s3cret")).unwrap();
        assert!(api.has_link("GET_USER").await.unwrap());
    }

    /// Test 401 response maps to InvalidCredentials
    #[tokio::test]
    async fn test_401_returns_invalid_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/api"))
            .respond_with(ResponseTemplate::new(401).set_body_string(""))
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).unwrap();
        let err = api.has_link("LIST_DOMAINS").await.unwrap_err();
        match err {
            ClientError::InvalidCredentials { message } => {
                assert_eq!(message, "API returned HTTP 401");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test 404 response maps to NotFound with the server's exit code
    #[tokio::test]
    async fn test_404_returns_not_found() {
        let server = MockServer::start().await;
        mount_root(&server).await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/domains"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(sample("get-domain-notfound.json", &base_of(&server))),
            )
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).unwrap();
        let err = api.domains().await.unwrap_err();
        match &err {
            ClientError::NotFound { exit_code, message } => {
                assert_eq!(*exit_code, Some(127));
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_retryable());
    }

    /// Test 5xx response maps to ServerError
    #[tokio::test]
    async fn test_500_returns_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/api"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).unwrap();
        assert!(matches!(
            api.has_link("LIST_DOMAINS").await,
            Err(ClientError::ServerError { status: 503, .. })
        ));
    }

    /// POST parameters are sent as a form body
    #[tokio::test]
    async fn test_create_domain_posts_form_body() {
        let server = MockServer::start().await;
        mount_root(&server).await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/domains"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sample("get-domains-noexisting.json", &base_of(&server))),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/broker/rest/domains"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("id=gamma"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_string(sample("add-domain.json", &base_of(&server))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).unwrap();
        let gamma = api.create_domain("gamma").await.expect("domain should be created");
        assert_eq!(gamma.id().await.unwrap(), "gamma");
        assert_eq!(api.domains().await.unwrap().len(), 1);
    }

    /// DELETE parameters are sent in the query string
    #[tokio::test]
    async fn test_force_destroy_uses_query() {
        let server = MockServer::start().await;
        mount_root(&server).await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/domains"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sample("get-domains.json", &base_of(&server))),
            )
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/broker/rest/domains/beta"))
            .and(query_param("force", "true"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = Api::connect(&config_for(&server), None).unwrap();
        let beta = api.domain("beta").await.unwrap().expect("beta exists");
        beta.force_destroy().await.expect("delete should succeed");

        assert!(beta.is_destroyed().await);
        assert_eq!(api.domains().await.unwrap().len(), 1);
    }

    /// A slow server surfaces as a retryable timeout
    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broker/rest/api"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(sample("get-rest-api.json", &base_of(&server)))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let transport =
            HttpTransport::new("openshift-client-test", Duration::from_millis(100), None).unwrap();
        let base = Url::parse(&base_of(&server)).unwrap();
        let executor = RequestExecutor::new(base, Arc::new(transport));
        let api = Api::new(executor);

        let err = api.has_link("LIST_DOMAINS").await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert!(err.is_retryable());
    }

    /// Nothing listening surfaces as a network failure
    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = ClientConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ClientConfig::default()
        };

        let api = Api::connect(&config, None).unwrap();
        let err = api.has_link("LIST_DOMAINS").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout(_)));
        assert!(err.is_retryable());
    }
}
