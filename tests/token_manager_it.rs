mod common;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use azure_collector::{
	auth::{ClientCertificate, Credentials, StaticJwt, TokenManager, TokenSecret},
	error::{AuthError, Error},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

const GRAPH: &str = "https://graph.microsoft.com";
const GRAPH_SCOPE: &str = "scope=https%3A%2F%2Fgraph.microsoft.com%2F.default";
const CERT_PEM: &[u8] = include_bytes!("fixtures/client-cert.pem");
const KEY_PEM: &[u8] = include_bytes!("fixtures/client-key.pem");
const PUB_PEM: &[u8] = include_bytes!("fixtures/client-pub.pem");

type ReqwestTokenManager = TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

fn manager(server: &MockServer, credentials: Credentials) -> ReqwestTokenManager {
	TokenManager::new(
		&common::server_url(server, "/"),
		&common::tenant(),
		common::client_id(),
		GRAPH,
		credentials,
		ReqwestHttpClient::default(),
		ReqwestTransportErrorMapper,
	)
	.expect("Token manager should build.")
}

fn client_secret() -> Credentials {
	Credentials::ClientSecret(TokenSecret::new(common::CLIENT_SECRET))
}

fn token_body(token: &str, refresh: Option<&str>, expires_in: i64) -> String {
	match refresh {
		Some(refresh) => format!(
			r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":{expires_in},"refresh_token":"{refresh}"}}"#
		),
		None => format!(
			r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":{expires_in}}}"#
		),
	}
}

fn unsigned_jwt(claims: &str) -> String {
	format!("{}.{}.", URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#), URL_SAFE_NO_PAD.encode(claims))
}

#[tokio::test]
async fn client_secret_token_is_cached_and_singleflight() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.body_includes("grant_type=client_credentials")
				.body_includes("client_secret=collector-secret")
				.body_includes(GRAPH_SCOPE);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token", None, 3600));
		})
		.await;
	let tokens = manager(&server, client_secret());
	let (first, second) = tokio::join!(tokens.bearer(), tokens.bearer());
	let third = tokens.bearer().await.expect("Cached bearer should be returned.");

	assert_eq!(first.expect("First bearer should succeed.").expose(), "graph-token");
	assert_eq!(second.expect("Second bearer should succeed.").expose(), "graph-token");
	assert_eq!(third.expose(), "graph-token");
	assert_eq!(tokens.scope(), "https://graph.microsoft.com/.default");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn tokens_inside_the_expiry_skew_are_reacquired() {
	let server = MockServer::start_async().await;
	let mock = common::mock_token(&server, "short-lived", 5).await;
	let tokens = manager(&server, client_secret());

	tokens.bearer().await.expect("First bearer should succeed.");

	let cached = tokens.current().expect("Token should be cached after the first call.");

	assert!(tokens.is_expired(&cached));

	tokens.bearer().await.expect("Second bearer should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn authenticate_always_hits_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let mock = common::mock_token(&server, "fresh", 3600).await;
	let tokens = manager(&server, client_secret());

	tokens.authenticate().await.expect("First authenticate should succeed.");
	tokens.authenticate().await.expect("Second authenticate should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn certificate_grant_posts_a_verifiable_assertion() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.body_includes("grant_type=client_credentials")
				.body_includes(
					"client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer",
				)
				.body_includes("client_assertion=ey");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("cert-token", None, 3600));
		})
		.await;
	let certificate =
		ClientCertificate::from_pem(CERT_PEM, KEY_PEM).expect("Fixture certificate should load.");
	let tokens = manager(&server, Credentials::ClientCertificate(certificate.clone()));

	assert_eq!(tokens.bearer().await.expect("Bearer should succeed.").expose(), "cert-token");

	mock.assert_calls_async(1).await;

	let now = time::OffsetDateTime::now_utc();
	let assertion = certificate
		.sign_assertion(&common::client_id(), tokens.token_endpoint(), now)
		.expect("Assertion should sign.");
	let header = jsonwebtoken::decode_header(&assertion).expect("Assertion header should decode.");
	let mut validation = Validation::new(Algorithm::RS256);

	validation.set_audience(&[tokens.token_endpoint().as_str()]);
	validation.set_issuer(&[common::CLIENT_ID]);

	let claims = jsonwebtoken::decode::<serde_json::Value>(
		&assertion,
		&DecodingKey::from_rsa_pem(PUB_PEM).expect("Fixture public key should load."),
		&validation,
	)
	.expect("Assertion should verify against the certificate's public key.")
	.claims;

	assert_eq!(header.x5t.as_deref(), Some("4bnJXDXgOwx_OlIBWfRUmZDpy6I"));
	assert_eq!(claims["sub"], common::CLIENT_ID);
	assert_eq!(claims["nbf"].as_i64(), Some(now.unix_timestamp()));
	assert_eq!(claims["exp"].as_i64(), Some(now.unix_timestamp() + 60));
}

#[tokio::test]
async fn refresh_tokens_rotate_between_exchanges() {
	let server = MockServer::start_async().await;
	let first = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=rt-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("at-1", Some("rt-2"), 5));
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=rt-2");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("at-2", None, 3600));
		})
		.await;
	let tokens = manager(
		&server,
		Credentials::RefreshToken { refresh_token: TokenSecret::new("rt-1"), client_secret: None },
	);

	assert_eq!(tokens.bearer().await.expect("First bearer should succeed.").expose(), "at-1");
	assert_eq!(tokens.bearer().await.expect("Second bearer should succeed.").expose(), "at-2");

	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;
}

#[tokio::test]
async fn password_grant_sends_resource_owner_credentials() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.body_includes("grant_type=password")
				.body_includes("username=auditor%40contoso.com")
				.body_includes("password=hunter2");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("user-token", None, 3600));
		})
		.await;
	let tokens = manager(
		&server,
		Credentials::Password {
			username: "auditor@contoso.com".into(),
			password: TokenSecret::new("hunter2"),
		},
	);

	assert_eq!(tokens.bearer().await.expect("Bearer should succeed.").expose(), "user-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_endpoint_rejections_are_classified() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(common::TOKEN_PATH);
			then.status(401).header("content-type", "application/json").body(
				r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 0000"}"#,
			);
		})
		.await;
	let tokens = manager(&server, client_secret());
	let err = tokens.bearer().await.expect_err("Rejected secrets must fail.");

	assert!(matches!(err, Error::InvalidClient { .. }));
	assert!(tokens.current().is_none());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn static_jwt_skips_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let mock = common::mock_token(&server, "unused", 3600).await;
	let jwt = unsigned_jwt(r#"{"aud":"https://graph.microsoft.com","exp":4102444800}"#);
	let tokens = manager(
		&server,
		Credentials::StaticJwt(StaticJwt::parse(&jwt).expect("JWT fixture should parse.")),
	);

	assert_eq!(tokens.bearer().await.expect("Static JWT should be returned.").expose(), jwt);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn static_jwt_for_another_audience_is_rejected() {
	let server = MockServer::start_async().await;
	let jwt = unsigned_jwt(r#"{"aud":"https://management.azure.com"}"#);
	let tokens = manager(
		&server,
		Credentials::StaticJwt(StaticJwt::parse(&jwt).expect("JWT fixture should parse.")),
	);
	let err = tokens.bearer().await.expect_err("Audience mismatch must be rejected.");

	assert!(matches!(
		err,
		Error::Auth(AuthError::AudienceMismatch { ref expected, .. }) if expected == GRAPH
	));
}
