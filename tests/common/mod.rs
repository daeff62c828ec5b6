//! Fixtures shared by the integration suites: identifiers, a scripted transport, and
//! `httpmock`-backed client builders.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	future::Future,
	io::{Error as IoError, ErrorKind},
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
#[cfg(feature = "reqwest")] use httpmock::{Mock, prelude::*};
use parking_lot::Mutex;
use url::Url;
// self
#[cfg(feature = "reqwest")]
use azure_collector::{
	client::{AzureClient, ReqwestAzureClient},
	config::{ClientConfig, ClientConfigBuilder},
};
use azure_collector::{
	auth::{ClientId, Credentials, TenantId, TokenManager, TokenSecret},
	error::{Error, TransportError},
	http::{
		AsyncHttpClient, CollectorHttpClient, HttpClientError, HttpRequest, HttpResponse,
		ResponseMetadata, ResponseMetadataSlot, TransportErrorMapper, map_io_error,
	},
	oauth::oauth2::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION},
	sender::{ApiClient, RetryPolicy},
};

pub const TENANT: &str = "contoso.onmicrosoft.com";
pub const CLIENT_ID: &str = "6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9";
pub const CLIENT_SECRET: &str = "collector-secret";
pub const TOKEN_PATH: &str = "/contoso.onmicrosoft.com/oauth2/v2.0/token";

const SCRIPTED_TOKEN: &str =
	r#"{"access_token":"scripted-token","token_type":"Bearer","expires_in":3600}"#;

pub fn tenant() -> TenantId {
	TenantId::new(TENANT).expect("Tenant fixture should be valid.")
}

pub fn client_id() -> ClientId {
	ClientId::new(CLIENT_ID).expect("Client id fixture should be valid.")
}

/// Same attempt budget as the default policy, with millisecond backoff.
pub fn fast_retry() -> RetryPolicy {
	RetryPolicy {
		max_attempts: 3,
		base_delay: StdDuration::from_millis(10),
		max_delay: StdDuration::from_millis(50),
	}
}

/// One scripted answer for a non-token request.
#[derive(Debug)]
pub enum Step {
	Respond { status: u16, headers: Vec<(&'static str, String)>, body: String },
	Reset,
}
impl Step {
	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self::Respond {
			status,
			headers: vec![("content-type", "application/json".into())],
			body: body.into(),
		}
	}

	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		if let Self::Respond { headers, .. } = &mut self {
			headers.push((name, value.into()));
		}

		self
	}
}

#[derive(Debug, Default)]
pub struct Script {
	steps: Mutex<VecDeque<Step>>,
	token_calls: AtomicUsize,
	api_calls: AtomicUsize,
	authorizations: Mutex<Vec<String>>,
	bodies: Mutex<Vec<Vec<u8>>>,
}

/// Transport that answers token requests with a fixed token and every other request from a
/// queue of [`Step`]s.
#[derive(Clone, Debug, Default)]
pub struct ScriptedHttpClient(Arc<Script>);
impl ScriptedHttpClient {
	pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		let script = Script { steps: Mutex::new(steps.into_iter().collect()), ..Default::default() };

		Self(Arc::new(script))
	}

	pub fn api_calls(&self) -> usize {
		self.0.api_calls.load(Ordering::SeqCst)
	}

	pub fn token_calls(&self) -> usize {
		self.0.token_calls.load(Ordering::SeqCst)
	}

	pub fn authorizations(&self) -> Vec<String> {
		self.0.authorizations.lock().clone()
	}

	/// Request bodies of every non-token attempt, in order.
	pub fn bodies(&self) -> Vec<Vec<u8>> {
		self.0.bodies.lock().clone()
	}
}
impl CollectorHttpClient for ScriptedHttpClient {
	type Handle = ScriptedHandle;
	type TransportError = IoError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ScriptedHandle { script: Arc::clone(&self.0), slot }
	}
}

pub struct ScriptedHandle {
	script: Arc<Script>,
	slot: ResponseMetadataSlot,
}
impl ScriptedHandle {
	fn answer(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError<IoError>> {
		self.slot.take();

		if request.uri().path().ends_with("/oauth2/v2.0/token") {
			self.script.token_calls.fetch_add(1, Ordering::SeqCst);

			let headers = [("content-type", "application/json".to_owned())];

			return Ok(response(200, &headers, SCRIPTED_TOKEN));
		}

		self.script.api_calls.fetch_add(1, Ordering::SeqCst);

		if let Some(value) = request.headers().get(AUTHORIZATION) {
			let value = value.to_str().expect("Authorization header should be ASCII.").to_owned();

			self.script.authorizations.lock().push(value);
		}

		self.script.bodies.lock().push(request.body().clone());

		let step = self.script.steps.lock().pop_front();

		match step.unwrap_or_else(|| Step::json(418, "script exhausted")) {
			Step::Reset => {
				let reset = IoError::new(ErrorKind::ConnectionReset, "connection reset by peer");

				Err(HttpClientError::Io(reset))
			},
			Step::Respond { status, headers, body } => {
				self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

				Ok(response(status, &headers, &body))
			},
		}
	}
}
impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
	type Error = HttpClientError<IoError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move { self.answer(&request) })
	}
}

fn response(status: u16, headers: &[(&'static str, String)], body: &str) -> HttpResponse {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = StatusCode::from_u16(status).expect("Scripted status should be valid.");

	for (name, value) in headers {
		let value = HeaderValue::from_str(value).expect("Scripted header should be valid.");

		response.headers_mut().append(HeaderName::from_static(*name), value);
	}

	response
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedErrorMapper;
impl TransportErrorMapper<IoError> for ScriptedErrorMapper {
	fn map_transport_error(
		&self,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<IoError>,
	) -> Error {
		match error {
			HttpClientError::Io(e) => map_io_error(e),
			other => TransportError::network(IoError::other(other.to_string())).into(),
		}
	}
}

pub type ScriptedApiClient = ApiClient<ScriptedHttpClient, ScriptedErrorMapper>;

/// Graph-shaped API client over `script` authenticated with a client secret.
pub fn scripted_api_client(script: &ScriptedHttpClient) -> ScriptedApiClient {
	let authority = Url::parse("https://login.test").expect("Authority should parse.");
	let base_url = Url::parse("https://graph.test").expect("Base URL should parse.");
	let tokens = TokenManager::<ScriptedHttpClient, ScriptedErrorMapper>::new(
		&authority,
		&tenant(),
		client_id(),
		"https://graph.test",
		Credentials::ClientSecret(TokenSecret::new(CLIENT_SECRET)),
		script.clone(),
		ScriptedErrorMapper,
	)
	.expect("Token manager should build.");

	ApiClient::new(
		base_url,
		Arc::new(tokens),
		script.clone(),
		ScriptedErrorMapper,
		fast_retry(),
		"azure-collector-tests/0.0",
	)
}

#[cfg(feature = "reqwest")]
pub fn server_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock server URL should parse.")
}

/// Config builder whose authority, Graph (`/graph`), and Resource Manager (`/arm`) all live on
/// `server`.
#[cfg(feature = "reqwest")]
pub fn config_builder(server: &MockServer) -> ClientConfigBuilder {
	ClientConfig::builder(tenant(), client_id())
		.authority(server_url(server, "/"))
		.graph_url(server_url(server, "/graph"))
		.resource_manager_url(server_url(server, "/arm"))
		.retry(fast_retry())
}

#[cfg(feature = "reqwest")]
pub fn reqwest_client(server: &MockServer) -> ReqwestAzureClient {
	let config =
		config_builder(server).client_secret(CLIENT_SECRET).build().expect("Config should build.");

	AzureClient::new(&config).expect("Client should build.")
}

/// Token endpoint answering every grant with `token`.
#[cfg(feature = "reqwest")]
pub async fn mock_token<'a>(server: &'a MockServer, token: &str, expires_in: i64) -> Mock<'a> {
	let body =
		format!(r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":{expires_in}}}"#);

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await
}
