//! Resilient sender: bearer injection, bounded retries, and error-envelope decoding.
//!
//! [`ApiClient`] binds one API base URL (Graph or Resource Manager) to the [`TokenManager`] for
//! that audience. Every logical request gets at most [`RetryPolicy::max_attempts`] attempts:
//!
//! - closed connections and HTTP 5xx back off exponentially and retry;
//! - HTTP 429 sleeps for exactly the integer `Retry-After` seconds and retries, while a missing
//!   or non-numeric header fails immediately;
//! - any other non-2xx status fails immediately with the decoded `{"error":{"code","message"}}`
//!   envelope.
//!
//! No sleep follows the final attempt; exhaustion surfaces as [`Error::RetriesExhausted`].

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::http::{Method, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenManager,
	error::{DecodeError, TransientError},
	http::{
		self, AsyncHttpClient, CollectorHttpClient, HttpResponse, ResponseMetadataSlot,
		TransportErrorMapper,
	},
	obs::{self, OpKind, OpSpan, RetryReason},
	request::{ApiRequest, QueryParams},
};

type SendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

const BODY_PREVIEW_CHARS: usize = 256;

/// Attempt budget and backoff curve for the sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Total attempts per logical request, including the first.
	pub max_attempts: u32,
	/// Delay after the first retryable failure; doubled for each later one.
	pub base_delay: StdDuration,
	/// Upper bound for exponential delays. `Retry-After` is honored as sent.
	pub max_delay: StdDuration,
}
impl RetryPolicy {
	/// Delay before attempt `attempt + 1` after `attempt` failed (1-based).
	pub fn backoff(&self, attempt: u32) -> StdDuration {
		let exponent = attempt.saturating_sub(1).min(31);

		self.base_delay.saturating_mul(1 << exponent).min(self.max_delay)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: StdDuration::from_secs(1),
			max_delay: StdDuration::from_secs(30),
		}
	}
}

enum Attempt {
	Done(HttpResponse),
	Retry { error: Error, delay: StdDuration, reason: RetryReason },
}

/// Authenticated client for one API surface.
pub struct ApiClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	base_url: Url,
	tokens: Arc<TokenManager<C, M>>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	retry: RetryPolicy,
	user_agent: String,
}
impl<C, M> ApiClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Binds `base_url` to the token manager for its audience.
	pub fn new(
		base_url: Url,
		tokens: Arc<TokenManager<C, M>>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
		retry: RetryPolicy,
		user_agent: impl Into<String>,
	) -> Self {
		Self {
			base_url,
			tokens,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			retry,
			user_agent: user_agent.into(),
		}
	}

	/// API base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Token manager backing this client.
	pub fn tokens(&self) -> &Arc<TokenManager<C, M>> {
		&self.tokens
	}

	/// Retry policy applied to every request.
	pub fn retry_policy(&self) -> &RetryPolicy {
		&self.retry
	}

	/// Builds a request for `path` under this client's base URL.
	pub fn request(&self, method: Method, path: &str, params: &QueryParams) -> Result<ApiRequest> {
		Ok(ApiRequest::endpoint(method, &self.base_url, path, params)?)
	}

	/// Sends `request` under the retry policy and returns the first non-retryable success.
	pub fn send<'a>(&'a self, request: &'a ApiRequest) -> SendFuture<'a, HttpResponse> {
		Box::pin(async move {
			let span = OpSpan::start(OpKind::Request, request.url().path());

			span.finish_with(span.instrument(self.send_with_retries(request)).await)
		})
	}

	/// Sends `request` and decodes the JSON body into `T`.
	pub async fn send_json<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send(request).await?;

		decode_json(response.body())
	}

	/// `GET`s `path` with `params` and decodes the JSON body into `T`.
	pub async fn get_json<T>(&self, path: &str, params: &QueryParams) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let request = self.request(Method::GET, path, params)?;

		self.send_json(&request).await
	}

	async fn send_with_retries(&self, request: &ApiRequest) -> Result<HttpResponse> {
		let max_attempts = self.retry.max_attempts.max(1);
		let mut attempt = 0;

		loop {
			attempt += 1;

			let (error, delay, reason) = match self.attempt(request, attempt).await? {
				Attempt::Done(response) => return Ok(response),
				Attempt::Retry { error, delay, reason } => (error, delay, reason),
			};

			if attempt >= max_attempts {
				return Err(Error::RetriesExhausted { attempts: attempt, source: Box::new(error) });
			}

			obs::record_retry(reason);

			#[cfg(feature = "tracing")]
			tracing::debug!(
				attempt,
				reason = reason.as_str(),
				delay_ms = delay.as_millis() as u64,
				url = %request.url(),
				"retrying request"
			);

			tokio::time::sleep(delay).await;
		}
	}

	async fn attempt(&self, request: &ApiRequest, attempt: u32) -> Result<Attempt> {
		let bearer = self.tokens.bearer().await?;
		let http_request = request.to_http(&self.user_agent, &bearer)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = match handle.call(http_request).await {
			Ok(response) => response,
			Err(e) => {
				let error = self.error_mapper.map_transport_error(slot.take().as_ref(), e);

				if !error.is_retryable() {
					return Err(error);
				}

				return Ok(Attempt::Retry {
					error,
					delay: self.retry.backoff(attempt),
					reason: RetryReason::ConnectionClosed,
				});
			},
		};
		let status = response.status();

		if status == StatusCode::TOO_MANY_REQUESTS {
			let seconds = retry_after_seconds(&response)?;

			return Ok(Attempt::Retry {
				error: TransientError::RetryableStatus { status: status.as_u16() }.into(),
				delay: StdDuration::from_secs(seconds),
				reason: RetryReason::Throttled,
			});
		}
		if status.is_server_error() {
			return Ok(Attempt::Retry {
				error: TransientError::RetryableStatus { status: status.as_u16() }.into(),
				delay: self.retry.backoff(attempt),
				reason: RetryReason::ServerError,
			});
		}
		if !status.is_success() {
			return Err(api_error(status, response.body()));
		}

		Ok(Attempt::Done(response))
	}
}
impl<C, M> Debug for ApiClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.base_url.as_str())
			.field("audience", &self.tokens.audience())
			.field("retry", &self.retry)
			.finish()
	}
}

/// Decodes a JSON body, reporting the JSON path on failure.
pub fn decode_json<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|e| DecodeError::from(e).into())
}

fn retry_after_seconds(response: &HttpResponse) -> Result<u64> {
	http::retry_after_secs(response.headers()).ok_or_else(|| {
		let raw = response.headers().get(RETRY_AFTER).and_then(|value| value.to_str().ok());

		TransientError::InvalidRetryAfter { value: raw.unwrap_or_default().trim().to_owned() }.into()
	})
}

/// Decodes a non-retryable, non-2xx body into [`Error::Api`].
///
/// Graph and Resource Manager share `{"error":{"code","message"}}`; OAuth-style
/// `{"error","error_description"}` bodies and raw text are accepted as fallbacks.
pub fn api_error(status: StatusCode, body: &[u8]) -> Error {
	#[derive(Deserialize)]
	struct Envelope {
		error: Option<ErrorField>,
		error_description: Option<String>,
	}
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum ErrorField {
		Detailed { code: Option<String>, message: Option<String> },
		Code(String),
	}

	let fallback_code = status.canonical_reason().unwrap_or("Unknown").to_owned();
	let (code, message) = match serde_json::from_slice::<Envelope>(body) {
		Ok(Envelope { error: Some(ErrorField::Detailed { code, message }), .. }) =>
			(code.unwrap_or(fallback_code), message.unwrap_or_default()),
		Ok(Envelope { error: Some(ErrorField::Code(code)), error_description }) =>
			(code, error_description.unwrap_or_default()),
		_ => {
			let preview = String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect();

			(fallback_code, preview)
		},
	};

	Error::Api { status: status.as_u16(), code, message }
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	#[test]
	fn backoff_doubles_and_caps() {
		let policy = RetryPolicy::default();

		assert_eq!(policy.backoff(1), StdDuration::from_secs(1));
		assert_eq!(policy.backoff(2), StdDuration::from_secs(2));
		assert_eq!(policy.backoff(3), StdDuration::from_secs(4));
		assert_eq!(policy.backoff(10), StdDuration::from_secs(30));
		assert_eq!(policy.backoff(u32::MAX), StdDuration::from_secs(30));
	}

	#[test]
	fn api_errors_decode_graph_and_arm_envelopes() {
		let graph = api_error(
			StatusCode::NOT_FOUND,
			br#"{"error":{"code":"Request_ResourceNotFound","message":"Resource 'x' does not exist.","innerError":{}}}"#,
		);

		assert!(matches!(
			graph,
			Error::Api { status: 404, ref code, ref message }
				if code == "Request_ResourceNotFound" && message == "Resource 'x' does not exist."
		));

		let arm = api_error(
			StatusCode::FORBIDDEN,
			br#"{"error":{"code":"AuthorizationFailed","message":"No access."}}"#,
		);

		assert!(matches!(arm, Error::Api { status: 403, ref code, .. } if code == "AuthorizationFailed"));
	}

	#[test]
	fn api_errors_fall_back_to_oauth_shape_and_raw_text() {
		let oauth = api_error(
			StatusCode::BAD_REQUEST,
			br#"{"error":"invalid_request","error_description":"Missing scope."}"#,
		);

		assert!(matches!(
			oauth,
			Error::Api { status: 400, ref code, ref message }
				if code == "invalid_request" && message == "Missing scope."
		));

		let raw = api_error(StatusCode::UNAUTHORIZED, b"<html>nope</html>");

		assert!(matches!(
			raw,
			Error::Api { status: 401, ref code, ref message }
				if code == "Unauthorized" && message == "<html>nope</html>"
		));
	}

	#[test]
	fn retry_after_requires_integer_seconds() {
		let with = |value: Option<&str>| {
			let mut response = HttpResponse::new(Vec::new());

			*response.status_mut() = StatusCode::TOO_MANY_REQUESTS;

			if let Some(value) = value {
				response
					.headers_mut()
					.insert(RETRY_AFTER, value.parse().expect("Header value should parse."));
			}

			retry_after_seconds(&response)
		};

		assert_eq!(with(Some("2")).expect("Integer seconds should parse."), 2);
		assert_eq!(with(Some(" 10 ")).expect("Whitespace should be trimmed."), 10);
		assert!(matches!(
			with(Some("Wed, 21 Oct 2015 07:28:00 GMT")),
			Err(Error::Transient(TransientError::InvalidRetryAfter { ref value }))
				if value.starts_with("Wed")
		));
		assert!(matches!(
			with(None),
			Err(Error::Transient(TransientError::InvalidRetryAfter { ref value })) if value.is_empty()
		));
	}

	#[test]
	fn decode_errors_report_paths() {
		let err = decode_json::<HashMap<String, Vec<u32>>>(br#"{"value":[1,"two"]}"#)
			.expect_err("String element should not decode as u32.");

		assert!(matches!(err, Error::Decode(DecodeError::Json { ref path, .. }) if path == "value[1]"));
	}
}
