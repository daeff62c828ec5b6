//! Pluggable HTTP transport.
//!
//! Everything above this module speaks buffered [`HttpRequest`]/[`HttpResponse`] values, so a
//! request body can be replayed on every retry. A transport implements [`CollectorHttpClient`]
//! and hands out one [`AsyncHttpClient`] handle per attempt; the handle reports the status and
//! `Retry-After` of whatever it received through a [`ResponseMetadataSlot`] so token endpoint
//! failures can be classified after `oauth2` has consumed the response.

// std
use std::{io::ErrorKind, time::Duration as StdDuration};
// crates.io
pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use oauth2::http::{HeaderMap, header::RETRY_AFTER};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// HTTP stack used for token exchanges and API calls.
///
/// Handles must resolve to `Ok` for every HTTP response, whatever the status. Shared across
/// spawned list tasks, so both the client and its handle futures are `Send`.
pub trait CollectorHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error raised when no HTTP response was obtained.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-attempt handle.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle that clears `slot` before sending and fills it once a status line
	/// arrives.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Turns transport failures into collector errors.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Must yield [`TransportError::ConnectionClosed`] when the peer dropped the connection,
	/// since that is the only transport failure the sender retries.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Status line facts observed by a transport handle.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code.
	pub status: Option<u16>,
	/// Integer `Retry-After` delay.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Captures `status` and the integer `Retry-After` header, if present.
	pub fn observe(status: u16, headers: &HeaderMap) -> Self {
		let retry_after = retry_after_secs(headers)
			.and_then(|secs| i64::try_from(secs).ok())
			.map(Duration::seconds);

		Self { status: Some(status), retry_after }
	}
}

/// Shared cell a handle writes [`ResponseMetadata`] into.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Replaces the stored metadata.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Removes and returns the stored metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Connection pool and timeout settings for the built-in transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
	/// Idle connections kept per host.
	pub max_idle_per_host: usize,
	/// Idle connection lifetime.
	pub idle_timeout: StdDuration,
	/// Connect timeout (TCP and TLS).
	pub connect_timeout: StdDuration,
	/// Whole-request timeout.
	pub request_timeout: StdDuration,
	/// Forward proxy for every scheme.
	pub proxy: Option<Url>,
}
impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			max_idle_per_host: 200,
			idle_timeout: StdDuration::from_secs(90),
			connect_timeout: StdDuration::from_secs(30),
			request_timeout: StdDuration::from_secs(300),
			proxy: None,
		}
	}
}

/// Built-in transport over a pooled [`ReqwestClient`].
///
/// Redirects are disabled; Graph and Resource Manager paginate with next links, not 3xx.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds the pooled client described by `settings`.
	pub fn from_settings(settings: &TransportSettings) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.min_tls_version(reqwest::tls::Version::TLS_1_2)
			.pool_max_idle_per_host(settings.max_idle_per_host)
			.pool_idle_timeout(settings.idle_timeout)
			.connect_timeout(settings.connect_timeout)
			.timeout(settings.request_timeout);

		if let Some(proxy) = &settings.proxy {
			builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl CollectorHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.0.clone(), slot }
	}
}

/// One attempt's view of a [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let request = reqwest::Request::try_from(request).map_err(Box::new)?;
			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().clone();

			self.slot.store(ResponseMetadata::observe(status.as_u16(), &headers));

			let body = response.bytes().await.map_err(Box::new)?;
			let mut buffered = HttpResponse::new(body.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}

/// Error mapper paired with [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) if is_closed_connection(&*inner) =>
				TransportError::connection_closed(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => map_io_error(inner),
			HttpClientError::Other(message) =>
				TransportError::network(std::io::Error::other(message)).into(),
			_ => TransportError::network(std::io::Error::other("unrecognized HTTP client failure"))
				.into(),
		}
	}
}

/// Integer seconds from `Retry-After`; HTTP-date and malformed values yield `None`.
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
	headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

/// Classifies an I/O failure, flagging peer-closed connections as retryable.
pub fn map_io_error(err: std::io::Error) -> Error {
	if is_closed_connection(&err) {
		TransportError::connection_closed(err).into()
	} else {
		TransportError::Io(err).into()
	}
}

/// Whether `err` or anything in its source chain says the peer closed the connection.
///
/// hyper reports pooled connections that died while idle only through message text.
pub fn is_closed_connection(err: &(dyn StdError + 'static)) -> bool {
	const CLOSED_MESSAGES: [&str; 3] =
		["connection closed", "closed idle connection", "connection reset"];

	let mut cause = Some(err);

	while let Some(err) = cause {
		let closed_kind = err.downcast_ref::<std::io::Error>().is_some_and(|io| {
			matches!(
				io.kind(),
				ErrorKind::ConnectionReset
					| ErrorKind::ConnectionAborted
					| ErrorKind::BrokenPipe
					| ErrorKind::UnexpectedEof
			)
		});
		let message = err.to_string().to_ascii_lowercase();

		if closed_kind || CLOSED_MESSAGES.iter().any(|needle| message.contains(needle)) {
			return true;
		}

		cause = err.source();
	}

	false
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn peer_closures_are_detected_by_kind_or_message() {
		for closed in [
			std::io::Error::new(ErrorKind::ConnectionReset, "reset by peer"),
			std::io::Error::new(ErrorKind::UnexpectedEof, "tls close_notify missing"),
			std::io::Error::other("connection closed before message completed"),
		] {
			assert!(is_closed_connection(&closed), "`{closed}` should count as closed.");
		}

		assert!(!is_closed_connection(&std::io::Error::new(ErrorKind::ConnectionRefused, "no")));
		assert!(map_io_error(std::io::Error::new(ErrorKind::BrokenPipe, "pipe")).is_retryable());
		assert!(matches!(
			map_io_error(std::io::Error::new(ErrorKind::PermissionDenied, "denied")),
			Error::Transport(TransportError::Io(_))
		));
	}

	#[test]
	fn metadata_keeps_only_integer_retry_after() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, " 7 ".parse().expect("Header value should parse."));

		let throttled = ResponseMetadata::observe(429, &headers);

		assert_eq!(throttled.status, Some(429));
		assert_eq!(throttled.retry_after, Some(Duration::seconds(7)));

		headers.insert(
			RETRY_AFTER,
			"Wed, 21 Oct 2026 07:28:00 GMT".parse().expect("Header value should parse."),
		);

		assert_eq!(ResponseMetadata::observe(503, &headers).retry_after, None);
		assert_eq!(retry_after_secs(&HeaderMap::new()), None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn proxied_settings_build_a_client() {
		let settings = TransportSettings {
			proxy: Some(Url::parse("http://127.0.0.1:3128").expect("Proxy URL should parse.")),
			..Default::default()
		};

		assert!(ReqwestHttpClient::from_settings(&settings).is_ok());
	}
}
