//! Error taxonomy.
//!
//! [`Error`] is what every public call and every [`crate::stream::ListResult`] carries. The
//! grouped enums underneath say where a failure came from; only
//! [`TransportError::ConnectionClosed`] is ever retried as a transport failure.

// self
use crate::_prelude::*;

/// `Result` defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure surfaced by the collector.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Bad local input, caught before a request was sent.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authentication material could not be produced or was rejected locally.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Throttling, 5xx, or an unexpected token endpoint answer.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, closed connections).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Entra ID returned `invalid_grant` (expired refresh token, wrong password, MFA required).
	#[error("Entra ID rejected the grant: {reason}.")]
	InvalidGrant {
		/// `AADSTS` code and first description line.
		reason: String,
	},
	/// Entra ID returned `invalid_client` or `unauthorized_client`.
	#[error("Entra ID rejected the application credentials: {reason}.")]
	InvalidClient {
		/// `AADSTS` code and first description line.
		reason: String,
	},
	/// Entra ID returned `invalid_scope`; usually missing admin consent.
	#[error("Entra ID refused the requested scope: {reason}.")]
	InsufficientScope {
		/// `AADSTS` code and first description line.
		reason: String,
	},
	/// Graph or Resource Manager answered with a non-retryable 4xx status.
	#[error("API request failed with status {status} ({code}): {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Error code decoded from the response envelope.
		code: String,
		/// Error message decoded from the response envelope.
		message: String,
	},
	/// The attempt budget ran out; `source` is the last attempt's failure.
	#[error("Unable to complete the request after {attempts} attempts.")]
	RetriesExhausted {
		/// Number of attempts performed.
		attempts: u32,
		/// Failure observed on the final attempt.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Whether the sender treats this as a closed connection worth another attempt.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(TransportError::ConnectionClosed { .. }))
	}
}

/// Problems with local input.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The transport refused its settings (bad proxy, TLS backend unavailable).
	#[error("HTTP transport could not be built.")]
	HttpClientBuild {
		/// Builder failure.
		#[source]
		source: BoxError,
	},
	/// A request or header could not be assembled.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	SerializeBody {
		/// Underlying serde failure.
		#[source]
		source: serde_json::Error,
	},
	/// A configured URL or path could not be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL or path.
		url: String,
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL cannot serve as a base for endpoint paths.
	#[error("URL `{url}` cannot be used as a base URL.")]
	NotABaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Cloud name does not match a known preset.
	#[error("Unknown Azure cloud `{name}`.")]
	UnknownCloud {
		/// Rejected name.
		name: String,
	},
	/// A typed identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// No credential in the configured set can be used.
	#[error("No usable credential is configured.")]
	MissingCredential,
	/// Configured static JWT cannot be decoded.
	#[error("Configured static JWT is invalid.")]
	InvalidStaticJwt {
		/// Underlying decoding failure.
		#[source]
		source: AuthError,
	},
	/// Certificate or key material could not be parsed.
	#[error("Certificate material is invalid: {reason}.")]
	InvalidCertificate {
		/// Human-readable reason.
		reason: String,
	},
}
impl ConfigError {
	/// Boxes a transport builder failure.
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Pairs a URL parse failure with its input.
	pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Credential problems found without contacting Entra ID.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Client assertion could not be signed.
	#[error("Client assertion could not be signed.")]
	AssertionSigning {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Static JWT could not be decoded.
	#[error("Static JWT is malformed: {reason}.")]
	MalformedJwt {
		/// Human-readable reason.
		reason: String,
	},
	/// Static JWT was minted for a different audience than the endpoint being called.
	#[error("Static JWT audience `{actual}` does not match endpoint audience `{expected}`.")]
	AudienceMismatch {
		/// Audience required by the endpoint.
		expected: String,
		/// Audience carried by the token.
		actual: String,
	},
}

/// Upstream answers that may succeed later.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// The token endpoint failed with an OAuth code the collector does not classify.
	#[error("Token endpoint failed: {message}.")]
	TokenEndpoint {
		/// OAuth code and description.
		message: String,
		/// Response status.
		status: Option<u16>,
		/// Integer `Retry-After`, if sent.
		retry_after: Option<Duration>,
	},
	/// The token endpoint body was not a token response.
	#[error("Token endpoint body could not be parsed.")]
	TokenResponseParse {
		/// Parse failure with JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// Response status.
		status: Option<u16>,
	},
	/// Token response had no `expires_in`.
	#[error("Token response has no expires_in.")]
	MissingExpiresIn,
	/// Token response `expires_in` cannot be added to the current time.
	#[error("Token response expires_in is too large.")]
	ExpiresInOutOfRange,
	/// Token response `expires_in` was zero.
	#[error("Token response expires_in is zero.")]
	NonPositiveExpiresIn,
	/// API answered 429 or 5xx on the final permitted attempt.
	#[error("API responded with retryable status {status}.")]
	RetryableStatus {
		/// HTTP status code.
		status: u16,
	},
	/// API answered 429 without a usable `Retry-After` header.
	#[error("Received 429 but the Retry-After header `{value}` is not a number of seconds.")]
	InvalidRetryAfter {
		/// Raw header value, or an empty string when the header was absent.
		value: String,
	},
}

/// Failures that produced no HTTP response.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Peer closed the connection before a response was read.
	#[error("Connection was closed by the peer.")]
	ConnectionClosed {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// DNS, connect, TLS, or timeout failure.
	#[error("Request failed before a response arrived.")]
	Network {
		/// Transport error.
		#[source]
		source: BoxError,
	},
	/// Raw I/O failure from a custom transport.
	#[error("I/O failure while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Boxes a non-retryable transport failure.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Boxes a failure caused by the peer closing the connection.
	pub fn connection_closed(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::ConnectionClosed { source: Box::new(src) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body did not match the expected JSON shape.
	#[error("Response body does not match the expected shape at `{path}`.")]
	Json {
		/// JSON path where decoding stopped.
		path: String,
		/// Underlying serde failure.
		#[source]
		source: serde_json::Error,
	},
	/// A single-object endpoint returned an empty collection.
	#[error("Response did not contain any {what}.")]
	Empty {
		/// Kind of object that was expected.
		what: &'static str,
	},
	/// Server-supplied next link is not an absolute URL.
	#[error("Next link `{link}` is not a valid URL.")]
	NextLink {
		/// Raw next link.
		link: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Json { path, source: e.into_inner() }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{collections::HashMap, error::Error as StdError};
	// self
	use super::*;

	#[test]
	fn only_closed_connections_are_retryable() {
		let closed = Error::from(TransportError::connection_closed(std::io::Error::new(
			std::io::ErrorKind::ConnectionReset,
			"reset",
		)));
		let network = Error::from(TransportError::network(std::io::Error::other("dns")));

		assert!(closed.is_retryable());
		assert!(!network.is_retryable());
		assert!(!Error::from(ConfigError::MissingCredential).is_retryable());
	}

	#[test]
	fn malformed_token_lifetimes_are_transient() {
		let err = Error::from(TransientError::MissingExpiresIn);

		assert!(matches!(err, Error::Transient(TransientError::MissingExpiresIn)));
		assert!(!err.is_retryable());
		assert_eq!(err.to_string(), "Token response has no expires_in.");
	}

	#[test]
	fn exhausted_error_exposes_last_failure() {
		let last = Error::from(TransientError::RetryableStatus { status: 503 });
		let err = Error::RetriesExhausted { attempts: 3, source: Box::new(last) };
		let source = StdError::source(&err).expect("Exhausted error should expose its source.");

		assert_eq!(err.to_string(), "Unable to complete the request after 3 attempts.");
		assert_eq!(source.to_string(), "API responded with retryable status 503.");
	}

	#[test]
	fn decode_error_keeps_json_path() {
		let mut de = serde_json::Deserializer::from_str("{\"value\":[{\"id\":7}]}");
		let err = serde_path_to_error::deserialize::<_, HashMap<String, Vec<HashMap<String, String>>>>(
			&mut de,
		)
		.expect_err("Numeric id should not decode into a string.");
		let decoded = DecodeError::from(err);

		assert!(matches!(&decoded, DecodeError::Json { path, .. } if path == "value[0].id"));
	}
}
