//! Token endpoint exchanges built on the `oauth2` crate.
//!
//! [`GrantFacade`] owns a configured `oauth2` client for one tenant token endpoint and runs a
//! single grant per call through the collector's [`CollectorHttpClient`], mapping OAuth error
//! responses and transport failures into the collector [`Error`] taxonomy.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RefreshToken, RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, Scope,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, TokenSecret, assertion::CLIENT_ASSERTION_TYPE},
	error::{ConfigError, TransientError},
	http::{CollectorHttpClient, ResponseMetadata, ResponseMetadataSlot, TransportErrorMapper},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// One token request's grant-specific inputs.
#[derive(Clone, Copy)]
pub(crate) enum Grant<'a> {
	/// `client_credentials` authenticated by the configured client secret.
	ClientCredentials,
	/// `client_credentials` authenticated by a signed assertion.
	ClientAssertion(&'a str),
	/// `refresh_token`.
	RefreshToken(&'a TokenSecret),
	/// Resource-owner `password`.
	Password {
		/// User principal name.
		username: &'a str,
		/// User password.
		password: &'a TokenSecret,
	},
}

pub(crate) struct GrantFacade<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> GrantFacade<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_endpoint: &Url,
		client_id: &ClientId,
		client_secret: Option<&TokenSecret>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::invalid_url(token_endpoint.as_str(), source))?;
		let mut oauth_client = BasicClient::new(OAuthClientId::new(client_id.to_string()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().into()));
		}

		Ok(Self { oauth_client, http_client: http_client.into(), error_mapper: error_mapper.into() })
	}

	/// Runs `grant` for `scope` and converts the response into an [`AccessToken`].
	pub(crate) fn exchange<'a>(
		&'a self,
		grant: Grant<'a>,
		scope: &'a str,
	) -> FacadeFuture<'a, AccessToken> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let scope = Scope::new(scope.to_owned());
			let response = match grant {
				Grant::ClientCredentials =>
					self.oauth_client
						.exchange_client_credentials()
						.add_scope(scope)
						.request_async(&instrumented)
						.await,
				Grant::ClientAssertion(assertion) =>
					self.oauth_client
						.exchange_client_credentials()
						.add_scope(scope)
						.add_extra_param("client_assertion_type", CLIENT_ASSERTION_TYPE)
						.add_extra_param("client_assertion", assertion)
						.request_async(&instrumented)
						.await,
				Grant::RefreshToken(refresh) => {
					let refresh = RefreshToken::new(refresh.expose().to_owned());

					self.oauth_client
						.exchange_refresh_token(&refresh)
						.add_scope(scope)
						.request_async(&instrumented)
						.await
				},
				Grant::Password { username, password } => {
					let username = ResourceOwnerUsername::new(username.to_owned());
					let password = ResourceOwnerPassword::new(password.expose().to_owned());

					self.oauth_client
						.exchange_password(&username, &password)
						.add_scope(scope)
						.request_async(&instrumented)
						.await
				},
			}
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(response)
		})
	}
}

fn map_token_response(response: FacadeTokenResponse) -> Result<AccessToken> {
	let expires_in = response.expires_in().ok_or(TransientError::MissingExpiresIn)?;
	let token = AccessToken::with_lifetime(
		TokenSecret::new(response.access_token().secret()),
		expires_in,
		OffsetDateTime::now_utc(),
	)?
	.token_type(response.token_type().as_ref())
	.refresh_token(response.refresh_token().map(|refresh| TokenSecret::new(refresh.secret())));

	Ok(token)
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref().to_owned();
	let reason = match response.error_description() {
		Some(description) => format!("{code}: {}", first_line(description)),
		None => code.clone(),
	};

	match classify_oauth_error(&code) {
		Some(OAuthErrorKind::InvalidGrant) => Error::InvalidGrant { reason },
		Some(OAuthErrorKind::InvalidClient) => Error::InvalidClient { reason },
		Some(OAuthErrorKind::InsufficientScope) => Error::InsufficientScope { reason },
		None => TransientError::TokenEndpoint {
			message: reason,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OAuthErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
}

fn classify_oauth_error(code: &str) -> Option<OAuthErrorKind> {
	if code.eq_ignore_ascii_case("invalid_grant") || code.eq_ignore_ascii_case("access_denied") {
		Some(OAuthErrorKind::InvalidGrant)
	} else if code.eq_ignore_ascii_case("invalid_client")
		|| code.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(OAuthErrorKind::InvalidClient)
	} else if code.eq_ignore_ascii_case("invalid_scope")
		|| code.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(OAuthErrorKind::InsufficientScope)
	} else {
		None
	}
}

// Identity platform descriptions append trace and correlation ids on later lines.
fn first_line(description: &str) -> &str {
	description.lines().next().unwrap_or(description).trim()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
