//! Per-audience token lifecycle: grant selection, expiry checks, and singleflight refresh.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, Credentials, TenantId, TokenSecret},
	error::ConfigError,
	http::{CollectorHttpClient, TransportErrorMapper},
	oauth::{Grant, GrantFacade},
	obs::{OpKind, OpSpan},
};

/// Lifetime reported for a static JWT that carries no `exp` claim.
const STATIC_JWT_DEFAULT_LIFETIME: Duration = Duration::hours(1);

/// Owns the bearer token for one audience (Graph or Resource Manager).
///
/// Reads go through a [`RwLock`]; refreshes are collapsed by an async singleflight guard so
/// concurrent list tasks that all observe an expired token trigger exactly one exchange. The
/// HTTP exchange itself runs without holding the token lock.
pub struct TokenManager<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	audience: String,
	scope: String,
	client_id: ClientId,
	token_endpoint: Url,
	credentials: Credentials,
	facade: GrantFacade<C, M>,
	token: RwLock<Option<AccessToken>>,
	rotated_refresh_token: RwLock<Option<TokenSecret>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager for `audience` against `{authority}/{tenant}/oauth2/v2.0/token`.
	///
	/// No request is made until the first [`TokenManager::bearer`] or
	/// [`TokenManager::authenticate`] call.
	pub fn new(
		authority: &Url,
		tenant: &TenantId,
		client_id: ClientId,
		audience: impl Into<String>,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let audience = audience.into();
		let token_endpoint = token_endpoint(authority, tenant)?;
		let client_secret = match &credentials {
			Credentials::ClientSecret(secret) => Some(secret),
			Credentials::RefreshToken { client_secret, .. } => client_secret.as_ref(),
			_ => None,
		};
		let facade =
			GrantFacade::new(&token_endpoint, &client_id, client_secret, http_client, error_mapper)?;

		Ok(Self {
			scope: default_scope(&audience),
			audience,
			client_id,
			token_endpoint,
			credentials,
			facade,
			token: RwLock::new(None),
			rotated_refresh_token: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		})
	}

	/// Audience the managed token is minted for.
	pub fn audience(&self) -> &str {
		&self.audience
	}

	/// Scope requested from the token endpoint (`{audience}/.default`).
	pub fn scope(&self) -> &str {
		&self.scope
	}

	/// Token endpoint used for every grant.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Returns the cached token, if any, without checking expiry.
	pub fn current(&self) -> Option<AccessToken> {
		self.token.read().clone()
	}

	/// Returns `true` when `token` expires within [`crate::auth::TOKEN_EXPIRY_SKEW`].
	pub fn is_expired(&self, token: &AccessToken) -> bool {
		token.is_expired()
	}

	/// Acquires a fresh token unconditionally and stores it.
	pub async fn authenticate(&self) -> Result<AccessToken> {
		let _guard = self.refresh_guard.lock().await;

		self.exchange().await
	}

	/// Returns the secret to place in `Authorization: Bearer`, refreshing first when the cached
	/// token is missing or expired.
	pub async fn bearer(&self) -> Result<TokenSecret> {
		if let Credentials::StaticJwt(jwt) = &self.credentials {
			jwt.ensure_audience(&self.audience)?;

			return Ok(jwt.secret().clone());
		}
		if let Some(token) = self.fresh_token() {
			return Ok(token.secret);
		}

		let _guard = self.refresh_guard.lock().await;

		// Another task may have refreshed while this one waited on the guard.
		if let Some(token) = self.fresh_token() {
			return Ok(token.secret);
		}

		Ok(self.exchange().await?.secret)
	}

	fn fresh_token(&self) -> Option<AccessToken> {
		self.token.read().as_ref().filter(|token| !token.is_expired()).cloned()
	}

	async fn exchange(&self) -> Result<AccessToken> {
		let span = OpSpan::start(OpKind::Authenticate, &self.audience);
		let result = span.instrument(self.request_token()).await;

		match span.finish_with(result) {
			Ok(token) => {
				if let Some(rotated) = &token.refresh_token {
					*self.rotated_refresh_token.write() = Some(rotated.clone());
				}

				*self.token.write() = Some(token.clone());

				Ok(token)
			},
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					grant = self.credentials.grant_label(),
					error = %e,
					"token acquisition failed"
				);

				Err(e)
			},
		}
	}

	async fn request_token(&self) -> Result<AccessToken> {
		match &self.credentials {
			Credentials::StaticJwt(jwt) => {
				jwt.ensure_audience(&self.audience)?;

				let expires_at = jwt
					.expires_at()
					.unwrap_or_else(|| OffsetDateTime::now_utc() + STATIC_JWT_DEFAULT_LIFETIME);

				Ok(AccessToken::until(jwt.secret().clone(), expires_at))
			},
			Credentials::RefreshToken { refresh_token, .. } => {
				let current = self.rotated_refresh_token.read().clone();
				let refresh_token = current.as_ref().unwrap_or(refresh_token);

				self.facade.exchange(Grant::RefreshToken(refresh_token), &self.scope).await
			},
			Credentials::ClientSecret(_) =>
				self.facade.exchange(Grant::ClientCredentials, &self.scope).await,
			Credentials::ClientCertificate(certificate) => {
				let assertion = certificate.sign_assertion(
					&self.client_id,
					&self.token_endpoint,
					OffsetDateTime::now_utc(),
				)?;

				self.facade.exchange(Grant::ClientAssertion(&assertion), &self.scope).await
			},
			Credentials::Password { username, password } =>
				self.facade.exchange(Grant::Password { username, password }, &self.scope).await,
		}
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("audience", &self.audience)
			.field("client_id", &self.client_id)
			.field("grant", &self.credentials.grant_label())
			.field("token", &*self.token.read())
			.finish()
	}
}

/// Builds `{authority}/{tenant}/oauth2/v2.0/token`.
pub fn token_endpoint(authority: &Url, tenant: &TenantId) -> Result<Url, ConfigError> {
	let raw = format!("{}/{tenant}/oauth2/v2.0/token", authority.as_str().trim_end_matches('/'));

	Url::parse(&raw).map_err(|source| ConfigError::invalid_url(raw, source))
}

/// Builds the `.default` scope for an audience.
pub fn default_scope(audience: &str) -> String {
	format!("{}/.default", audience.trim_end_matches('/'))
}
