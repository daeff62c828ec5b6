//! Cached bearer tokens and their expiry arithmetic.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::TransientError};

/// A token is treated as expired this long before its nominal expiry.
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::seconds(10);

/// Bearer token held by a [`crate::auth::TokenManager`] for one audience.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
	/// Raw bearer value.
	pub secret: TokenSecret,
	/// Token type from the endpoint response; `Bearer` for every Entra ID grant.
	pub token_type: String,
	/// Refresh token handed back by the exchange, if the grant rotates one.
	pub refresh_token: Option<TokenSecret>,
	/// Nominal expiry before skew.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Token valid until `expires_at`, such as a pre-issued JWT.
	pub fn until(secret: TokenSecret, expires_at: OffsetDateTime) -> Self {
		Self { secret, token_type: "Bearer".into(), refresh_token: None, expires_at }
	}

	/// Token whose endpoint response reported `expires_in` relative to `now`.
	///
	/// A zero lifetime is rejected because it could never be used.
	pub fn with_lifetime(
		secret: TokenSecret,
		expires_in: std::time::Duration,
		now: OffsetDateTime,
	) -> Result<Self, TransientError> {
		if expires_in.is_zero() {
			return Err(TransientError::NonPositiveExpiresIn);
		}

		let expires_at = Duration::try_from(expires_in)
			.ok()
			.and_then(|lifetime| now.checked_add(lifetime))
			.ok_or(TransientError::ExpiresInOutOfRange)?;

		Ok(Self::until(secret, expires_at))
	}

	/// Replaces the reported token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Attaches the refresh token returned alongside the access token.
	pub fn refresh_token(mut self, refresh_token: Option<TokenSecret>) -> Self {
		self.refresh_token = refresh_token;

		self
	}

	/// Usable lifetime left at `now` once the skew is subtracted; zero or negative means expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - TOKEN_EXPIRY_SKEW - now
	}

	/// Whether a request sent at `now` must fetch a new token first.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.remaining_at(now) <= Duration::ZERO
	}

	/// [`Self::is_expired_at`] against the current UTC clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
