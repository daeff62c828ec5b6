//! Credential sets and the precedence rules that pick the active grant.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::{ClientCertificate, TokenSecret},
	error::{AuthError, ConfigError},
};

/// PEM material for certificate-based client authentication.
#[derive(Clone, Serialize, Deserialize)]
pub struct CertificateMaterial {
	/// PEM encoded certificate registered on the application.
	pub certificate_pem: String,
	/// PEM encoded RSA private key matching the certificate.
	pub private_key_pem: TokenSecret,
}
impl Debug for CertificateMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CertificateMaterial")
			.field("certificate_pem", &format_args!("{} bytes", self.certificate_pem.len()))
			.field("private_key_pem", &self.private_key_pem)
			.finish()
	}
}

/// Every credential a caller may configure; [`CredentialSet::resolve`] picks the active one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSet {
	/// Pre-issued JWT that bypasses every grant flow.
	pub jwt: Option<TokenSecret>,
	/// Refresh token for the `refresh_token` grant.
	pub refresh_token: Option<TokenSecret>,
	/// Client secret for the `client_credentials` grant.
	pub client_secret: Option<TokenSecret>,
	/// Certificate + key for assertion-based `client_credentials`.
	pub client_certificate: Option<CertificateMaterial>,
	/// Resource-owner username for the `password` grant.
	pub username: Option<String>,
	/// Resource-owner password for the `password` grant.
	pub password: Option<TokenSecret>,
}
impl CredentialSet {
	/// Resolves the active credential.
	///
	/// Precedence: static JWT > refresh token > client secret > client certificate >
	/// username/password. A configured client secret is still sent with the refresh-token grant
	/// so confidential clients can redeem their refresh tokens.
	pub fn resolve(&self) -> Result<Credentials, ConfigError> {
		if let Some(jwt) = &self.jwt {
			let jwt = StaticJwt::parse(jwt.expose())
				.map_err(|source| ConfigError::InvalidStaticJwt { source })?;

			return Ok(Credentials::StaticJwt(jwt));
		}
		if let Some(refresh_token) = &self.refresh_token {
			return Ok(Credentials::RefreshToken {
				refresh_token: refresh_token.clone(),
				client_secret: self.client_secret.clone(),
			});
		}
		if let Some(secret) = &self.client_secret {
			return Ok(Credentials::ClientSecret(secret.clone()));
		}
		if let Some(material) = &self.client_certificate {
			let certificate = ClientCertificate::from_pem(
				material.certificate_pem.as_bytes(),
				material.private_key_pem.expose().as_bytes(),
			)?;

			return Ok(Credentials::ClientCertificate(certificate));
		}
		if let (Some(username), Some(password)) = (&self.username, &self.password) {
			return Ok(Credentials::Password {
				username: username.clone(),
				password: password.clone(),
			});
		}

		Err(ConfigError::MissingCredential)
	}
}

/// The single credential a client instance authenticates with.
#[derive(Clone, Debug)]
pub enum Credentials {
	/// Pre-issued token; only its audience is checked.
	StaticJwt(StaticJwt),
	/// `refresh_token` grant.
	RefreshToken {
		/// Initial refresh token; rotated tokens are tracked by the token manager.
		refresh_token: TokenSecret,
		/// Optional client secret for confidential clients.
		client_secret: Option<TokenSecret>,
	},
	/// `client_credentials` grant authenticated with a shared secret.
	ClientSecret(TokenSecret),
	/// `client_credentials` grant authenticated with a signed assertion.
	ClientCertificate(ClientCertificate),
	/// Resource-owner `password` grant.
	Password {
		/// User principal name.
		username: String,
		/// User password.
		password: TokenSecret,
	},
}
impl Credentials {
	/// Returns a stable label for spans and errors.
	pub fn grant_label(&self) -> &'static str {
		match self {
			Self::StaticJwt(_) => "static_jwt",
			Self::RefreshToken { .. } => "refresh_token",
			Self::ClientSecret(_) => "client_credentials",
			Self::ClientCertificate(_) => "client_assertion",
			Self::Password { .. } => "password",
		}
	}
}

/// Pre-issued JWT with its decoded audience and expiry.
#[derive(Clone)]
pub struct StaticJwt {
	secret: TokenSecret,
	audiences: Vec<String>,
	expires_at: Option<OffsetDateTime>,
}
impl StaticJwt {
	/// Decodes the (unverified) claims of a compact JWT.
	pub fn parse(token: &str) -> Result<Self, AuthError> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Audience {
			One(String),
			Many(Vec<String>),
		}
		#[derive(Deserialize)]
		struct Claims {
			aud: Option<Audience>,
			exp: Option<i64>,
		}

		let malformed = |reason: &str| AuthError::MalformedJwt { reason: reason.into() };
		let mut segments = token.split('.');
		let (Some(_), Some(payload), Some(_), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(malformed("expected three dot-separated segments"));
		};
		let raw = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|e| malformed(&e.to_string()))?;
		let claims: Claims = serde_json::from_slice(&raw).map_err(|e| malformed(&e.to_string()))?;
		let audiences = match claims.aud {
			Some(Audience::One(aud)) => vec![aud],
			Some(Audience::Many(auds)) => auds,
			None => Vec::new(),
		};
		let expires_at = claims.exp.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok());

		Ok(Self { secret: TokenSecret::new(token), audiences, expires_at })
	}

	/// Returns the raw token for the `Authorization` header.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}

	/// Returns the `exp` claim, if present.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Ensures the token was minted for `expected`, ignoring trailing slashes.
	pub fn ensure_audience(&self, expected: &str) -> Result<(), AuthError> {
		let wanted = expected.trim_end_matches('/');

		if self.audiences.iter().any(|aud| aud.trim_end_matches('/') == wanted) {
			Ok(())
		} else {
			Err(AuthError::AudienceMismatch {
				expected: expected.to_owned(),
				actual: self.audiences.join(","),
			})
		}
	}
}
impl Debug for StaticJwt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticJwt")
			.field("secret", &self.secret)
			.field("audiences", &self.audiences)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn jwt(claims: &str) -> String {
		format!(
			"{}.{}.sig",
			URL_SAFE_NO_PAD.encode("{\"alg\":\"none\"}"),
			URL_SAFE_NO_PAD.encode(claims)
		)
	}

	#[test]
	fn static_jwt_wins_over_every_grant() {
		let set = CredentialSet {
			jwt: Some(jwt("{\"aud\":\"https://graph.microsoft.com\"}").into()),
			refresh_token: Some("refresh".into()),
			client_secret: Some("secret".into()),
			..Default::default()
		};

		assert!(matches!(set.resolve(), Ok(Credentials::StaticJwt(_))));
	}

	#[test]
	fn refresh_token_outranks_client_secret_and_keeps_it() {
		let set = CredentialSet {
			refresh_token: Some("refresh".into()),
			client_secret: Some("secret".into()),
			username: Some("user@contoso.com".into()),
			password: Some("hunter2".into()),
			..Default::default()
		};

		match set.resolve().expect("Refresh token should resolve.") {
			Credentials::RefreshToken { refresh_token, client_secret } => {
				assert_eq!(refresh_token.expose(), "refresh");
				assert_eq!(client_secret.as_ref().map(TokenSecret::expose), Some("secret"));
			},
			other => panic!("Unexpected credential: {other:?}."),
		}
	}

	#[test]
	fn client_secret_outranks_password() {
		let set = CredentialSet {
			client_secret: Some("secret".into()),
			username: Some("user@contoso.com".into()),
			password: Some("hunter2".into()),
			..Default::default()
		};

		assert_eq!(
			set.resolve().expect("Client secret should resolve.").grant_label(),
			"client_credentials"
		);
	}

	#[test]
	fn password_requires_both_halves() {
		let set = CredentialSet { username: Some("user@contoso.com".into()), ..Default::default() };

		assert!(matches!(set.resolve(), Err(ConfigError::MissingCredential)));

		let set = CredentialSet {
			username: Some("user@contoso.com".into()),
			password: Some("hunter2".into()),
			..Default::default()
		};

		assert_eq!(set.resolve().expect("Password should resolve.").grant_label(), "password");
	}

	#[test]
	fn static_jwt_audience_matching_ignores_trailing_slash() {
		let token = StaticJwt::parse(&jwt(
			"{\"aud\":[\"https://management.azure.com/\"],\"exp\":1893456000}",
		))
		.expect("JWT should decode.");

		token.ensure_audience("https://management.azure.com").expect("Audience should match.");

		assert!(matches!(
			token.ensure_audience("https://graph.microsoft.com"),
			Err(AuthError::AudienceMismatch { .. })
		));
		assert_eq!(token.expires_at().map(OffsetDateTime::unix_timestamp), Some(1_893_456_000));
	}

	#[test]
	fn static_jwt_rejects_malformed_tokens() {
		assert!(matches!(StaticJwt::parse("a.b"), Err(AuthError::MalformedJwt { .. })));
		assert!(matches!(StaticJwt::parse("a.!!!.c"), Err(AuthError::MalformedJwt { .. })));
	}
}
