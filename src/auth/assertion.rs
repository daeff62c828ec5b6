//! Certificate-backed client assertions (RFC 7523 `private_key_jwt`).
//!
//! The identity platform accepts a short-lived RS256 JWT in place of a client secret. The JWT
//! header carries the base64url SHA-1 thumbprint of the DER certificate (`x5t`) so the platform
//! can pick the registered public key, and the claims bind the assertion to the token endpoint.

// std
use std::io::Cursor;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use sha1::{Digest, Sha1};
// self
use crate::{
	_prelude::*,
	auth::ClientId,
	error::{AuthError, ConfigError},
};

/// Value of the `client_assertion_type` form field.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const ASSERTION_LIFETIME: Duration = Duration::minutes(1);

#[derive(Serialize)]
struct AssertionClaims<'a> {
	aud: &'a str,
	iss: &'a str,
	sub: &'a str,
	jti: String,
	nbf: i64,
	exp: i64,
}

/// Parsed certificate + private key pair used to sign client assertions.
#[derive(Clone)]
pub struct ClientCertificate {
	thumbprint: String,
	key: EncodingKey,
}
impl ClientCertificate {
	/// Parses a PEM certificate (the first `CERTIFICATE` block is used) and a PEM RSA key
	/// (PKCS#1 or PKCS#8).
	pub fn from_pem(certificate_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, ConfigError> {
		let der = rustls_pemfile::certs(&mut Cursor::new(certificate_pem))
			.next()
			.ok_or_else(|| ConfigError::InvalidCertificate {
				reason: "no CERTIFICATE block found".into(),
			})?
			.map_err(|e| ConfigError::InvalidCertificate { reason: e.to_string() })?;
		let key = EncodingKey::from_rsa_pem(private_key_pem)
			.map_err(|e| ConfigError::InvalidCertificate { reason: e.to_string() })?;

		Ok(Self { thumbprint: thumbprint(der.as_ref()), key })
	}

	/// Returns the base64url (unpadded) SHA-1 thumbprint sent as the `x5t` header.
	pub fn thumbprint(&self) -> &str {
		&self.thumbprint
	}

	/// Signs an assertion for `client_id` addressed to `token_endpoint`, valid from `now` for
	/// one minute.
	pub fn sign_assertion(
		&self,
		client_id: &ClientId,
		token_endpoint: &Url,
		now: OffsetDateTime,
	) -> Result<String, AuthError> {
		let mut header = Header::new(Algorithm::RS256);

		header.x5t = Some(self.thumbprint.clone());

		let claims = AssertionClaims {
			aud: token_endpoint.as_str(),
			iss: client_id.as_ref(),
			sub: client_id.as_ref(),
			jti: format!("{:032x}", rand::random::<u128>()),
			nbf: now.unix_timestamp(),
			exp: (now + ASSERTION_LIFETIME).unix_timestamp(),
		};

		jsonwebtoken::encode(&header, &claims, &self.key)
			.map_err(|source| AuthError::AssertionSigning { source })
	}
}
impl Debug for ClientCertificate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCertificate")
			.field("thumbprint", &self.thumbprint)
			.field("key", &"<redacted>")
			.finish()
	}
}

/// Computes the `x5t` thumbprint for a DER-encoded certificate.
pub fn thumbprint(der: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(Sha1::digest(der))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn thumbprint_is_unpadded_base64url_sha1() {
		// SHA-1("abc") = a9993e36 4706816a ba3e2571 7850c26c 9cd0d89d
		assert_eq!(thumbprint(b"abc"), "qZk-NkcGgWq6PiVxeFDCbJzQ2J0");
	}

	#[test]
	fn rejects_pem_without_certificate() {
		let err = ClientCertificate::from_pem(b"not a pem", b"also not a pem")
			.expect_err("Garbage PEM input must be rejected.");

		assert!(matches!(err, ConfigError::InvalidCertificate { .. }));
	}
}
