//! Credential material that must never reach logs: bearer and refresh tokens, client secrets,
//! passwords, and PEM private keys.

// crates.io
use oauth2::http::{HeaderValue, header::InvalidHeaderValue};
// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Opaque secret string. Formatting always prints `<redacted>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Reveals the raw value for the wire.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders `Authorization: Bearer <token>` as a header value flagged sensitive, so HTTP
	/// stacks that honor the flag keep it out of their own debug output.
	pub fn authorization_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.0))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatting_never_leaks_the_value() {
		let secret = TokenSecret::from("Zx8Q~client.secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted>)");
		assert_eq!(secret.to_string(), "<redacted>");
		assert_eq!(secret.expose(), "Zx8Q~client.secret");
	}

	#[test]
	fn authorization_header_is_sensitive() {
		let header = TokenSecret::new("eyJ0eXAi.payload.sig")
			.authorization_header()
			.expect("Token characters should be valid in a header.");

		assert_eq!(header, "Bearer eyJ0eXAi.payload.sig");
		assert!(header.is_sensitive());
		assert!(TokenSecret::new("line\nbreak").authorization_header().is_err());
	}
}
