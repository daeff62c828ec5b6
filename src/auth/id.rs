//! Azure directory identifiers.
//!
//! Applications and subscriptions are always GUIDs. A tenant may be named
//! either by its GUID or by one of its verified domains. Every identifier is normalized to
//! lowercase so that values copied from the portal and values returned by Graph compare equal.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
const DOMAIN_MAX_LEN: usize = 253;
const LABEL_MAX_LEN: usize = 63;

/// Reasons an identifier is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier kind.
		kind: &'static str,
	},
	/// The value is not a `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` GUID.
	#[error("{kind} identifier `{value}` is not a GUID.")]
	NotGuid {
		/// Identifier kind.
		kind: &'static str,
		/// Rejected input.
		value: String,
	},
	/// The tenant is neither a GUID nor a plausible domain name.
	#[error("Tenant `{value}` is neither a GUID nor a domain name.")]
	InvalidTenant {
		/// Rejected input.
		value: String,
	},
}

macro_rules! azure_id {
	($(#[$meta:meta])* $name:ident, $kind:literal, $normalize:path) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and lowercases `value`.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				$normalize($kind, value.as_ref()).map(Self)
			}

			/// Borrows the normalized form.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				self.as_str()
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				self.as_str()
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

azure_id! {
	/// Directory (tenant) GUID or verified domain such as `contoso.onmicrosoft.com`.
	TenantId, "Tenant", normalize_tenant
}
azure_id! {
	/// Application (client) id of an app registration.
	ClientId, "Client", normalize_guid
}
azure_id! {
	/// Azure subscription id.
	SubscriptionId, "Subscription", normalize_guid
}

fn normalize_guid(kind: &'static str, raw: &str) -> Result<String, IdentifierError> {
	if raw.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !is_guid(raw) {
		return Err(IdentifierError::NotGuid { kind, value: raw.to_owned() });
	}

	Ok(raw.to_ascii_lowercase())
}

fn normalize_tenant(kind: &'static str, raw: &str) -> Result<String, IdentifierError> {
	if raw.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if is_guid(raw) || is_domain(raw) {
		return Ok(raw.to_ascii_lowercase());
	}

	Err(IdentifierError::InvalidTenant { value: raw.to_owned() })
}

fn is_guid(raw: &str) -> bool {
	let groups = raw.split('-').collect::<Vec<_>>();

	groups.len() == GUID_GROUPS.len()
		&& groups
			.iter()
			.zip(GUID_GROUPS)
			.all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn is_domain(raw: &str) -> bool {
	if raw.len() > DOMAIN_MAX_LEN || !raw.contains('.') {
		return false;
	}

	raw.split('.').all(|label| {
		!label.is_empty()
			&& label.len() <= LABEL_MAX_LEN
			&& !label.starts_with('-')
			&& !label.ends_with('-')
			&& label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
	})
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	const APP: &str = "6F1E2D3C-4B5A-4978-8695-A4B3C2D1E0F9";

	#[test]
	fn guid_identifiers_are_lowercased() {
		let client = ClientId::new(APP).expect("Uppercase GUID should be accepted.");

		assert_eq!(client.as_str(), "6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9");
		assert_eq!(format!("{client:?}"), "Client(6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9)");
		assert_eq!(
			SubscriptionId::new(APP).expect("Subscription id should be accepted."),
			SubscriptionId::new(APP.to_ascii_lowercase())
				.expect("Lowercase subscription id should be accepted.")
		);
	}

	#[test]
	fn malformed_guids_are_rejected() {
		for raw in [
			"sub-1",
			"6f1e2d3c4b5a49788695a4b3c2d1e0f9",
			"6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f",
			"6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0fg",
			"{6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9}",
		] {
			assert!(
				matches!(SubscriptionId::new(raw), Err(IdentifierError::NotGuid { .. })),
				"`{raw}` must not be accepted as a subscription id."
			);
		}

		assert_eq!(ClientId::new(""), Err(IdentifierError::Empty { kind: "Client" }));
	}

	#[test]
	fn tenants_accept_guids_and_domains() {
		let domain = TenantId::new("Contoso.OnMicrosoft.com").expect("Domain should be accepted.");

		assert_eq!(domain.as_str(), "contoso.onmicrosoft.com");
		TenantId::new(APP).expect("Tenant GUID should be accepted.");

		for raw in ["contoso", "contoso..com", "-contoso.com", "con toso.com", "contoso.com/evil"] {
			assert!(
				matches!(TenantId::new(raw), Err(IdentifierError::InvalidTenant { .. })),
				"`{raw}` must not be accepted as a tenant."
			);
		}
	}

	#[test]
	fn deserialization_normalizes_and_validates() {
		let ids: Vec<SubscriptionId> =
			serde_json::from_str(&format!("[\"{APP}\"]")).expect("Subscription ids should decode.");
		let map = HashMap::from([(ids[0].clone(), "prod")]);

		assert_eq!(map.get("6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9"), Some(&"prod"));
		assert!(serde_json::from_str::<SubscriptionId>("\"prod\"").is_err());
		assert_eq!(
			serde_json::to_string(&ids[0]).expect("Subscription id should encode."),
			"\"6f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9\""
		);
	}
}
