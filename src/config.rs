//! Validated client configuration and Azure cloud presets.

pub mod builder;
pub mod cloud;

pub use builder::*;
pub use cloud::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, CredentialSet, SubscriptionId, TenantId},
	http::TransportSettings,
	sender::RetryPolicy,
};

/// One API surface: where requests go and which audience tokens are minted for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
	/// Base URL that request paths are appended to.
	pub base_url: Url,
	/// Token audience; the `.default` scope is derived from it.
	pub audience: String,
}
impl Endpoint {
	/// Uses `base_url` (without a trailing slash) as the audience.
	pub fn new(base_url: Url) -> Self {
		let audience = base_url.as_str().trim_end_matches('/').to_owned();

		Self { base_url, audience }
	}
}

/// Everything needed to construct an [`crate::client::AzureClient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Cloud the endpoints were derived from.
	pub cloud: AzureCloud,
	/// Identity platform authority, e.g. `https://login.microsoftonline.com`.
	pub authority: Url,
	/// Microsoft Graph endpoint.
	pub graph: Endpoint,
	/// Resource Manager endpoint.
	pub resource_manager: Endpoint,
	/// Directory (tenant) to authenticate against.
	pub tenant: TenantId,
	/// Application (client) id.
	pub client_id: ClientId,
	/// Configured credentials; the active one is picked by precedence.
	pub credentials: CredentialSet,
	/// Subscriptions the caller intends to collect from.
	#[serde(default)]
	pub subscriptions: Vec<SubscriptionId>,
	/// Management groups the caller intends to collect from.
	#[serde(default)]
	pub management_groups: Vec<String>,
	/// Connection pool, timeout, and proxy settings.
	#[serde(default)]
	pub transport: TransportSettings,
	/// Sender retry policy.
	#[serde(default)]
	pub retry: RetryPolicy,
	/// `User-Agent` header value.
	pub user_agent: String,
}
impl ClientConfig {
	/// Starts a builder for `tenant` + `client_id` on the public cloud.
	pub fn builder(tenant: TenantId, client_id: ClientId) -> ClientConfigBuilder {
		ClientConfigBuilder::new(tenant, client_id)
	}
}
