//! Fluent construction of [`ClientConfig`] values.

// self
use crate::{
	_prelude::*,
	auth::{CertificateMaterial, ClientId, CredentialSet, SubscriptionId, TenantId, TokenSecret},
	config::{AzureCloud, ClientConfig, Endpoint},
	error::ConfigError,
	http::TransportSettings,
	request::DEFAULT_USER_AGENT,
	sender::RetryPolicy,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Directory (tenant) to authenticate against.
	pub tenant: TenantId,
	/// Application (client) id.
	pub client_id: ClientId,
	/// Cloud preset used for every URL not overridden explicitly.
	pub cloud: AzureCloud,
	/// Authority override.
	pub authority: Option<Url>,
	/// Graph base URL override.
	pub graph_url: Option<Url>,
	/// Resource Manager base URL override.
	pub resource_manager_url: Option<Url>,
	/// Credentials collected so far.
	pub credentials: CredentialSet,
	/// Target subscriptions.
	pub subscriptions: Vec<SubscriptionId>,
	/// Target management groups.
	pub management_groups: Vec<String>,
	/// Transport settings.
	pub transport: TransportSettings,
	/// Retry policy.
	pub retry: RetryPolicy,
	/// `User-Agent` override.
	pub user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a builder on the public cloud with default transport and retry settings.
	pub fn new(tenant: TenantId, client_id: ClientId) -> Self {
		Self {
			tenant,
			client_id,
			cloud: AzureCloud::default(),
			authority: None,
			graph_url: None,
			resource_manager_url: None,
			credentials: CredentialSet::default(),
			subscriptions: Vec::new(),
			management_groups: Vec::new(),
			transport: TransportSettings::default(),
			retry: RetryPolicy::default(),
			user_agent: None,
		}
	}

	/// Selects a cloud preset.
	pub fn cloud(mut self, cloud: AzureCloud) -> Self {
		self.cloud = cloud;

		self
	}

	/// Overrides the identity platform authority.
	pub fn authority(mut self, url: Url) -> Self {
		self.authority = Some(url);

		self
	}

	/// Overrides the Graph base URL (and therefore its audience).
	pub fn graph_url(mut self, url: Url) -> Self {
		self.graph_url = Some(url);

		self
	}

	/// Overrides the Resource Manager base URL (and therefore its audience).
	pub fn resource_manager_url(mut self, url: Url) -> Self {
		self.resource_manager_url = Some(url);

		self
	}

	/// Replaces the whole credential set.
	pub fn credentials(mut self, credentials: CredentialSet) -> Self {
		self.credentials = credentials;

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.credentials.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets PEM certificate + key material.
	pub fn client_certificate(
		mut self,
		certificate_pem: impl Into<String>,
		private_key_pem: impl Into<String>,
	) -> Self {
		self.credentials.client_certificate = Some(CertificateMaterial {
			certificate_pem: certificate_pem.into(),
			private_key_pem: TokenSecret::new(private_key_pem),
		});

		self
	}

	/// Sets a refresh token.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.credentials.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets resource-owner credentials.
	pub fn username_password(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.credentials.username = Some(username.into());
		self.credentials.password = Some(TokenSecret::new(password));

		self
	}

	/// Sets a pre-issued JWT; it bypasses every grant.
	pub fn jwt(mut self, token: impl Into<String>) -> Self {
		self.credentials.jwt = Some(TokenSecret::new(token));

		self
	}

	/// Adds a target subscription.
	pub fn subscription(mut self, id: SubscriptionId) -> Self {
		self.subscriptions.push(id);

		self
	}

	/// Adds a target management group by name.
	pub fn management_group(mut self, name: impl Into<String>) -> Self {
		self.management_groups.push(name.into());

		self
	}

	/// Routes every request through a forward proxy.
	pub fn proxy(mut self, url: Url) -> Self {
		self.transport.proxy = Some(url);

		self
	}

	/// Overrides transport settings.
	pub fn transport(mut self, transport: TransportSettings) -> Self {
		self.transport = transport;

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	///
	/// Fails when no credential is usable (including malformed PEM or JWT material) or when a
	/// URL cannot serve as a base URL.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.credentials.resolve()?;

		let authority = resolve_url(self.authority, self.cloud.authority())?;
		let graph = resolve_url(self.graph_url, self.cloud.graph())?;
		let resource_manager =
			resolve_url(self.resource_manager_url, self.cloud.resource_manager())?;

		Ok(ClientConfig {
			cloud: self.cloud,
			authority,
			graph: Endpoint::new(graph),
			resource_manager: Endpoint::new(resource_manager),
			tenant: self.tenant,
			client_id: self.client_id,
			credentials: self.credentials,
			subscriptions: self.subscriptions,
			management_groups: self.management_groups,
			transport: self.transport,
			retry: self.retry,
			user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
		})
	}
}

fn resolve_url(explicit: Option<Url>, preset: &str) -> Result<Url, ConfigError> {
	let url = match explicit {
		Some(url) => url,
		None => AzureCloud::url(preset)?,
	};

	if url.cannot_be_a_base() {
		return Err(ConfigError::NotABaseUrl { url: url.to_string() });
	}

	Ok(url)
}
