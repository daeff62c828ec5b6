//! Typed facade over Graph and Resource Manager list endpoints.
//!
//! Every `list_*` method returns a [`ListStream`] immediately; paging happens on a spawned task.
//! Methods must therefore be called from within a tokio runtime. Parent-scoped methods stamp
//! each result with the parent object id.

mod graph;
mod resource_manager;

pub use resource_manager::api_versions;

// crates.io
use oauth2::http::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	auth::{SubscriptionId, TokenManager},
	config::{ClientConfig, Endpoint},
	http::{CollectorHttpClient, TransportErrorMapper},
	paging::{ListEnvelope, PageEnvelope},
	request::QueryParams,
	sender::ApiClient,
	stream::{self, ListStream},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Which API surface a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiTarget {
	/// Microsoft Graph.
	Graph,
	/// Azure Resource Manager.
	ResourceManager,
}

/// Collector client backed by reqwest.
#[cfg(feature = "reqwest")]
pub type ReqwestAzureClient = AzureClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Graph + Resource Manager client sharing one credential and one connection pool.
pub struct AzureClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	graph: Arc<ApiClient<C, M>>,
	resource_manager: Arc<ApiClient<C, M>>,
	subscriptions: Vec<SubscriptionId>,
	management_groups: Vec<String>,
}
#[cfg(feature = "reqwest")]
impl AzureClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds a reqwest transport from `config.transport` and wires both API clients.
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_settings(&config.transport)?;

		Self::with_http_client(config, http_client, ReqwestTransportErrorMapper)
	}
}
impl<C, M> AzureClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wires both API clients over a caller-supplied transport.
	pub fn with_http_client(
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let error_mapper = error_mapper.into();
		let credentials = config.credentials.resolve()?;
		let api_client = |endpoint: &Endpoint| -> Result<Arc<ApiClient<C, M>>> {
			let tokens = TokenManager::new(
				&config.authority,
				&config.tenant,
				config.client_id.clone(),
				endpoint.audience.clone(),
				credentials.clone(),
				Arc::clone(&http_client),
				Arc::clone(&error_mapper),
			)?;

			Ok(Arc::new(ApiClient::new(
				endpoint.base_url.clone(),
				Arc::new(tokens),
				Arc::clone(&http_client),
				Arc::clone(&error_mapper),
				config.retry.clone(),
				config.user_agent.clone(),
			)))
		};

		Ok(Self {
			graph: api_client(&config.graph)?,
			resource_manager: api_client(&config.resource_manager)?,
			subscriptions: config.subscriptions.clone(),
			management_groups: config.management_groups.clone(),
		})
	}

	/// Microsoft Graph client.
	pub fn graph(&self) -> &Arc<ApiClient<C, M>> {
		&self.graph
	}

	/// Resource Manager client.
	pub fn resource_manager(&self) -> &Arc<ApiClient<C, M>> {
		&self.resource_manager
	}

	/// Subscriptions configured as collection targets.
	pub fn subscriptions(&self) -> &[SubscriptionId] {
		&self.subscriptions
	}

	/// Management groups configured as collection targets.
	pub fn management_groups(&self) -> &[String] {
		&self.management_groups
	}

	/// Client for `target`.
	pub fn api(&self, target: ApiTarget) -> &Arc<ApiClient<C, M>> {
		match target {
			ApiTarget::Graph => &self.graph,
			ApiTarget::ResourceManager => &self.resource_manager,
		}
	}

	/// Streams any list endpoint that uses the standard `value` + next-link envelope.
	pub fn list<T>(
		&self,
		cancel: &CancellationToken,
		target: ApiTarget,
		path: &str,
		params: QueryParams,
		parent_id: Option<String>,
	) -> ListStream<T>
	where
		T: 'static + Send + DeserializeOwned,
	{
		self.list_envelope::<ListEnvelope<T>>(cancel, target, path, params, parent_id)
	}

	/// Streams a list endpoint through a custom [`PageEnvelope`].
	pub fn list_envelope<E>(
		&self,
		cancel: &CancellationToken,
		target: ApiTarget,
		path: &str,
		params: QueryParams,
		parent_id: Option<String>,
	) -> ListStream<E::Item>
	where
		E: PageEnvelope,
	{
		let client = self.api(target);

		match client.request(Method::GET, path, &params) {
			Ok(request) =>
				stream::spawn_list::<C, M, E>(Arc::clone(client), request, parent_id, cancel),
			Err(e) => stream::spawn_error(e, parent_id),
		}
	}
}
impl<C, M> Debug for AzureClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AzureClient")
			.field("graph", &self.graph)
			.field("resource_manager", &self.resource_manager)
			.field("subscriptions", &self.subscriptions)
			.field("management_groups", &self.management_groups)
			.finish()
	}
}
