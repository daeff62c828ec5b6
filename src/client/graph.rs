//! Microsoft Graph list methods.

// crates.io
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	client::{ApiTarget, AzureClient},
	error::DecodeError,
	http::{CollectorHttpClient, TransportErrorMapper},
	models::{
		AppRoleAssignment, Application, Device, DirectoryObject, DirectoryRole,
		FederatedIdentityCredential, Group, Organization, RoleAssignment, RoleDefinition,
		ServicePrincipal, User,
	},
	paging::ListEnvelope,
	request::QueryParams,
	stream::ListStream,
};

/// `$top` for directory collections.
pub const COLLECTION_PAGE_SIZE: u32 = 999;
/// `$top` for owner and registered-owner relationships.
pub const RELATIONSHIP_PAGE_SIZE: u32 = 99;

impl<C, M> AzureClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists users.
	pub fn list_users(&self, cancel: &CancellationToken, params: QueryParams) -> ListStream<User> {
		self.graph_collection(cancel, "/v1.0/users", params)
	}

	/// Lists groups.
	pub fn list_groups(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<Group> {
		self.graph_collection(cancel, "/v1.0/groups", params)
	}

	/// Lists the direct members of a group.
	pub fn list_group_members(
		&self,
		cancel: &CancellationToken,
		group_id: &str,
		params: QueryParams,
	) -> ListStream<DirectoryObject> {
		self.graph_nested(
			cancel,
			format!("/v1.0/groups/{group_id}/members"),
			group_id,
			params.with_default_top(COLLECTION_PAGE_SIZE),
		)
	}

	/// Lists the owners of a group.
	pub fn list_group_owners(
		&self,
		cancel: &CancellationToken,
		group_id: &str,
		params: QueryParams,
	) -> ListStream<DirectoryObject> {
		self.graph_nested(
			cancel,
			format!("/v1.0/groups/{group_id}/owners"),
			group_id,
			params.with_default_top(RELATIONSHIP_PAGE_SIZE),
		)
	}

	/// Lists app registrations.
	pub fn list_apps(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<Application> {
		self.graph_collection(cancel, "/v1.0/applications", params)
	}

	/// Lists the owners of an app registration (by object id).
	pub fn list_app_owners(
		&self,
		cancel: &CancellationToken,
		app_object_id: &str,
		params: QueryParams,
	) -> ListStream<DirectoryObject> {
		self.graph_nested(
			cancel,
			format!("/v1.0/applications/{app_object_id}/owners"),
			app_object_id,
			params.with_default_top(RELATIONSHIP_PAGE_SIZE),
		)
	}

	/// Lists the federated identity credentials of an app registration (by object id).
	///
	/// The endpoint caps results at 20 per application, so no `$top` is added.
	pub fn list_app_federated_identity_credentials(
		&self,
		cancel: &CancellationToken,
		app_object_id: &str,
		params: QueryParams,
	) -> ListStream<FederatedIdentityCredential> {
		self.graph_nested(
			cancel,
			format!("/v1.0/applications/{app_object_id}/federatedIdentityCredentials"),
			app_object_id,
			params,
		)
	}

	/// Lists service principals.
	pub fn list_service_principals(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<ServicePrincipal> {
		self.graph_collection(cancel, "/v1.0/servicePrincipals", params)
	}

	/// Lists the owners of a service principal.
	pub fn list_service_principal_owners(
		&self,
		cancel: &CancellationToken,
		service_principal_id: &str,
		params: QueryParams,
	) -> ListStream<DirectoryObject> {
		self.graph_nested(
			cancel,
			format!("/v1.0/servicePrincipals/{service_principal_id}/owners"),
			service_principal_id,
			params.with_default_top(RELATIONSHIP_PAGE_SIZE),
		)
	}

	/// Lists the app roles granted to principals on a service principal (`appRoleAssignedTo`).
	pub fn list_app_role_assignments(
		&self,
		cancel: &CancellationToken,
		service_principal_id: &str,
		params: QueryParams,
	) -> ListStream<AppRoleAssignment> {
		self.graph_nested(
			cancel,
			format!("/v1.0/servicePrincipals/{service_principal_id}/appRoleAssignedTo"),
			service_principal_id,
			params.with_default_top(COLLECTION_PAGE_SIZE),
		)
	}

	/// Lists devices.
	pub fn list_devices(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<Device> {
		self.graph_collection(cancel, "/v1.0/devices", params)
	}

	/// Lists the registered owners of a device.
	pub fn list_device_registered_owners(
		&self,
		cancel: &CancellationToken,
		device_id: &str,
		params: QueryParams,
	) -> ListStream<DirectoryObject> {
		self.graph_nested(
			cancel,
			format!("/v1.0/devices/{device_id}/registeredOwners"),
			device_id,
			params.with_default_top(RELATIONSHIP_PAGE_SIZE),
		)
	}

	/// Lists activated directory roles. The endpoint does not page, so no `$top` is added.
	pub fn list_directory_roles(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<DirectoryRole> {
		self.list(cancel, ApiTarget::Graph, "/v1.0/directoryRoles", params, None)
	}

	/// Lists directory role definitions.
	pub fn list_role_definitions(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<RoleDefinition> {
		let path = "/v1.0/roleManagement/directory/roleDefinitions";

		self.list(cancel, ApiTarget::Graph, path, params, None)
	}

	/// Lists directory role assignments.
	pub fn list_role_assignments(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<RoleAssignment> {
		let path = "/v1.0/roleManagement/directory/roleAssignments";

		self.list(cancel, ApiTarget::Graph, path, params, None)
	}

	/// Fetches the tenant's organization object.
	pub async fn get_organization(&self) -> Result<Organization> {
		let page = self
			.graph
			.get_json::<ListEnvelope<Organization>>("/v1.0/organization", &QueryParams::default())
			.await?;

		page.value
			.into_iter()
			.next()
			.ok_or_else(|| DecodeError::Empty { what: "organization" }.into())
	}

	fn graph_collection<T>(
		&self,
		cancel: &CancellationToken,
		path: &str,
		params: QueryParams,
	) -> ListStream<T>
	where
		T: 'static + Send + DeserializeOwned,
	{
		let params = params.with_default_top(COLLECTION_PAGE_SIZE);

		self.list(cancel, ApiTarget::Graph, path, params, None)
	}

	fn graph_nested<T>(
		&self,
		cancel: &CancellationToken,
		path: String,
		parent_id: &str,
		params: QueryParams,
	) -> ListStream<T>
	where
		T: 'static + Send + DeserializeOwned,
	{
		self.list(cancel, ApiTarget::Graph, &path, params, Some(parent_id.to_owned()))
	}
}
