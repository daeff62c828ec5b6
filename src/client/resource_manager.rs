//! Azure Resource Manager list methods.

// crates.io
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	client::{ApiTarget, AzureClient},
	http::{CollectorHttpClient, TransportErrorMapper},
	models::{
		AutomationAccount, AzureRoleAssignment, ContainerRegistry, KeyVault, LogicApp,
		ManagedCluster, ManagementGroup, ManagementGroupDescendant, ResourceGroup,
		StorageAccount, StorageContainer, Subscription, Tenant, VirtualMachine,
		VirtualMachineScaleSet, WebApp,
	},
	paging::{ListEnvelope, PageEnvelope},
	request::QueryParams,
	stream::ListStream,
};

/// `api-version` defaults per resource provider.
pub mod api_versions {
	/// `/tenants`.
	pub const TENANTS: &str = "2020-01-01";
	/// `/subscriptions`.
	pub const SUBSCRIPTIONS: &str = "2022-12-01";
	/// `Microsoft.Management/managementGroups`.
	pub const MANAGEMENT_GROUPS: &str = "2020-05-01";
	/// `resourcegroups`.
	pub const RESOURCE_GROUPS: &str = "2021-04-01";
	/// `Microsoft.Compute`.
	pub const COMPUTE: &str = "2021-07-01";
	/// `Microsoft.KeyVault/vaults`.
	pub const KEY_VAULTS: &str = "2019-09-01";
	/// `Microsoft.Storage`.
	pub const STORAGE: &str = "2022-05-01";
	/// `Microsoft.Automation/automationAccounts`.
	pub const AUTOMATION: &str = "2021-06-22";
	/// `Microsoft.ContainerRegistry/registries`.
	pub const CONTAINER_REGISTRY: &str = "2023-01-01-preview";
	/// `Microsoft.Web/sites`.
	pub const WEB: &str = "2022-03-01";
	/// `Microsoft.Logic/workflows`.
	pub const LOGIC: &str = "2016-06-01";
	/// `Microsoft.ContainerService/managedClusters`.
	pub const CONTAINER_SERVICE: &str = "2021-07-01";
	/// `Microsoft.Authorization/roleAssignments`.
	pub const AUTHORIZATION: &str = "2022-04-01";
}

/// `Microsoft.Web/sites` page that keeps either function apps or every other site.
#[derive(Deserialize)]
#[serde(transparent)]
struct SitePage<const FUNCTION_APPS: bool>(ListEnvelope<WebApp>);
impl<const FUNCTION_APPS: bool> PageEnvelope for SitePage<FUNCTION_APPS> {
	type Item = WebApp;

	fn into_page(self) -> (Vec<WebApp>, Option<String>) {
		let (sites, next) = self.0.into_page();
		let sites =
			sites.into_iter().filter(|site| site.is_function_app() == FUNCTION_APPS).collect();

		(sites, next)
	}
}

impl<C, M> AzureClient<C, M>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists tenants the caller can see.
	pub fn list_tenants(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<Tenant> {
		let params = params.with_default_api_version(api_versions::TENANTS);

		self.list(cancel, ApiTarget::ResourceManager, "/tenants", params, None)
	}

	/// Lists subscriptions the caller can see.
	pub fn list_subscriptions(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<Subscription> {
		let params = params.with_default_api_version(api_versions::SUBSCRIPTIONS);

		self.list(cancel, ApiTarget::ResourceManager, "/subscriptions", params, None)
	}

	/// Lists management groups the caller can see.
	pub fn list_management_groups(
		&self,
		cancel: &CancellationToken,
		params: QueryParams,
	) -> ListStream<ManagementGroup> {
		let params = params.with_default_api_version(api_versions::MANAGEMENT_GROUPS);
		let path = "/providers/Microsoft.Management/managementGroups";

		self.list(cancel, ApiTarget::ResourceManager, path, params, None)
	}

	/// Lists every descendant (child groups and subscriptions) of a management group.
	pub fn list_management_group_descendants(
		&self,
		cancel: &CancellationToken,
		management_group_id: &str,
		params: QueryParams,
	) -> ListStream<ManagementGroupDescendant> {
		let params = params.with_default_api_version(api_versions::MANAGEMENT_GROUPS);
		let path = format!(
			"/providers/Microsoft.Management/managementGroups/{management_group_id}/descendants"
		);
		let parent_id = Some(management_group_id.to_owned());

		self.list(cancel, ApiTarget::ResourceManager, &path, params, parent_id)
	}

	/// Lists resource groups in a subscription.
	pub fn list_resource_groups(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<ResourceGroup> {
		let params = params.with_default_api_version(api_versions::RESOURCE_GROUPS);
		let path = format!("/subscriptions/{subscription_id}/resourcegroups");
		let parent_id = Some(subscription_id.to_owned());

		self.list(cancel, ApiTarget::ResourceManager, &path, params, parent_id)
	}

	/// Lists virtual machines in a subscription.
	pub fn list_virtual_machines(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<VirtualMachine> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.Compute/virtualMachines",
			api_versions::COMPUTE,
			params,
		)
	}

	/// Lists virtual machine scale sets in a subscription.
	pub fn list_vm_scale_sets(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<VirtualMachineScaleSet> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.Compute/virtualMachineScaleSets",
			api_versions::COMPUTE,
			params,
		)
	}

	/// Lists key vaults in a subscription.
	pub fn list_key_vaults(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<KeyVault> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.KeyVault/vaults",
			api_versions::KEY_VAULTS,
			params,
		)
	}

	/// Lists storage accounts in a subscription.
	pub fn list_storage_accounts(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<StorageAccount> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.Storage/storageAccounts",
			api_versions::STORAGE,
			params,
		)
	}

	/// Lists blob containers of a storage account, given the account's full resource id.
	pub fn list_storage_containers(
		&self,
		cancel: &CancellationToken,
		storage_account_id: &str,
		params: QueryParams,
	) -> ListStream<StorageContainer> {
		let params = params.with_default_api_version(api_versions::STORAGE);
		let path =
			format!("{}/blobServices/default/containers", storage_account_id.trim_end_matches('/'));
		let parent_id = Some(storage_account_id.to_owned());

		self.list(cancel, ApiTarget::ResourceManager, &path, params, parent_id)
	}

	/// Lists automation accounts in a subscription.
	pub fn list_automation_accounts(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<AutomationAccount> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.Automation/automationAccounts",
			api_versions::AUTOMATION,
			params,
		)
	}

	/// Lists container registries in a subscription.
	pub fn list_container_registries(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<ContainerRegistry> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.ContainerRegistry/registries",
			api_versions::CONTAINER_REGISTRY,
			params,
		)
	}

	/// Lists App Service sites in a subscription, excluding function apps.
	pub fn list_web_apps(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<WebApp> {
		self.list_sites::<false>(cancel, subscription_id, params)
	}

	/// Lists function apps in a subscription.
	pub fn list_function_apps(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<WebApp> {
		self.list_sites::<true>(cancel, subscription_id, params)
	}

	/// Lists logic app workflows in a subscription.
	pub fn list_logic_apps(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<LogicApp> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.Logic/workflows",
			api_versions::LOGIC,
			params,
		)
	}

	/// Lists AKS clusters in a subscription.
	pub fn list_managed_clusters(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<ManagedCluster> {
		self.list_provider(
			cancel,
			subscription_id,
			"Microsoft.ContainerService/managedClusters",
			api_versions::CONTAINER_SERVICE,
			params,
		)
	}

	/// Lists role assignments at (and, without a `$filter`, below) any Resource Manager scope:
	/// a subscription, resource group, resource, or management group id.
	pub fn list_role_assignments_for_resource(
		&self,
		cancel: &CancellationToken,
		scope: &str,
		params: QueryParams,
	) -> ListStream<AzureRoleAssignment> {
		let params = params.with_default_api_version(api_versions::AUTHORIZATION);
		let path = format!(
			"{}/providers/Microsoft.Authorization/roleAssignments",
			scope.trim_end_matches('/')
		);

		self.list(cancel, ApiTarget::ResourceManager, &path, params, Some(scope.into()))
	}

	fn list_provider<T>(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		resource_type: &str,
		api_version: &str,
		params: QueryParams,
	) -> ListStream<T>
	where
		T: 'static + Send + DeserializeOwned,
	{
		let params = params.with_default_api_version(api_version);
		let path = format!("/subscriptions/{subscription_id}/providers/{resource_type}");
		let parent_id = Some(subscription_id.to_owned());

		self.list(cancel, ApiTarget::ResourceManager, &path, params, parent_id)
	}

	fn list_sites<const FUNCTION_APPS: bool>(
		&self,
		cancel: &CancellationToken,
		subscription_id: &str,
		params: QueryParams,
	) -> ListStream<WebApp> {
		let params = params.with_default_api_version(api_versions::WEB);
		let path = format!("/subscriptions/{subscription_id}/providers/Microsoft.Web/sites");

		self.list_envelope::<SitePage<FUNCTION_APPS>>(
			cancel,
			ApiTarget::ResourceManager,
			&path,
			params,
			Some(subscription_id.into()),
		)
	}
}
