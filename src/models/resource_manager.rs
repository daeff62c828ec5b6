//! Azure Resource Manager resources.

// self
use crate::{
	_prelude::*,
	models::{Extra, ResourceId},
};

macro_rules! def_resource {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
		pub struct $name {
			/// Full resource id.
			pub id: String,
			/// Resource name.
			#[serde(default)]
			pub name: Option<String>,
			/// Resource type, e.g. `Microsoft.Compute/virtualMachines`.
			#[serde(rename = "type", default)]
			pub resource_type: Option<String>,
			/// Azure region.
			#[serde(default)]
			pub location: Option<String>,
			/// Resource kind (web apps use it to tell function apps apart).
			#[serde(default)]
			pub kind: Option<String>,
			/// Resource tags.
			#[serde(default)]
			pub tags: Option<BTreeMap<String, String>>,
			/// Provider-specific properties.
			#[serde(default)]
			pub properties: serde_json::Value,
			/// Remaining top-level fields (identity, sku, zones, …).
			#[serde(flatten)]
			pub extra: Extra,
		}
		impl $name {
			/// Parses [`Self::id`].
			pub fn resource_id(&self) -> Option<ResourceId> {
				ResourceId::parse(&self.id).ok()
			}

			/// Resource group the resource lives in.
			pub fn resource_group_name(&self) -> Option<String> {
				self.resource_id().and_then(|id| id.resource_group)
			}

			/// Subscription the resource lives in.
			pub fn subscription_id(&self) -> Option<String> {
				self.resource_id().and_then(|id| id.subscription_id)
			}
		}
	};
}

def_resource!(ResourceGroup, "Resource group.");
def_resource!(VirtualMachine, "Virtual machine (`Microsoft.Compute/virtualMachines`).");
def_resource!(
	VirtualMachineScaleSet,
	"Virtual machine scale set (`Microsoft.Compute/virtualMachineScaleSets`)."
);
def_resource!(KeyVault, "Key vault (`Microsoft.KeyVault/vaults`).");
def_resource!(StorageAccount, "Storage account (`Microsoft.Storage/storageAccounts`).");
def_resource!(
	StorageContainer,
	"Blob container (`Microsoft.Storage/storageAccounts/blobServices/containers`)."
);
def_resource!(AutomationAccount, "Automation account (`Microsoft.Automation/automationAccounts`).");
def_resource!(ContainerRegistry, "Container registry (`Microsoft.ContainerRegistry/registries`).");
def_resource!(WebApp, "App Service site (`Microsoft.Web/sites`); function apps share the shape.");
def_resource!(LogicApp, "Logic app workflow (`Microsoft.Logic/workflows`).");
def_resource!(ManagedCluster, "AKS cluster (`Microsoft.ContainerService/managedClusters`).");
def_resource!(ManagementGroup, "Management group (`Microsoft.Management/managementGroups`).");
def_resource!(
	ManagementGroupDescendant,
	"Management group descendant: a child management group or subscription."
);
def_resource!(
	AzureRoleAssignment,
	"Resource Manager role assignment (`Microsoft.Authorization/roleAssignments`)."
);

impl WebApp {
	/// Returns `true` for function apps (`kind` contains `functionapp`).
	pub fn is_function_app(&self) -> bool {
		self.kind.as_deref().is_some_and(|kind| kind.to_ascii_lowercase().contains("functionapp"))
	}
}

/// Subscription visible to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
	/// `/subscriptions/{subscriptionId}`.
	pub id: String,
	/// Subscription id.
	pub subscription_id: String,
	/// Owning tenant.
	#[serde(default)]
	pub tenant_id: Option<String>,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// `Enabled`, `Disabled`, `Warned`, …
	#[serde(default)]
	pub state: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Tenant visible to the caller (`/tenants`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
	/// `/tenants/{tenantId}`.
	pub id: String,
	/// Tenant id.
	pub tenant_id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Default domain.
	#[serde(default)]
	pub default_domain: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
