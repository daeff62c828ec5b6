//! Microsoft Graph directory objects.

// self
use crate::{_prelude::*, models::Extra};

/// Generic directory object returned by membership and ownership relationships.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
	/// Object id.
	pub id: String,
	/// Concrete type, e.g. `#microsoft.graph.user`.
	#[serde(rename = "@odata.type", default)]
	pub odata_type: Option<String>,
	/// Display name, when the object has one.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}
impl DirectoryObject {
	/// Returns the type name without the `#microsoft.graph.` prefix.
	pub fn kind(&self) -> Option<&str> {
		self.odata_type.as_deref().map(|ty| ty.trim_start_matches("#microsoft.graph."))
	}
}

/// Graph `user`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Object id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// User principal name.
	#[serde(default)]
	pub user_principal_name: Option<String>,
	/// Whether sign-in is enabled.
	#[serde(default)]
	pub account_enabled: Option<bool>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `group`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
	/// Object id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Whether the group is security-enabled.
	#[serde(default)]
	pub security_enabled: Option<bool>,
	/// Whether the group can be assigned to directory roles.
	#[serde(default)]
	pub is_assignable_to_role: Option<bool>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `application`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
	/// Object id.
	pub id: String,
	/// Application (client) id.
	#[serde(default)]
	pub app_id: Option<String>,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `federatedIdentityCredential` on an application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedIdentityCredential {
	/// Credential id.
	pub id: String,
	/// Credential name.
	#[serde(default)]
	pub name: Option<String>,
	/// External issuer.
	#[serde(default)]
	pub issuer: Option<String>,
	/// External subject.
	#[serde(default)]
	pub subject: Option<String>,
	/// Accepted audiences.
	#[serde(default)]
	pub audiences: Vec<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `servicePrincipal`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
	/// Object id.
	pub id: String,
	/// Application (client) id.
	#[serde(default)]
	pub app_id: Option<String>,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// `Application`, `ManagedIdentity`, `Legacy`, or `SocialIdp`.
	#[serde(default)]
	pub service_principal_type: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `appRoleAssignment`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleAssignment {
	/// Assignment id.
	pub id: String,
	/// Assigned app role id.
	#[serde(default)]
	pub app_role_id: Option<String>,
	/// Principal receiving the role.
	#[serde(default)]
	pub principal_id: Option<String>,
	/// `User`, `Group`, or `ServicePrincipal`.
	#[serde(default)]
	pub principal_type: Option<String>,
	/// Service principal exposing the role.
	#[serde(default)]
	pub resource_id: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `device`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
	/// Object id.
	pub id: String,
	/// Device id registered with the directory.
	#[serde(default)]
	pub device_id: Option<String>,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Operating system.
	#[serde(default)]
	pub operating_system: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `directoryRole` (activated role instance).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRole {
	/// Object id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Id of the role template the role was activated from.
	#[serde(default)]
	pub role_template_id: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `unifiedRoleDefinition`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
	/// Definition id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Whether the definition ships with the platform.
	#[serde(default)]
	pub is_built_in: Option<bool>,
	/// Template id.
	#[serde(default)]
	pub template_id: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `unifiedRoleAssignment`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
	/// Assignment id.
	pub id: String,
	/// Assigned role definition.
	#[serde(default)]
	pub role_definition_id: Option<String>,
	/// Principal holding the role.
	#[serde(default)]
	pub principal_id: Option<String>,
	/// Scope of the assignment (`/` for tenant-wide).
	#[serde(default)]
	pub directory_scope_id: Option<String>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Graph `organization`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
	/// Tenant id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Verified domains.
	#[serde(default)]
	pub verified_domains: Vec<VerifiedDomain>,
	/// Remaining properties.
	#[serde(flatten)]
	pub extra: Extra,
}
impl Organization {
	/// Returns the default verified domain, if any.
	pub fn default_domain(&self) -> Option<&str> {
		self.verified_domains
			.iter()
			.find(|domain| domain.is_default.unwrap_or(false))
			.map(|domain| domain.name.as_str())
	}
}

/// A domain verified for an [`Organization`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDomain {
	/// Domain name.
	pub name: String,
	/// Whether this is the tenant's default domain.
	#[serde(default)]
	pub is_default: Option<bool>,
	/// Whether this is the initial `*.onmicrosoft.com` domain.
	#[serde(default)]
	pub is_initial: Option<bool>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn directory_objects_keep_type_and_extra_fields() {
		let object: DirectoryObject = serde_json::from_str(
			r##"{"@odata.type":"#microsoft.graph.servicePrincipal","id":"sp-1","displayName":"ci","appId":"app-1"}"##,
		)
		.expect("Directory object should decode.");

		assert_eq!(object.kind(), Some("servicePrincipal"));
		assert_eq!(object.display_name.as_deref(), Some("ci"));
		assert_eq!(object.extra["appId"], "app-1");
	}

	#[test]
	fn organization_reports_default_domain() {
		let org: Organization = serde_json::from_str(
			r#"{"id":"t-1","verifiedDomains":[{"name":"contoso.onmicrosoft.com","isDefault":false,"isInitial":true},{"name":"contoso.com","isDefault":true}]}"#,
		)
		.expect("Organization should decode.");

		assert_eq!(org.default_domain(), Some("contoso.com"));
	}
}
