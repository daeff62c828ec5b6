//! Resource Manager resource-id parsing.

// self
use crate::_prelude::*;

const MANAGEMENT_NAMESPACE: &str = "Microsoft.Management";

/// Error returned when a string is not a Resource Manager resource id.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("`{value}` is not a Resource Manager resource id.")]
pub struct ResourceIdError {
	/// Rejected input.
	pub value: String,
}

/// Parsed `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}[/...]` id.
///
/// Segment keys are matched case-insensitively because Resource Manager returns ids with
/// inconsistent casing (`resourceGroups` vs `resourcegroups`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceId {
	/// Subscription id segment.
	pub subscription_id: Option<String>,
	/// Resource group segment.
	pub resource_group: Option<String>,
	/// Management group name for `/providers/Microsoft.Management/managementGroups/{name}`.
	pub management_group: Option<String>,
	/// Provider namespace of the innermost `providers` segment (e.g. `Microsoft.Compute`).
	pub provider: Option<String>,
	/// Full resource type under the provider (e.g. `storageAccounts/blobServices/containers`).
	pub resource_type: Option<String>,
	/// Name of the innermost resource.
	pub name: Option<String>,
}
impl ResourceId {
	/// Parses an id.
	pub fn parse(value: &str) -> Result<Self, ResourceIdError> {
		let invalid = || ResourceIdError { value: value.to_owned() };

		if !value.starts_with('/') {
			return Err(invalid());
		}

		let segments = value.trim_matches('/').split('/').collect::<Vec<_>>();

		if segments.iter().any(|segment| segment.is_empty()) || segments.len() % 2 != 0 {
			return Err(invalid());
		}

		let mut id = Self::default();
		let mut types = Vec::new();

		for pair in segments.chunks_exact(2) {
			let (key, val) = (pair[0], pair[1]);

			if key.eq_ignore_ascii_case("providers") {
				// Extension resources nest a second provider; only the innermost one describes
				// the resource itself.
				id.provider = Some(val.to_owned());
				id.name = None;
				types.clear();
			} else if let Some(provider) = &id.provider {
				if types.is_empty()
					&& id.management_group.is_none()
					&& provider.eq_ignore_ascii_case(MANAGEMENT_NAMESPACE)
					&& key.eq_ignore_ascii_case("managementGroups")
				{
					id.management_group = Some(val.to_owned());
				}

				types.push(key);
				id.name = Some(val.to_owned());
			} else if key.eq_ignore_ascii_case("subscriptions") {
				id.subscription_id = Some(val.to_owned());
			} else if key.eq_ignore_ascii_case("resourceGroups") {
				id.resource_group = Some(val.to_owned());
			} else {
				return Err(invalid());
			}
		}

		if !types.is_empty() {
			id.resource_type = Some(types.join("/"));
		}

		Ok(id)
	}
}
impl FromStr for ResourceId {
	type Err = ResourceIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
