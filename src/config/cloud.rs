//! National cloud presets and their endpoint URLs.

// self
use crate::{_prelude::*, error::ConfigError};

/// National cloud presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzureCloud {
	/// Azure public cloud.
	#[default]
	Public,
	/// Azure US Government.
	UsGovernment,
	/// Azure operated by 21Vianet.
	China,
}
impl AzureCloud {
	/// Identity platform authority.
	pub const fn authority(self) -> &'static str {
		match self {
			Self::Public => "https://login.microsoftonline.com",
			Self::UsGovernment => "https://login.microsoftonline.us",
			Self::China => "https://login.chinacloudapi.cn",
		}
	}

	/// Microsoft Graph base URL (also the Graph audience).
	pub const fn graph(self) -> &'static str {
		match self {
			Self::Public => "https://graph.microsoft.com",
			Self::UsGovernment => "https://graph.microsoft.us",
			Self::China => "https://microsoftgraph.chinacloudapi.cn",
		}
	}

	/// Resource Manager base URL (also the Resource Manager audience).
	pub const fn resource_manager(self) -> &'static str {
		match self {
			Self::Public => "https://management.azure.com",
			Self::UsGovernment => "https://management.usgovcloudapi.net",
			Self::China => "https://management.chinacloudapi.cn",
		}
	}

	pub(crate) fn url(raw: &str) -> Result<Url, ConfigError> {
		Url::parse(raw).map_err(|source| ConfigError::invalid_url(raw, source))
	}
}
impl FromStr for AzureCloud {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
			"public" | "azurecloud" => Ok(Self::Public),
			"usgovernment" | "usgov" | "azureusgovernment" => Ok(Self::UsGovernment),
			"china" | "azurechinacloud" => Ok(Self::China),
			_ => Err(ConfigError::UnknownCloud { name: s.to_owned() }),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn presets_parse_common_spellings() {
		assert_eq!("AzureCloud".parse::<AzureCloud>().ok(), Some(AzureCloud::Public));
		assert_eq!("us-gov".parse::<AzureCloud>().ok(), Some(AzureCloud::UsGovernment));
		assert_eq!("AZURE_CHINA_CLOUD".parse::<AzureCloud>().ok(), Some(AzureCloud::China));
		assert!("mars".parse::<AzureCloud>().is_err());
	}

	#[test]
	fn preset_urls_are_valid() {
		for cloud in [AzureCloud::Public, AzureCloud::UsGovernment, AzureCloud::China] {
			for raw in [cloud.authority(), cloud.graph(), cloud.resource_manager()] {
				assert!(AzureCloud::url(raw).is_ok(), "{raw} should parse");
			}
		}
	}
}
