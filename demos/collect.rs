//! Walks a mocked tenant with the reqwest transport: users from Graph, then subscriptions and
//! their resource groups from Resource Manager, all streamed under one cancellation token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use tokio_util::sync::CancellationToken;
use url::Url;
// self
use azure_collector::{
	auth::{ClientId, TenantId},
	client::AzureClient,
	config::ClientConfig,
	request::QueryParams,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso.onmicrosoft.com/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let next = server.url("/graph/v1.0/users?$skiptoken=2");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/graph/v1.0/users").query_param("$top", "999");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"value\":[{{\"id\":\"u1\",\"displayName\":\"Adele\"}}],\"@odata.nextLink\":\"{next}\"}}"
			));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/graph/v1.0/users").query_param("$skiptoken", "2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"value\":[{\"id\":\"u2\",\"displayName\":\"Megan\"}]}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/arm/subscriptions");
			then.status(200).header("content-type", "application/json").body(
				"{\"value\":[{\"id\":\"/subscriptions/sub-1\",\"subscriptionId\":\"sub-1\"}]}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/arm/subscriptions/sub-1/resourcegroups");
			then.status(200).header("content-type", "application/json").body(
				"{\"value\":[{\"id\":\"/subscriptions/sub-1/resourceGroups/rg-web\",\"name\":\"rg-web\"}]}",
			);
		})
		.await;

	let config = ClientConfig::builder(
		TenantId::new("contoso.onmicrosoft.com")?,
		ClientId::new("0d3c1b2a-5e4f-4a6b-9c8d-7e6f5a4b3c2d")?,
	)
	.authority(Url::parse(&server.url("/"))?)
	.graph_url(Url::parse(&server.url("/graph"))?)
	.resource_manager_url(Url::parse(&server.url("/arm"))?)
	.client_secret("super-secret")
	.build()?;
	let client = AzureClient::new(&config)?;
	let cancel = CancellationToken::new();
	let mut users = client.list_users(&cancel, QueryParams::default());

	while let Some(user) = users.recv().await {
		let user = user.result?;

		println!("User {} ({}).", user.id, user.display_name.unwrap_or_default());
	}

	let mut subscriptions = client.list_subscriptions(&cancel, QueryParams::default());

	while let Some(subscription) = subscriptions.recv().await {
		let subscription = subscription.result?;
		let mut groups = client.list_resource_groups(
			&cancel,
			&subscription.subscription_id,
			QueryParams::default(),
		);

		while let Some(group) = groups.recv().await {
			println!(
				"Subscription {} has resource group {}.",
				group.parent_id.unwrap_or_default(),
				group.result?.name.unwrap_or_default()
			);
		}
	}

	// Graph and Resource Manager each hold their own token.
	token_mock.assert_calls_async(2).await;

	Ok(())
}
