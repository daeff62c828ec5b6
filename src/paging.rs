//! Pagination engine: page envelopes and the follow-next loop.

// std
use std::{marker::PhantomData, mem};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::DecodeError,
	http::{CollectorHttpClient, TransportErrorMapper},
	request::ApiRequest,
	sender::{ApiClient, decode_json},
};

/// Capability contract for a decoded list response.
pub trait PageEnvelope
where
	Self: 'static + Send + DeserializeOwned,
{
	/// Element type carried by the page.
	type Item: 'static + Send;

	/// Splits the page into its items and the next link, if any.
	fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

/// Default envelope shared by Graph (`@odata.nextLink`) and Resource Manager (`nextLink`).
#[derive(Clone, Debug, Deserialize)]
pub struct ListEnvelope<T> {
	/// Page items.
	#[serde(default = "Vec::new")]
	pub value: Vec<T>,
	/// Absolute URL of the next page.
	#[serde(default, rename = "@odata.nextLink", alias = "nextLink", alias = "NextLink")]
	pub next_link: Option<String>,
}
impl<T> PageEnvelope for ListEnvelope<T>
where
	T: 'static + Send + DeserializeOwned,
{
	type Item = T;

	fn into_page(self) -> (Vec<T>, Option<String>) {
		(self.value, self.next_link)
	}
}

enum Cursor {
	First(ApiRequest),
	Next(String),
	Done,
}

/// Pull-based pager over one list endpoint.
///
/// Each [`Pager::next_page`] call performs at most one HTTP request. After the last page, or
/// after the first failure of any kind, the pager is exhausted and returns `None`.
pub struct Pager<C, M, E>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: Arc<ApiClient<C, M>>,
	template: ApiRequest,
	cursor: Cursor,
	_envelope: PhantomData<fn() -> E>,
}
impl<C, M, E> Pager<C, M, E>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	E: PageEnvelope,
{
	/// Creates a pager whose first page comes from `first`.
	pub fn new(client: Arc<ApiClient<C, M>>, first: ApiRequest) -> Self {
		Self {
			client,
			template: first.clone(),
			cursor: Cursor::First(first),
			_envelope: PhantomData,
		}
	}

	/// Returns `true` once no further request will be made.
	pub fn is_done(&self) -> bool {
		matches!(self.cursor, Cursor::Done)
	}

	/// Fetches the next page.
	pub async fn next_page(&mut self) -> Option<Result<Vec<E::Item>>> {
		let result = match mem::replace(&mut self.cursor, Cursor::Done) {
			Cursor::Done => return None,
			Cursor::First(request) => self.fetch(&request).await,
			Cursor::Next(link) => self.follow_next(&link).await,
		};

		Some(result.map(|envelope| {
			let (items, next) = envelope.into_page();

			if let Some(link) = next.filter(|link| !link.trim().is_empty()) {
				self.cursor = Cursor::Next(link);
			}

			items
		}))
	}

	/// Fetches the page behind an absolute next link as a bare `GET`.
	///
	/// The link already carries every query parameter the server wants, so nothing is added;
	/// headers from the first request (such as `ConsistencyLevel`) are kept.
	pub async fn follow_next(&self, link: &str) -> Result<E> {
		let url = Url::parse(link)
			.map_err(|source| DecodeError::NextLink { link: link.to_owned(), source })?;
		let request = self.template.inherit_headers(ApiRequest::get(url));

		self.fetch(&request).await
	}

	async fn fetch(&self, request: &ApiRequest) -> Result<E> {
		let response = self.client.send(request).await?;

		decode_json(response.body())
	}
}
