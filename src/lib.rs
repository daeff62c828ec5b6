//! Azure tenant collector: authenticated, retry-aware enumeration of Microsoft Graph and Azure
//! Resource Manager, streamed through cancellable, backpressured channels.
//!
//! Build a [`config::ClientConfig`], hand it to [`client::AzureClient`], and call any of the
//! `list_*` methods. Each call returns a [`stream::ListStream`] that yields one
//! [`stream::ListResult`] per object until the last page, the first error, or cancellation.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod oauth;
pub mod obs;
pub mod paging;
pub mod request;
pub mod sender;
pub mod stream;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
