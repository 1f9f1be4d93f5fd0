//! Pluggable authentication over a small JSON contract: a client session engine that
//! serializes operations and refreshes ahead of expiry, plus a server-side strategy registry
//! that dispatches multi-step exchanges.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod error;
pub mod http;
pub mod model;
pub mod obs;
pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::{ClientConfig, MemoryNavigator, SessionEngine},
		http::{LoopbackTransport, TransportRequest, TransportResponse},
		store::MemoryStore,
	};

	/// Scripted responder used by [`build_loopback_engine`].
	pub type Responder = Arc<dyn Fn(&TransportRequest) -> TransportResponse + Send + Sync>;

	/// Builds an engine over a loopback transport answering with `responder`, a fresh shared
	/// store, and a navigator positioned at `https://app.example/`.
	pub fn build_loopback_engine(
		responder: Responder,
	) -> (SessionEngine, LoopbackTransport, Arc<MemoryStore>, Arc<MemoryNavigator>) {
		let transport = LoopbackTransport::new(move |request| {
			let response = responder(&request);

			async move { Ok(response) }
		});
		let store = Arc::new(MemoryStore::default());
		let navigator = Arc::new(MemoryNavigator::at(
			Url::parse("https://app.example/").expect("Navigator URL should parse."),
		));
		let config = ClientConfig::builder()
			.base_url(Url::parse("https://auth.example/api/").expect("Base URL should parse."))
			.refresh_jitter(Duration::ZERO)
			.build()
			.expect("Client config should build.");
		let engine = SessionEngine::builder(config)
			.transport(transport.clone())
			.store(store.clone())
			.navigator(navigator.clone())
			.build()
			.expect("Session engine should build.");

		(engine, transport, store, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
