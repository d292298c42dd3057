use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use super::Store;
use super::protocol::{IncrementRequest, IncrementResponse};
use crate::error::{ChainError, Result};

/// Store living behind a `rs-markov-server` instance.
///
/// Every call is one blocking HTTP round-trip; failures (connection,
/// timeout, non-2xx status, bad body) surface as `StoreUnavailable` and are
/// never retried.
#[derive(Debug, Clone)]
pub struct HttpStore {
	client: Client,
	base_url: String,
}

fn unavailable(err: reqwest::Error) -> ChainError {
	ChainError::StoreUnavailable(err.to_string())
}

impl HttpStore {
	/// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:5000`).
	pub fn new(base_url: impl Into<String>) -> Result<Self> {
		Self::with_timeout(base_url, Duration::from_secs(10))
	}

	pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
		let client = Client::builder().timeout(timeout).build().map_err(unavailable)?;
		let base_url = base_url.into().trim_end_matches('/').to_owned();
		Ok(Self { client, base_url })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn url(&self, route: &str) -> String {
		format!("{}/v1/store/{}", self.base_url, route)
	}

	fn checked(response: reqwest::Result<Response>) -> Result<Response> {
		response.and_then(Response::error_for_status).map_err(unavailable)
	}
}

impl Store for HttpStore {
	fn increment(&self, key: &str, field: &str, by: u64) -> Result<u64> {
		let body = IncrementRequest { key: key.to_owned(), field: field.to_owned(), by };
		let response = Self::checked(self.client.post(self.url("increment")).json(&body).send())?;
		let value: IncrementResponse = response.json().map_err(unavailable)?;
		Ok(value.value)
	}

	fn get_all(&self, key: &str) -> Result<BTreeMap<String, u64>> {
		let response = Self::checked(self.client.get(self.url("hash")).query(&[("key", key)]).send())?;
		response.json().map_err(unavailable)
	}

	fn exists(&self, key: &str) -> Result<bool> {
		let response = Self::checked(self.client.get(self.url("exists")).query(&[("key", key)]).send())?;
		response.json().map_err(unavailable)
	}

	fn keys(&self, prefix: &str) -> Result<Vec<String>> {
		let response = Self::checked(self.client.get(self.url("keys")).query(&[("prefix", prefix)]).send())?;
		response.json().map_err(unavailable)
	}
}
