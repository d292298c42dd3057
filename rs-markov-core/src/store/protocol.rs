use serde::{Deserialize, Serialize};

/// Body of `POST /v1/store/increment`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IncrementRequest {
	pub key: String,
	pub field: String,
	pub by: u64,
}

/// Response of `POST /v1/store/increment`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct IncrementResponse {
	pub value: u64,
}

/// Query of `GET /v1/store/hash` and `GET /v1/store/exists`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyQuery {
	pub key: String,
}

/// Query of `GET /v1/store/keys`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrefixQuery {
	pub prefix: String,
}
