// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller-supplied conversion between structured values and stored bytes.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("failed to encode value: {0}")]
	Encode(String),

	#[error("failed to decode value: {0}")]
	Decode(String),
}

/// Encode/decode pair plugged into [`crate::Keychain::set_object`] and
/// [`crate::Keychain::get_object`]. The keychain itself only stores bytes.
pub trait SecretCodec {
	type Value;

	fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;

	fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

/// JSON codec for any serde type.
#[derive(Debug)]
pub struct JsonCodec<T> {
	_marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
	pub fn new() -> Self {
		Self { _marker: PhantomData }
	}
}

impl<T> Default for JsonCodec<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for JsonCodec<T> {
	fn clone(&self) -> Self {
		Self::new()
	}
}

impl<T> SecretCodec for JsonCodec<T>
where
	T: Serialize + DeserializeOwned,
{
	type Value = T;

	fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
		serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
	}

	fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
		serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;
	use std::collections::BTreeMap;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct OAuthTokens {
		access: String,
		refresh: String,
		expires: u64,
	}

	#[test]
	fn json_codec_roundtrip() {
		let codec = JsonCodec::<OAuthTokens>::new();
		let tokens = OAuthTokens {
			access: "at_access".to_string(),
			refresh: "rt_refresh".to_string(),
			expires: 1735500000000,
		};

		let bytes = codec.encode(&tokens).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), tokens);
	}

	#[test]
	fn json_codec_rejects_garbage() {
		let codec = JsonCodec::<OAuthTokens>::new();
		let err = codec.decode(b"not json").unwrap_err();
		assert!(matches!(err, CodecError::Decode(_)));
	}

	/// Verifies that values JSON cannot represent surface as encode errors.
	#[test]
	fn json_codec_reports_encode_failure() {
		let codec = JsonCodec::<BTreeMap<Vec<u8>, u8>>::new();
		let mut value = BTreeMap::new();
		value.insert(vec![1, 2], 3);
		let err = codec.encode(&value).unwrap_err();
		assert!(matches!(err, CodecError::Encode(_)));
	}
}
