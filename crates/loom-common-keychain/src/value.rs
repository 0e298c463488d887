// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret payload bytes and their text/boolean projections.

use std::fmt;
use std::str::Utf8Error;

use serde::{Serialize, Serializer};
use zeroize::Zeroize;

/// The redaction placeholder used whenever a secret would be printed.
pub const REDACTED: &str = "[REDACTED]";

const TRUE_BYTE: u8 = 1;
const FALSE_BYTE: u8 = 0;

/// Owned secret bytes as stored in the secure-storage service.
///
/// Text and booleans are projections over the same bytes: text is UTF-8,
/// a boolean is a single byte (`1` or `0`). An empty value is a legal
/// payload and is distinct from "no item".
///
/// The buffer is zeroized on drop and never appears in Debug, Display or
/// serialized output.
#[derive(Clone, Default, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue {
	bytes: Vec<u8>,
}

impl SecretValue {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self { bytes }
	}

	/// Copy the caller's buffer into a new secret.
	pub fn from_slice(bytes: &[u8]) -> Self {
		Self::new(bytes.to_vec())
	}

	pub fn from_text(text: &str) -> Self {
		Self::from_slice(text.as_bytes())
	}

	pub fn from_bool(value: bool) -> Self {
		Self::new(vec![if value { TRUE_BYTE } else { FALSE_BYTE }])
	}

	/// Explicitly access the secret bytes.
	pub fn expose(&self) -> &[u8] {
		&self.bytes
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Decode the bytes as UTF-8 text.
	pub fn to_text(&self) -> Result<String, Utf8Error> {
		std::str::from_utf8(&self.bytes).map(str::to_owned)
	}

	/// Decode the first byte as a boolean.
	///
	/// Returns `None` for an empty value. Any first byte other than `1`
	/// decodes to `false`; trailing bytes are ignored.
	pub fn to_bool(&self) -> Option<bool> {
		self.bytes.first().map(|b| *b == TRUE_BYTE)
	}

	/// Copy the bytes out. The original buffer is still zeroized when
	/// `self` drops.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes.clone()
	}
}

impl From<Vec<u8>> for SecretValue {
	fn from(bytes: Vec<u8>) -> Self {
		Self::new(bytes)
	}
}

impl From<&[u8]> for SecretValue {
	fn from(bytes: &[u8]) -> Self {
		Self::from_slice(bytes)
	}
}

impl fmt::Debug for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretValue")
			.field("len", &self.bytes.len())
			.field("bytes", &REDACTED)
			.finish()
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for SecretValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}
