// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keychain error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::status::Status;

/// Typed view of a non-success [`Status`].
///
/// Data operations never return this directly; it is available through
/// [`crate::Keychain::last_error`] and [`Status::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeychainError {
	#[error("keychain item not found")]
	NotFound,

	#[error("invalid arguments")]
	BadArguments,

	#[error("stored value has an invalid encoding")]
	InvalidEncoding,

	#[error("secure storage error: {status}")]
	Service { status: Status },
}

impl KeychainError {
	pub fn status(&self) -> Status {
		match self {
			KeychainError::NotFound => Status::ITEM_NOT_FOUND,
			KeychainError::BadArguments => Status::BAD_ARGUMENTS,
			KeychainError::InvalidEncoding => Status::INVALID_ENCODING,
			KeychainError::Service { status } => *status,
		}
	}
}

impl From<Status> for KeychainError {
	fn from(status: Status) -> Self {
		match status {
			Status::ITEM_NOT_FOUND => KeychainError::NotFound,
			Status::BAD_ARGUMENTS => KeychainError::BadArguments,
			Status::INVALID_ENCODING => KeychainError::InvalidEncoding,
			status => KeychainError::Service { status },
		}
	}
}

/// Errors raised while loading [`crate::KeychainConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse {}: {source}", .path.display())]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
}

impl ConfigError {
	pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
		ConfigError::InvalidValue {
			key: key.into(),
			message: message.into(),
		}
	}
}
