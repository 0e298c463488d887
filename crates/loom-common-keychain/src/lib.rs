// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key-value facade over a platform secure-storage service.
//!
//! The service speaks in attribute mappings (class, account, access group,
//! accessibility, payload) and answers with signed status codes. This crate
//! hides that protocol behind string keys and byte, text, boolean or codec
//! values, scoped by a key prefix, an optional access group and an optional
//! synchronizable flag.
//!
//! # Features
//!
//! - **Keychain**: the facade; thread-safe, one lock per instance
//! - **SecureStorage trait**: the service contract
//! - **MemoryKeychain**: in-process storage for tests and headless hosts
//! - **KeyringStorage** (feature `keyring`): the OS credential store
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use loom_common_keychain::{Keychain, MemoryKeychain, Status};
//!
//! let keychain = Keychain::with_prefix(Arc::new(MemoryKeychain::new()), "loom.");
//!
//! assert!(keychain.set_text("api-key", "sk-test-key"));
//! assert_eq!(keychain.get_text("api-key").as_deref(), Some("sk-test-key"));
//!
//! assert!(keychain.delete("api-key"));
//! assert_eq!(keychain.get_text("api-key"), None);
//! assert_eq!(keychain.last_status(), Status::ITEM_NOT_FOUND);
//! ```

mod access;
mod attrs;
mod codec;
mod config;
mod error;
mod keychain;
mod memory;
mod query;
mod service;
mod status;
#[cfg(feature = "keyring")]
mod store_keyring;
mod value;

pub use access::{AccessPolicy, UnknownAccessPolicy};
pub use attrs::{
	AttrValue, Attribute, AttributeMap, UnknownAttribute, CLASS_GENERIC_PASSWORD, MATCH_LIMIT_ALL,
	MATCH_LIMIT_ONE, SYNCHRONIZABLE_ANY,
};
pub use codec::{CodecError, JsonCodec, SecretCodec};
pub use config::{KeychainConfig, ENV_ACCESS_GROUP, ENV_KEY_PREFIX, ENV_SYNCHRONIZABLE};
pub use error::{ConfigError, KeychainError};
pub use keychain::Keychain;
pub use memory::MemoryKeychain;
pub use query::{QueryBuilder, RequestKind};
pub use service::{Payload, SecureStorage};
pub use status::Status;
#[cfg(feature = "keyring")]
pub use store_keyring::KeyringStorage;
pub use value::{SecretValue, REDACTED};
