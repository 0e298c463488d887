// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The keychain facade.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::access::AccessPolicy;
use crate::attrs::{Attribute, AttributeMap};
use crate::codec::SecretCodec;
use crate::config::KeychainConfig;
use crate::error::KeychainError;
use crate::query::QueryBuilder;
use crate::service::{Payload, SecureStorage};
use crate::status::Status;
use crate::value::SecretValue;

#[derive(Debug, Default)]
struct KeychainState {
	access_group: Option<String>,
	synchronizable: bool,
	last_query: Option<AttributeMap>,
	last_status: Status,
}

impl KeychainState {
	fn record(&mut self, query: AttributeMap, status: Status) {
		self.last_query = Some(query);
		self.last_status = status;
	}
}

/// Save, fetch, enumerate and delete secrets in a [`SecureStorage`].
///
/// Every operation runs under one lock held for its whole duration, so
/// concurrent callers on the same `Keychain` never interleave requests.
/// Separate `Keychain` instances over the same storage are not excluded
/// against each other.
///
/// Data operations report failure as `false` or `None`. The status of the
/// most recent request is available from [`Keychain::last_status`].
#[derive(Debug)]
pub struct Keychain {
	storage: Arc<dyn SecureStorage>,
	key_prefix: String,
	state: Mutex<KeychainState>,
}

impl Keychain {
	pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
		Self::with_config(storage, KeychainConfig::default())
	}

	pub fn with_prefix(storage: Arc<dyn SecureStorage>, key_prefix: impl Into<String>) -> Self {
		Self::with_config(storage, KeychainConfig::with_prefix(key_prefix))
	}

	pub fn with_config(storage: Arc<dyn SecureStorage>, config: KeychainConfig) -> Self {
		Self {
			storage,
			key_prefix: config.key_prefix,
			state: Mutex::new(KeychainState {
				access_group: normalize_access_group(config.access_group),
				synchronizable: config.synchronizable,
				..KeychainState::default()
			}),
		}
	}

	// ---------------------------------------------------------------------
	// Scope
	// ---------------------------------------------------------------------

	/// Prefix applied to every key. Fixed for the lifetime of the instance.
	pub fn key_prefix(&self) -> &str {
		&self.key_prefix
	}

	pub fn access_group(&self) -> Option<String> {
		self.state.lock().access_group.clone()
	}

	/// Change the access group used by subsequent operations.
	///
	/// Waits for any in-flight operation on this instance to finish. An empty
	/// or blank group is treated as no group.
	pub fn set_access_group(&self, access_group: Option<String>) {
		self.state.lock().access_group = normalize_access_group(access_group);
	}

	pub fn synchronizable(&self) -> bool {
		self.state.lock().synchronizable
	}

	/// Enable or disable cross-device synchronization for subsequent
	/// operations. Waits for any in-flight operation to finish.
	pub fn set_synchronizable(&self, synchronizable: bool) {
		self.state.lock().synchronizable = synchronizable;
	}

	/// Snapshot of the current scope.
	pub fn config(&self) -> KeychainConfig {
		let state = self.state.lock();
		KeychainConfig {
			key_prefix: self.key_prefix.clone(),
			access_group: state.access_group.clone(),
			synchronizable: state.synchronizable,
		}
	}

	// ---------------------------------------------------------------------
	// Diagnostics
	// ---------------------------------------------------------------------

	/// Attribute mapping of the most recent request.
	pub fn last_query(&self) -> Option<AttributeMap> {
		self.state.lock().last_query.clone()
	}

	/// Status of the most recent request.
	pub fn last_status(&self) -> Status {
		self.state.lock().last_status
	}

	/// The most recent status as an error, or `None` if it succeeded.
	pub fn last_error(&self) -> Option<KeychainError> {
		self.last_status().check().err()
	}

	// ---------------------------------------------------------------------
	// Writes
	// ---------------------------------------------------------------------

	/// Store `value` under `key` with the default access policy.
	pub fn set(&self, key: &str, value: &[u8]) -> bool {
		self.set_with_access(key, value, AccessPolicy::default())
	}

	/// Store `value` under `key`.
	///
	/// Any existing item is deleted first and a fresh one is added. An
	/// in-place update cannot change an item's access policy, so re-creating
	/// is the only way a new `access` takes effect.
	pub fn set_with_access(&self, key: &str, value: &[u8], access: AccessPolicy) -> bool {
		let mut state = self.state.lock();
		self.set_locked(&mut state, key, value, access)
	}

	pub fn set_text(&self, key: &str, text: &str) -> bool {
		self.set_text_with_access(key, text, AccessPolicy::default())
	}

	/// Store `text` as UTF-8 bytes.
	pub fn set_text_with_access(&self, key: &str, text: &str, access: AccessPolicy) -> bool {
		self.set_with_access(key, text.as_bytes(), access)
	}

	pub fn set_bool(&self, key: &str, value: bool) -> bool {
		self.set_bool_with_access(key, value, AccessPolicy::default())
	}

	/// Store a boolean as a single byte, `1` or `0`.
	pub fn set_bool_with_access(&self, key: &str, value: bool, access: AccessPolicy) -> bool {
		let encoded = SecretValue::from_bool(value);
		self.set_with_access(key, encoded.expose(), access)
	}

	pub fn set_object<C: SecretCodec>(&self, key: &str, value: &C::Value, codec: &C) -> bool {
		self.set_object_with_access(key, value, codec, AccessPolicy::default())
	}

	/// Encode `value` with `codec` and store the bytes.
	///
	/// An encoding failure records [`Status::BAD_ARGUMENTS`] against the
	/// item's class and account mapping and skips the store entirely.
	pub fn set_object_with_access<C: SecretCodec>(
		&self,
		key: &str,
		value: &C::Value,
		codec: &C,
		access: AccessPolicy,
	) -> bool {
		let mut state = self.state.lock();
		match codec.encode(value) {
			Ok(bytes) => {
				let encoded = SecretValue::new(bytes);
				self.set_locked(&mut state, key, encoded.expose(), access)
			}
			Err(e) => {
				warn!(key = %key, error = %e, "failed to encode keychain object");
				let query = Self::builder(&self.key_prefix, &state).delete(key);
				state.record(query, Status::BAD_ARGUMENTS);
				false
			}
		}
	}

	// ---------------------------------------------------------------------
	// Reads
	// ---------------------------------------------------------------------

	/// Fetch the bytes stored under `key`.
	///
	/// Returns `None` for any non-success status, including a missing item.
	pub fn get(&self, key: &str) -> Option<Vec<u8>> {
		let mut state = self.state.lock();
		self.get_locked(&mut state, key, false)
	}

	/// Fetch the persistent reference of the item stored under `key`.
	pub fn get_persistent_ref(&self, key: &str) -> Option<Vec<u8>> {
		let mut state = self.state.lock();
		self.get_locked(&mut state, key, true)
	}

	/// Fetch and decode UTF-8 text.
	///
	/// Bytes that are not valid UTF-8 record [`Status::INVALID_ENCODING`],
	/// which keeps them distinguishable from a missing item.
	pub fn get_text(&self, key: &str) -> Option<String> {
		let mut state = self.state.lock();
		let value = SecretValue::new(self.get_locked(&mut state, key, false)?);
		match value.to_text() {
			Ok(text) => Some(text),
			Err(e) => {
				debug!(key = %key, error = %e, "keychain value is not valid UTF-8");
				state.last_status = Status::INVALID_ENCODING;
				None
			}
		}
	}

	/// Fetch a boolean. Empty data reads as `None`; otherwise only the
	/// first byte is inspected and anything but `1` is `false`.
	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.get(key).and_then(|bytes| SecretValue::new(bytes).to_bool())
	}

	/// Fetch bytes and decode them with `codec`.
	///
	/// A decoding failure records [`Status::INVALID_ENCODING`].
	pub fn get_object<C: SecretCodec>(&self, key: &str, codec: &C) -> Option<C::Value> {
		let mut state = self.state.lock();
		let value = SecretValue::new(self.get_locked(&mut state, key, false)?);
		match codec.decode(value.expose()) {
			Ok(decoded) => Some(decoded),
			Err(e) => {
				warn!(key = %key, error = %e, "failed to decode keychain object");
				state.last_status = Status::INVALID_ENCODING;
				None
			}
		}
	}

	// ---------------------------------------------------------------------
	// Deletion
	// ---------------------------------------------------------------------

	/// Delete the item stored under `key`. A missing item reports `false`.
	pub fn delete(&self, key: &str) -> bool {
		let mut state = self.state.lock();
		self.delete_locked(&mut state, key)
	}

	/// Delete every item in the configured access-group/synchronizable scope.
	///
	/// The key prefix is not applied: items written by other instances with
	/// other prefixes in the same scope are removed too.
	pub fn clear(&self) -> bool {
		let mut state = self.state.lock();
		let query = Self::builder(&self.key_prefix, &state).clear();
		let status = self.storage.delete(&query);
		debug!(status = status.code(), "cleared keychain scope");
		state.record(query, status);
		status.is_success()
	}

	// ---------------------------------------------------------------------
	// Enumeration
	// ---------------------------------------------------------------------

	/// Account identifiers of every item in scope.
	///
	/// Identifiers are returned exactly as stored, prefix included. Order is
	/// whatever the service returns. See [`Keychain::keys_in_namespace`] for
	/// the prefix-aware variant.
	pub fn all_keys(&self) -> HashSet<String> {
		self.all_items()
			.into_iter()
			.filter_map(|record| record.text(Attribute::Account).map(str::to_string))
			.collect()
	}

	/// Attribute records of every item in scope, secret data removed.
	///
	/// Records carry whatever the service reports (account, access group,
	/// accessibility, synchronizable, persistent reference). Accounts keep
	/// their prefix. An empty vector means nothing matched or the request
	/// failed; [`Keychain::last_status`] tells which.
	pub fn all_items(&self) -> Vec<AttributeMap> {
		let mut state = self.state.lock();
		let query = Self::builder(&self.key_prefix, &state).all_items();
		let (status, payload) = self.storage.copy_matching(&query);
		state.record(query, status);

		if !status.is_success() {
			debug!(status = status.code(), "keychain enumeration returned nothing");
			return Vec::new();
		}
		let records = payload.map(collect_records).unwrap_or_default();
		debug!(count = records.len(), "enumerated keychain items");
		records
	}

	/// Keys in scope that carry this instance's prefix, with the prefix
	/// removed. Accounts written under other prefixes are skipped.
	pub fn keys_in_namespace(&self) -> HashSet<String> {
		self.all_keys()
			.into_iter()
			.filter_map(|account| {
				account
					.strip_prefix(self.key_prefix.as_str())
					.map(str::to_string)
			})
			.collect()
	}

	// ---------------------------------------------------------------------
	// Lock-held helpers
	// ---------------------------------------------------------------------

	fn builder<'a>(key_prefix: &'a str, state: &'a KeychainState) -> QueryBuilder<'a> {
		QueryBuilder::new(key_prefix, state.access_group.as_deref(), state.synchronizable)
	}

	fn set_locked(
		&self,
		state: &mut KeychainState,
		key: &str,
		value: &[u8],
		access: AccessPolicy,
	) -> bool {
		self.delete_locked(state, key);

		let query = Self::builder(&self.key_prefix, state).add(key, value, access);
		let status = self.storage.add(&query);
		if status.is_success() {
			debug!(key = %key, access = %access, "stored keychain item");
		} else {
			warn!(key = %key, status = status.code(), "failed to store keychain item");
		}
		state.record(query, status);
		status.is_success()
	}

	fn get_locked(
		&self,
		state: &mut KeychainState,
		key: &str,
		as_reference: bool,
	) -> Option<Vec<u8>> {
		let query = Self::builder(&self.key_prefix, state).fetch(key, as_reference);
		let (status, payload) = self.storage.copy_matching(&query);
		state.record(query, status);

		if !status.is_success() {
			debug!(key = %key, status = status.code(), "keychain item not returned");
			return None;
		}
		payload.and_then(|payload| payload_bytes(payload, as_reference))
	}

	fn delete_locked(&self, state: &mut KeychainState, key: &str) -> bool {
		let query = Self::builder(&self.key_prefix, state).delete(key);
		let status = self.storage.delete(&query);
		debug!(key = %key, status = status.code(), "deleted keychain item");
		state.record(query, status);
		status.is_success()
	}
}

fn payload_bytes(payload: Payload, as_reference: bool) -> Option<Vec<u8>> {
	match payload {
		Payload::Data(value) => Some(value.into_bytes()),
		Payload::Reference(reference) => Some(reference),
		Payload::Attributes(map) => {
			let attr = if as_reference {
				Attribute::ValuePersistentRef
			} else {
				Attribute::ValueData
			};
			map.data(attr).map(|value| value.expose().to_vec())
		}
		Payload::List(items) => items
			.into_iter()
			.next()
			.and_then(|first| payload_bytes(first, as_reference)),
	}
}

fn normalize_access_group(access_group: Option<String>) -> Option<String> {
	match access_group {
		Some(group) if group.trim().is_empty() => {
			debug!("ignoring blank access group");
			None
		}
		other => other,
	}
}

fn collect_records(payload: Payload) -> Vec<AttributeMap> {
	let records = match payload {
		Payload::List(items) => items,
		single => vec![single],
	};
	records
		.into_iter()
		.filter_map(|record| match record {
			Payload::Attributes(mut map) => {
				map.remove(Attribute::ValueData);
				Some(map)
			}
			_ => None,
		})
		.collect()
}
