// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! [`SecureStorage`] backed by the OS credential store through `keyring`.
//!
//! Each item maps to one `keyring::Entry` keyed by `(service, account)`.
//! The OS stores have no notion of access groups, synchronization or
//! accessibility classes; those attributes are accepted and ignored.
//! Enumeration and class-wide deletion are not supported.

use tracing::{debug, warn};

use crate::access::AccessPolicy;
use crate::attrs::{AttrValue, Attribute, AttributeMap, MATCH_LIMIT_ALL};
use crate::service::{Payload, SecureStorage};
use crate::status::Status;
use crate::value::SecretValue;

#[derive(Debug, Clone)]
pub struct KeyringStorage {
	service: String,
}

impl KeyringStorage {
	pub fn new(service: impl Into<String>) -> Self {
		Self {
			service: service.into(),
		}
	}

	pub fn service(&self) -> &str {
		&self.service
	}

	fn entry(&self, account: &str) -> Result<keyring::Entry, Status> {
		keyring::Entry::new(&self.service, account).map_err(|e| map_error(&e))
	}

	fn reference(&self, account: &str) -> Vec<u8> {
		format!("{}:{}", self.service, account).into_bytes()
	}

	fn log_ignored(&self, attributes: &AttributeMap) {
		if let Some(group) = attributes.text(Attribute::AccessGroup) {
			debug!(group = %group, "keyring backend ignores access groups");
		}
		if let Some(sync) = attributes.get(Attribute::Synchronizable) {
			debug!(synchronizable = ?sync, "keyring backend ignores synchronizable");
		}
		if let Some(policy) = attributes
			.text(Attribute::Accessible)
			.and_then(|literal| literal.parse::<AccessPolicy>().ok())
		{
			debug!(
				policy = %policy,
				this_device_only = policy.is_this_device_only(),
				"keyring backend ignores accessibility"
			);
		}
	}
}

impl SecureStorage for KeyringStorage {
	fn add(&self, attributes: &AttributeMap) -> Status {
		self.log_ignored(attributes);
		let (Some(account), Some(data)) = (
			attributes.text(Attribute::Account),
			attributes.data(Attribute::ValueData),
		) else {
			return Status::PARAM;
		};

		let entry = match self.entry(account) {
			Ok(entry) => entry,
			Err(status) => return status,
		};
		match entry.get_secret() {
			Ok(_) => return Status::DUPLICATE_ITEM,
			Err(keyring::Error::NoEntry) => {}
			Err(e) => return map_error(&e),
		}

		match entry.set_secret(data.expose()) {
			Ok(()) => {
				debug!(service = %self.service, account = %account, "stored keyring entry");
				Status::SUCCESS
			}
			Err(e) => map_error(&e),
		}
	}

	fn update(&self, query: &AttributeMap, changes: &AttributeMap) -> Status {
		if changes.contains(Attribute::Accessible) {
			return Status::PARAM;
		}
		let Some(account) = query.text(Attribute::Account) else {
			return Status::UNIMPLEMENTED;
		};
		let Some(data) = changes.data(Attribute::ValueData) else {
			return Status::PARAM;
		};

		let entry = match self.entry(account) {
			Ok(entry) => entry,
			Err(status) => return status,
		};
		if let Err(e) = entry.get_secret() {
			return map_error(&e);
		}
		match entry.set_secret(data.expose()) {
			Ok(()) => Status::SUCCESS,
			Err(e) => map_error(&e),
		}
	}

	fn copy_matching(&self, query: &AttributeMap) -> (Status, Option<Payload>) {
		if query.text(Attribute::MatchLimit) == Some(MATCH_LIMIT_ALL) {
			debug!("keyring backend cannot enumerate entries");
			return (Status::UNIMPLEMENTED, None);
		}
		let Some(account) = query.text(Attribute::Account) else {
			return (Status::UNIMPLEMENTED, None);
		};
		self.log_ignored(query);

		let entry = match self.entry(account) {
			Ok(entry) => entry,
			Err(status) => return (status, None),
		};
		let data = match entry.get_secret() {
			Ok(bytes) => SecretValue::new(bytes),
			Err(e) => return (map_error(&e), None),
		};

		let wants_data = query.flag(Attribute::ReturnData) == Some(true);
		let wants_attributes = query.flag(Attribute::ReturnAttributes) == Some(true);
		let wants_reference = query.flag(Attribute::ReturnPersistentRef) == Some(true);

		let payload = if wants_attributes || (wants_data && wants_reference) {
			let mut map = AttributeMap::new();
			if wants_attributes {
				map.insert(Attribute::Account, account);
			}
			if wants_data {
				map.insert(Attribute::ValueData, data);
			}
			if wants_reference {
				map.insert(
					Attribute::ValuePersistentRef,
					AttrValue::Data(SecretValue::new(self.reference(account))),
				);
			}
			Some(Payload::Attributes(map))
		} else if wants_data {
			Some(Payload::Data(data))
		} else if wants_reference {
			Some(Payload::Reference(self.reference(account)))
		} else {
			None
		};
		(Status::SUCCESS, payload)
	}

	fn delete(&self, query: &AttributeMap) -> Status {
		let Some(account) = query.text(Attribute::Account) else {
			debug!("keyring backend cannot delete a whole class");
			return Status::UNIMPLEMENTED;
		};

		let entry = match self.entry(account) {
			Ok(entry) => entry,
			Err(status) => return status,
		};
		match entry.delete_credential() {
			Ok(()) => Status::SUCCESS,
			Err(e) => map_error(&e),
		}
	}
}

fn map_error(error: &keyring::Error) -> Status {
	match error {
		keyring::Error::NoEntry => Status::ITEM_NOT_FOUND,
		keyring::Error::NoStorageAccess(_) => Status::INTERACTION_NOT_ALLOWED,
		keyring::Error::PlatformFailure(_) => Status::NOT_AVAILABLE,
		keyring::Error::BadEncoding(_) => Status::DECODE,
		keyring::Error::TooLong(..) | keyring::Error::Invalid(..) => Status::PARAM,
		keyring::Error::Ambiguous(_) => Status::DUPLICATE_ITEM,
		other => {
			warn!(error = %other, "unrecognised keyring error");
			Status::NOT_AVAILABLE
		}
	}
}
