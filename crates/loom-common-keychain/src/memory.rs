// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process secure storage.
//!
//! Reproduces the matching rules of the platform service closely enough that
//! the facade behaves the same against it: duplicate detection on add,
//! access-group and synchronizable matching on search, and refusal to change
//! accessibility through an update.

use parking_lot::Mutex;
use tracing::trace;

use crate::access::AccessPolicy;
use crate::attrs::{
	AttrValue, Attribute, AttributeMap, MATCH_LIMIT_ALL, MATCH_LIMIT_ONE, SYNCHRONIZABLE_ANY,
};
use crate::service::{Payload, SecureStorage};
use crate::status::Status;
use crate::value::SecretValue;

#[derive(Debug, Clone)]
struct StoredItem {
	class: String,
	account: Option<String>,
	access_group: Option<String>,
	accessible: AccessPolicy,
	synchronizable: bool,
	data: SecretValue,
	reference: Vec<u8>,
}

impl StoredItem {
	fn same_identity(&self, other: &StoredItem) -> bool {
		self.class == other.class
			&& self.account == other.account
			&& self.access_group == other.access_group
			&& self.synchronizable == other.synchronizable
	}

	fn attributes(&self) -> AttributeMap {
		let mut map = AttributeMap::new()
			.with(Attribute::Class, self.class.as_str())
			.with(Attribute::Accessible, self.accessible.as_str())
			.with(Attribute::Synchronizable, self.synchronizable);
		if let Some(account) = &self.account {
			map.insert(Attribute::Account, account.as_str());
		}
		if let Some(group) = &self.access_group {
			map.insert(Attribute::AccessGroup, group.as_str());
		}
		map
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncFilter {
	Exactly(bool),
	Any,
}

/// A parsed search query.
#[derive(Debug)]
struct Filter<'a> {
	class: &'a str,
	account: Option<&'a str>,
	access_group: Option<&'a str>,
	synchronizable: SyncFilter,
}

impl<'a> Filter<'a> {
	fn parse(query: &'a AttributeMap) -> Result<Self, Status> {
		let class = query.text(Attribute::Class).ok_or(Status::PARAM)?;
		let synchronizable = match query.get(Attribute::Synchronizable) {
			None => SyncFilter::Exactly(false),
			Some(AttrValue::Bool(b)) => SyncFilter::Exactly(*b),
			Some(AttrValue::Text(t)) if t == SYNCHRONIZABLE_ANY => SyncFilter::Any,
			Some(_) => return Err(Status::PARAM),
		};
		Ok(Self {
			class,
			account: query.text(Attribute::Account),
			access_group: query.text(Attribute::AccessGroup),
			synchronizable,
		})
	}

	fn matches(&self, item: &StoredItem) -> bool {
		if item.class != self.class {
			return false;
		}
		if let Some(account) = self.account {
			if item.account.as_deref() != Some(account) {
				return false;
			}
		}
		if let Some(group) = self.access_group {
			if item.access_group.as_deref() != Some(group) {
				return false;
			}
		}
		match self.synchronizable {
			SyncFilter::Any => true,
			SyncFilter::Exactly(sync) => item.synchronizable == sync,
		}
	}
}

#[derive(Debug, Default)]
struct MemoryState {
	items: Vec<StoredItem>,
	next_reference: u64,
	injected_failure: Option<Status>,
}

impl MemoryState {
	fn take_failure(&mut self) -> Option<Status> {
		self.injected_failure.take()
	}
}

/// Secure storage kept in process memory.
///
/// Safe to share between several [`crate::Keychain`] instances through an
/// `Arc`; each call takes the store's own lock.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
	state: Mutex<MemoryState>,
}

impl MemoryKeychain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored items across every scope.
	pub fn len(&self) -> usize {
		self.state.lock().items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().items.is_empty()
	}

	/// Attribute records of every stored item, without their data.
	pub fn items(&self) -> Vec<AttributeMap> {
		self.state.lock().items.iter().map(StoredItem::attributes).collect()
	}

	/// Make the next service call fail with `status` without touching the store.
	pub fn fail_next(&self, status: Status) {
		self.state.lock().injected_failure = Some(status);
	}
}

impl SecureStorage for MemoryKeychain {
	fn add(&self, attributes: &AttributeMap) -> Status {
		let mut state = self.state.lock();
		if let Some(status) = state.take_failure() {
			return status;
		}

		let Some(class) = attributes.text(Attribute::Class) else {
			return Status::PARAM;
		};
		let synchronizable = match attributes.get(Attribute::Synchronizable) {
			None => false,
			Some(AttrValue::Bool(b)) => *b,
			// "Match any" is a search wildcard and cannot describe a new item.
			Some(_) => return Status::PARAM,
		};
		let accessible = match attributes.text(Attribute::Accessible) {
			None => AccessPolicy::default(),
			Some(literal) => match literal.parse() {
				Ok(policy) => policy,
				Err(_) => return Status::PARAM,
			},
		};

		let reference = format!("genp:{}", state.next_reference).into_bytes();
		let item = StoredItem {
			class: class.to_string(),
			account: attributes.text(Attribute::Account).map(str::to_string),
			access_group: attributes.text(Attribute::AccessGroup).map(str::to_string),
			accessible,
			synchronizable,
			data: attributes
				.data(Attribute::ValueData)
				.cloned()
				.unwrap_or_default(),
			reference,
		};

		if state.items.iter().any(|existing| existing.same_identity(&item)) {
			return Status::DUPLICATE_ITEM;
		}

		trace!(account = ?item.account, synchronizable, "memory keychain add");
		state.next_reference += 1;
		state.items.push(item);
		Status::SUCCESS
	}

	fn update(&self, query: &AttributeMap, changes: &AttributeMap) -> Status {
		let mut state = self.state.lock();
		if let Some(status) = state.take_failure() {
			return status;
		}

		if changes.contains(Attribute::Accessible) || changes.contains(Attribute::Class) {
			return Status::PARAM;
		}
		let filter = match Filter::parse(query) {
			Ok(filter) => filter,
			Err(status) => return status,
		};

		let mut updated = 0usize;
		for item in state.items.iter_mut().filter(|item| filter.matches(item)) {
			if let Some(data) = changes.data(Attribute::ValueData) {
				item.data = data.clone();
			}
			if let Some(account) = changes.text(Attribute::Account) {
				item.account = Some(account.to_string());
			}
			if let Some(group) = changes.text(Attribute::AccessGroup) {
				item.access_group = Some(group.to_string());
			}
			if let Some(sync) = changes.flag(Attribute::Synchronizable) {
				item.synchronizable = sync;
			}
			updated += 1;
		}

		trace!(count = updated, "memory keychain update");
		if updated == 0 {
			Status::ITEM_NOT_FOUND
		} else {
			Status::SUCCESS
		}
	}

	fn copy_matching(&self, query: &AttributeMap) -> (Status, Option<Payload>) {
		let mut state = self.state.lock();
		if let Some(status) = state.take_failure() {
			return (status, None);
		}

		let filter = match Filter::parse(query) {
			Ok(filter) => filter,
			Err(status) => return (status, None),
		};
		let match_all = match query.text(Attribute::MatchLimit) {
			None | Some(MATCH_LIMIT_ONE) => false,
			Some(MATCH_LIMIT_ALL) => true,
			Some(_) => return (Status::PARAM, None),
		};
		let wants_data = query.flag(Attribute::ReturnData) == Some(true);
		let wants_attributes = query.flag(Attribute::ReturnAttributes) == Some(true);
		let wants_reference = query.flag(Attribute::ReturnPersistentRef) == Some(true);

		let matched: Vec<&StoredItem> = state
			.items
			.iter()
			.filter(|item| filter.matches(item))
			.collect();
		trace!(count = matched.len(), match_all, "memory keychain copy_matching");
		if matched.is_empty() {
			return (Status::ITEM_NOT_FOUND, None);
		}

		let build = |item: &StoredItem| -> Option<Payload> {
			if wants_attributes || (wants_data && wants_reference) {
				let mut map = if wants_attributes {
					item.attributes()
				} else {
					AttributeMap::new()
				};
				if wants_data {
					map.insert(Attribute::ValueData, item.data.clone());
				}
				if wants_reference {
					map.insert(
						Attribute::ValuePersistentRef,
						SecretValue::from_slice(&item.reference),
					);
				}
				Some(Payload::Attributes(map))
			} else if wants_data {
				Some(Payload::Data(item.data.clone()))
			} else if wants_reference {
				Some(Payload::Reference(item.reference.clone()))
			} else {
				None
			}
		};

		let payload = if match_all {
			let results: Vec<Payload> = matched.into_iter().filter_map(build).collect();
			if results.is_empty() {
				None
			} else {
				Some(Payload::List(results))
			}
		} else {
			build(matched[0])
		};
		(Status::SUCCESS, payload)
	}

	fn delete(&self, query: &AttributeMap) -> Status {
		let mut state = self.state.lock();
		if let Some(status) = state.take_failure() {
			return status;
		}

		let filter = match Filter::parse(query) {
			Ok(filter) => filter,
			Err(status) => return status,
		};
		let before = state.items.len();
		state.items.retain(|item| !filter.matches(item));
		let removed = before - state.items.len();

		trace!(count = removed, "memory keychain delete");
		if removed == 0 {
			Status::ITEM_NOT_FOUND
		} else {
			Status::SUCCESS
		}
	}
}
