// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute mappings for each facade operation.
//!
//! A [`QueryBuilder`] is a borrowed snapshot of the facade's scope (prefix,
//! access group, synchronizable). Every mapping it produces goes through the
//! two scoping helpers before it reaches the service.

use crate::access::AccessPolicy;
use crate::attrs::{
	Attribute, AttributeMap, CLASS_GENERIC_PASSWORD, MATCH_LIMIT_ALL, MATCH_LIMIT_ONE,
	SYNCHRONIZABLE_ANY,
};
use crate::value::SecretValue;

/// Whether a mapping creates an item or searches for existing ones.
///
/// The service needs an exact synchronizable flag to create an item but a
/// wildcard to find one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
	Add,
	Search,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
	key_prefix: &'a str,
	access_group: Option<&'a str>,
	synchronizable: bool,
}

impl<'a> QueryBuilder<'a> {
	pub fn new(key_prefix: &'a str, access_group: Option<&'a str>, synchronizable: bool) -> Self {
		Self {
			key_prefix,
			access_group,
			synchronizable,
		}
	}

	/// The account identifier stored for `key`: always `prefix + key`.
	pub fn account(&self, key: &str) -> String {
		format!("{}{}", self.key_prefix, key)
	}

	/// Mapping that creates the item for `key`.
	pub fn add(&self, key: &str, value: &[u8], access: AccessPolicy) -> AttributeMap {
		let map = self
			.item(key)
			.with(Attribute::ValueData, SecretValue::from_slice(value))
			.with(Attribute::Accessible, access.as_str());
		self.scoped(map, RequestKind::Add)
	}

	/// Mapping that fetches the data, or the persistent reference, of `key`.
	pub fn fetch(&self, key: &str, as_reference: bool) -> AttributeMap {
		let returned = if as_reference {
			Attribute::ReturnPersistentRef
		} else {
			Attribute::ReturnData
		};
		let map = self
			.item(key)
			.with(Attribute::MatchLimit, MATCH_LIMIT_ONE)
			.with(returned, true);
		self.scoped(map, RequestKind::Search)
	}

	pub fn delete(&self, key: &str) -> AttributeMap {
		self.scoped(self.item(key), RequestKind::Search)
	}

	/// Class-wide mapping. The prefix is not applied, so every namespace in
	/// the configured scope matches.
	pub fn clear(&self) -> AttributeMap {
		let map = AttributeMap::new().with(Attribute::Class, CLASS_GENERIC_PASSWORD);
		self.scoped(map, RequestKind::Search)
	}

	/// Mapping that enumerates every item in scope with its attributes.
	pub fn all_items(&self) -> AttributeMap {
		let map = AttributeMap::new()
			.with(Attribute::Class, CLASS_GENERIC_PASSWORD)
			.with(Attribute::ReturnData, true)
			.with(Attribute::ReturnAttributes, true)
			.with(Attribute::ReturnPersistentRef, true)
			.with(Attribute::MatchLimit, MATCH_LIMIT_ALL);
		self.scoped(map, RequestKind::Search)
	}

	/// Inject the access group, when one is configured.
	pub fn add_access_group_when_present(&self, mut map: AttributeMap) -> AttributeMap {
		if let Some(group) = self.access_group {
			map.insert(Attribute::AccessGroup, group);
		}
		map
	}

	/// Inject the synchronizable attribute, when synchronization is enabled.
	pub fn add_synchronizable_if_required(
		&self,
		mut map: AttributeMap,
		kind: RequestKind,
	) -> AttributeMap {
		if !self.synchronizable {
			return map;
		}
		match kind {
			RequestKind::Add => map.insert(Attribute::Synchronizable, true),
			RequestKind::Search => map.insert(Attribute::Synchronizable, SYNCHRONIZABLE_ANY),
		};
		map
	}

	fn item(&self, key: &str) -> AttributeMap {
		AttributeMap::new()
			.with(Attribute::Class, CLASS_GENERIC_PASSWORD)
			.with(Attribute::Account, self.account(key))
	}

	fn scoped(&self, map: AttributeMap, kind: RequestKind) -> AttributeMap {
		let map = self.add_access_group_when_present(map);
		self.add_synchronizable_if_required(map, kind)
	}
}
