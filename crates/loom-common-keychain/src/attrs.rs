// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute vocabulary of the secure-storage service.
//!
//! Every request to the service is an [`AttributeMap`]: symbolic
//! [`Attribute`] keys mapped to [`AttrValue`]s. The literal strings below are
//! the only place service-specific constants appear; the rest of the crate
//! refers to attributes symbolically.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::SecretValue;

/// Item class of every item this crate manages.
pub const CLASS_GENERIC_PASSWORD: &str = "genp";
/// Match-limit value returning at most one item.
pub const MATCH_LIMIT_ONE: &str = "m_LimitOne";
/// Match-limit value returning every matching item.
pub const MATCH_LIMIT_ALL: &str = "m_LimitAll";
/// Synchronizable value that matches both synchronized and local items.
/// Only valid in searches, never when creating an item.
pub const SYNCHRONIZABLE_ANY: &str = "syna";

/// Symbolic attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
	Class,
	Account,
	Accessible,
	AccessGroup,
	Synchronizable,
	ValueData,
	ValuePersistentRef,
	ReturnData,
	ReturnAttributes,
	ReturnPersistentRef,
	MatchLimit,
}

impl Attribute {
	pub const ALL: [Attribute; 11] = [
		Attribute::Class,
		Attribute::Account,
		Attribute::Accessible,
		Attribute::AccessGroup,
		Attribute::Synchronizable,
		Attribute::ValueData,
		Attribute::ValuePersistentRef,
		Attribute::ReturnData,
		Attribute::ReturnAttributes,
		Attribute::ReturnPersistentRef,
		Attribute::MatchLimit,
	];

	/// Literal key understood by the secure-storage service.
	pub fn as_str(self) -> &'static str {
		match self {
			Attribute::Class => "class",
			Attribute::Account => "acct",
			Attribute::Accessible => "pdmn",
			Attribute::AccessGroup => "agrp",
			Attribute::Synchronizable => "sync",
			Attribute::ValueData => "v_Data",
			Attribute::ValuePersistentRef => "v_PersistentRef",
			Attribute::ReturnData => "r_Data",
			Attribute::ReturnAttributes => "r_Attributes",
			Attribute::ReturnPersistentRef => "r_PersistentRef",
			Attribute::MatchLimit => "m_Limit",
		}
	}
}

impl fmt::Display for Attribute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attribute key: {0}")]
pub struct UnknownAttribute(pub String);

impl FromStr for Attribute {
	type Err = UnknownAttribute;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Attribute::ALL
			.into_iter()
			.find(|attr| attr.as_str() == s)
			.ok_or_else(|| UnknownAttribute(s.to_string()))
	}
}

impl Serialize for Attribute {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}

/// Value side of an attribute mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
	Text(String),
	Bool(bool),
	Data(SecretValue),
}

impl AttrValue {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			AttrValue::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttrValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_data(&self) -> Option<&SecretValue> {
		match self {
			AttrValue::Data(d) => Some(d),
			_ => None,
		}
	}
}

impl From<&str> for AttrValue {
	fn from(s: &str) -> Self {
		AttrValue::Text(s.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(s: String) -> Self {
		AttrValue::Text(s)
	}
}

impl From<bool> for AttrValue {
	fn from(b: bool) -> Self {
		AttrValue::Bool(b)
	}
}

impl From<SecretValue> for AttrValue {
	fn from(d: SecretValue) -> Self {
		AttrValue::Data(d)
	}
}

/// An attribute mapping passed to, or returned by, the service.
///
/// Serializes with literal keys; secret data serializes as `[REDACTED]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
	entries: BTreeMap<Attribute, AttrValue>,
}

impl AttributeMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, attr: Attribute, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.entries.insert(attr, value.into())
	}

	/// Builder-style insert.
	pub fn with(mut self, attr: Attribute, value: impl Into<AttrValue>) -> Self {
		self.insert(attr, value);
		self
	}

	pub fn remove(&mut self, attr: Attribute) -> Option<AttrValue> {
		self.entries.remove(&attr)
	}

	pub fn get(&self, attr: Attribute) -> Option<&AttrValue> {
		self.entries.get(&attr)
	}

	/// Look an entry up by its literal service key, e.g. `"agrp"`.
	pub fn get_literal(&self, key: &str) -> Option<&AttrValue> {
		key.parse::<Attribute>().ok().and_then(|attr| self.get(attr))
	}

	pub fn contains(&self, attr: Attribute) -> bool {
		self.entries.contains_key(&attr)
	}

	pub fn text(&self, attr: Attribute) -> Option<&str> {
		self.get(attr).and_then(AttrValue::as_text)
	}

	pub fn flag(&self, attr: Attribute) -> Option<bool> {
		self.get(attr).and_then(AttrValue::as_bool)
	}

	pub fn data(&self, attr: Attribute) -> Option<&SecretValue> {
		self.get(attr).and_then(AttrValue::as_data)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttrValue)> {
		self.entries.iter().map(|(k, v)| (*k, v))
	}
}

impl FromIterator<(Attribute, AttrValue)> for AttributeMap {
	fn from_iter<I: IntoIterator<Item = (Attribute, AttrValue)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

impl Serialize for AttributeMap {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;
		for (attr, value) in &self.entries {
			map.serialize_entry(attr.as_str(), value)?;
		}
		map.end()
	}
}
