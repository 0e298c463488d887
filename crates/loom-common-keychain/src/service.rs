// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Contract of the external secure-storage service.

use crate::attrs::AttributeMap;
use crate::status::Status;
use crate::value::SecretValue;

/// Result payload of a copy-matching request.
///
/// The shape depends on the return-* attributes and the match limit of the
/// query: a single data or reference result, an attribute record, or a list
/// of results when the match limit is "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
	Data(SecretValue),
	Reference(Vec<u8>),
	Attributes(AttributeMap),
	List(Vec<Payload>),
}

/// The four operations of the platform credential vault.
///
/// Every call takes attribute mappings and answers with a [`Status`];
/// implementations do not interpret the facade's intent beyond matching
/// items. Calls block until the backend answers.
pub trait SecureStorage: Send + Sync + std::fmt::Debug {
	/// Create a new item described by `attributes`.
	fn add(&self, attributes: &AttributeMap) -> Status;

	/// Apply `changes` to every item matching `query`.
	fn update(&self, query: &AttributeMap, changes: &AttributeMap) -> Status;

	/// Search for items matching `query` and return what it asks for.
	fn copy_matching(&self, query: &AttributeMap) -> (Status, Option<Payload>);

	/// Remove every item matching `query`.
	fn delete(&self, query: &AttributeMap) -> Status;
}
