// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Accessibility policies attached to items at creation time.

use std::fmt;
use std::str::FromStr;

/// When the operating system will hand an item's data back to the caller.
///
/// The policy is fixed when the item is created. The service refuses to
/// change it through an update, which is why [`crate::Keychain::set`]
/// always deletes and re-adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessPolicy {
	/// Readable while the device is unlocked. Migrates to new devices.
	#[default]
	WhenUnlocked,
	/// Readable while the device is unlocked. Never leaves this device.
	WhenUnlockedThisDeviceOnly,
	/// Readable after the first unlock following a restart.
	AfterFirstUnlock,
	AfterFirstUnlockThisDeviceOnly,
	/// Only available while a passcode is set. Never leaves this device.
	WhenPasscodeSetThisDeviceOnly,
}

impl AccessPolicy {
	pub const ALL: [AccessPolicy; 5] = [
		AccessPolicy::WhenUnlocked,
		AccessPolicy::WhenUnlockedThisDeviceOnly,
		AccessPolicy::AfterFirstUnlock,
		AccessPolicy::AfterFirstUnlockThisDeviceOnly,
		AccessPolicy::WhenPasscodeSetThisDeviceOnly,
	];

	/// Literal value understood by the secure-storage service.
	pub fn as_str(self) -> &'static str {
		match self {
			AccessPolicy::WhenUnlocked => "ak",
			AccessPolicy::WhenUnlockedThisDeviceOnly => "aku",
			AccessPolicy::AfterFirstUnlock => "ck",
			AccessPolicy::AfterFirstUnlockThisDeviceOnly => "cku",
			AccessPolicy::WhenPasscodeSetThisDeviceOnly => "akpu",
		}
	}

	pub fn is_this_device_only(self) -> bool {
		!matches!(self, AccessPolicy::WhenUnlocked | AccessPolicy::AfterFirstUnlock)
	}
}

impl fmt::Display for AccessPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown accessibility literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown accessibility value: {0}")]
pub struct UnknownAccessPolicy(pub String);

impl FromStr for AccessPolicy {
	type Err = UnknownAccessPolicy;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		AccessPolicy::ALL
			.into_iter()
			.find(|policy| policy.as_str() == s)
			.ok_or_else(|| UnknownAccessPolicy(s.to_string()))
	}
}
