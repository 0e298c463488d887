// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Status codes returned by the secure-storage service.
//!
//! Only success and item-not-found carry meaning for the facade. The other
//! well-known codes exist so diagnostics can print a readable message.

use std::fmt;

use crate::error::KeychainError;

/// Signed status code of a service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
	pub const SUCCESS: Status = Status(0);
	pub const UNIMPLEMENTED: Status = Status(-4);
	pub const PARAM: Status = Status(-50);
	pub const ALLOCATE: Status = Status(-108);
	pub const BAD_ARGUMENTS: Status = Status(-1001);
	pub const NOT_AVAILABLE: Status = Status(-25291);
	pub const AUTH_FAILED: Status = Status(-25293);
	pub const DUPLICATE_ITEM: Status = Status(-25299);
	pub const ITEM_NOT_FOUND: Status = Status(-25300);
	pub const INTERACTION_NOT_ALLOWED: Status = Status(-25308);
	pub const DECODE: Status = Status(-26275);
	pub const INVALID_ENCODING: Status = Status(-67853);

	pub const fn new(code: i32) -> Self {
		Self(code)
	}

	pub const fn code(self) -> i32 {
		self.0
	}

	pub fn is_success(self) -> bool {
		self == Status::SUCCESS
	}

	pub fn is_not_found(self) -> bool {
		self == Status::ITEM_NOT_FOUND
	}

	/// Human-readable description for logs and error dialogs.
	pub fn message(self) -> &'static str {
		match self {
			Status::SUCCESS => "No error.",
			Status::UNIMPLEMENTED => "Function or operation not implemented.",
			Status::PARAM => "One or more parameters passed to the function were not valid.",
			Status::ALLOCATE => "Failed to allocate memory.",
			Status::BAD_ARGUMENTS => "Some of the arguments were invalid.",
			Status::NOT_AVAILABLE => "No keychain is available.",
			Status::AUTH_FAILED => "The user name or passphrase you entered is not correct.",
			Status::DUPLICATE_ITEM => "The specified item already exists in the keychain.",
			Status::ITEM_NOT_FOUND => "The specified item could not be found in the keychain.",
			Status::INTERACTION_NOT_ALLOWED => "User interaction is not allowed.",
			Status::DECODE => "Unable to decode the provided data.",
			Status::INVALID_ENCODING => "The stored data is not valid in the requested encoding.",
			_ => "An unknown keychain error occurred.",
		}
	}

	/// `Ok(())` on success, otherwise the matching [`KeychainError`].
	pub fn check(self) -> Result<(), KeychainError> {
		if self.is_success() {
			Ok(())
		} else {
			Err(KeychainError::from(self))
		}
	}
}

impl Default for Status {
	fn default() -> Self {
		Status::SUCCESS
	}
}

impl From<i32> for Status {
	fn from(code: i32) -> Self {
		Status(code)
	}
}

impl From<Status> for i32 {
	fn from(status: Status) -> Self {
		status.0
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.message(), self.0)
	}
}
