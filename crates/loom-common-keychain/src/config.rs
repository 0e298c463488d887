// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keychain scope configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file
//! (`~/.config/loom/keychain.toml` unless a path is given), then
//! `LOOM_KEYCHAIN_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;

pub const ENV_KEY_PREFIX: &str = "LOOM_KEYCHAIN_PREFIX";
pub const ENV_ACCESS_GROUP: &str = "LOOM_KEYCHAIN_ACCESS_GROUP";
pub const ENV_SYNCHRONIZABLE: &str = "LOOM_KEYCHAIN_SYNCHRONIZABLE";

/// Scope applied to every keychain request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeychainConfig {
	/// Prepended to every key. Items written under different prefixes are
	/// different items.
	pub key_prefix: String,
	/// Sharing group across the host's sandboxed applications.
	pub access_group: Option<String>,
	/// Replicate items through the OS account sync service.
	pub synchronizable: bool,
}

impl KeychainConfig {
	pub fn with_prefix(key_prefix: impl Into<String>) -> Self {
		Self {
			key_prefix: key_prefix.into(),
			..Self::default()
		}
	}

	pub fn access_group(mut self, group: impl Into<String>) -> Self {
		self.access_group = Some(group.into());
		self
	}

	pub fn synchronizable(mut self, synchronizable: bool) -> Self {
		self.synchronizable = synchronizable;
		self
	}

	/// `~/.config/loom/keychain.toml` on Linux, the platform equivalent elsewhere.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("loom").join("keychain.toml"))
	}

	/// Load defaults, then `path` (or the default path), then the environment.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let path = path.map(Path::to_path_buf).or_else(Self::default_path);
		let mut config = match path {
			Some(path) => Self::from_file(&path)?,
			None => Self::default(),
		};
		config.apply_env()?;
		config.validate()?;
		Ok(config)
	}

	/// Parse a TOML file. A missing file yields the defaults.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "keychain config file not found, using defaults");
			return Ok(Self::default());
		}

		debug!(path = %path.display(), "loading keychain config file");
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source: e,
		})
	}

	/// Override fields from `LOOM_KEYCHAIN_*` environment variables.
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|var| std::env::var(var).ok())
	}

	/// Override fields from an arbitrary variable lookup.
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
			trace!(var = ENV_KEY_PREFIX, "key prefix overridden from environment");
			self.key_prefix = prefix;
		}
		if let Some(group) = lookup(ENV_ACCESS_GROUP) {
			trace!(var = ENV_ACCESS_GROUP, "access group overridden from environment");
			self.access_group = Some(group);
		}
		if let Some(raw) = lookup(ENV_SYNCHRONIZABLE) {
			self.synchronizable = parse_bool(ENV_SYNCHRONIZABLE, &raw)?;
		}
		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if let Some(group) = &self.access_group {
			if group.trim().is_empty() {
				return Err(ConfigError::invalid_value(
					"access_group",
					"access_group cannot be empty; omit it instead",
				));
			}
		}
		Ok(())
	}
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(ConfigError::invalid_value(
			key,
			format!("expected a boolean, got {other:?}"),
		)),
	}
}
