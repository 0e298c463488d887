// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::sync::Arc;

use loom_common_keychain::{
	AccessPolicy, AttrValue, Attribute, JsonCodec, Keychain, KeychainConfig, MemoryKeychain, Status,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

const GROUP: &str = "123.my.test.group";

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter("loom_common_keychain=debug")
		.with_test_writer()
		.try_init();
}

fn keychain_with_prefix(prefix: &str) -> (Arc<MemoryKeychain>, Keychain) {
	let storage = Arc::new(MemoryKeychain::new());
	let keychain = Keychain::with_prefix(storage.clone(), prefix);
	(storage, keychain)
}

fn set(keys: &[&str]) -> HashSet<String> {
	keys.iter().map(|k| k.to_string()).collect()
}

#[test]
fn test_roundtrip_bytes() {
	init_tracing();
	let (_, keychain) = keychain_with_prefix("");
	assert!(keychain.set("blob", &[0, 1, 2, 255]));
	assert_eq!(keychain.get("blob"), Some(vec![0, 1, 2, 255]));
}

#[test]
fn test_empty_value_is_stored() {
	let (_, keychain) = keychain_with_prefix("");
	assert!(keychain.set("empty", b""));
	assert_eq!(keychain.get("empty"), Some(Vec::new()));
	assert_eq!(keychain.get_text("empty").as_deref(), Some(""));
	assert_eq!(keychain.get_bool("empty"), None);
}

#[test]
fn test_overwrite_replaces_value() {
	let (storage, keychain) = keychain_with_prefix("");
	assert!(keychain.set_text("key 1", "hello :)"));
	assert!(keychain.set_text("key 1", "hello again"));
	assert_eq!(keychain.get_text("key 1").as_deref(), Some("hello again"));
	assert_eq!(storage.len(), 1);
}

#[test]
fn test_delete_then_get_is_absent() {
	let (_, keychain) = keychain_with_prefix("");
	keychain.set_text("key 1", "hello :)");
	assert!(keychain.delete("key 1"));
	assert_eq!(keychain.get_text("key 1"), None);
	assert_eq!(keychain.last_status(), Status::ITEM_NOT_FOUND);
}

#[test]
fn test_delete_missing_is_false() {
	let (_, keychain) = keychain_with_prefix("");
	assert!(!keychain.delete("never-stored"));
	assert_eq!(keychain.last_status(), Status::ITEM_NOT_FOUND);
}

#[test]
fn test_bool_roundtrip() {
	let (_, keychain) = keychain_with_prefix("");
	assert!(keychain.set_bool("yes", true));
	assert!(keychain.set_bool("no", false));
	assert_eq!(keychain.get_bool("yes"), Some(true));
	assert_eq!(keychain.get_bool("no"), Some(false));
	assert_eq!(keychain.get_bool("missing"), None);
}

#[test]
fn test_bool_other_first_byte_is_false() {
	let (_, keychain) = keychain_with_prefix("");
	keychain.set("seven", &[7]);
	keychain.set("one-then-junk", &[1, 9, 9]);
	assert_eq!(keychain.get_bool("seven"), Some(false));
	assert_eq!(keychain.get_bool("one-then-junk"), Some(true));
}

#[test]
fn test_prefix_separates_namespaces() {
	let storage = Arc::new(MemoryKeychain::new());
	let one = Keychain::with_prefix(storage.clone(), "p1.");
	let two = Keychain::with_prefix(storage.clone(), "p2.");

	one.set_text("token", "first");
	two.set_text("token", "second");

	assert_eq!(one.get_text("token").as_deref(), Some("first"));
	assert_eq!(two.get_text("token").as_deref(), Some("second"));
	assert_eq!(storage.len(), 2);
}

/// Verifies that clearing from one namespace removes every namespace in the
/// same scope.
#[test]
fn test_clear_ignores_prefix() {
	let storage = Arc::new(MemoryKeychain::new());
	let one = Keychain::with_prefix(storage.clone(), "p1");
	let two = Keychain::with_prefix(storage.clone(), "p2");

	one.set_text("key 1", "hello :)");
	assert!(two.clear());

	assert_eq!(one.get_text("key 1"), None);
	assert!(storage.is_empty());
}

#[test]
fn test_clear_respects_access_group() {
	let storage = Arc::new(MemoryKeychain::new());
	let grouped = Keychain::with_config(
		storage.clone(),
		KeychainConfig::default().access_group(GROUP),
	);
	let other = Keychain::with_config(
		storage.clone(),
		KeychainConfig::default().access_group("456.other.group"),
	);

	grouped.set_text("a", "1");
	other.set_text("b", "2");
	assert!(grouped.clear());

	assert_eq!(grouped.get_text("a"), None);
	assert_eq!(other.get_text("b").as_deref(), Some("2"));
}

#[test]
fn test_clear_on_empty_store_is_false() {
	let (_, keychain) = keychain_with_prefix("");
	assert!(!keychain.clear());
	assert_eq!(keychain.last_status(), Status::ITEM_NOT_FOUND);
}

mod access_group_diagnostics {
	use super::*;

	fn recorded_group(keychain: &Keychain) -> Option<String> {
		keychain.last_query().and_then(|query| {
			query
				.get_literal("agrp")
				.and_then(AttrValue::as_text)
				.map(str::to_string)
		})
	}

	fn grouped() -> Keychain {
		let keychain = Keychain::new(Arc::new(MemoryKeychain::new()));
		keychain.set_access_group(Some(GROUP.to_string()));
		keychain
	}

	#[test]
	fn test_set_uses_access_group() {
		let keychain = grouped();
		keychain.set_text("key1", "hello");
		assert_eq!(recorded_group(&keychain).as_deref(), Some(GROUP));
	}

	#[test]
	fn test_get_uses_access_group() {
		let keychain = grouped();
		let _ = keychain.get_text("key1");
		assert_eq!(recorded_group(&keychain).as_deref(), Some(GROUP));
	}

	#[test]
	fn test_delete_uses_access_group() {
		let keychain = grouped();
		keychain.delete("key1");
		assert_eq!(recorded_group(&keychain).as_deref(), Some(GROUP));
	}

	#[test]
	fn test_clear_uses_access_group() {
		let keychain = grouped();
		keychain.clear();
		assert_eq!(recorded_group(&keychain).as_deref(), Some(GROUP));
	}
}

mod enumeration {
	use super::*;

	#[test]
	fn test_all_keys_without_prefix() {
		let (_, keychain) = keychain_with_prefix("");
		keychain.set_text("a", "1");
		keychain.set_text("b", "2");
		assert_eq!(keychain.all_keys(), set(&["a", "b"]));
	}

	/// Verifies that enumeration reports accounts as stored, prefix included.
	#[test]
	fn test_all_keys_keeps_prefix() {
		let (_, keychain) = keychain_with_prefix("ns.");
		keychain.set_text("a", "1");
		keychain.set_text("b", "2");
		assert_eq!(keychain.all_keys(), set(&["ns.a", "ns.b"]));
	}

	#[test]
	fn test_all_keys_spans_namespaces() {
		let storage = Arc::new(MemoryKeychain::new());
		let one = Keychain::with_prefix(storage.clone(), "one.");
		let two = Keychain::with_prefix(storage.clone(), "two.");
		one.set_text("a", "1");
		two.set_text("b", "2");

		assert_eq!(one.all_keys(), set(&["one.a", "two.b"]));
		assert_eq!(one.keys_in_namespace(), set(&["a"]));
		assert_eq!(two.keys_in_namespace(), set(&["b"]));
	}

	#[test]
	fn test_all_keys_on_empty_store() {
		let (_, keychain) = keychain_with_prefix("");
		assert!(keychain.all_keys().is_empty());
		assert_eq!(keychain.last_status(), Status::ITEM_NOT_FOUND);
	}

	#[test]
	fn test_all_keys_includes_synchronized_items_when_enabled() {
		let (_, keychain) = keychain_with_prefix("");
		keychain.set_text("local", "1");
		keychain.set_synchronizable(true);
		keychain.set_text("synced", "2");

		assert_eq!(keychain.all_keys(), set(&["local", "synced"]));
		keychain.set_synchronizable(false);
		assert_eq!(keychain.all_keys(), set(&["local"]));
	}

	/// Verifies that full records come back across namespaces with the
	/// secret data stripped.
	#[test]
	fn test_all_items_returns_attribute_records() {
		let storage = Arc::new(MemoryKeychain::new());
		let one = Keychain::with_prefix(storage.clone(), "one.");
		let two = Keychain::with_prefix(storage.clone(), "two.");
		one.set_text("a", "secret-a");
		two.set_text_with_access("b", "secret-b", AccessPolicy::WhenUnlockedThisDeviceOnly);

		let mut records = one.all_items();
		records.sort_by_key(|r| r.text(Attribute::Account).map(str::to_string));
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].text(Attribute::Account), Some("one.a"));
		assert_eq!(records[1].text(Attribute::Account), Some("two.b"));
		assert_eq!(records[1].text(Attribute::Accessible), Some("aku"));
		assert!(records.iter().all(|r| !r.contains(Attribute::ValueData)));
	}
}

#[test]
fn test_concurrent_sets_on_distinct_keys() {
	let (storage, keychain) = keychain_with_prefix("threads.");
	let keychain = Arc::new(keychain);

	std::thread::scope(|scope| {
		for thread in 0..8 {
			let keychain = Arc::clone(&keychain);
			scope.spawn(move || {
				for i in 0..25 {
					let key = format!("t{thread}-k{i}");
					assert!(keychain.set_text(&key, &key));
				}
			});
		}
	});

	assert_eq!(storage.len(), 200);
	for thread in 0..8 {
		for i in 0..25 {
			let key = format!("t{thread}-k{i}");
			assert_eq!(keychain.get_text(&key).as_deref(), Some(key.as_str()));
		}
	}
}

#[test]
fn test_concurrent_overwrites_of_one_key() {
	let (storage, keychain) = keychain_with_prefix("");
	let keychain = Arc::new(keychain);

	std::thread::scope(|scope| {
		for thread in 0..4 {
			let keychain = Arc::clone(&keychain);
			scope.spawn(move || {
				for i in 0..50 {
					assert!(keychain.set_text("shared", &format!("{thread}:{i}")));
				}
			});
		}
	});

	assert_eq!(storage.len(), 1);
	assert!(keychain.get_text("shared").is_some());
}

/// Verifies that a new access policy replaces the stored one.
#[test]
fn test_access_policy_change_recreates_item() {
	let (storage, keychain) = keychain_with_prefix("");
	keychain.set_text_with_access("k", "v", AccessPolicy::WhenUnlocked);
	keychain.set_text_with_access("k", "v", AccessPolicy::WhenPasscodeSetThisDeviceOnly);

	let items = storage.items();
	assert_eq!(items.len(), 1);
	assert_eq!(items[0].text(Attribute::Accessible), Some("akpu"));
}

#[test]
fn test_synchronizable_items_are_found() {
	let storage = Arc::new(MemoryKeychain::new());
	let keychain = Keychain::with_config(
		storage.clone(),
		KeychainConfig::default().synchronizable(true),
	);
	assert!(keychain.set_text("k", "v"));
	assert_eq!(keychain.get_text("k").as_deref(), Some("v"));
	assert!(keychain.delete("k"));
	assert!(storage.is_empty());
}

#[test]
fn test_invalid_utf8_is_distinguished_from_missing() {
	let (_, keychain) = keychain_with_prefix("");
	keychain.set("raw", &[0xc3, 0x28]);
	assert_eq!(keychain.get_text("raw"), None);
	assert_eq!(keychain.last_status(), Status::INVALID_ENCODING);
	assert_eq!(keychain.get("raw"), Some(vec![0xc3, 0x28]));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OAuthTokens {
	access: String,
	refresh: String,
	expires: u64,
}

#[test]
fn test_failed_object_encode_reports_its_own_key() {
	let (_, keychain) = keychain_with_prefix("oauth.");
	keychain.set_text("other", "x");

	let codec = JsonCodec::<std::collections::HashMap<(u8, u8), u8>>::new();
	let value = std::collections::HashMap::from([((1, 2), 3)]);
	assert!(!keychain.set_object("bad", &value, &codec));

	assert_eq!(keychain.last_status(), Status::BAD_ARGUMENTS);
	let query = keychain.last_query().unwrap();
	assert_eq!(query.text(Attribute::Account), Some("oauth.bad"));
}

#[test]
fn test_object_roundtrip_with_json_codec() {
	let (_, keychain) = keychain_with_prefix("oauth.");
	let codec = JsonCodec::<OAuthTokens>::new();
	let tokens = OAuthTokens {
		access: "at_access".to_string(),
		refresh: "rt_refresh".to_string(),
		expires: 1735500000000,
	};

	assert!(keychain.set_object("anthropic", &tokens, &codec));
	assert_eq!(keychain.get_object("anthropic", &codec), Some(tokens));
	assert_eq!(keychain.get_object("openai", &codec), None);
}

#[test]
fn test_config_file_drives_scope() {
	use std::io::Write;

	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "key_prefix = \"cfg.\"\naccess_group = \"{GROUP}\"").unwrap();
	let mut config = KeychainConfig::from_file(file.path()).unwrap();
	config.apply_env_from(|_| None).unwrap();

	let storage = Arc::new(MemoryKeychain::new());
	let keychain = Keychain::with_config(storage.clone(), config);
	keychain.set_text("k", "v");

	let items = storage.items();
	assert_eq!(items[0].text(Attribute::Account), Some("cfg.k"));
	assert_eq!(items[0].text(Attribute::AccessGroup), Some(GROUP));
}

proptest! {
	#[test]
	fn prop_set_then_get_returns_value(
		key in "[a-z0-9._-]{1,16}",
		value in proptest::collection::vec(any::<u8>(), 0..128),
	) {
		let (_, keychain) = keychain_with_prefix("prop.");
		prop_assert!(keychain.set(&key, &value));
		prop_assert_eq!(keychain.get(&key), Some(value));
	}

	#[test]
	fn prop_last_write_wins(
		key in "[a-z]{1,8}",
		first in ".*",
		second in ".*",
	) {
		let (_, keychain) = keychain_with_prefix("");
		prop_assert!(keychain.set_text(&key, &first));
		prop_assert!(keychain.set_text(&key, &second));
		prop_assert_eq!(keychain.get_text(&key), Some(second));
	}

	#[test]
	fn prop_bool_decodes_first_byte(bytes in proptest::collection::vec(any::<u8>(), 1..8)) {
		let (_, keychain) = keychain_with_prefix("");
		keychain.set("flag", &bytes);
		prop_assert_eq!(keychain.get_bool("flag"), Some(bytes[0] == 1));
	}
}
