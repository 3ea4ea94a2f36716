// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Naming, id, and conversion utilities.

use std::sync::LazyLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use crate::error::ApiError;

/// Resource name rule: starts with a letter, continues with letters,
/// digits, or dashes, and does not end with a dash. A single letter is
/// accepted.
static NAME_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z]([a-zA-Z0-9-]*[a-zA-Z0-9])?$").unwrap());

/// Validate a user-chosen name or id.
pub fn check_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::Validation("the provided name is empty".into()));
    }
    if !NAME_RULE.is_match(name) {
        return Err(ApiError::Validation(format!(
            "invalid name {name:?}: names must start with a letter, continue with letters, \
             digits, or dashes, and must not end with a dash"
        )));
    }
    Ok(())
}

/// Generate a fresh opaque uid (lowercase hex, globally unique).
pub fn gen_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Normalize an arbitrary string into a usable id: lowercase, every run of
/// non-alphanumerics collapsed to a dash, with a trailing `r` appended if
/// the result would end in a dash.
pub fn change_id_string(name: &str) -> String {
    static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-zA-Z0-9]+").unwrap());
    let mut out = NON_ALNUM.replace_all(name, "-").to_lowercase();
    if out.ends_with('-') {
        out.push('r');
    }
    out
}

const PASSWORD_CLASSES: [&[u8]; 4] = [b"ABCDEFGHJKLMNPQRSTUVWXYZ", b"123456789", b"!$%&", b"abcdefghijkmnpqrstuvwxyz"];

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Generate a random password of at least [`MIN_PASSWORD_LEN`] characters
/// containing at least one uppercase letter, digit, symbol, and lowercase
/// letter.
pub fn gen_random_password(length: usize) -> String {
    let length = length.max(MIN_PASSWORD_LEN);
    let mut rng = rand::thread_rng();

    let mut chars: Vec<u8> = PASSWORD_CLASSES
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    let filler = PASSWORD_CLASSES[3];
    while chars.len() < length {
        chars.push(filler[rng.gen_range(0..filler.len())]);
    }
    chars.shuffle(&mut rng);
    String::from_utf8(chars).expect("password classes are ASCII")
}

/// Parse an input document in the named format into a JSON value.
pub fn convert_to_message(in_type: &str, raw: &str) -> Result<serde_json::Value, ApiError> {
    match in_type {
        "yaml" => serde_yaml::from_str(raw)
            .map_err(|e| ApiError::Validation(format!("invalid yaml: {e}"))),
        "json" => serde_json::from_str(raw)
            .map_err(|e| ApiError::Validation(format!("invalid json: {e}"))),
        other => Err(ApiError::Validation(format!(
            "unsupported input format: {other}"
        ))),
    }
}

/// Render a JSON value in the named output format.
pub fn convert_to_output(out_type: &str, value: &serde_json::Value) -> Result<String, ApiError> {
    match out_type {
        "yaml" => serde_yaml::to_string(value)
            .map_err(|e| ApiError::Internal(format!("yaml marshal: {e}"))),
        "json" => serde_json::to_string_pretty(value)
            .map_err(|e| ApiError::Internal(format!("json marshal: {e}"))),
        other => Err(ApiError::Validation(format!(
            "unsupported output format: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rule_boundary_cases() {
        assert!(check_name("a").is_ok());
        assert!(check_name("a--b").is_ok());
        assert!(check_name("vnet1").is_ok());
        assert!(check_name("A-1-b").is_ok());

        assert!(check_name("").is_err());
        assert!(check_name("1a").is_err());
        assert!(check_name("a-").is_err());
        assert!(check_name("a+b").is_err());
        assert!(check_name("-a").is_err());
        assert!(check_name("a b").is_err());
    }

    #[test]
    fn uid_is_unique_and_plain() {
        let a = gen_uid();
        let b = gen_uid();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn id_normalization() {
        assert_eq!(change_id_string("My Spec.Name"), "my-spec-name");
        assert_eq!(change_id_string("t3.large"), "t3-large");
        assert_eq!(change_id_string("odd_trailing!"), "odd-trailingr");
        assert_eq!(change_id_string("aws-us-east-1"), "aws-us-east-1");
    }

    #[test]
    fn password_has_all_classes_and_floor() {
        for requested in [0, 4, 8, 20] {
            let pw = gen_random_password(requested);
            assert!(pw.len() >= MIN_PASSWORD_LEN);
            assert!(pw.len() >= requested);
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            assert!(pw.chars().any(|c| c.is_ascii_digit()));
            assert!(pw.chars().any(|c| "!$%&".contains(c)));
        }
    }

    #[test]
    fn yaml_output_message_round_trip() {
        let value = serde_json::json!({
            "Name": "vnet1",
            "CidrBlock": "10.0.0.0/16",
            "SubnetInfoList": [{"Name": "sn1", "IPv4_CIDR": "10.0.1.0/24"}],
        });
        let yaml = convert_to_output("yaml", &value).unwrap();
        let back = convert_to_message("yaml", &yaml).unwrap();
        assert_eq!(back, value);

        let json = convert_to_output("json", &value).unwrap();
        let back = convert_to_message("json", &json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn unknown_formats_are_rejected() {
        assert!(convert_to_message("toml", "a = 1").is_err());
        assert!(convert_to_output("toml", &serde_json::json!({})).is_err());
    }
}
