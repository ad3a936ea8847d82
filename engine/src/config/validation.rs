//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

use chat_core::CasingPolicy;

static RE_HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+(/[^\s?#]*)?$").unwrap());
static RE_CLIENT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,64}$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "CASING_POLICY" => {
            value
                .parse::<CasingPolicy>()
                .map_err(|_| "must be none, all_caps, all_lower, first_cap or lookup")?;
        }
        "INFER_CASING_FROM_BODY" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        "IDENTITY_LOOKUP_BASE_URL" => {
            if !RE_HTTP_URL.is_match(value) {
                return Err("must be an http(s) URL without query or fragment".into());
            }
        }
        "IDENTITY_CLIENT_ID" => {
            if !value.is_empty() && !RE_CLIENT_ID.is_match(value) {
                return Err("must be 1-64 alphanumeric characters".into());
            }
        }
        "EMOJI_WORKER_COUNT" => validate_int_range(value, 1, 16)?,
        "EMOJI_QUEUE_CAPACITY" => validate_int_range(value, 1, 4096)?,
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i32, max: i32) -> Result<(), String> {
    let v: i32 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casing_policy() {
        assert!(validate_setting("CASING_POLICY", "lookup").is_ok());
        assert!(validate_setting("CASING_POLICY", "first_cap").is_ok());
        assert!(validate_setting("CASING_POLICY", "shout").is_err());
    }

    #[test]
    fn test_boolean() {
        assert!(validate_setting("INFER_CASING_FROM_BODY", "true").is_ok());
        assert!(validate_setting("INFER_CASING_FROM_BODY", "yes").is_err());
    }

    #[test]
    fn test_lookup_url() {
        assert!(validate_setting("IDENTITY_LOOKUP_BASE_URL", "https://api.twitch.tv/kraken/users/").is_ok());
        assert!(validate_setting("IDENTITY_LOOKUP_BASE_URL", "http://localhost:8080").is_ok());
        assert!(validate_setting("IDENTITY_LOOKUP_BASE_URL", "ftp://example.com/").is_err());
        assert!(validate_setting("IDENTITY_LOOKUP_BASE_URL", "https://x.test/users?id=").is_err());
    }

    #[test]
    fn test_client_id() {
        assert!(validate_setting("IDENTITY_CLIENT_ID", "").is_ok()); // empty is ok
        assert!(validate_setting("IDENTITY_CLIENT_ID", "abc123XYZ").is_ok());
        assert!(validate_setting("IDENTITY_CLIENT_ID", "abc 123").is_err());
    }

    #[test]
    fn test_ranges() {
        assert!(validate_setting("EMOJI_WORKER_COUNT", "1").is_ok());
        assert!(validate_setting("EMOJI_WORKER_COUNT", "16").is_ok());
        assert!(validate_setting("EMOJI_WORKER_COUNT", "0").is_err());
        assert!(validate_setting("EMOJI_QUEUE_CAPACITY", "4097").is_err());
        assert!(validate_setting("EMOJI_QUEUE_CAPACITY", "lots").is_err());
    }
}
