//! Serde helpers for Native wire conventions shared by request and response.

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use std::fmt;

/// Native Markup version emitted when a payload does not name one.
pub const NATIVE_VERSION: &str = "1.2";

pub(crate) fn default_ver() -> String {
    NATIVE_VERSION.to_string()
}

pub(crate) fn default_plcmtcnt() -> i64 {
    1
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// Open JSON fields such as `ext`. An explicit `null` is kept as
/// `Some(Value::Null)` so it re-encodes the way it arrived; only an absent key
/// (via `#[serde(default)]`) is `None`.
pub(crate) fn keep_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Default-bearing fields resolve `null` the same as an absent key.
pub(crate) mod null_default {
    use super::*;

    pub fn ver<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_ver))
    }

    pub fn plcmtcnt<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_else(default_plcmtcnt))
    }

    pub fn zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Boolean flags travel as the integers 0 and 1.
pub(crate) mod bool_int {
    use super::*;

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("0 or 1")
        }

        // null reads as the flag's default
        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        // Some exchanges send JSON booleans.
        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::invalid_value(Unexpected::Unsigned(other), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match u64::try_from(v) {
                Ok(v) => self.visit_u64(v),
                Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Flags {
        #[serde(default, with = "super::bool_int", skip_serializing_if = "super::is_false")]
        flag: bool,
    }

    #[test]
    fn test_flag_accepts_integers_and_booleans() {
        let on: Flags = serde_json::from_str(r#"{"flag":1}"#).unwrap();
        assert!(on.flag);
        let off: Flags = serde_json::from_str(r#"{"flag":0}"#).unwrap();
        assert!(!off.flag);
        let as_bool: Flags = serde_json::from_str(r#"{"flag":true}"#).unwrap();
        assert!(as_bool.flag);
        let absent: Flags = serde_json::from_str("{}").unwrap();
        assert!(!absent.flag);
        let null: Flags = serde_json::from_str(r#"{"flag":null}"#).unwrap();
        assert!(!null.flag);
    }

    #[test]
    fn test_flag_rejects_other_values() {
        assert!(serde_json::from_str::<Flags>(r#"{"flag":2}"#).is_err());
        assert!(serde_json::from_str::<Flags>(r#"{"flag":-1}"#).is_err());
        assert!(serde_json::from_str::<Flags>(r#"{"flag":"1"}"#).is_err());
    }

    #[test]
    fn test_flag_serializes_as_integer_and_skips_false() {
        assert_eq!(
            serde_json::to_string(&Flags { flag: true }).unwrap(),
            r#"{"flag":1}"#
        );
        assert_eq!(serde_json::to_string(&Flags { flag: false }).unwrap(), "{}");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Defaults {
        #[serde(default = "super::default_ver", deserialize_with = "super::null_default::ver")]
        ver: String,
        #[serde(
            default = "super::default_plcmtcnt",
            deserialize_with = "super::null_default::plcmtcnt"
        )]
        plcmtcnt: i64,
        #[serde(default, deserialize_with = "super::null_default::zero")]
        seq: i64,
        #[serde(
            default,
            deserialize_with = "super::keep_null",
            skip_serializing_if = "Option::is_none"
        )]
        ext: Option<Value>,
    }

    #[test]
    fn test_null_resolves_to_field_default() {
        let nulls: Defaults =
            serde_json::from_str(r#"{"ver":null,"plcmtcnt":null,"seq":null}"#).unwrap();
        let absent: Defaults = serde_json::from_str("{}").unwrap();
        assert_eq!(nulls, absent);
        assert_eq!(nulls.ver, "1.2");
        assert_eq!(nulls.plcmtcnt, 1);
        assert_eq!(nulls.seq, 0);
    }

    #[test]
    fn test_ext_null_is_kept_apart_from_absent() {
        let null: Defaults = serde_json::from_str(r#"{"ext":null}"#).unwrap();
        assert_eq!(null.ext, Some(Value::Null));
        assert_eq!(serde_json::to_value(&null).unwrap()["ext"], Value::Null);
        assert!(serde_json::to_value(&null).unwrap().get("ext").is_some());

        let absent: Defaults = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.ext, None);
        assert_eq!(
            serde_json::to_value(&absent).unwrap(),
            json!({"ver": "1.2", "plcmtcnt": 1, "seq": 0})
        );
    }
}
