//! Serde utilities for lenient API payloads.

use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;

/// Deserializes a `u64` that the service may send as a number or a string.
pub mod string_or_u64 {
    use super::{de, fmt, Deserializer, Visitor};

    /// Deserializes a u64 from a string or number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a string or integer, or if parsing fails.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringOrIntVisitor;

        impl Visitor<'_> for StringOrIntVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative integer or a string holding one")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value).map_err(de::Error::custom)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.trim().parse::<u64>().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(StringOrIntVisitor)
    }
}

/// Same as [`string_or_u64`], narrowed to `u32`.
pub mod string_or_u32 {
    use super::{de, Deserializer};

    /// Deserializes a u32 from a string or number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an integer that fits in a u32.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = super::string_or_u64::deserialize(deserializer)?;
        u32::try_from(value).map_err(de::Error::custom)
    }
}
