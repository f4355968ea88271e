//! Shared deserializers for loosely-typed API payloads

use std::fmt;

use serde::de::{self, Visitor};
use serde::Deserializer;

/// Accept a count given as an integer, a numeric string, or null
pub(crate) fn deserialize_count_option<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer, numeric string, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(u64::try_from(v).ok())
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.trim().parse::<u64>().ok())
        }
    }

    deserializer.deserialize_option(CountVisitor)
}

/// Leading four-digit year of a date string such as "2021-03-01"
pub(crate) fn year_from_date(date: &str) -> Option<i32> {
    date.get(..4).and_then(|y| y.parse().ok())
}
