// Module name shadows the `serde` crate, so refer to the external crate as `::serde`.
use ::serde::{Deserialize, Deserializer, Serializer};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Serialize `DateTime<Utc>` as ISO 8601 with microseconds and a `Z` suffix.
pub fn to_rfc3339_micros<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Serialize a money amount as a string with exactly two decimal places.
pub fn decimal_2dp<S>(d: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut d = *d;
    d.rescale(2);
    s.serialize_str(&d.to_string())
}

/// Serialize a computed amount as a JSON number.
pub fn decimal_as_f64<S>(d: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_f64(d.to_f64().unwrap_or_default())
}

/// Like [`decimal_as_f64`], `null` when absent.
pub fn option_decimal_as_f64<S>(d: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match d {
        Some(d) => decimal_as_f64(d, s),
        None => s.serialize_none(),
    }
}

/// Keeps "absent" and "explicit null" apart for partial updates.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: a missing
/// key stays `None`, `null` becomes `Some(None)`.
pub fn double_option<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}
