//! Query-parameter lookups: `field`, `field__lt`, `field__range=a,b`, and so on.

use std::str::FromStr;

/// A comparison against a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Exact(T),
    Lt(T),
    Gt(T),
    Lte(T),
    Gte(T),
    /// Inclusive on both ends.
    Range(T, T),
}

/// Lookup suffix of a query key, without the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Exact,
    Lt,
    Gt,
    Lte,
    Gte,
    Range,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("\"{0}\" is not a valid value.")]
    InvalidValue(String),
    #[error("Range query expects two values.")]
    RangeArity,
}

/// Split `price__lte` into `("price", Some("lte"))`; a bare key has no suffix.
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once("__") {
        Some((field, suffix)) => (field, Some(suffix)),
        None => (key, None),
    }
}

impl Comparison {
    pub fn from_suffix(suffix: Option<&str>) -> Option<Self> {
        match suffix {
            None | Some("exact") => Some(Self::Exact),
            Some("lt") => Some(Self::Lt),
            Some("gt") => Some(Self::Gt),
            Some("lte") => Some(Self::Lte),
            Some("gte") => Some(Self::Gte),
            Some("range") => Some(Self::Range),
            Some(_) => None,
        }
    }

    /// Parse a raw query value into a typed lookup.
    pub fn parse<T: FromStr>(self, raw: &str) -> Result<Lookup<T>, LookupError> {
        let one = |s: &str| {
            s.trim()
                .parse::<T>()
                .map_err(|_| LookupError::InvalidValue(s.trim().to_owned()))
        };
        Ok(match self {
            Self::Exact => Lookup::Exact(one(raw)?),
            Self::Lt => Lookup::Lt(one(raw)?),
            Self::Gt => Lookup::Gt(one(raw)?),
            Self::Lte => Lookup::Lte(one(raw)?),
            Self::Gte => Lookup::Gte(one(raw)?),
            Self::Range => {
                let parts: Vec<&str> = raw.split(',').collect();
                let [lo, hi] = parts.as_slice() else {
                    return Err(LookupError::RangeArity);
                };
                Lookup::Range(one(*lo)?, one(*hi)?)
            }
        })
    }
}
