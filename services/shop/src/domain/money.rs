//! Price rules and the integer-cents storage mapping.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use shop_domain::lookup::Lookup;

pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Check a submitted price: digit limits first, then sign.
pub fn validate_price(price: Decimal) -> Result<Decimal, String> {
    let scale = price.scale();
    let len = digit_count(price);
    let (digits, decimals) = if scale == 0 {
        (len, 0)
    } else if scale > len {
        (scale, scale)
    } else {
        (len, scale)
    };
    let whole = digits - decimals;
    let max_whole = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;

    if digits > PRICE_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        ));
    }
    if decimals > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        ));
    }
    if whole > max_whole {
        return Err(format!(
            "Ensure that there are no more than {max_whole} digits before the decimal point."
        ));
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price must be a positive number.".to_owned());
    }
    Ok(price)
}

fn digit_count(d: Decimal) -> u32 {
    let mut m = d.mantissa().unsigned_abs();
    let mut n = 1;
    while m >= 10 {
        m /= 10;
        n += 1;
    }
    n
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, PRICE_DECIMAL_PLACES)
}

/// Exact conversion; `None` when the amount has sub-cent precision or overflows.
pub fn to_cents(price: Decimal) -> Option<i64> {
    let scaled = price.checked_mul(Decimal::ONE_HUNDRED)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i64()
}

fn scaled(v: Decimal) -> Decimal {
    v.checked_mul(Decimal::ONE_HUNDRED).unwrap_or(if v.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

fn saturating_i64(v: Decimal) -> i64 {
    v.to_i64().unwrap_or(if v.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn ceil_cents(v: Decimal) -> i64 {
    saturating_i64(scaled(v).ceil())
}

fn floor_cents(v: Decimal) -> i64 {
    saturating_i64(scaled(v).floor())
}

/// Rewrite a price lookup as an equivalent lookup on `price_cents`.
///
/// Bounds with sub-cent precision are rounded toward the inside of the range.
/// `None` means nothing can match (an exact sub-cent price).
pub fn cents_lookup(lookup: Lookup<Decimal>) -> Option<Lookup<i64>> {
    Some(match lookup {
        Lookup::Exact(v) => Lookup::Exact(to_cents(v)?),
        Lookup::Lt(v) => Lookup::Lt(ceil_cents(v)),
        Lookup::Lte(v) => Lookup::Lte(floor_cents(v)),
        Lookup::Gt(v) => Lookup::Gt(floor_cents(v)),
        Lookup::Gte(v) => Lookup::Gte(ceil_cents(v)),
        Lookup::Range(lo, hi) => Lookup::Range(ceil_cents(lo), floor_cents(hi)),
    })
}
