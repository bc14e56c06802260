//! Case-insensitive text predicates for Postgres and SQLite.
//!
//! The value is lowercased with Unicode rules. SQLite's `LOWER()` folds ASCII
//! only, so on SQLite non-ASCII letters match case-sensitively.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `LOWER(col) = lower(value)`
pub fn iexact<C: IntoColumnRef>(col: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).eq(value.to_lowercase())
}

/// `LOWER(col) LIKE '%value%'`, with `value` escaped.
pub fn icontains<C: IntoColumnRef>(col: C, value: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&value.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}
