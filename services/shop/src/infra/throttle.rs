//! Fixed-window request throttling.
//!
//! Anonymous requests always count against the `anon` budget (keyed by client
//! IP). Route groups may add a named scope, keyed by user id when a caller is
//! authenticated and by IP otherwise.

use std::net::SocketAddr;
use std::str::FromStr;

use axum::extract::{ConnectInfo, FromRef, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use shop_auth_types::identity::{JwtSecret, MaybeCaller};

use crate::error::ShopError;
use crate::infra::cache::CacheStore;
use crate::state::AppState;

/// `requests` per `period_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub requests: u64,
    pub period_secs: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateParseError {
    #[error("expected \"<count>/<period>\", got {0:?}")]
    Format(String),
    #[error("unknown period {0:?}")]
    Period(String),
}

impl FromStr for Rate {
    type Err = RateParseError;

    /// `2/minute`, `100/day`, `5/s`. Only the first letter of the period counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| RateParseError::Format(s.to_owned()))?;
        let requests = count
            .trim()
            .parse()
            .map_err(|_| RateParseError::Format(s.to_owned()))?;
        let period_secs = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 60 * 60,
            Some('d') => 24 * 60 * 60,
            _ => return Err(RateParseError::Period(period.to_owned())),
        };
        Ok(Self {
            requests,
            period_secs,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRates {
    pub anon: Rate,
    pub products: Rate,
    pub orders: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleScope {
    Products,
    Orders,
}

impl ThrottleScope {
    fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }

    fn rate(self, rates: &ThrottleRates) -> Rate {
        match self {
            Self::Products => rates.products,
            Self::Orders => rates.orders,
        }
    }
}

/// State for [`throttle`]: the app plus the scope of the route group it guards.
#[derive(Clone)]
pub struct ThrottleState {
    pub app: AppState,
    pub scope: Option<ThrottleScope>,
}

impl ThrottleState {
    pub fn new(app: &AppState, scope: Option<ThrottleScope>) -> Self {
        Self {
            app: app.clone(),
            scope,
        }
    }
}

impl FromRef<ThrottleState> for JwtSecret {
    fn from_ref(state: &ThrottleState) -> Self {
        state.app.jwt_secret.clone()
    }
}

/// First `X-Forwarded-For` entry, else the socket peer.
pub fn client_ip(req: &Request) -> String {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').map(str::trim).find(|s| !s.is_empty()));
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

pub async fn throttle(
    State(state): State<ThrottleState>,
    MaybeCaller(caller): MaybeCaller,
    req: Request,
    next: Next,
) -> Result<Response, ShopError> {
    let ip = client_ip(&req);
    let rates = &state.app.settings.rates;
    let cache = &state.app.cache;

    if caller.is_none() {
        allow(cache, &format!("throttle:anon:{ip}"), rates.anon).await?;
    }
    if let Some(scope) = state.scope {
        let ident = match &caller {
            Some(c) => format!("user:{}", c.user_id),
            None => format!("ip:{ip}"),
        };
        allow(
            cache,
            &format!("throttle:{}:{ident}", scope.name()),
            scope.rate(rates),
        )
        .await?;
    }
    Ok(next.run(req).await)
}

/// Count one request against `key`. A cache outage lets the request through.
async fn allow(cache: &CacheStore, key: &str, rate: Rate) -> Result<(), ShopError> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let window = now / rate.period_secs;
    match cache.incr(&format!("{key}:{window}"), rate.period_secs).await {
        Ok(count) if count > rate.requests => {
            tracing::info!(key, count, "request throttled");
            Err(ShopError::Throttled {
                retry_after_secs: rate.period_secs - now % rate.period_secs,
            })
        }
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(error = ?e, key, "throttle counter unavailable");
            Ok(())
        }
    }
}
