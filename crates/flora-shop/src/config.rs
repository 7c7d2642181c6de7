//! Client configuration.
//!
//! Values come from environment variables, each with a default:
//! - `FLORA_DB_PATH`: SQLite file holding both storage namespaces (default: "flora.db")
//! - `FLORA_API_URL`: backend base URL, normalised to end in `/api` (default: "http://localhost:4000")
//! - `FLORA_SHOP_NAME`: name printed on receipts (default: "Rozoviy Sad")
//! - `FLORA_CURRENCY`: currency code shown after amounts (default: "UZS")
//! - `FLORA_CARD_NUMBER`: card number customers pay to (default: unset)
//! - `FLORA_PAYMENT_CONTACT`: where payment screenshots go (default: "https://t.me/rozoviysaduz")
//!
//! Empty values count as unset.

use reqwest::Url;
use tracing::debug;

use crate::error::ShopError;

pub const DEFAULT_DB_PATH: &str = "flora.db";
pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_SHOP_NAME: &str = "Rozoviy Sad";
pub const DEFAULT_CURRENCY: &str = "UZS";
pub const DEFAULT_PAYMENT_CONTACT: &str = "https://t.me/rozoviysaduz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    pub db_path: String,
    /// Normalised API base, e.g. `http://localhost:4000/api`.
    pub api_url: String,
    /// Site base without the `/api` segment.
    pub base_url: String,
    pub shop_name: String,
    pub currency: String,
    pub card_number: Option<String>,
    pub payment_contact: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            db_path: DEFAULT_DB_PATH.to_string(),
            api_url: format!("{}/api", DEFAULT_API_URL),
            base_url: DEFAULT_API_URL.to_string(),
            shop_name: DEFAULT_SHOP_NAME.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            card_number: None,
            payment_contact: DEFAULT_PAYMENT_CONTACT.to_string(),
        }
    }
}

impl ShopConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ShopError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShopError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = ShopConfig::default();

        let config = ShopConfig {
            db_path: get("FLORA_DB_PATH").unwrap_or(defaults.db_path),
            shop_name: get("FLORA_SHOP_NAME").unwrap_or(defaults.shop_name),
            currency: get("FLORA_CURRENCY").unwrap_or(defaults.currency),
            card_number: get("FLORA_CARD_NUMBER"),
            payment_contact: get("FLORA_PAYMENT_CONTACT").unwrap_or(defaults.payment_contact),
            ..defaults
        };
        let config = match get("FLORA_API_URL") {
            Some(raw) => config.with_api_url(&raw)?,
            None => config,
        };

        debug!(db = %config.db_path, api = %config.api_url, "configuration loaded");
        Ok(config)
    }

    /// Replaces the API URL (and the derived base URL).
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ShopError> {
        self.api_url = normalize_api_url(raw)?;
        self.base_url = base_url_of(&self.api_url)?;
        Ok(self)
    }

    /// Full address of a site route such as `/admin-login`.
    pub fn page_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

fn ends_with_api(path: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    path.get(path.len().saturating_sub(4)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case("/api"))
}

fn is_absolute(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn parse_url(raw: &str) -> Result<Url, ShopError> {
    Url::parse(raw).map_err(|e| ShopError::Config(format!("invalid API URL '{}': {}", raw, e)))
}

/// Makes sure the API URL ends in `/api` with no trailing slash.
///
/// `http://host:4000` and `http://host:4000/api/` both become
/// `http://host:4000/api`; relative forms such as `/backend` become
/// `/backend/api`.
pub fn normalize_api_url(raw: &str) -> Result<String, ShopError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ShopError::Config("API URL is empty".to_string()));
    }

    if is_absolute(raw) {
        let mut url = parse_url(raw)?;
        if !ends_with_api(url.path()) {
            let path = format!("{}/api", url.path().trim_end_matches('/'));
            url.set_path(&path);
        }
        let text = url.to_string();
        return Ok(text.strip_suffix('/').unwrap_or(&text).to_string());
    }

    if ends_with_api(raw) {
        Ok(raw.strip_suffix('/').unwrap_or(raw).to_string())
    } else {
        Ok(format!("{}/api", raw.trim_end_matches('/')))
    }
}

fn strip_api_segment(path: &str) -> &str {
    let path = path.strip_suffix('/').unwrap_or(path);
    let cut = path.len().saturating_sub(4);
    match path.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case("/api") => &path[..cut],
        _ => path,
    }
}

/// The site base for a normalised API URL: the same URL without its
/// trailing `/api` segment.
pub fn base_url_of(api_url: &str) -> Result<String, ShopError> {
    if is_absolute(api_url) {
        let url = parse_url(api_url)?;
        let origin = url.origin().ascii_serialization();
        return Ok(format!("{}{}", origin, strip_api_segment(url.path())));
    }
    match strip_api_segment(api_url) {
        "" => Ok("/".to_string()),
        base => Ok(base.to_string()),
    }
}
