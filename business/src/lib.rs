//! Filtering API client and the server-backed table engine.

pub mod api;
mod config;
pub mod filtering;
pub mod http;
pub mod table;

#[cfg(test)]
mod test_utils;

pub use api::{ApiError, ApiResult, FilteringBackend, HttpBackend};
pub use config::{
    BusinessConfig, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, DEFAULT_SERVER_URL, RawConfig,
    parse_refresh_rates,
};
