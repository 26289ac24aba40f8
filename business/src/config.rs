use std::{collections::HashMap, env::vars, time::Duration};

use log::info;
use serde::Deserialize;
use ustr::Ustr;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    pub server_url: String,
    /// Sent verbatim as the `Authorization` header when present.
    pub authorization: Option<String>,
    /// Name used by the "only my rows" table scope.
    pub current_user: Option<String>,
    pub page_size: usize,
    pub search_debounce_ms: u64,
    /// Announce the start and end of each search.
    pub search_notification: bool,
    /// Periodic refresh interval per entity type.
    pub refresh_rates: HashMap<Ustr, Duration>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl BusinessConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            authorization: None,
            current_user: None,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            search_notification: false,
            refresh_rates: HashMap::new(),
        }
    }

    /// Absolute URL for a server path such as `/filtering/device`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn search_debounce(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.search_debounce_ms).unwrap_or(i64::MAX))
    }

    pub fn refresh_rate(&self, entity_type: &str) -> Option<Duration> {
        self.refresh_rates.get(&Ustr::from(entity_type)).copied()
    }

    /// Reads `NETDECK_*` variables on top of the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().apply_env()
    }

    /// Lets `NETDECK_*` variables override an already built config.
    pub fn apply_env(self) -> anyhow::Result<Self> {
        info!("Loading business configuration from environment variables");
        let raw: RawConfig = serde_env::from_iter(vars())?;
        self.merge_raw(raw)
    }

    /// Overrides the fields `raw` sets, keeping everything else.
    pub fn merge_raw(mut self, raw: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            netdeck_server_url,
            netdeck_authorization,
            netdeck_user,
            netdeck_page_size,
            netdeck_search_debounce_ms,
            netdeck_search_notification,
            netdeck_refresh_rates,
        } = raw;

        if let Some(url) = netdeck_server_url {
            info!("Using NETDECK_SERVER_URL: {url}");
            self.server_url = url;
        }
        if netdeck_authorization.is_some() {
            self.authorization = netdeck_authorization;
        }
        if netdeck_user.is_some() {
            self.current_user = netdeck_user;
        }
        match netdeck_page_size {
            Some(0) => anyhow::bail!("NETDECK_PAGE_SIZE must be greater than zero"),
            Some(size) => self.page_size = size,
            None => {}
        }
        if let Some(ms) = netdeck_search_debounce_ms {
            self.search_debounce_ms = ms;
        }
        if let Some(flag) = netdeck_search_notification {
            self.search_notification = flag;
        }
        if let Some(rates) = netdeck_refresh_rates {
            self.refresh_rates.extend(parse_refresh_rates(&rates)?);
        }

        Ok(self)
    }
}

/// Environment overrides, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    netdeck_server_url: Option<String>,
    netdeck_authorization: Option<String>,
    netdeck_user: Option<String>,
    netdeck_page_size: Option<usize>,
    netdeck_search_debounce_ms: Option<u64>,
    netdeck_search_notification: Option<bool>,
    /// `device=30,service=10`, seconds per entity type.
    netdeck_refresh_rates: Option<String>,
}

/// Parses `type=seconds` pairs separated by commas.
pub fn parse_refresh_rates(spec: &str) -> anyhow::Result<HashMap<Ustr, Duration>> {
    spec.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (entity, seconds) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Refresh rate `{pair}` is not `type=seconds`"))?;
            let seconds: u64 = seconds
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Refresh rate for `{entity}` is invalid: {e}"))?;
            if seconds == 0 {
                anyhow::bail!("Refresh rate for `{entity}` must be greater than zero");
            }
            Ok((Ustr::from(entity.trim()), Duration::from_secs(seconds)))
        })
        .collect()
}
