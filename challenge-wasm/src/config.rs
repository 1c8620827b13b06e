use log::LevelFilter;

use crate::error::ClientError;
use crate::utils::{asset_url, get_query_param};

/// Start-up configuration read from the page URL and the host page globals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Challenge id, `?id=`.
    pub id: String,
    /// Challenge family, `?variant=`. Families with subtypes resolve to a
    /// concrete variant once the descriptor arrives.
    pub family: String,
    /// Prefix for the challenge and submit endpoints, `window.__BASE_URL`.
    pub base_url: Option<String>,
    /// Console verbosity, `?log=`. Defaults to info.
    pub log_level: LevelFilter,
}

impl ClientConfig {
    pub fn from_query(search: &str, base_url: Option<String>) -> Result<Self, ClientError> {
        let param = |key: &'static str| {
            get_query_param(search, key)
                .filter(|v| !v.is_empty())
                .ok_or(ClientError::MissingParam(key))
        };
        Ok(ClientConfig {
            id: param("id")?,
            family: param("variant")?,
            base_url,
            log_level: Self::log_level(search),
        })
    }

    pub fn new(id: String, family: String, base_url: Option<String>) -> Self {
        ClientConfig {
            id,
            family,
            base_url,
            log_level: LevelFilter::Info,
        }
    }

    pub fn log_level(search: &str) -> LevelFilter {
        get_query_param(search, "log")
            .and_then(|l| l.parse().ok())
            .unwrap_or(LevelFilter::Info)
    }

    pub fn url(&self, path: &str) -> String {
        asset_url(self.base_url.as_deref(), path)
    }
}
