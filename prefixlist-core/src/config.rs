//! Reconciler configuration.
//!
//! Reads optional overrides from env vars:
//!   PREFIXLIST_POLL_DELAY_SECONDS - delay requested between polls (default: 5)
//!   PREFIXLIST_MAX_PAGES          - page cap for any paginated listing (default: 1000)

pub const DEFAULT_POLL_DELAY_SECONDS: u32 = 5;
pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Delay handed back with `Continue` while a mutation is still pending.
    pub poll_delay_seconds: u32,
    /// Upper bound on pages drained from one listing.
    pub max_pages: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_delay_seconds: DEFAULT_POLL_DELAY_SECONDS,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            poll_delay_seconds: lookup("PREFIXLIST_POLL_DELAY_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.poll_delay_seconds),
            max_pages: lookup("PREFIXLIST_MAX_PAGES")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_pages),
        }
    }

    pub fn with_poll_delay_seconds(mut self, seconds: u32) -> Self {
        self.poll_delay_seconds = seconds;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.poll_delay_seconds, 5);
        assert_eq!(config.max_pages, 1000);
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("PREFIXLIST_POLL_DELAY_SECONDS", "2"),
            ("PREFIXLIST_MAX_PAGES", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = ReconcilerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.poll_delay_seconds, 2);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn zero_page_cap_is_rejected() {
        let config = ReconcilerConfig::from_lookup(|k| {
            (k == "PREFIXLIST_MAX_PAGES").then(|| "0".to_string())
        });
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }
}
