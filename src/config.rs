use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub reset_delay: Duration,
    pub reset_timeout: Duration,
    pub reports_path: Option<PathBuf>,
    pub recommendations_path: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        Ok(Self {
            reset_delay: millis(&lookup, "VISIBILITY_RESET_DELAY_MS", DEFAULT_RESET_DELAY)?,
            reset_timeout: millis(&lookup, "VISIBILITY_RESET_TIMEOUT_MS", DEFAULT_RESET_TIMEOUT)?,
            reports_path: path("VISIBILITY_REPORTS_JSON"),
            recommendations_path: path("VISIBILITY_RECOMMENDATIONS_CSV"),
        })
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .with_context(|| format!("{key} must be a whole number of milliseconds, got {raw:?}")),
        None => Ok(default),
    }
}
