use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use tracing::warn;

pub const ENV_WAVE_TIMEOUT_SECS: &str = "SYNCER_WAVE_TIMEOUT_SECS";
pub const ENV_MAX_WORKERS: &str = "SYNCER_MAX_WORKERS";
pub const ENV_AUDIT_BUFFER: &str = "SYNCER_AUDIT_BUFFER";

/// Engine-wide knobs. Per-job tunables live on the job itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Upper bound on how long one write wave may take.
    pub wave_timeout_secs: u64,
    /// Worker-pool capacity shared by all jobs.
    pub max_workers: usize,
    /// Audit channel capacity.
    pub audit_buffer: usize,
    /// Capacity of event subscriber channels.
    pub event_buffer: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            wave_timeout_secs: 300,
            max_workers: 32,
            audit_buffer: 1024,
            event_buffer: 16,
        }
    }
}

impl EngineSettings {
    pub fn wave_timeout(&self) -> Duration {
        Duration::from_secs(self.wave_timeout_secs.max(1))
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_from(&lookup, ENV_WAVE_TIMEOUT_SECS, &mut self.wave_timeout_secs);
        override_from(&lookup, ENV_MAX_WORKERS, &mut self.max_workers);
        override_from(&lookup, ENV_AUDIT_BUFFER, &mut self.audit_buffer);
        self
    }
}

fn override_from<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = %raw, "Ignoring invalid setting override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tracing_test::traced_test;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: EngineSettings = serde_json::from_str(r#"{"maxWorkers": 4}"#).unwrap();
        assert_eq!(settings.max_workers, 4);
        assert_eq!(settings.wave_timeout(), Duration::from_secs(300));
    }

    #[traced_test]
    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let env: HashMap<&str, &str> = [
            (ENV_WAVE_TIMEOUT_SECS, "5"),
            (ENV_MAX_WORKERS, "lots"),
        ]
        .into_iter()
        .collect();

        let settings = EngineSettings::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.wave_timeout_secs, 5);
        assert_eq!(settings.max_workers, 32);
        assert!(logs_contain("Ignoring invalid setting override"));
    }
}
