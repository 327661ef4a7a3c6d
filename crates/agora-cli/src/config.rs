//! Configuration file loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use agora_search::SearchConfig;

/// Top-level configuration file.
///
/// ```toml
/// [search]
/// enabled = true
/// results_per_page = 20
///
/// [search.boosts.topic]
/// solved = 1.1
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search engine section.
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Built-in defaults with the recommended boost table.
    pub fn recommended() -> Self {
        Self {
            search: SearchConfig::recommended(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[search]\nresults_per_page = 5\n\n[search.boosts.topic]\nsolved = 1.4\n"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.search.results_per_page, 5);
        assert!(config.search.enabled);
        assert_eq!(
            config
                .search
                .boosts
                .factor(agora_search::DocumentKind::Topic, "solved"),
            1.4
        );
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(AppConfig::load(Path::new("/nonexistent/agora.toml")).is_err());
    }
}
