use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).label().to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add("region", self.region().to_string());
        add("stack_prefix", self.stack_prefix().to_string());
        if let Some(url) = &self.defaults.backend_url {
            add("backend_url", url.clone());
        }
        match &self.infrastructure {
            Some(infra) => {
                add("infrastructure", format!("{} ({})", infra.vpc_id, infra.zone_name));
            }
            None => add("infrastructure", "(not configured)".to_string()),
        }

        config
    }
}
