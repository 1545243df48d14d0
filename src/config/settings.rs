use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use slack_lists::{ClientConfig, RetryPolicy};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub slack: SlackSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SlackSettings {
    /// Bot token (`xoxb-...`)
    #[serde(default)]
    pub token: String,
    /// Lista usada quando a ferramenta não recebe `list_id`
    #[serde(default)]
    pub default_list_id: Option<String>,
    pub base_url: String,
    /// Timeout por tentativa, em segundos
    pub timeout_secs: u64,
    /// Tentativas por chamada (incluindo a primeira)
    pub retry_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Variáveis de ambiente reconhecidas -> chave da configuração
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SLACK_BOT_TOKEN", "slack.token"),
    ("DEFAULT_LIST_ID", "slack.default_list_id"),
    ("SLACK_API_TIMEOUT", "slack.timeout_secs"),
    ("SLACK_RETRY_COUNT", "slack.retry_count"),
    ("SLACK_API_BASE_URL", "slack.base_url"),
    ("PORT", "server.port"),
    ("LOG_LEVEL", "logging.level"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::build(&run_mode, |name| std::env::var(name).ok())
    }

    /// Padrões -> `config/default` -> `config/{run_mode}` -> variáveis de ambiente
    pub fn build<F>(run_mode: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("slack.base_url", slack_lists::config::DEFAULT_BASE_URL)?
            .set_default("slack.timeout_secs", 30)?
            .set_default("slack.retry_count", 3)?
            .set_default("logging.level", "info")?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("SLACK_LISTS").separator("__"));

        for (name, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                builder = builder.set_override(*key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Configuração imutável do núcleo
    pub fn client_config(&self) -> slack_lists::Result<ClientConfig> {
        let retry = RetryPolicy::new()
            .with_max_attempts(self.slack.retry_count)
            .with_attempt_timeout(Duration::from_secs(self.slack.timeout_secs.max(1)));

        let mut config = ClientConfig::new(self.slack.token.clone())
            .with_base_url(self.slack.base_url.clone())
            .with_retry_policy(retry);

        if let Some(list_id) = &self.slack.default_list_id {
            config = config.with_default_list_id(list_id.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
