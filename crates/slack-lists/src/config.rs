//! Configuração imutável do cliente
//!
//! Construída uma única vez no início do processo e passada explicitamente
//! para `SlackListsClient` / `ListOperations`. Nenhum módulo do núcleo lê
//! variáveis de ambiente diretamente.

use crate::error::{Result, SlackListsError};
use crate::retry::RetryPolicy;
use std::fmt;
use std::time::Duration;

/// URL base da Web API do Slack
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

#[derive(Clone)]
pub struct ClientConfig {
    token: String,
    base_url: String,
    default_list_id: Option<String>,
    connect_timeout: Duration,
    retry: RetryPolicy,
}

impl ClientConfig {
    /// Cria a configuração com os valores padrão
    ///
    /// - base_url: `https://slack.com/api`
    /// - connect timeout: 5s
    /// - retry: `RetryPolicy::default()` (3 tentativas, timeout de 30s por tentativa)
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_list_id: None,
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_list_id(mut self, list_id: impl Into<String>) -> Self {
        let list_id = list_id.into();
        self.default_list_id = if list_id.trim().is_empty() {
            None
        } else {
            Some(list_id)
        };
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Falha com `ConfigError` se o token estiver vazio
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(SlackListsError::ConfigError(
                "Slack bot token is empty".to_string(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(SlackListsError::ConfigError("base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_list_id(&self) -> Option<&str> {
        self.default_list_id.as_deref()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Resolve o list_id da requisição, com fallback para o padrão do processo
    pub fn resolve_list_id(&self, explicit: Option<&str>) -> Result<String> {
        match explicit.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self.default_list_id.clone().ok_or_else(|| {
                SlackListsError::ValidationError(
                    "list_id is required. Either provide it as parameter or set DEFAULT_LIST_ID."
                        .to_string(),
                )
            }),
        }
    }
}

// Token nunca aparece em logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"***")
            .field("base_url", &self.base_url)
            .field("default_list_id", &self.default_list_id)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}
