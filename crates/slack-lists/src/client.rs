//! Cliente HTTP para a Web API do Slack

use crate::config::ClientConfig;
use crate::error::{human_message, Result, SlackListsError};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Cliente de baixo nível: uma chamada = um POST `{base_url}/{method}`
///
/// Não faz retry; isso é papel do `ResilientExecutor`.
#[derive(Clone)]
pub struct SlackListsClient {
    http_client: HttpClient,
    token: String,
    base_url: String,
}

impl SlackListsClient {
    /// Cria o cliente a partir da configuração já validada
    ///
    /// # Timeouts
    ///
    /// - Connect: `ClientConfig::connect_timeout` (padrão 5s)
    /// - Total: timeout por tentativa da política de retry (padrão 30s)
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_client = HttpClient::builder()
            .timeout(config.retry_policy().attempt_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| {
                SlackListsError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            token: config.token().to_string(),
            base_url: config.base_url().to_string(),
        })
    }

    /// Chama um método da API (`slackLists.items.create`, ...) e retorna o
    /// corpo JSON de sucesso (`ok: true`)
    pub async fn call(&self, method: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, method);

        tracing::debug!("POST {} with body: {}", url, body);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(body)
            .send()
            .await?;

        self.handle_response(method, response).await
    }

    /// Processa a resposta HTTP e o envelope `{ok, error}` do Slack
    async fn handle_response(&self, method: &str, response: Response) -> Result<Value> {
        let status = response.status();
        let retry_after = parse_retry_after(&response);

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("⏳ Rate limit em {} (retry-after: {:?})", method, retry_after);
            return Err(SlackListsError::ApiError {
                status: status.as_u16(),
                code: "rate_limited".to_string(),
                message: human_message("rate_limited").to_string(),
                retry_after,
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Slack API error ({}) em {}: {}", status.as_u16(), method, body);

            // Tentar extrair o código de erro do JSON
            let code = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| json.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("http_{}", status.as_u16()));

            return Err(SlackListsError::ApiError {
                status: status.as_u16(),
                message: human_message(&code).to_string(),
                code,
                retry_after,
            });
        }

        let json: Value = serde_json::from_str(&body)?;

        if json.get("ok").and_then(Value::as_bool) != Some(true) {
            let code = json
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();

            tracing::error!("Slack API error em {}: {}", method, code);

            return Err(SlackListsError::ApiError {
                status: status.as_u16(),
                message: human_message(&code).to_string(),
                code,
                retry_after,
            });
        }

        Ok(json)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
