//! Tipos de erro para o crate slack-lists
//!
//! A taxonomia separa três famílias que o chamador precisa distinguir:
//!
//! - **Entrada inválida** (`ValidationError`, `UnsupportedFieldType`, `InvalidFilter`):
//!   detectada antes de qualquer chamada de rede, nunca sofre retry.
//! - **Falha transitória** (`TransientFailure`): o retry interno esgotou as tentativas.
//! - **Falha permanente** (`PermanentFailure`): a API rejeitou a requisição e
//!   repetir não resolve (token inválido, lista inexistente, sem permissão).

use std::time::Duration;
use thiserror::Error;

/// Códigos de erro do Slack que indicam falha recuperável
pub const RETRYABLE_ERROR_CODES: &[&str] = &[
    "rate_limited",
    "ratelimited",
    "service_unavailable",
    "internal_error",
    "request_timeout",
    "fatal_error",
];

/// Erros do cliente Slack Lists
#[derive(Debug, Error)]
pub enum SlackListsError {
    /// Erro de requisição HTTP (conexão, timeout de socket, corpo ilegível)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resposta de erro da API (HTTP não-2xx ou `ok: false`)
    #[error("Slack API error (status {status}, code {code}): {message}")]
    ApiError {
        status: u16,
        code: String,
        message: String,
        /// Valor do header `Retry-After`, quando presente
        retry_after: Option<Duration>,
    },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Tentativa individual excedeu o timeout configurado
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Entrada malformada (tipo de valor incorreto, identificador ausente,
    /// parâmetros mutuamente exclusivos)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Tipo de campo desconhecido durante a normalização
    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(String),

    /// Operador desconhecido ou operando incompatível com o operador
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Tentativas esgotadas contra uma falha recuperável
    #[error("Transient failure after {attempts} attempt(s): {source}")]
    TransientFailure {
        attempts: u32,
        #[source]
        source: Box<SlackListsError>,
    },

    /// A API rejeitou a requisição por motivo não recuperável
    #[error("Permanent failure ({code}): {message}")]
    PermanentFailure {
        status: Option<u16>,
        code: String,
        message: String,
    },
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, SlackListsError>;

/// Classificação de uma falha para fins de retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A requisição comprovadamente não teve efeito (conexão recusada, rate limit)
    RetryableBeforeEffect,
    /// Recuperável, mas a requisição pode ter sido aplicada (timeout após envio, 5xx)
    RetryableAmbiguous,
    /// Não adianta repetir
    Permanent,
}

impl SlackListsError {
    /// Cria um `ApiError` sem `Retry-After`
    pub fn api(status: u16, code: impl Into<String>) -> Self {
        let code = code.into();
        Self::ApiError {
            status,
            message: human_message(&code).to_string(),
            code,
            retry_after: None,
        }
    }

    /// Classifica a falha para o executor resiliente
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::HttpError(e) if e.is_connect() => FailureClass::RetryableBeforeEffect,
            Self::HttpError(e) if e.is_timeout() || e.is_request() => {
                FailureClass::RetryableAmbiguous
            }
            Self::ApiError { status, code, .. } if *status == 429 || is_rate_limit_code(code) => {
                FailureClass::RetryableBeforeEffect
            }
            Self::ApiError { status, .. } if *status >= 500 => FailureClass::RetryableAmbiguous,
            Self::ApiError { code, .. } if RETRYABLE_ERROR_CODES.contains(&code.as_str()) => {
                FailureClass::RetryableAmbiguous
            }
            Self::Timeout(_) => FailureClass::RetryableAmbiguous,
            _ => FailureClass::Permanent,
        }
    }

    /// Tag estável (snake_case) exposta na fronteira de ferramentas
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HttpError(_) => "http_error",
            Self::ApiError { .. } => "api_error",
            Self::JsonError(_) => "json_error",
            Self::ConfigError(_) => "config_error",
            Self::Timeout(_) => "timeout",
            Self::ValidationError(_) => "validation_error",
            Self::UnsupportedFieldType(_) => "unsupported_field_type",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::TransientFailure { .. } => "transient_failure",
            Self::PermanentFailure { .. } => "permanent_failure",
        }
    }

    /// Status HTTP original da API, quando conhecido
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            Self::ApiError { status, .. } => Some(*status),
            Self::PermanentFailure { status, .. } => *status,
            Self::TransientFailure { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Código de erro do Slack (`list_not_found`, `invalid_auth`, ...)
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::ApiError { code, .. } | Self::PermanentFailure { code, .. } => Some(code),
            Self::TransientFailure { source, .. } => source.error_code(),
            _ => None,
        }
    }

    /// `true` quando o chamador pode tentar novamente mais tarde
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransientFailure { .. } => true,
            other => other.failure_class() != FailureClass::Permanent,
        }
    }

    /// `true` para erros de entrada ("corrija sua requisição")
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::UnsupportedFieldType(_) | Self::InvalidFilter(_)
        )
    }

    /// Converte um erro de API não recuperável em `PermanentFailure`,
    /// preservando status e código. Outros erros passam intactos.
    pub(crate) fn into_permanent(self) -> Self {
        match self {
            Self::ApiError {
                status,
                code,
                message,
                ..
            } => Self::PermanentFailure {
                status: Some(status),
                code,
                message,
            },
            other => other,
        }
    }
}

fn is_rate_limit_code(code: &str) -> bool {
    matches!(code, "rate_limited" | "ratelimited" | "too_many_requests")
}

/// Mensagem legível para códigos de erro comuns da API
pub fn human_message(code: &str) -> &str {
    match code {
        "invalid_arguments" => "Invalid parameters provided. Check field formats and required values.",
        "invalid_request" => "Malformed request or missing required parameters.",
        "list_not_found" => "List not found. The list may have been deleted or you don't have access.",
        "item_not_found" => "Item not found in the list. It may have been deleted.",
        "not_found" => "Resource not found. The requested item, list, or resource doesn't exist.",
        "access_denied" => "Access denied. You don't have permission to perform this action.",
        "rate_limited" | "ratelimited" => "Rate limited. Too many requests - please wait and retry.",
        "too_many_requests" => "Too many requests. Please slow down and retry.",
        "not_authed" => "Authentication failed. Check your Slack bot token.",
        "invalid_auth" => "Invalid authentication. The token may be revoked or invalid.",
        "account_inactive" => "The Slack account is inactive or deleted.",
        "missing_scope" => "Missing required OAuth scope. Check bot permissions.",
        "channel_not_found" => "Channel not found or bot doesn't have access.",
        "user_not_found" => "User not found in the workspace.",
        "cant_update_message" => "Cannot update this item. It may be locked or archived.",
        "is_archived" => "Cannot modify archived list or item.",
        "restricted_action" => "This action is restricted by workspace settings.",
        "ekm_access_denied" => "Access denied by Enterprise Key Management.",
        "invalid_cursor" => "Invalid pagination cursor. Start from the beginning.",
        "fatal_error" => "A fatal server error occurred. Please try again later.",
        "invalid_blocks" => "Invalid Block Kit formatting in text fields. Check rich_text structure.",
        "failed_to_parse_block_kit" => {
            "Block Kit parsing error. Ensure rich_text follows Block Kit format."
        }
        other => other,
    }
}
