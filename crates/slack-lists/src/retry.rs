//! Execução resiliente de chamadas remotas
//!
//! `ResilientExecutor` envolve uma única chamada com:
//!
//! - timeout por tentativa
//! - retry com backoff exponencial (`base × 2^(tentativa−1)`, com jitter, limitado a `max_delay`)
//! - respeito ao `Retry-After` enviado pelo servidor em caso de rate limit
//! - regra de idempotência: operações não-idempotentes só repetem falhas que
//!   comprovadamente ocorreram antes de a operação ter efeito
//!
//! # Cancelamento
//!
//! Os únicos pontos de suspensão são a chamada em voo e o `sleep` do backoff.
//! Descartar o future retornado por `execute` interrompe imediatamente
//! qualquer retry pendente.

use crate::error::{FailureClass, Result, SlackListsError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Marca se repetir a operação às cegas é seguro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    Idempotent,
    /// Ex.: criação de item/lista, início de exportação
    NonIdempotent,
}

/// Política de retry (somente leitura após a construção)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Número máximo de tentativas, incluindo a primeira
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    attempt_timeout: Duration,
    jitter: bool,
}

impl RetryPolicy {
    /// Padrões:
    /// - `max_attempts`: 3
    /// - `base_delay`: 1s
    /// - `max_delay`: 30s
    /// - `attempt_timeout`: 30s
    /// - jitter habilitado
    pub const fn new() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(30),
            jitter: true,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay sem jitter após a tentativa `attempt` (1-indexada)
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Delay efetivo: nominal multiplicado por um fator aleatório em [0.5, 1.0]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let nominal = self.nominal_delay(attempt);
        if !self.jitter {
            return nominal;
        }
        let factor = rand::thread_rng().gen_range(0.5..=1.0);
        nominal.mul_f64(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Executor compartilhado por todas as operações de alto nível
#[derive(Debug, Clone, Default)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executa `call` aplicando timeout, retry e backoff
    ///
    /// # Retorno
    ///
    /// - `Ok(T)`: alguma tentativa teve sucesso
    /// - `Err(TransientFailure)`: falha recuperável após esgotar as tentativas
    ///   (ou falha ambígua numa operação não-idempotente, que não é repetida)
    /// - `Err(PermanentFailure)`: a API rejeitou a requisição (status/código preservados)
    /// - demais erros (validação, JSON) retornam intactos na primeira ocorrência
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        idempotency: Idempotency,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;

        loop {
            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(SlackListsError::Timeout(format!(
                    "{} exceeded {:?}",
                    operation, self.policy.attempt_timeout
                ))),
            };

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation, attempt, "✅ Operação bem-sucedida após retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let retryable = match (error.failure_class(), idempotency) {
                (FailureClass::Permanent, _) => return Err(error.into_permanent()),
                (FailureClass::RetryableBeforeEffect, _) => true,
                (FailureClass::RetryableAmbiguous, Idempotency::Idempotent) => true,
                (FailureClass::RetryableAmbiguous, Idempotency::NonIdempotent) => false,
            };

            if !retryable {
                tracing::warn!(
                    operation,
                    attempt,
                    error = %error,
                    "⚠️ Falha ambígua em operação não-idempotente, sem retry"
                );
                return Err(SlackListsError::TransientFailure {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            if attempt >= self.policy.max_attempts {
                tracing::error!(
                    operation,
                    attempts = attempt,
                    error = %error,
                    "❌ Tentativas esgotadas"
                );
                return Err(SlackListsError::TransientFailure {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = match &error {
                SlackListsError::ApiError {
                    retry_after: Some(retry_after),
                    ..
                } => *retry_after,
                _ => self.policy.backoff_delay(attempt),
            };

            tracing::warn!(
                operation,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "🔄 Falha recuperável, novo retry agendado"
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
