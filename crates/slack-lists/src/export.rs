//! Jobs de exportação (`slackLists.download.*`)
//!
//! ```text
//! Pending -> Processing -> Completed
//!                       -> Failed
//! ```
//!
//! `wait_for` pode ainda devolver `TimedOut` sem alterar o job remoto: o
//! chamador decide se continua esperando com uma nova chamada.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn from_api(status: &str) -> Self {
        match status {
            "pending" | "queued" | "not_started" => Self::Pending,
            "completed" | "complete" | "done" | "success" => Self::Completed,
            "failed" | "error" | "cancelled" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// Estado de um job observado em uma consulta
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportJob {
    pub job_id: String,
    pub status: ExportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportJob {
    /// Interpreta a resposta de `slackLists.download.get`
    ///
    /// Sem campo `status` explícito, a presença de `download_url` indica que o
    /// job terminou; caso contrário ainda está em processamento.
    pub fn from_response(job_id: impl Into<String>, response: &Value) -> Self {
        let download_url = response
            .get("download_url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let status = match response.get("status").and_then(Value::as_str) {
            Some(status) => ExportStatus::from_api(status),
            None if download_url.is_some() => ExportStatus::Completed,
            None => ExportStatus::Processing,
        };

        Self {
            job_id: job_id.into(),
            status,
            download_url,
            error: response
                .get("error")
                .or_else(|| response.get("job_error"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Resultado final de `wait_for`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Completed {
        job_id: String,
        download_url: String,
    },
    Failed {
        job_id: String,
        error: String,
    },
    /// Prazo do chamador esgotado; o job continua no servidor
    TimedOut {
        job_id: String,
        last_status: ExportStatus,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_archived: bool,
}

/// Operações remotas usadas pelo controlador
#[async_trait]
pub trait ExportBackend: Send + Sync {
    /// Inicia o job e retorna seu ID
    async fn start_job(&self, list_id: &str, options: &ExportOptions) -> Result<String>;

    async fn job_status(&self, list_id: &str, job_id: &str) -> Result<ExportJob>;
}

/// Intervalo entre consultas: fixo ou crescente
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
}

impl PollSchedule {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            multiplier: 1.0,
            max_interval: interval,
        }
    }

    pub fn backoff(initial: Duration, multiplier: f64, max_interval: Duration) -> Self {
        Self {
            interval: initial,
            multiplier: multiplier.max(1.0),
            max_interval: max_interval.max(initial),
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

impl Default for PollSchedule {
    /// 2s fixo
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

/// Prazo padrão de `wait_for`
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Prazos maiores que este são reduzidos a ele
pub const MAX_EXPORT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub struct ExportJobController<'a, B: ExportBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: ExportBackend + ?Sized> ExportJobController<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Inicia o job. Falhas voltam direto (a chamada é não-idempotente).
    pub async fn start(&self, list_id: &str, options: &ExportOptions) -> Result<String> {
        let job_id = self.backend.start_job(list_id, options).await?;
        tracing::info!("📦 Exportação iniciada: list={} job={}", list_id, job_id);
        Ok(job_id)
    }

    /// Uma única consulta de status
    pub async fn poll(&self, list_id: &str, job_id: &str) -> Result<ExportJob> {
        self.backend.job_status(list_id, job_id).await
    }

    /// Consulta até um estado terminal ou até `timeout`
    ///
    /// A última consulta acontece no máximo em `timeout` (limitado a
    /// `MAX_EXPORT_TIMEOUT`); o sleep final é encurtado para não ultrapassar
    /// o prazo.
    pub async fn wait_for(
        &self,
        list_id: &str,
        job_id: &str,
        timeout: Duration,
        schedule: PollSchedule,
    ) -> Result<ExportOutcome> {
        let timeout = timeout.min(MAX_EXPORT_TIMEOUT);
        // None: o relógio não representa o prazo, consulta sem limite
        let deadline = Instant::now().checked_add(timeout);
        let mut interval = schedule.interval;
        let mut polls = 0u32;

        loop {
            let job = self.poll(list_id, job_id).await?;
            polls += 1;

            match job.status {
                ExportStatus::Completed => {
                    if let Some(download_url) = job.download_url {
                        tracing::info!("✅ Exportação concluída após {} consulta(s): {}", polls, job_id);
                        return Ok(ExportOutcome::Completed {
                            job_id: job.job_id,
                            download_url,
                        });
                    }
                    // concluído sem URL ainda: segue consultando
                }
                ExportStatus::Failed => {
                    tracing::warn!("❌ Exportação falhou: {}", job_id);
                    return Ok(ExportOutcome::Failed {
                        job_id: job.job_id,
                        error: job.error.unwrap_or_else(|| "export job failed".to_string()),
                    });
                }
                ExportStatus::Pending | ExportStatus::Processing => {}
            }

            let now = Instant::now();
            if deadline.map_or(false, |deadline| now >= deadline) {
                tracing::warn!(
                    "⏱️ Exportação {} não terminou em {:?} (status: {:?})",
                    job_id,
                    timeout,
                    job.status
                );
                return Ok(ExportOutcome::TimedOut {
                    job_id: job.job_id,
                    last_status: job.status,
                });
            }

            let remaining = deadline.map_or(interval, |deadline| deadline.saturating_duration_since(now));
            tokio::time::sleep(interval.min(remaining)).await;
            interval = schedule.next_interval(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Backend que devolve uma sequência fixa de respostas de status;
    /// a última se repete indefinidamente
    struct ScriptedBackend {
        responses: Vec<Value>,
        polls: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Value>) -> Self {
            Self {
                responses,
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> usize {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ExportBackend for ScriptedBackend {
        async fn start_job(&self, _list_id: &str, _options: &ExportOptions) -> Result<String> {
            Ok("LeF123".to_string())
        }

        async fn job_status(&self, _list_id: &str, job_id: &str) -> Result<ExportJob> {
            let mut polls = self.polls.lock().unwrap();
            let response = &self.responses[(*polls).min(self.responses.len() - 1)];
            *polls += 1;
            Ok(ExportJob::from_response(job_id, response))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_walks_states_until_completed() {
        let backend = ScriptedBackend::new(vec![
            json!({"ok": true, "status": "pending"}),
            json!({"ok": true, "status": "processing"}),
            json!({"ok": true, "status": "completed", "download_url": "https://files.slack.com/x.csv"}),
        ]);
        let controller = ExportJobController::new(&backend);

        let job_id = controller.start("F1", &ExportOptions::default()).await.unwrap();
        let outcome = controller
            .wait_for("F1", &job_id, DEFAULT_EXPORT_TIMEOUT, PollSchedule::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::Completed {
                job_id: "LeF123".to_string(),
                download_url: "https://files.slack.com/x.csv".to_string(),
            }
        );
        assert_eq!(backend.polls(), 3);

        let rendered = serde_json::to_value(&outcome).unwrap();
        assert_eq!(rendered["status"], "completed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_on_second_poll_stops_polling() {
        let backend = ScriptedBackend::new(vec![
            json!({"ok": true}),
            json!({"ok": true, "download_url": "https://files.slack.com/y.csv"}),
            json!({"ok": true, "status": "failed"}),
        ]);
        let controller = ExportJobController::new(&backend);

        let outcome = controller
            .wait_for("F1", "LeF123", DEFAULT_EXPORT_TIMEOUT, PollSchedule::default())
            .await
            .unwrap();

        assert!(matches!(outcome, ExportOutcome::Completed { .. }));
        assert_eq!(backend.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_returns_timed_out() {
        let backend = ScriptedBackend::new(vec![json!({"ok": true, "status": "processing"})]);
        let controller = ExportJobController::new(&backend);

        let started = Instant::now();
        let outcome = controller
            .wait_for(
                "F1",
                "LeF123",
                Duration::from_secs(10),
                PollSchedule::backoff(Duration::from_secs(1), 2.0, Duration::from_secs(4)),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::TimedOut {
                job_id: "LeF123".to_string(),
                last_status: ExportStatus::Processing,
            }
        );
        assert!(started.elapsed() <= Duration::from_secs(10));
        // t = 0, 1, 3, 7, 10
        assert_eq!(backend.polls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_does_not_overflow() {
        let backend = ScriptedBackend::new(vec![
            json!({"ok": true, "status": "processing"}),
            json!({"ok": true, "status": "completed", "download_url": "https://files.slack.com/z.csv"}),
        ]);
        let controller = ExportJobController::new(&backend);

        let outcome = controller
            .wait_for("F1", "LeF123", Duration::from_secs(u64::MAX), PollSchedule::default())
            .await
            .unwrap();

        assert!(matches!(outcome, ExportOutcome::Completed { .. }));
        assert_eq!(backend.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_capped() {
        let backend = ScriptedBackend::new(vec![json!({"ok": true, "status": "pending"})]);
        let controller = ExportJobController::new(&backend);

        let started = Instant::now();
        let outcome = controller
            .wait_for(
                "F1",
                "LeF123",
                Duration::from_secs(u64::MAX),
                PollSchedule::backoff(Duration::from_secs(600), f64::INFINITY, Duration::from_secs(600)),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ExportOutcome::TimedOut { .. }));
        assert!(started.elapsed() >= MAX_EXPORT_TIMEOUT);
        assert!(started.elapsed() < MAX_EXPORT_TIMEOUT + Duration::from_secs(1));
        // t = 0, 10, 20, ..., 60 min
        assert_eq!(backend.polls(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_wait_for_stops_polling() {
        let backend = ScriptedBackend::new(vec![json!({"ok": true, "status": "processing"})]);
        let controller = ExportJobController::new(&backend);

        // consultas em t = 0 e 2s; descartado em 3s
        let pending = controller.wait_for("F1", "LeF123", DEFAULT_EXPORT_TIMEOUT, PollSchedule::default());
        let result = tokio::time::timeout(Duration::from_secs(3), pending).await;
        assert!(result.is_err());
        assert_eq!(backend.polls(), 2);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_is_an_outcome() {
        let backend =
            ScriptedBackend::new(vec![json!({"ok": true, "status": "failed", "job_error": "too_large"})]);
        let controller = ExportJobController::new(&backend);

        let outcome = controller
            .wait_for("F1", "LeF123", DEFAULT_EXPORT_TIMEOUT, PollSchedule::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::Failed {
                job_id: "LeF123".to_string(),
                error: "too_large".to_string(),
            }
        );
    }

    #[test]
    fn test_status_mapping_without_explicit_status() {
        let job = ExportJob::from_response("J1", &json!({"ok": true, "download_url": ""}));
        assert_eq!(job.status, ExportStatus::Processing);
        assert!(!job.status.is_terminal());

        let job = ExportJob::from_response("J1", &json!({"ok": true, "download_url": "https://x"}));
        assert_eq!(job.status, ExportStatus::Completed);
        assert!(job.status.is_terminal());
    }
}
