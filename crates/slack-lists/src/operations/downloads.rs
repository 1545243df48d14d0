//! Exportação de listas (`slackLists.download.*`)

use super::items::require_id;
use super::ListOperations;
use crate::error::{Result, SlackListsError};
use crate::export::{
    ExportBackend, ExportJob, ExportJobController, ExportOptions, ExportOutcome, PollSchedule,
};
use crate::retry::Idempotency;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

#[async_trait]
impl ExportBackend for ListOperations {
    async fn start_job(&self, list_id: &str, options: &ExportOptions) -> Result<String> {
        let mut body = json!({ "list_id": list_id });
        if options.include_archived {
            body["include_archived"] = json!(true);
        }

        let response = self
            .invoke("slackLists.download.start", Idempotency::NonIdempotent, body)
            .await?;

        response
            .get("job_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SlackListsError::PermanentFailure {
                status: None,
                code: "invalid_response".to_string(),
                message: "slackLists.download.start returned no job_id".to_string(),
            })
    }

    async fn job_status(&self, list_id: &str, job_id: &str) -> Result<ExportJob> {
        let response = self
            .invoke(
                "slackLists.download.get",
                Idempotency::Idempotent,
                json!({ "list_id": list_id, "job_id": job_id }),
            )
            .await?;
        Ok(ExportJob::from_response(job_id, &response))
    }
}

impl ListOperations {
    /// Inicia a exportação e retorna o `job_id`
    pub async fn start_export(&self, list_id: Option<&str>, include_archived: bool) -> Result<String> {
        let list_id = self.list_id(list_id)?;
        ExportJobController::new(self)
            .start(&list_id, &ExportOptions { include_archived })
            .await
    }

    /// Uma consulta ao status do job
    pub async fn export_status(&self, list_id: Option<&str>, job_id: &str) -> Result<ExportJob> {
        let list_id = self.list_id(list_id)?;
        require_id("job_id", job_id)?;
        ExportJobController::new(self).poll(&list_id, job_id).await
    }

    /// Aguarda o job terminar; `TimedOut` quando o prazo esgota
    pub async fn wait_for_export(
        &self,
        list_id: Option<&str>,
        job_id: &str,
        timeout: Duration,
        schedule: PollSchedule,
    ) -> Result<ExportOutcome> {
        let list_id = self.list_id(list_id)?;
        require_id("job_id", job_id)?;
        ExportJobController::new(self)
            .wait_for(&list_id, job_id, timeout, schedule)
            .await
    }
}
