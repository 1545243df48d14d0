//! Superfície de ferramentas: `POST /tools/{nome}` com um objeto JSON de argumentos
//!
//! Cada ferramenta é uma chamada fina sobre `ListOperations`. O `list_id`
//! ausente cai no `DEFAULT_LIST_ID` configurado.

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use slack_lists::export::{DEFAULT_EXPORT_TIMEOUT, MAX_EXPORT_TIMEOUT};
use slack_lists::{
    AddItemRequest, CreateListRequest, DeleteAccessRequest, ListItemsRequest, ListOperations,
    PollSchedule, SetAccessRequest, UpdateItemsRequest, UpdateListRequest,
};
use slack_lists_middleware::utils::logging::*;
use slack_lists_middleware::utils::{AppError, AppResult};
use slack_lists_middleware::AppState;

pub const TOOL_NAMES: &[&str] = &[
    "add_list_item",
    "update_list_item",
    "delete_list_item",
    "delete_list_items",
    "get_list_item",
    "list_items",
    "get_list_info",
    "get_list_structure",
    "create_list",
    "update_list",
    "delete_list",
    "set_list_access",
    "delete_list_access",
    "start_list_export",
    "get_list_export_url",
    "wait_for_export",
];

#[derive(Debug, Default, Deserialize)]
struct ListArgs {
    #[serde(default)]
    list_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemArgs {
    #[serde(default)]
    list_id: Option<String>,
    item_id: String,
    #[serde(default)]
    include_is_subscribed: bool,
}

#[derive(Debug, Deserialize)]
struct ItemsArgs {
    #[serde(default)]
    list_id: Option<String>,
    item_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteListArgs {
    list_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct StartExportArgs {
    #[serde(default)]
    list_id: Option<String>,
    #[serde(default)]
    include_archived: bool,
}

#[derive(Debug, Deserialize)]
struct ExportArgs {
    #[serde(default)]
    list_id: Option<String>,
    job_id: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
}

pub async fn list_tools() -> Json<Value> {
    log_request_received("/tools", "GET");
    Json(json!({
        "success": true,
        "tools": TOOL_NAMES,
        "count": TOOL_NAMES.len()
    }))
}

pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let endpoint = format!("/tools/{}", name);
    log_request_received(&endpoint, "POST");

    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("tool", name = %name, request_id = %request_id);
    let start_time = Instant::now();

    let result = async {
        log_tool_call(&name, &request_id);
        let args = parse_body(&body)?;
        dispatch(&state.operations, &name, args).await
    }
    .instrument(span)
    .await;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    match result {
        Ok(payload) => {
            log_tool_completed(&name, duration_ms);
            log_request_processed(&endpoint, 200, duration_ms);
            Ok(Json(success(payload)))
        }
        Err(e) => {
            log_tool_failed(&name, e.kind(), &e.to_string());
            log_request_processed(&endpoint, e.status().as_u16(), duration_ms);
            Err(e)
        }
    }
}

/// Corpo vazio equivale a `{}`
fn parse_body(body: &[u8]) -> AppResult<Value> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(json!({}));
    }
    let args: Value = serde_json::from_slice(body)?;
    if !args.is_object() {
        return Err(AppError::InvalidArguments(
            "tool arguments must be a JSON object".to_string(),
        ));
    }
    Ok(args)
}

fn args<T: DeserializeOwned>(args: Value) -> AppResult<T> {
    Ok(serde_json::from_value(args)?)
}

fn payload<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))
}

fn success(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        other => json!({ "success": true, "result": other }),
    }
}

/// `timeout_secs` do chamador, limitado a `MAX_EXPORT_TIMEOUT`
fn export_timeout(timeout_secs: Option<u64>) -> Duration {
    timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_EXPORT_TIMEOUT)
        .min(MAX_EXPORT_TIMEOUT)
}

async fn dispatch(ops: &ListOperations, name: &str, raw: Value) -> AppResult<Value> {
    match name {
        "add_list_item" => {
            let item = ops.add_item(args::<AddItemRequest>(raw)?).await?;
            Ok(json!({ "item": payload(&item)? }))
        }
        "update_list_item" => payload(&ops.update_items(args::<UpdateItemsRequest>(raw)?).await?),
        "delete_list_item" => {
            let a: ItemArgs = args(raw)?;
            Ok(ops.delete_item(a.list_id.as_deref(), &a.item_id).await?)
        }
        "delete_list_items" => {
            let a: ItemsArgs = args(raw)?;
            Ok(ops.delete_items(a.list_id.as_deref(), &a.item_ids).await?)
        }
        "get_list_item" => {
            let a: ItemArgs = args(raw)?;
            let details = ops
                .get_item(a.list_id.as_deref(), &a.item_id, a.include_is_subscribed)
                .await?;
            payload(&details)
        }
        "list_items" => payload(&ops.list_items(args::<ListItemsRequest>(raw)?).await?),
        "get_list_info" => {
            let a: ListArgs = args(raw)?;
            Ok(json!({ "list": ops.get_list(a.list_id.as_deref()).await? }))
        }
        "get_list_structure" => {
            let a: ListArgs = args(raw)?;
            payload(&ops.get_list_structure(a.list_id.as_deref()).await?)
        }
        "create_list" => Ok(ops.create_list(args::<CreateListRequest>(raw)?).await?),
        "update_list" => Ok(ops.update_list(args::<UpdateListRequest>(raw)?).await?),
        "delete_list" => {
            let a: DeleteListArgs = args(raw)?;
            Ok(ops.delete_list(&a.list_id).await?)
        }
        "set_list_access" => Ok(ops.set_access(args::<SetAccessRequest>(raw)?).await?),
        "delete_list_access" => Ok(ops.delete_access(args::<DeleteAccessRequest>(raw)?).await?),
        "start_list_export" => {
            let a: StartExportArgs = args(raw)?;
            let job_id = ops
                .start_export(a.list_id.as_deref(), a.include_archived)
                .await?;
            Ok(json!({ "job_id": job_id, "status": "processing" }))
        }
        "get_list_export_url" => {
            let a: ExportArgs = args(raw)?;
            payload(&ops.export_status(a.list_id.as_deref(), &a.job_id).await?)
        }
        "wait_for_export" => {
            let a: ExportArgs = args(raw)?;
            let timeout = export_timeout(a.timeout_secs);
            let schedule = match a.poll_interval_secs {
                Some(secs) => PollSchedule::fixed(Duration::from_secs(secs.max(1))),
                None => PollSchedule::default(),
            };
            let outcome = ops
                .wait_for_export(a.list_id.as_deref(), &a.job_id, timeout, schedule)
                .await?;
            payload(&outcome)
        }
        other => Err(AppError::UnknownTool(other.to_string())),
    }
}
