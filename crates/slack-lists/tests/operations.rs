//! Testes HTTP de ListOperations contra um servidor simulado

use futures_util::StreamExt;
use httpmock::prelude::*;
use serde_json::json;
use slack_lists::{
    AddItemRequest, ClientConfig, CreateListRequest, ExportOutcome, FilterEngine,
    ListItemsRequest, ListOperations, PollSchedule, RetryPolicy, SetAccessRequest,
    SlackListsError, UpdateItemsRequest,
};
use std::time::Duration;

fn operations(server: &MockServer) -> ListOperations {
    let config = ClientConfig::new("xoxb-test")
        .with_base_url(server.base_url())
        .with_default_list_id("F1")
        .with_retry_policy(
            RetryPolicy::new()
                .with_base_delay(Duration::from_millis(10))
                .with_max_delay(Duration::from_millis(20))
                .with_jitter(false),
        );
    ListOperations::new(config).unwrap()
}

fn rich_text(text: &str) -> serde_json::Value {
    json!([{
        "type": "rich_text",
        "elements": [{"type": "rich_text_section", "elements": [{"type": "text", "text": text}]}]
    }])
}

#[tokio::test]
async fn test_add_item_sends_canonical_rich_text() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.create")
                .header("authorization", "Bearer xoxb-test")
                .json_body(json!({
                    "list_id": "F1",
                    "initial_fields": [
                        {"column_id": "Col1", "rich_text": rich_text("Buy milk")},
                        {"column_id": "Col2", "select": ["OptA"]}
                    ]
                }));
            then.status(200).json_body(json!({
                "ok": true,
                "item": {
                    "id": "Rec1",
                    "list_id": "F1",
                    "fields": [
                        {"key": "name", "column_id": "Col1", "rich_text": rich_text("Buy milk")},
                        {"key": "status", "column_id": "Col2", "select": ["OptA"]}
                    ]
                }
            }));
        })
        .await;

    let ops = operations(&server);
    let item = ops
        .add_item(AddItemRequest {
            initial_fields: vec![
                json!({"column": "Col1", "text": "Buy milk"}),
                json!({"column_id": "Col2", "select": "OptA"}),
            ],
            ..Default::default()
        })
        .await
        .unwrap();

    create.assert_async().await;
    assert_eq!(item.id, "Rec1");
    assert_eq!(item.field("name").unwrap().plain_text().as_deref(), Some("Buy milk"));
    assert_eq!(item.fields[0].payload["text"], "Buy milk");
}

#[tokio::test]
async fn test_validation_errors_make_no_calls() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;

    let ops = operations(&server);

    let err = ops
        .add_item(AddItemRequest {
            initial_fields: vec![json!({"column_id": "Col3", "checkbox": "yes"})],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SlackListsError::ValidationError(_)));

    let err = ops
        .list_items(ListItemsRequest {
            filters: Some(json!({"status": {"like": "todo"}})),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SlackListsError::InvalidFilter(_)));

    let err = ops
        .set_access(SetAccessRequest {
            list_id: None,
            access_level: slack_lists::AccessLevel::Owner,
            user_ids: Vec::new(),
            channel_ids: vec!["C1".to_string()],
        })
        .await
        .unwrap_err();
    assert!(err.is_input_error());

    let err = ops
        .update_items(UpdateItemsRequest {
            list_id: None,
            cells: vec![json!({"column_id": "Col1", "text": "x"})],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SlackListsError::ValidationError(_)));

    assert_eq!(any.hits_async().await, 0);
}

#[tokio::test]
async fn test_ok_false_is_permanent_failure() {
    let server = MockServer::start_async().await;
    let info = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.info");
            then.status(200)
                .json_body(json!({"ok": false, "error": "list_not_found"}));
        })
        .await;

    let err = operations(&server)
        .get_item(None, "Rec1", false)
        .await
        .unwrap_err();

    info.assert_hits_async(1).await;
    match &err {
        SlackListsError::PermanentFailure { status, code, .. } => {
            assert_eq!(*status, Some(200));
            assert_eq!(code, "list_not_found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_errors_are_retried_until_exhausted() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.list");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let err = operations(&server)
        .list_items(ListItemsRequest::default())
        .await
        .unwrap_err();

    list.assert_hits_async(3).await;
    assert!(matches!(err, SlackListsError::TransientFailure { attempts: 3, .. }));
    assert_eq!(err.status_code(), Some(503));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_create_is_not_retried_on_server_error() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.create");
            then.status(500).json_body(json!({"ok": false, "error": "internal_error"}));
        })
        .await;

    let err = operations(&server)
        .add_item(AddItemRequest {
            initial_fields: vec![json!({"column_id": "Col1", "text": "Buy milk"})],
            ..Default::default()
        })
        .await
        .unwrap_err();

    create.assert_hits_async(1).await;
    assert!(matches!(err, SlackListsError::TransientFailure { attempts: 1, .. }));
}

#[tokio::test]
async fn test_rate_limit_is_retried_even_for_create() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.create");
            then.status(429).header("Retry-After", "0");
        })
        .await;

    let err = operations(&server)
        .add_item(AddItemRequest {
            duplicated_item_id: Some("Rec1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    create.assert_hits_async(3).await;
    assert_eq!(err.error_code(), Some("rate_limited"));
}

#[tokio::test]
async fn test_list_items_with_filters_walks_pages() {
    let server = MockServer::start_async().await;

    let item = |id: &str, status: &str| json!({"id": id, "fields": [{"key": "status", "column_id": "Col2", "select": [status]}]});

    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 6}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec1", "todo"), item("Rec2", "done")],
                "response_metadata": {"next_cursor": "c2"}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 6, "cursor": "c2"}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec3", "doing"), item("Rec4", "todo")],
                "response_metadata": {"next_cursor": "c3"}
            }));
        })
        .await;

    let page = operations(&server)
        .list_items(ListItemsRequest {
            limit: Some(2),
            filters: Some(json!({"status": {"in": ["todo", "doing"]}})),
            ..Default::default()
        })
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["Rec1", "Rec3"]);
    assert_eq!(page.total, 2);
    assert!(page.has_more);
    // Rec4 também casa: o cursor volta para a página c2 em vez de pular para c3
    assert_eq!(page.next_cursor.as_deref(), Some("resume:1:6:c2"));
}

#[tokio::test]
async fn test_list_items_cursor_walk_returns_every_match() {
    let server = MockServer::start_async().await;

    let item = |id: &str| json!({"id": id, "fields": [{"key": "status", "column_id": "Col2", "select": ["todo"]}]});

    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 3}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec1"), item("Rec2"), item("Rec3")],
                "response_metadata": {"next_cursor": "c2"}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 3, "cursor": "c2"}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec4")],
                "response_metadata": {"next_cursor": ""}
            }));
        })
        .await;

    let ops = operations(&server);
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    for _ in 0..10 {
        let page = ops
            .list_items(ListItemsRequest {
                limit: Some(1),
                cursor: cursor.clone(),
                filters: Some(json!({"status": {"equals": "todo"}})),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.items.len() <= 1);
        seen.extend(page.items.into_iter().map(|i| i.id));
        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(seen, vec!["Rec1", "Rec2", "Rec3", "Rec4"]);
    // a primeira página é relida uma vez para cada item ainda não entregue
    first.assert_hits_async(3).await;
    second.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_update_items_with_row_to_create() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.update").json_body(json!({
                "list_id": "F1",
                "cells": [{"row_id": "Rec1", "column_id": "Col3", "checkbox": true}]
            }));
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.create").json_body(json!({
                "list_id": "F1",
                "initial_fields": [
                    {"column_id": "Col1", "rich_text": rich_text("New task")},
                    {"column_id": "Col2", "select": ["OptA"]}
                ]
            }));
            then.status(200)
                .json_body(json!({"ok": true, "item": {"id": "Rec9", "fields": []}}));
        })
        .await;

    let result = operations(&server)
        .update_items(UpdateItemsRequest {
            list_id: None,
            cells: vec![
                json!({"row_id": "Rec1", "column_id": "Col3", "checkbox": true}),
                json!({"row_id_to_create": true, "column_id": "Col1", "text": "New task"}),
                json!({"row_id_to_create": true, "column_id": "Col2", "select": ["OptA"]}),
            ],
        })
        .await
        .unwrap();

    update.assert_async().await;
    create.assert_async().await;
    assert_eq!(result.updated_rows, vec!["Rec1".to_string()]);
    assert_eq!(result.updated_cells, 1);
    assert_eq!(result.created_item.unwrap().id, "Rec9");
}

#[tokio::test]
async fn test_get_list_structure_reads_schema_through_first_item() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 1}));
            then.status(200)
                .json_body(json!({"ok": true, "items": [{"id": "Rec1", "fields": []}]}));
        })
        .await;
    let info = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.info")
                .json_body(json!({"list_id": "F1", "id": "Rec1"}));
            then.status(200).json_body(json!({
                "ok": true,
                "record": {"id": "Rec1", "fields": []},
                "list": {
                    "id": "F1",
                    "name": "Sprint",
                    "list_metadata": {
                        "schema": [
                            {"id": "Col1", "key": "name", "name": "Task", "type": "text", "is_primary_column": true},
                            {"id": "Col2", "key": "status", "name": "Status", "type": "select"}
                        ]
                    }
                }
            }));
        })
        .await;

    let structure = operations(&server).get_list_structure(None).await.unwrap();

    list.assert_async().await;
    info.assert_async().await;
    assert_eq!(structure.list_id, "F1");
    assert_eq!(structure.columns.len(), 2);
    assert_eq!(structure.name_column.as_deref(), Some("Col1"));
}

#[tokio::test]
async fn test_get_list_of_empty_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.items.list");
            then.status(200).json_body(json!({"ok": true, "items": []}));
        })
        .await;

    let list = operations(&server).get_list(Some("F2")).await.unwrap();
    assert_eq!(list["id"], "F2");
    assert_eq!(list["item_count"], 0);
}

#[tokio::test]
async fn test_export_round_trip() {
    let server = MockServer::start_async().await;
    let start = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.download.start")
                .json_body(json!({"list_id": "F1", "include_archived": true}));
            then.status(200).json_body(json!({"ok": true, "job_id": "LeF1"}));
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.download.get")
                .json_body_partial(r#"{"job_id": "LeF1"}"#);
            then.status(200).json_body(json!({
                "ok": true,
                "download_url": "https://files.slack.com/export.csv"
            }));
        })
        .await;

    let ops = operations(&server);
    let job_id = ops.start_export(None, true).await.unwrap();
    let outcome = ops
        .wait_for_export(
            None,
            &job_id,
            Duration::from_secs(5),
            PollSchedule::fixed(Duration::from_millis(10)),
        )
        .await
        .unwrap();

    start.assert_async().await;
    get.assert_hits_async(1).await;
    assert_eq!(
        outcome,
        ExportOutcome::Completed {
            job_id: "LeF1".to_string(),
            download_url: "https://files.slack.com/export.csv".to_string(),
        }
    );
}

#[tokio::test]
async fn test_delete_items_sends_ids() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.deleteMultiple")
                .json_body(json!({"list_id": "F1", "ids": ["Rec1", "Rec2"]}));
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;

    let ops = operations(&server);
    let result = ops
        .delete_items(None, &["Rec1".to_string(), "Rec2".to_string()])
        .await
        .unwrap();

    delete.assert_async().await;
    assert_eq!(result["count"], 2);
    assert!(ops.delete_items(None, &[]).await.is_err());
}

#[tokio::test]
async fn test_iter_items_walks_pages_and_restarts() {
    let server = MockServer::start_async().await;

    let item = |id: &str, status: &str| json!({"id": id, "fields": [{"key": "status", "column_id": "Col2", "select": [status]}]});

    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 2}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec1", "todo"), item("Rec2", "done")],
                "response_metadata": {"next_cursor": "c2"}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/slackLists.items.list")
                .json_body(json!({"list_id": "F1", "limit": 2, "cursor": "c2"}));
            then.status(200).json_body(json!({
                "ok": true,
                "items": [item("Rec3", "todo")],
                "response_metadata": {"next_cursor": ""}
            }));
        })
        .await;

    let ops = operations(&server);
    let filter = FilterEngine::from_json(&json!({"status": {"equals": "todo"}})).unwrap();

    let walk = |filter: FilterEngine| {
        let ops = &ops;
        async move {
            ops.iter_items(None, 2, false, filter)
                .unwrap()
                .into_stream()
                .map(|item| item.unwrap().id)
                .collect::<Vec<_>>()
                .await
        }
    };

    assert_eq!(walk(filter.clone()).await, vec!["Rec1", "Rec3"]);
    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;

    // nova chamada recomeça da primeira página, sem cursor
    assert_eq!(walk(filter).await, vec!["Rec1", "Rec3"]);
    first.assert_hits_async(2).await;
    second.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_create_list_sends_description_blocks() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/slackLists.create").json_body(json!({
                "name": "Sprint",
                "description_blocks": rich_text("Q3 work"),
                "todo_mode": true
            }));
            then.status(200)
                .json_body(json!({"ok": true, "list": {"id": "F9", "name": "Sprint"}}));
        })
        .await;

    let list = operations(&server)
        .create_list(CreateListRequest {
            name: Some("Sprint".to_string()),
            description: Some("Q3 work".to_string()),
            todo_mode: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();

    create.assert_async().await;
    assert_eq!(list["id"], "F9");
}
