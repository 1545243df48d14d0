//! Operações sobre listas

use super::items::require_id;
use super::ListOperations;
use crate::error::{Result, SlackListsError};
use crate::retry::Idempotency;
use crate::types::{ColumnDefinition, ListStructure, RichText};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateListRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Texto plano, convertido para `description_blocks`
    #[serde(default)]
    pub description: Option<String>,
    /// Cria as colunas Completed, Assignee e Due Date
    #[serde(default)]
    pub todo_mode: Option<bool>,
    #[serde(default)]
    pub schema: Option<Vec<ColumnDefinition>>,
    #[serde(default)]
    pub copy_from_list_id: Option<String>,
    #[serde(default)]
    pub include_copied_list_records: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub todo_mode: Option<bool>,
}

impl ListOperations {
    /// Objeto `list` de um item qualquer da lista
    ///
    /// Não existe `slackLists.info`: lê um item com `items.list(limit=1)` e
    /// depois `items.info`, que traz os metadados da lista. `None` se a
    /// lista estiver vazia.
    async fn list_payload(&self, list_id: &str) -> Result<Option<Value>> {
        let response = self
            .invoke(
                "slackLists.items.list",
                Idempotency::Idempotent,
                json!({ "list_id": list_id, "limit": 1 }),
            )
            .await?;

        let first_id = response
            .pointer("/items/0/id")
            .and_then(Value::as_str)
            .map(str::to_string);

        let Some(item_id) = first_id else {
            return Ok(None);
        };

        let info = self
            .invoke(
                "slackLists.items.info",
                Idempotency::Idempotent,
                json!({ "list_id": list_id, "id": item_id }),
            )
            .await?;

        Ok(Some(info.get("list").cloned().unwrap_or_else(|| json!({}))))
    }

    /// Metadados da lista
    pub async fn get_list(&self, list_id: Option<&str>) -> Result<Value> {
        let list_id = self.list_id(list_id)?;
        Ok(match self.list_payload(&list_id).await? {
            Some(list) => list,
            None => json!({
                "id": list_id,
                "item_count": 0,
                "message": "List metadata not available. List may be empty.",
            }),
        })
    }

    /// Colunas, coluna principal, views e modo to-do
    pub async fn get_list_structure(&self, list_id: Option<&str>) -> Result<ListStructure> {
        let list_id = self.list_id(list_id)?;
        match self.list_payload(&list_id).await? {
            Some(list) => ListStructure::from_list_payload(list_id, &list),
            None => {
                tracing::warn!("⚠️ Lista {} vazia: schema indisponível", list_id);
                Ok(ListStructure::empty(list_id))
            }
        }
    }

    /// `slackLists.create` (não-idempotente)
    pub async fn create_list(&self, request: CreateListRequest) -> Result<Value> {
        let has_name = request.name.as_deref().map_or(false, |n| !n.trim().is_empty());
        if !has_name && request.copy_from_list_id.is_none() {
            return Err(SlackListsError::ValidationError(
                "Either name or copy_from_list_id must be provided".to_string(),
            ));
        }
        if request.include_copied_list_records.is_some() && request.copy_from_list_id.is_none() {
            return Err(SlackListsError::ValidationError(
                "include_copied_list_records requires copy_from_list_id".to_string(),
            ));
        }
        if let Some(schema) = &request.schema {
            for column in schema {
                column.kind()?;
            }
        }

        let mut body = json!({});
        if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
            body["name"] = json!(name);
        }
        if let Some(description) = request.description.filter(|d| !d.is_empty()) {
            body["description_blocks"] = json!(RichText::from_plain(&description));
        }
        if let Some(todo_mode) = request.todo_mode {
            body["todo_mode"] = json!(todo_mode);
        }
        if let Some(schema) = &request.schema {
            body["schema"] = serde_json::to_value(schema)?;
        }
        if let Some(source) = &request.copy_from_list_id {
            body["copy_from_list_id"] = json!(source);
        }
        if let Some(include) = request.include_copied_list_records {
            body["include_copied_list_records"] = json!(include);
        }

        let response = self
            .invoke("slackLists.create", Idempotency::NonIdempotent, body)
            .await?;

        let list = response.get("list").cloned().unwrap_or_else(|| json!({}));
        let created_id = list.get("id").and_then(Value::as_str).unwrap_or("?");
        tracing::info!("✅ Lista criada: {}", created_id);
        Ok(list)
    }

    /// `slackLists.update`; exige ao menos uma alteração
    pub async fn update_list(&self, request: UpdateListRequest) -> Result<Value> {
        let list_id = self.list_id(request.list_id.as_deref())?;

        let mut body = json!({ "id": list_id });
        if let Some(name) = &request.name {
            body["name"] = json!(name);
        }
        if let Some(description) = &request.description {
            body["description_blocks"] = json!(RichText::from_plain(description));
        }
        if let Some(todo_mode) = request.todo_mode {
            body["todo_mode"] = json!(todo_mode);
        }

        if body.as_object().map_or(0, |o| o.len()) == 1 {
            return Err(SlackListsError::ValidationError(
                "At least one of name, description, or todo_mode must be provided".to_string(),
            ));
        }

        self.invoke("slackLists.update", Idempotency::Idempotent, body)
            .await?;

        tracing::info!("✅ Lista atualizada: {}", list_id);
        Ok(json!({ "updated": true, "list_id": list_id }))
    }

    /// `slackLists.delete` (remove a lista e todos os itens)
    pub async fn delete_list(&self, list_id: &str) -> Result<Value> {
        require_id("list_id", list_id)?;

        self.invoke(
            "slackLists.delete",
            Idempotency::Idempotent,
            json!({ "id": list_id }),
        )
        .await?;

        tracing::info!("🗑️ Lista removida: {}", list_id);
        Ok(json!({ "deleted": true, "list_id": list_id }))
    }
}
