//! Operações sobre itens (linhas)

use super::ListOperations;
use crate::error::{Result, SlackListsError};
use crate::fields::{needs_schema, with_plain_text, CellInput, CellTarget, FieldCodec, FieldInput};
use crate::filters::FilterEngine;
use crate::pagination::{ItemPager, PageQuery, PageSource, ResumeToken};
use crate::retry::Idempotency;
use crate::types::{Item, ItemsPage, ListStructure};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tamanho de página padrão de `list_items`
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Com filtros, cada página remota pede este múltiplo do `limit`
const FILTER_OVERFETCH: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    /// Campos simplificados ou canônicos (ver `FieldCodec`)
    #[serde(default)]
    pub initial_fields: Vec<Value>,
    /// Duplica um item existente (exclusivo com `initial_fields`)
    #[serde(default)]
    pub duplicated_item_id: Option<String>,
    /// Cria como subtarefa
    #[serde(default)]
    pub parent_item_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemsRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    /// Cada célula: `row_id` (ou `row_id_to_create: true`) + `column_id` + valor
    pub cells: Vec<Value>,
}

/// Resultado de `update_items`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateItemsResult {
    /// Linhas existentes alteradas, na ordem em que apareceram
    pub updated_rows: Vec<String>,
    pub updated_cells: usize,
    /// Item criado a partir das células `row_id_to_create`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_item: Option<Item>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItemsRequest {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
    /// `{campo: {operador: operando}}`
    #[serde(default)]
    pub filters: Option<Value>,
}

/// Resposta de `get_item`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetails {
    pub item: Item,
    pub list: Value,
    pub subtasks: Vec<Item>,
}

impl ListOperations {
    /// Cria um item a partir de campos ou duplicando outro item
    ///
    /// `slackLists.items.create` (não-idempotente)
    pub async fn add_item(&self, request: AddItemRequest) -> Result<Item> {
        let list_id = self.list_id(request.list_id.as_deref())?;

        let fields = match (&request.duplicated_item_id, request.initial_fields.is_empty()) {
            (Some(_), false) => {
                return Err(SlackListsError::ValidationError(
                    "Provide either initial_fields or duplicated_item_id, not both".to_string(),
                ))
            }
            (None, true) => {
                return Err(SlackListsError::ValidationError(
                    "Either initial_fields or duplicated_item_id must be provided".to_string(),
                ))
            }
            (Some(_), true) => Vec::new(),
            (None, false) => {
                let structure = self.schema_if_needed(&list_id, &request.initial_fields).await?;
                codec_for(structure.as_ref()).parse_fields(&request.initial_fields)?
            }
        };

        self.create_item(
            &list_id,
            &fields,
            request.duplicated_item_id.as_deref(),
            request.parent_item_id.as_deref(),
        )
        .await
    }

    async fn create_item(
        &self,
        list_id: &str,
        fields: &[FieldInput],
        duplicated_item_id: Option<&str>,
        parent_item_id: Option<&str>,
    ) -> Result<Item> {
        let mut body = json!({ "list_id": list_id });
        if let Some(parent) = parent_item_id {
            body["parent_item_id"] = json!(parent);
        }
        match duplicated_item_id {
            Some(original) => {
                tracing::debug!("Duplicando item {} na lista {}", original, list_id);
                body["duplicated_item_id"] = json!(original);
            }
            None => {
                body["initial_fields"] =
                    Value::Array(fields.iter().map(|f| Value::Object(f.to_wire())).collect());
            }
        }

        let response = self
            .invoke("slackLists.items.create", Idempotency::NonIdempotent, body)
            .await?;

        let item: Item = serde_json::from_value(response.get("item").cloned().unwrap_or(Value::Null))?;
        tracing::info!("✅ Item criado: {} (lista {})", item.id, list_id);
        Ok(with_plain_text(item))
    }

    /// Atualiza células de itens existentes
    ///
    /// Células marcadas com `row_id_to_create: true` formam **um** novo item,
    /// criado depois que as células existentes foram gravadas. As duas etapas
    /// não são atômicas: se a criação falhar, as atualizações já aplicadas
    /// permanecem.
    pub async fn update_items(&self, request: UpdateItemsRequest) -> Result<UpdateItemsResult> {
        let list_id = self.list_id(request.list_id.as_deref())?;

        if request.cells.is_empty() {
            return Err(SlackListsError::ValidationError(
                "At least one cell must be provided".to_string(),
            ));
        }

        let structure = self.schema_if_needed(&list_id, &request.cells).await?;
        let codec = codec_for(structure.as_ref());
        let cells = request
            .cells
            .iter()
            .map(|cell| codec.parse_cell(cell))
            .collect::<Result<Vec<CellInput>>>()?;

        let (existing, to_create): (Vec<CellInput>, Vec<CellInput>) = cells
            .into_iter()
            .partition(|cell| matches!(cell.target, CellTarget::Row(_)));

        let mut updated_rows: Vec<String> = Vec::new();
        for cell in &existing {
            if let CellTarget::Row(row_id) = &cell.target {
                if !updated_rows.contains(row_id) {
                    updated_rows.push(row_id.clone());
                }
            }
        }

        if !existing.is_empty() {
            tracing::info!(
                "Atualizando {} célula(s) em {} item(ns) da lista {}",
                existing.len(),
                updated_rows.len(),
                list_id
            );
            let body = json!({
                "list_id": list_id,
                "cells": existing.iter().map(CellInput::to_wire).collect::<Vec<_>>(),
            });
            self.invoke("slackLists.items.update", Idempotency::Idempotent, body)
                .await?;
        }

        let created_item = if to_create.is_empty() {
            None
        } else {
            let fields: Vec<FieldInput> = to_create.into_iter().map(|cell| cell.field).collect();
            match self.create_item(&list_id, &fields, None, None).await {
                Ok(item) => Some(item),
                Err(error) => {
                    if !existing.is_empty() {
                        tracing::warn!(
                            "⚠️ Criação de item falhou após atualizar {} célula(s): {}",
                            existing.len(),
                            error
                        );
                    }
                    return Err(error);
                }
            }
        };

        Ok(UpdateItemsResult {
            updated_rows,
            updated_cells: existing.len(),
            created_item,
        })
    }

    /// `slackLists.items.delete`
    pub async fn delete_item(&self, list_id: Option<&str>, item_id: &str) -> Result<Value> {
        let list_id = self.list_id(list_id)?;
        require_id("item_id", item_id)?;

        self.invoke(
            "slackLists.items.delete",
            Idempotency::Idempotent,
            json!({ "list_id": list_id, "id": item_id }),
        )
        .await?;

        tracing::info!("🗑️ Item removido: {} (lista {})", item_id, list_id);
        Ok(json!({ "deleted": true, "item_id": item_id }))
    }

    /// `slackLists.items.deleteMultiple`
    pub async fn delete_items(&self, list_id: Option<&str>, item_ids: &[String]) -> Result<Value> {
        let list_id = self.list_id(list_id)?;
        if item_ids.is_empty() || item_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(SlackListsError::ValidationError(
                "item_ids must be a non-empty list of item IDs".to_string(),
            ));
        }

        self.invoke(
            "slackLists.items.deleteMultiple",
            Idempotency::Idempotent,
            json!({ "list_id": list_id, "ids": item_ids }),
        )
        .await?;

        tracing::info!("🗑️ {} itens removidos (lista {})", item_ids.len(), list_id);
        Ok(json!({ "deleted": true, "count": item_ids.len(), "item_ids": item_ids }))
    }

    /// Item, metadados da lista e subtarefas (`slackLists.items.info`)
    pub async fn get_item(
        &self,
        list_id: Option<&str>,
        item_id: &str,
        include_is_subscribed: bool,
    ) -> Result<ItemDetails> {
        let list_id = self.list_id(list_id)?;
        require_id("item_id", item_id)?;

        let mut body = json!({ "list_id": list_id, "id": item_id });
        if include_is_subscribed {
            body["include_is_subscribed"] = json!(true);
        }

        let response = self
            .invoke("slackLists.items.info", Idempotency::Idempotent, body)
            .await?;

        let item: Item = serde_json::from_value(response.get("record").cloned().unwrap_or(Value::Null))?;
        let subtasks: Vec<Item> = match response.get("subtasks") {
            Some(subtasks) if !subtasks.is_null() => serde_json::from_value(subtasks.clone())?,
            _ => Vec::new(),
        };

        Ok(ItemDetails {
            item: with_plain_text(item),
            list: response.get("list").cloned().unwrap_or_else(|| json!({})),
            subtasks: subtasks.into_iter().map(with_plain_text).collect(),
        })
    }

    /// Uma página de itens
    ///
    /// Com filtros, cada página remota pede `3 × limit` itens e a busca
    /// continua até reunir `limit` itens que casam ou a lista acabar.
    /// Se a última página trouxe mais itens que casam do que cabem, o cursor
    /// retornado é um `ResumeToken` que volta a essa página; seguir os
    /// cursores nunca pula um item.
    pub async fn list_items(&self, request: ListItemsRequest) -> Result<ItemsPage> {
        let list_id = self.list_id(request.list_id.as_deref())?;
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

        // filtros e cursor inválidos falham antes de qualquer chamada de rede
        let filter = match &request.filters {
            Some(filters) => FilterEngine::from_json(filters)?,
            None => FilterEngine::default(),
        };
        let start = match request.cursor.as_deref() {
            Some(cursor) => ResumeToken::parse(cursor)?,
            None => ResumeToken::default(),
        };

        let query = PageQuery::new(list_id).with_archived(request.archived.unwrap_or(false));

        if filter.is_empty() && start.skip == 0 {
            return self
                .fetch_page(&query.with_cursor(start.cursor).with_limit(limit))
                .await;
        }

        let page_size = if filter.is_empty() {
            limit
        } else {
            limit.saturating_mul(FILTER_OVERFETCH)
        };
        let mut pager = ItemPager::resume(self, query.with_limit(page_size), start).with_filter(filter);
        let items = pager.collect_up_to(limit as usize).await?;

        tracing::debug!(
            "🔎 {} item(ns) após filtro em {} página(s)",
            items.len(),
            pager.pages_fetched()
        );

        Ok(ItemsPage::new(items, pager.resume_cursor()))
    }

    /// Sequência preguiçosa de todos os itens (com filtro opcional)
    ///
    /// Cada chamada começa da primeira página.
    pub fn iter_items(
        &self,
        list_id: Option<&str>,
        page_size: u32,
        archived: bool,
        filter: FilterEngine,
    ) -> Result<ItemPager<'_, Self>> {
        let query = PageQuery::new(self.list_id(list_id)?)
            .with_limit(page_size.max(1))
            .with_archived(archived);
        Ok(ItemPager::new(self, query).with_filter(filter))
    }

    /// Schema da lista, só quando algum campo usa a chave genérica `value`
    async fn schema_if_needed(&self, list_id: &str, raw: &[Value]) -> Result<Option<ListStructure>> {
        if needs_schema(raw) {
            self.get_list_structure(Some(list_id)).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

fn codec_for(structure: Option<&ListStructure>) -> FieldCodec<'_> {
    match structure {
        Some(structure) => FieldCodec::with_schema(&structure.columns),
        None => FieldCodec::new(),
    }
}

pub(crate) fn require_id(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SlackListsError::ValidationError(format!("{} is required", name)));
    }
    Ok(())
}
