// ============================================================================
// ListOperations - operações lógicas sobre listas do Slack
// ============================================================================
//
// Compõe os blocos do crate para cada operação exposta:
//
// 1. **Itens:** add_item, update_items, delete_item(s), get_item, list_items
// 2. **Listas:** get_list, get_list_structure, create_list, update_list, delete_list
// 3. **Acesso:** set_access, delete_access
// 4. **Exportação:** start_export, export_status, wait_for_export
//
// Fluxo de cada operação: validação/normalização da entrada (antes de
// qualquer chamada de rede) -> `ResilientExecutor` -> decodificação da
// resposta. `list_id` omitido cai no `default_list_id` da configuração.
//
// # Idempotência
//
// Criação de item, criação de lista e início de exportação são marcadas como
// não-idempotentes: só são repetidas quando a falha comprovadamente ocorreu
// antes de a requisição ter efeito.

mod access;
mod downloads;
mod items;
mod lists;

pub use access::{AccessLevel, DeleteAccessRequest, SetAccessRequest};
pub use items::{AddItemRequest, ItemDetails, ListItemsRequest, UpdateItemsRequest, UpdateItemsResult};
pub use lists::{CreateListRequest, UpdateListRequest};

use crate::client::SlackListsClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::fields::with_plain_text;
use crate::pagination::{PageQuery, PageSource};
use crate::retry::{Idempotency, ResilientExecutor};
use crate::types::{Item, ItemsPage};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Ponto de entrada do crate para chamadores externos
///
/// Não guarda estado mutável entre chamadas: pode ser clonado e usado em
/// paralelo (ex.: compartilhado via `Arc` no estado do servidor).
#[derive(Clone)]
pub struct ListOperations {
    client: SlackListsClient,
    executor: ResilientExecutor,
    config: ClientConfig,
}

impl ListOperations {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = SlackListsClient::new(&config)?;
        let executor = ResilientExecutor::new(config.retry_policy().clone());
        Ok(Self {
            client,
            executor,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `list_id` explícito ou o padrão da configuração
    pub(crate) fn list_id(&self, explicit: Option<&str>) -> Result<String> {
        self.config.resolve_list_id(explicit)
    }

    /// Uma chamada remota passando pelo executor resiliente
    pub(crate) async fn invoke(
        &self,
        method: &str,
        idempotency: Idempotency,
        body: Value,
    ) -> Result<Value> {
        let body = &body;
        self.executor
            .execute(method, idempotency, move || self.client.call(method, body))
            .await
    }
}

/// Lê `items` e o cursor de uma resposta de `slackLists.items.list`
pub(crate) fn parse_items_page(response: &Value) -> Result<ItemsPage> {
    let items: Vec<Item> = match response.get("items") {
        Some(items) => serde_json::from_value(items.clone())?,
        None => Vec::new(),
    };
    let next_cursor = response
        .pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ItemsPage::new(
        items.into_iter().map(with_plain_text).collect(),
        next_cursor,
    ))
}

#[async_trait]
impl PageSource for ListOperations {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ItemsPage> {
        let mut body = json!({ "list_id": query.list_id });
        if let Some(limit) = query.limit {
            body["limit"] = json!(limit);
        }
        if let Some(cursor) = &query.cursor {
            body["cursor"] = json!(cursor);
        }
        if query.archived {
            body["archived"] = json!(true);
        }

        let response = self
            .invoke("slackLists.items.list", Idempotency::Idempotent, body)
            .await?;
        parse_items_page(&response)
    }
}
