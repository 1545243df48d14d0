//! Cliente da API Slack Lists
//!
//! Camada de normalização e execução resiliente entre uma interface de
//! ferramentas e a Web API do Slack Lists:
//!
//! - **fields**: valores simplificados <-> formato canônico da API, por tipo de coluna
//! - **filters**: filtros declarativos avaliados no cliente
//! - **retry**: timeout por tentativa, backoff exponencial e `Retry-After`
//! - **pagination**: sequência preguiçosa de itens guiada por cursor
//! - **export**: máquina de estados dos jobs de exportação
//! - **operations**: `ListOperations`, o ponto de entrada para chamadores externos
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use slack_lists::{AddItemRequest, ClientConfig, ListOperations};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> slack_lists::Result<()> {
//!     let token = std::env::var("SLACK_BOT_TOKEN")
//!         .expect("SLACK_BOT_TOKEN não configurado");
//!
//!     let config = ClientConfig::new(token).with_default_list_id("F0123456789");
//!     let ops = ListOperations::new(config)?;
//!
//!     let item = ops
//!         .add_item(AddItemRequest {
//!             initial_fields: vec![json!({"column_id": "Col1", "text": "Buy milk"})],
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Item criado: {}", item.id);
//!
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod filters;
pub mod operations;
pub mod pagination;
pub mod retry;
pub mod types;

// Re-exports principais
pub use client::SlackListsClient;
pub use config::ClientConfig;
pub use error::{Result, SlackListsError};
pub use export::{ExportJob, ExportOutcome, ExportStatus, PollSchedule};
pub use fields::{to_canonical, to_simplified, FieldCodec};
pub use filters::{FilterEngine, FilterOperator, FilterPredicate};
pub use operations::{
    AccessLevel, AddItemRequest, CreateListRequest, DeleteAccessRequest, ItemDetails,
    ListItemsRequest, ListOperations, SetAccessRequest, UpdateItemsRequest, UpdateItemsResult,
    UpdateListRequest,
};
pub use pagination::{ItemPager, PageQuery, PageSource, ResumeToken};
pub use retry::{Idempotency, ResilientExecutor, RetryPolicy};
pub use types::{ColumnDefinition, FieldKind, FieldValue, Item, ItemsPage, ListStructure};
