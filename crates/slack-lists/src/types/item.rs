//! Itens (linhas) de uma lista

use super::{FieldKind, FieldValue, RichText};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordem de precedência ao descobrir o tipo de um campo lido da API.
/// `rich_text` vem antes de `text` porque a API devolve os dois para colunas de texto.
const READ_PRECEDENCE: &[FieldKind] = &[
    FieldKind::Checkbox,
    FieldKind::Select,
    FieldKind::User,
    FieldKind::Date,
    FieldKind::Number,
    FieldKind::Email,
    FieldKind::Phone,
    FieldKind::Attachment,
    FieldKind::Link,
    FieldKind::Message,
    FieldKind::Rating,
    FieldKind::Timestamp,
    FieldKind::Channel,
    FieldKind::Reference,
    FieldKind::Vote,
    FieldKind::Canvas,
    FieldKind::Text,
];

/// Item de uma lista
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,

    /// Item pai (subtarefas)
    #[serde(
        default,
        alias = "parent_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_item_id: Option<String>,

    #[serde(default, alias = "is_archived")]
    pub archived: bool,

    #[serde(default)]
    pub fields: Vec<ItemField>,

    /// Demais campos da API (date_created, created_by, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Campo por column_id ou key
    pub fn field(&self, name: &str) -> Option<&ItemField> {
        self.fields.iter().find(|f| f.matches(name))
    }
}

/// Valor de uma célula, no formato retornado pela API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemField {
    #[serde(default)]
    pub column_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Payload bruto: `rich_text`, `select`, `text`, `value`, ...
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ItemField {
    pub fn matches(&self, name: &str) -> bool {
        self.column_id == name || self.key.as_deref() == Some(name)
    }

    /// Tipo inferido pela chave canônica presente no payload
    pub fn kind(&self) -> Option<FieldKind> {
        READ_PRECEDENCE
            .iter()
            .copied()
            .find(|kind| self.payload.contains_key(kind.wire_key()))
            .or_else(|| {
                self.payload
                    .get("text")
                    .filter(|v| v.is_string())
                    .map(|_| FieldKind::Text)
            })
    }

    /// Decodifica o valor canônico. `Ok(None)` quando a célula não tem valor tipado.
    pub fn value(&self) -> Result<Option<FieldValue>> {
        let Some(kind) = self.kind() else {
            return Ok(None);
        };
        match self.payload.get(kind.wire_key()) {
            Some(payload) => FieldValue::from_wire(kind, payload).map(Some),
            // só existe o texto plano de conveniência
            None => Ok(self
                .payload
                .get("text")
                .and_then(Value::as_str)
                .map(|t| FieldValue::Text(RichText::from_plain(t)))),
        }
    }

    /// Texto plano (colunas de texto)
    pub fn plain_text(&self) -> Option<String> {
        match self.value() {
            Ok(Some(FieldValue::Text(rich))) => Some(rich.plain_text()),
            _ => None,
        }
    }
}

/// Uma página de `list_items`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsPage {
    pub items: Vec<Item>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub total: usize,
}

impl ItemsPage {
    pub fn new(items: Vec<Item>, next_cursor: Option<String>) -> Self {
        let next_cursor = next_cursor.filter(|c| !c.is_empty());
        Self {
            total: items.len(),
            has_more: next_cursor.is_some(),
            items,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_item() -> Item {
        serde_json::from_value(json!({
            "id": "Rec1",
            "list_id": "F1",
            "parent_record_id": "Rec0",
            "date_created": 1700000000,
            "fields": [
                {"key": "name", "column_id": "Col1", "value": "x", "text": "Buy milk",
                 "rich_text": [{"type": "rich_text", "elements": [
                     {"type": "rich_text_section", "elements": [{"type": "text", "text": "Buy milk"}]}
                 ]}]},
                {"key": "status", "column_id": "Col2", "value": "OptA", "select": ["OptA"]},
                {"key": "done", "column_id": "Col3", "value": true, "checkbox": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_item() {
        let item = sample_item();
        assert_eq!(item.parent_item_id.as_deref(), Some("Rec0"));
        assert!(!item.archived);
        assert_eq!(item.extra["date_created"], 1700000000);
        assert_eq!(item.fields.len(), 3);
    }

    #[test]
    fn test_field_kind_detection() {
        let item = sample_item();
        assert_eq!(item.field("name").unwrap().kind(), Some(FieldKind::Text));
        assert_eq!(item.field("Col2").unwrap().kind(), Some(FieldKind::Select));
        assert_eq!(item.field("done").unwrap().kind(), Some(FieldKind::Checkbox));
        assert!(item.field("missing").is_none());
    }

    #[test]
    fn test_plain_text_from_rich_text() {
        let item = sample_item();
        assert_eq!(
            item.field("Col1").unwrap().plain_text().as_deref(),
            Some("Buy milk")
        );
    }

    #[test]
    fn test_text_only_field_decodes_as_text() {
        let field: ItemField =
            serde_json::from_value(json!({"column_id": "Col1", "text": "hello"})).unwrap();
        assert_eq!(field.kind(), Some(FieldKind::Text));
        assert_eq!(field.plain_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_items_page_has_more_follows_cursor() {
        let page = ItemsPage::new(vec![sample_item()], Some(String::new()));
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
        assert_eq!(page.total, 1);

        let page = ItemsPage::new(Vec::new(), Some("cur".to_string()));
        assert!(page.has_more);
    }
}
