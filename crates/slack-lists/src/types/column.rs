//! Schema de uma lista (colunas)

use super::FieldKind;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Definição de coluna, como retornada em `list_metadata.schema`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// ID da coluna (`Col...`). Ausente ao definir o schema de uma lista nova.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Tipo declarado (ver `FieldKind`)
    #[serde(rename = "type")]
    pub column_type: String,

    #[serde(rename = "is_primary_column", default)]
    pub is_primary: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ColumnOptions>,
}

/// Configuração específica do tipo de coluna
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnOptions {
    /// Para select: opções disponíveis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SelectChoice>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Opção de select
///
/// A API retorna `{value, label, color}`; schemas escritos à mão costumam usar `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SelectChoice {
    /// ID usado nos valores de select
    pub fn option_id(&self) -> Option<&str> {
        self.value.as_deref().or(self.key.as_deref())
    }
}

impl ColumnDefinition {
    /// Nova coluna para o schema de `create_list`
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: None,
            key: Some(key.into()),
            name: name.into(),
            column_type: kind.as_str().to_string(),
            is_primary: false,
            options: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_choices(mut self, choices: Vec<SelectChoice>) -> Self {
        self.options.get_or_insert_with(ColumnOptions::default).choices = choices;
        self
    }

    /// Tipo da coluna; `UnsupportedFieldType` para tipos desconhecidos
    pub fn kind(&self) -> Result<FieldKind> {
        self.column_type.parse()
    }

    /// Casa por ID, key ou nome de exibição
    pub fn matches(&self, name: &str) -> bool {
        self.id.as_deref() == Some(name) || self.key.as_deref() == Some(name) || self.name == name
    }

    pub fn choices(&self) -> &[SelectChoice] {
        self.options
            .as_ref()
            .map(|o| o.choices.as_slice())
            .unwrap_or_default()
    }
}

/// Estrutura de uma lista: metadados + colunas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListStructure {
    pub list_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub columns: Vec<ColumnDefinition>,
    /// Coluna principal (nome/título do item)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_column: Option<String>,
    pub views: Vec<Value>,
    pub todo_mode: bool,
}

impl ListStructure {
    /// Lista sem itens: a API não expõe o schema sem ao menos um item
    pub fn empty(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            name: None,
            title: None,
            description: String::new(),
            columns: Vec::new(),
            name_column: None,
            views: Vec::new(),
            todo_mode: false,
        }
    }

    /// Monta a estrutura a partir do objeto `list` de `slackLists.items.info`
    pub fn from_list_payload(list_id: impl Into<String>, list: &Value) -> Result<Self> {
        let metadata = list.get("list_metadata").cloned().unwrap_or(Value::Null);
        let columns: Vec<ColumnDefinition> = match metadata.get("schema") {
            Some(schema) => serde_json::from_value(schema.clone())?,
            None => Vec::new(),
        };

        let name_column = columns
            .iter()
            .find(|c| {
                c.is_primary
                    || matches!(c.key.as_deref(), Some("name") | Some("title") | Some("todo_name"))
            })
            .and_then(|c| c.id.clone());

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            list_id: list_id.into(),
            name: text(list.get("name")),
            title: text(list.get("title")),
            description: text(metadata.get("description")).unwrap_or_default(),
            columns,
            name_column,
            views: metadata
                .get("views")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            todo_mode: metadata
                .get("todo_mode")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_schema_from_list_payload() {
        let list = json!({
            "name": "Sprint",
            "list_metadata": {
                "schema": [
                    {"id": "Col1", "key": "name", "name": "Task", "type": "text", "is_primary_column": true},
                    {"id": "Col2", "key": "status", "name": "Status", "type": "select",
                     "options": {"choices": [{"value": "OptA", "label": "To Do", "color": "gray"}]}}
                ],
                "todo_mode": true,
                "views": [{"id": "View1"}]
            }
        });

        let structure = ListStructure::from_list_payload("F1", &list).unwrap();
        assert_eq!(structure.name.as_deref(), Some("Sprint"));
        assert_eq!(structure.columns.len(), 2);
        assert_eq!(structure.name_column.as_deref(), Some("Col1"));
        assert!(structure.todo_mode);
        assert_eq!(structure.views.len(), 1);

        let status = structure.column("status").unwrap();
        assert_eq!(status.kind().unwrap(), FieldKind::Select);
        assert_eq!(status.choices()[0].option_id(), Some("OptA"));
        assert!(structure.column("Status").is_some());
    }

    #[test]
    fn test_unknown_column_type_is_unsupported() {
        let column: ColumnDefinition =
            serde_json::from_value(json!({"id": "Col9", "type": "formula"})).unwrap();
        assert!(column.kind().is_err());
    }

    #[test]
    fn test_schema_builder_serialization() {
        let column = ColumnDefinition::new("status", "Status", FieldKind::Select).with_choices(vec![
            SelectChoice {
                key: Some("todo".to_string()),
                value: Some("To Do".to_string()),
                label: None,
                color: Some("gray".to_string()),
            },
        ]);
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["type"], "select");
        assert_eq!(value["is_primary_column"], false);
        assert_eq!(value["options"]["choices"][0]["key"], "todo");
        assert!(value.get("id").is_none());
    }
}
