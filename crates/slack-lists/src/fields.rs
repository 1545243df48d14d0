//! Normalização de valores de campo
//!
//! Converte entre a forma **simplificada** (string, ID único, booleano) e a
//! forma **canônica** exigida pela API (rich text, arrays de IDs), nos dois
//! sentidos. A conversão é escolhida pelo tipo declarado da coluna, nunca
//! por inspeção do formato do valor, exceto pela regra de pass-through:
//! valores já canônicos são aceitos como estão.
//!
//! | Tipo | Simplificado | Canônico |
//! |------|--------------|----------|
//! | text | `"Buy milk"` | `[{"type":"rich_text","elements":[...]}]` |
//! | select / user | `"Opt1"` | `["Opt1"]` |
//! | checkbox | `true` | `true` |
//! | number / rating / timestamp / vote | `4` | `[4]` |
//! | date | `"2024-12-31"` | `["2024-12-31"]` |
//! | link | `"https://..."` | `[{"original_url": "https://..."}]` |

use crate::error::{Result, SlackListsError};
use crate::types::{ColumnDefinition, FieldKind, FieldValue, Item, RichText};
use chrono::NaiveDate;
use serde_json::{json, Map, Number, Value};

/// Chaves de metadados ignoradas ao interpretar um campo de entrada
const METADATA_KEYS: &[&str] = &["column_id", "column", "key", "row_id", "row_id_to_create", "value"];

/// Converte um valor simplificado (ou já canônico) para o formato da API
pub fn to_canonical(kind: FieldKind, value: &Value) -> Result<FieldValue> {
    match kind {
        FieldKind::Text => text_to_canonical(value),
        FieldKind::Checkbox => match value {
            Value::Bool(checked) => Ok(FieldValue::Checkbox(*checked)),
            other => Err(type_error(kind, "a boolean", other)),
        },
        FieldKind::Select => string_list(kind, value).map(FieldValue::Select),
        FieldKind::User => string_list(kind, value).map(FieldValue::User),
        FieldKind::Email => string_list(kind, value).map(FieldValue::Email),
        FieldKind::Phone => string_list(kind, value).map(FieldValue::Phone),
        FieldKind::Attachment => string_list(kind, value).map(FieldValue::Attachment),
        FieldKind::Channel => string_list(kind, value).map(FieldValue::Channel),
        FieldKind::Message => string_list(kind, value).map(FieldValue::Message),
        FieldKind::Canvas => string_list(kind, value).map(FieldValue::Canvas),
        FieldKind::Date => {
            let dates = string_list(kind, value)?;
            for date in &dates {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                    SlackListsError::ValidationError(format!(
                        "date field expects YYYY-MM-DD, got '{}'",
                        date
                    ))
                })?;
            }
            Ok(FieldValue::Date(dates))
        }
        FieldKind::Number => number_list(kind, value).map(FieldValue::Number),
        FieldKind::Rating => number_list(kind, value).map(FieldValue::Rating),
        FieldKind::Timestamp => number_list(kind, value).map(FieldValue::Timestamp),
        FieldKind::Vote => number_list(kind, value).map(FieldValue::Vote),
        FieldKind::Link => link_list(value).map(FieldValue::Link),
        FieldKind::Reference => Ok(FieldValue::Reference(match value {
            Value::Array(values) => values.clone(),
            Value::Null => return Err(type_error(kind, "a value", value)),
            other => vec![other.clone()],
        })),
    }
}

/// Converte um valor canônico para a forma simplificada
///
/// - text: texto plano extraído
/// - select/user (e demais tipos de lista de IDs): a lista canônica, sem unwrap
/// - tipos escalares: o elemento único, ou a lista quando houver mais de um
pub fn to_simplified(kind: FieldKind, value: &FieldValue) -> Result<Value> {
    if value.kind() != kind {
        return Err(SlackListsError::ValidationError(format!(
            "value of type '{}' given for '{}' column",
            value.kind(),
            kind
        )));
    }

    Ok(match value {
        FieldValue::Text(rich) => Value::String(rich.plain_text()),
        FieldValue::Checkbox(checked) => Value::Bool(*checked),
        FieldValue::Link(links) => unwrap_single(links.iter().map(simplify_link).collect()),
        _ if kind.is_list_valued() => value.to_wire(),
        _ => match value.to_wire() {
            Value::Array(values) => unwrap_single(values),
            other => other,
        },
    })
}

fn text_to_canonical(value: &Value) -> Result<FieldValue> {
    match value {
        Value::String(text) => Ok(FieldValue::Text(RichText::from_plain(text))),
        Value::Array(blocks) => RichText::from_blocks(blocks.clone()).map(FieldValue::Text),
        Value::Object(obj) if obj.contains_key("type") => {
            RichText::from_blocks(vec![value.clone()]).map(FieldValue::Text)
        }
        other => Err(type_error(FieldKind::Text, "a string or rich_text blocks", other)),
    }
}

fn string_list(kind: FieldKind, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(values) => values
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| type_error(kind, "a string or list of strings", value))
            })
            .collect(),
        other => Err(type_error(kind, "a string or list of strings", other)),
    }
}

fn number_list(kind: FieldKind, value: &Value) -> Result<Vec<Number>> {
    match value {
        Value::Number(n) => Ok(vec![n.clone()]),
        Value::Array(values) => values
            .iter()
            .map(|v| match v {
                Value::Number(n) => Ok(n.clone()),
                _ => Err(type_error(kind, "a number or list of numbers", value)),
            })
            .collect(),
        other => Err(type_error(kind, "a number or list of numbers", other)),
    }
}

fn link_list(value: &Value) -> Result<Vec<Value>> {
    let one = |v: &Value| -> Result<Value> {
        match v {
            Value::String(url) => Ok(json!({ "original_url": url })),
            Value::Object(obj) if obj.get("original_url").map_or(false, Value::is_string) => {
                Ok(v.clone())
            }
            other => Err(type_error(
                FieldKind::Link,
                "a URL string or an object with 'original_url'",
                other,
            )),
        }
    };
    match value {
        Value::Array(values) => values.iter().map(one).collect(),
        other => Ok(vec![one(other)?]),
    }
}

fn simplify_link(link: &Value) -> Value {
    match link.as_object() {
        Some(obj) if obj.len() == 1 && obj.contains_key("original_url") => obj["original_url"].clone(),
        _ => link.clone(),
    }
}

fn unwrap_single(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn type_error(kind: FieldKind, expected: &str, got: &Value) -> SlackListsError {
    SlackListsError::ValidationError(format!(
        "'{}' field expects {}, got {}",
        kind, expected, got
    ))
}

/// Campo de entrada já normalizado
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    pub column_id: String,
    pub value: FieldValue,
}

impl FieldInput {
    pub fn new(column_id: impl Into<String>, value: FieldValue) -> Self {
        Self {
            column_id: column_id.into(),
            value,
        }
    }

    /// `{"column_id": ..., "<chave canônica>": ...}`
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("column_id".to_string(), Value::String(self.column_id.clone()));
        obj.insert(self.value.kind().wire_key().to_string(), self.value.to_wire());
        obj
    }
}

/// Alvo de uma célula em `update_items`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellTarget {
    Row(String),
    /// `row_id_to_create: true`
    NewRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellInput {
    pub target: CellTarget,
    pub field: FieldInput,
}

impl CellInput {
    pub fn to_wire(&self) -> Value {
        let mut obj = self.field.to_wire();
        if let CellTarget::Row(row_id) = &self.target {
            obj.insert("row_id".to_string(), Value::String(row_id.clone()));
        }
        Value::Object(obj)
    }
}

/// Normalizador de campos de entrada, opcionalmente guiado pelo schema da lista
///
/// Sem schema, o tipo vem da chave usada no campo (`text`, `select`, ...).
/// Com schema, campos podem usar a chave genérica `value` e o tipo declarado
/// da coluna é validado contra a chave usada.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCodec<'a> {
    columns: Option<&'a [ColumnDefinition]>,
}

impl<'a> FieldCodec<'a> {
    pub fn new() -> Self {
        Self { columns: None }
    }

    pub fn with_schema(columns: &'a [ColumnDefinition]) -> Self {
        Self {
            columns: Some(columns),
        }
    }

    /// Tipo declarado da coluna, se o schema for conhecido
    pub fn column_kind(&self, column: &str) -> Result<Option<FieldKind>> {
        match self
            .columns
            .and_then(|cols| cols.iter().find(|c| c.matches(column)))
        {
            Some(definition) => definition.kind().map(Some),
            None => Ok(None),
        }
    }

    /// Interpreta um campo `{"column_id": "Col1", "text": "Buy milk"}`
    pub fn parse_field(&self, raw: &Value) -> Result<FieldInput> {
        let obj = raw.as_object().ok_or_else(|| {
            SlackListsError::ValidationError(format!("field must be an object, got {}", raw))
        })?;

        let column_id = obj
            .get("column_id")
            .or_else(|| obj.get("column"))
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                SlackListsError::ValidationError("Each field must have a 'column_id'".to_string())
            })?
            .to_string();

        let mut declared: Vec<(&str, FieldKind)> = Vec::new();
        for key in obj.keys() {
            if METADATA_KEYS.contains(&key.as_str()) {
                continue;
            }
            let kind = if key == "text" {
                FieldKind::Text
            } else {
                key.parse::<FieldKind>()?
            };
            declared.push((key.as_str(), kind));
        }

        // `text` junto de `rich_text` é o eco de conveniência da API: vale o canônico
        if declared.iter().any(|(k, _)| *k == "rich_text") {
            declared.retain(|(k, _)| *k != "text");
        }

        let column_kind = self.column_kind(&column_id)?;

        let (value, kind) = match declared.as_slice() {
            [(key, kind)] => (&obj[*key], *kind),
            [] => match (obj.get("value"), column_kind) {
                (Some(value), Some(kind)) => (value, kind),
                _ => {
                    return Err(SlackListsError::ValidationError(format!(
                        "Field with column_id '{}' must have a value. Supported types: {}",
                        column_id,
                        FieldKind::ALL
                            .iter()
                            .map(FieldKind::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    )))
                }
            },
            many => {
                return Err(SlackListsError::ValidationError(format!(
                    "Field with column_id '{}' has multiple values: {}",
                    column_id,
                    many.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
                )))
            }
        };

        if let Some(expected) = column_kind {
            if expected != kind {
                return Err(SlackListsError::ValidationError(format!(
                    "column '{}' is of type '{}', got a '{}' value",
                    column_id, expected, kind
                )));
            }
        }

        Ok(FieldInput::new(column_id, to_canonical(kind, value)?))
    }

    pub fn parse_fields(&self, raw: &[Value]) -> Result<Vec<FieldInput>> {
        raw.iter().map(|field| self.parse_field(field)).collect()
    }

    /// Interpreta uma célula de `update_items` (`row_id` XOR `row_id_to_create`)
    pub fn parse_cell(&self, raw: &Value) -> Result<CellInput> {
        let row_id = raw
            .get("row_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());
        let create = raw
            .get("row_id_to_create")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let target = match (row_id, create) {
            (Some(_), true) => {
                return Err(SlackListsError::ValidationError(
                    "A cell cannot have both 'row_id' and 'row_id_to_create'".to_string(),
                ))
            }
            (Some(id), false) => CellTarget::Row(id.to_string()),
            (None, true) => CellTarget::NewRow,
            (None, false) => {
                return Err(SlackListsError::ValidationError(
                    "Each cell must have either 'row_id' or 'row_id_to_create: true'".to_string(),
                ))
            }
        };

        Ok(CellInput {
            target,
            field: self.parse_field(raw)?,
        })
    }
}

/// `true` quando algum campo só traz a chave genérica `value`, e portanto
/// depende do schema da lista para descobrir o tipo
pub fn needs_schema(raw: &[Value]) -> bool {
    raw.iter().any(|field| {
        field.as_object().map_or(false, |obj| {
            obj.contains_key("value") && obj.keys().all(|k| METADATA_KEYS.contains(&k.as_str()))
        })
    })
}

/// Acrescenta o texto plano (`text`) às colunas de texto de um item lido,
/// mantendo o `rich_text` canônico
pub fn with_plain_text(mut item: Item) -> Item {
    for field in &mut item.fields {
        if let Some(text) = field.plain_text() {
            field.payload.insert("text".to_string(), Value::String(text));
        }
    }
    item
}
