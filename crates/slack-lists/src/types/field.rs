//! Tipos de campo do Slack Lists
//!
//! Cada coluna tem um tipo (`FieldKind`) que define o formato canônico do valor
//! na API. A maioria dos tipos usa arrays, mesmo para um único valor:
//!
//! ⚠️ IMPORTANTE: campos de texto usam `rich_text` (Block Kit), NÃO string simples!
//! ⚠️ IMPORTANTE: select/user são SEMPRE arrays de IDs, mesmo com uma única opção!

use crate::error::{Result, SlackListsError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use std::fmt;
use std::str::FromStr;

/// Tipos de campo suportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    User,
    Date,
    Number,
    Checkbox,
    Email,
    Phone,
    Link,
    Attachment,
    Channel,
    Message,
    Rating,
    Timestamp,
    Vote,
    Canvas,
    Reference,
}

impl FieldKind {
    pub const ALL: [FieldKind; 17] = [
        FieldKind::Text,
        FieldKind::Select,
        FieldKind::User,
        FieldKind::Date,
        FieldKind::Number,
        FieldKind::Checkbox,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::Link,
        FieldKind::Attachment,
        FieldKind::Channel,
        FieldKind::Message,
        FieldKind::Rating,
        FieldKind::Timestamp,
        FieldKind::Vote,
        FieldKind::Canvas,
        FieldKind::Reference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::User => "user",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Link => "link",
            FieldKind::Attachment => "attachment",
            FieldKind::Channel => "channel",
            FieldKind::Message => "message",
            FieldKind::Rating => "rating",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Vote => "vote",
            FieldKind::Canvas => "canvas",
            FieldKind::Reference => "reference",
        }
    }

    /// Chave do valor canônico no payload da API
    pub fn wire_key(&self) -> &'static str {
        match self {
            FieldKind::Text => "rich_text",
            other => other.as_str(),
        }
    }

    /// Tipos cujo valor simplificado continua sendo uma lista
    /// (sem unwrap silencioso de listas com um único elemento)
    pub fn is_list_valued(&self) -> bool {
        matches!(
            self,
            FieldKind::Select
                | FieldKind::User
                | FieldKind::Attachment
                | FieldKind::Channel
                | FieldKind::Message
                | FieldKind::Canvas
                | FieldKind::Reference
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = SlackListsError;

    /// Aceita o nome do tipo e também `rich_text` como alias de `text`
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "rich_text" {
            return Ok(FieldKind::Text);
        }
        FieldKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SlackListsError::UnsupportedFieldType(s.to_string()))
    }
}

/// Documento rich text (lista de blocos Block Kit do tipo `rich_text`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(Vec<Value>);

impl RichText {
    /// Um parágrafo com um único trecho de texto
    pub fn from_plain(text: &str) -> Self {
        RichText(vec![json!({
            "type": "rich_text",
            "elements": [{
                "type": "rich_text_section",
                "elements": [{"type": "text", "text": text}]
            }]
        })])
    }

    /// Aceita blocos já estruturados (cada um precisa ser um objeto com `type`)
    pub fn from_blocks(blocks: Vec<Value>) -> Result<Self> {
        for block in &blocks {
            let typed = block
                .as_object()
                .and_then(|obj| obj.get("type"))
                .and_then(Value::as_str)
                .is_some();
            if !typed {
                return Err(SlackListsError::ValidationError(
                    "rich_text blocks must be objects with a 'type'".to_string(),
                ));
            }
        }
        Ok(RichText(blocks))
    }

    pub fn blocks(&self) -> &[Value] {
        &self.0
    }

    /// Extrai o texto plano do documento
    ///
    /// Suporta seções, listas, blocos de código e citações. Links viram o
    /// texto do link (ou a URL), menções viram `<@U123>` / `<#C123>`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.0 {
            if block.get("type").and_then(Value::as_str) != Some("rich_text") {
                continue;
            }
            for element in children(block) {
                match element.get("type").and_then(Value::as_str) {
                    Some("rich_text_section")
                    | Some("rich_text_preformatted")
                    | Some("rich_text_quote") => push_inline(&mut out, element),
                    Some("rich_text_list") => {
                        for entry in children(element) {
                            if entry.get("type").and_then(Value::as_str)
                                == Some("rich_text_section")
                            {
                                push_inline(&mut out, entry);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        out
    }
}

fn children(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("elements")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn push_inline(out: &mut String, container: &Value) {
    for run in children(container) {
        match run.get("type").and_then(Value::as_str) {
            Some("text") => out.push_str(str_field(run, "text")),
            Some("link") => {
                let text = str_field(run, "text");
                out.push_str(if text.is_empty() { str_field(run, "url") } else { text });
            }
            Some("user") => out.push_str(&format!("<@{}>", str_field(run, "user_id"))),
            Some("channel") => out.push_str(&format!("<#{}>", str_field(run, "channel_id"))),
            _ => {}
        }
    }
}

fn str_field<'a>(node: &'a Value, name: &str) -> &'a str {
    node.get(name).and_then(Value::as_str).unwrap_or("")
}

/// Valor canônico de um campo (formato exigido pela API), um variant por tipo
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(RichText),
    Select(Vec<String>),
    User(Vec<String>),
    /// Datas `YYYY-MM-DD`
    Date(Vec<String>),
    Number(Vec<Number>),
    Checkbox(bool),
    Email(Vec<String>),
    Phone(Vec<String>),
    /// Objetos `{original_url, display_name?, ...}`
    Link(Vec<Value>),
    /// IDs de arquivos
    Attachment(Vec<String>),
    Channel(Vec<String>),
    /// Permalinks de mensagens
    Message(Vec<String>),
    Rating(Vec<Number>),
    /// Unix timestamps (segundos)
    Timestamp(Vec<Number>),
    Vote(Vec<Number>),
    Canvas(Vec<String>),
    Reference(Vec<Value>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Select(_) => FieldKind::Select,
            FieldValue::User(_) => FieldKind::User,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Checkbox(_) => FieldKind::Checkbox,
            FieldValue::Email(_) => FieldKind::Email,
            FieldValue::Phone(_) => FieldKind::Phone,
            FieldValue::Link(_) => FieldKind::Link,
            FieldValue::Attachment(_) => FieldKind::Attachment,
            FieldValue::Channel(_) => FieldKind::Channel,
            FieldValue::Message(_) => FieldKind::Message,
            FieldValue::Rating(_) => FieldKind::Rating,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Vote(_) => FieldKind::Vote,
            FieldValue::Canvas(_) => FieldKind::Canvas,
            FieldValue::Reference(_) => FieldKind::Reference,
        }
    }

    /// Payload do valor no formato da API (sem a chave)
    pub fn to_wire(&self) -> Value {
        match self {
            FieldValue::Text(rich) => json!(rich.blocks()),
            FieldValue::Checkbox(checked) => Value::Bool(*checked),
            FieldValue::Select(ids)
            | FieldValue::User(ids)
            | FieldValue::Date(ids)
            | FieldValue::Email(ids)
            | FieldValue::Phone(ids)
            | FieldValue::Attachment(ids)
            | FieldValue::Channel(ids)
            | FieldValue::Message(ids)
            | FieldValue::Canvas(ids) => json!(ids),
            FieldValue::Number(nums)
            | FieldValue::Rating(nums)
            | FieldValue::Timestamp(nums)
            | FieldValue::Vote(nums) => json!(nums),
            FieldValue::Link(values) | FieldValue::Reference(values) => json!(values),
        }
    }

    /// Decodifica um payload canônico vindo da API
    ///
    /// Diferente de `FieldCodec::to_canonical`, não aceita a forma simplificada.
    pub fn from_wire(kind: FieldKind, payload: &Value) -> Result<Self> {
        let mismatch = || {
            SlackListsError::ValidationError(format!(
                "unexpected canonical payload for '{}' field: {}",
                kind, payload
            ))
        };
        let array = || payload.as_array().ok_or_else(mismatch);
        let strings = || -> Result<Vec<String>> {
            array()?
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(mismatch))
                .collect()
        };
        let numbers = || -> Result<Vec<Number>> {
            array()?
                .iter()
                .map(|v| match v {
                    Value::Number(n) => Ok(n.clone()),
                    _ => Err(mismatch()),
                })
                .collect()
        };

        Ok(match kind {
            FieldKind::Text => FieldValue::Text(RichText::from_blocks(array()?.clone())?),
            FieldKind::Checkbox => FieldValue::Checkbox(payload.as_bool().ok_or_else(mismatch)?),
            FieldKind::Select => FieldValue::Select(strings()?),
            FieldKind::User => FieldValue::User(strings()?),
            FieldKind::Date => FieldValue::Date(strings()?),
            FieldKind::Email => FieldValue::Email(strings()?),
            FieldKind::Phone => FieldValue::Phone(strings()?),
            FieldKind::Attachment => FieldValue::Attachment(strings()?),
            FieldKind::Channel => FieldValue::Channel(strings()?),
            FieldKind::Message => FieldValue::Message(strings()?),
            FieldKind::Canvas => FieldValue::Canvas(strings()?),
            FieldKind::Number => FieldValue::Number(numbers()?),
            FieldKind::Rating => FieldValue::Rating(numbers()?),
            FieldKind::Timestamp => FieldValue::Timestamp(numbers()?),
            FieldKind::Vote => FieldValue::Vote(numbers()?),
            FieldKind::Link => FieldValue::Link(array()?.clone()),
            FieldKind::Reference => FieldValue::Reference(array()?.clone()),
        })
    }
}
