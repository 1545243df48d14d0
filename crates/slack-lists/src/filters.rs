//! Filtros declarativos avaliados no cliente
//!
//! `slackLists.items.list` não aceita filtros, então toda filtragem acontece
//! localmente depois de cada página. Formato de entrada:
//!
//! ```json
//! {"status": {"in": ["todo", "doing"]}, "name": {"contains": "milk"}}
//! ```
//!
//! Campos são localizados por `column_id` ou `key`. Todos os predicados
//! precisam casar (AND).
//!
//! `FilterEngine::from_json` valida o operando contra o operador. A validação
//! contra o tipo da coluna (ex.: `contains` em checkbox) exige o schema e só
//! acontece via `check_columns`; `list_items` não busca o schema e, sem ele,
//! um predicado incompatível simplesmente não casa.

use crate::error::{Result, SlackListsError};
use crate::fields::to_simplified;
use crate::types::{ColumnDefinition, FieldKind, FieldValue, Item, ItemField};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::In,
        Self::NotIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::In => "in",
            Self::NotIn => "not_in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = SlackListsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                SlackListsError::InvalidFilter(format!(
                    "unknown operator '{}'. Supported: equals, not_equals, contains, not_contains, in, not_in",
                    s
                ))
            })
    }
}

/// Predicado `(campo, operador, operando)`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: FilterOperator,
    pub operand: Value,
}

impl FilterPredicate {
    /// Valida o operando contra o operador:
    /// `contains`/`not_contains` exigem string, `in`/`not_in` exigem lista
    pub fn new(field: impl Into<String>, operator: FilterOperator, operand: Value) -> Result<Self> {
        let field = field.into();
        let valid = match operator {
            FilterOperator::Contains | FilterOperator::NotContains => operand.is_string(),
            FilterOperator::In | FilterOperator::NotIn => operand.is_array(),
            FilterOperator::Equals | FilterOperator::NotEquals => true,
        };
        if !valid {
            return Err(SlackListsError::InvalidFilter(format!(
                "operator '{}' on '{}' does not accept operand {}",
                operator, field, operand
            )));
        }
        Ok(Self {
            field,
            operator,
            operand,
        })
    }

    /// Confere operador e operando contra o tipo da coluna
    pub fn check_kind(&self, kind: FieldKind) -> Result<()> {
        let numeric = matches!(
            kind,
            FieldKind::Number | FieldKind::Rating | FieldKind::Timestamp | FieldKind::Vote
        );
        let scalar_ok = |value: &Value| match kind {
            FieldKind::Checkbox => value.is_boolean() || value.is_null(),
            _ if numeric => value.is_number() || value.is_null(),
            _ => true,
        };

        let valid = match self.operator {
            FilterOperator::Contains | FilterOperator::NotContains => {
                kind != FieldKind::Checkbox && !numeric
            }
            FilterOperator::Equals | FilterOperator::NotEquals => scalar_ok(&self.operand),
            FilterOperator::In | FilterOperator::NotIn => self
                .operand
                .as_array()
                .map_or(false, |values| values.iter().all(|v| scalar_ok(v))),
        };

        if !valid {
            return Err(SlackListsError::InvalidFilter(format!(
                "operator '{}' with operand {} does not apply to {} column '{}'",
                self.operator, self.operand, kind, self.field
            )));
        }
        Ok(())
    }

    pub fn matches(&self, item: &Item) -> bool {
        let subject = item
            .field(&self.field)
            .map(Subject::from_field)
            .unwrap_or(Subject::Empty);

        match self.operator {
            FilterOperator::Equals => subject.equals(&self.operand),
            FilterOperator::NotEquals => !subject.equals(&self.operand),
            FilterOperator::Contains => subject.contains(&self.operand),
            FilterOperator::NotContains => !subject.contains(&self.operand),
            FilterOperator::In => subject.is_in(&self.operand),
            FilterOperator::NotIn => !subject.is_in(&self.operand),
        }
    }
}

/// Conjunto de predicados combinados com AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterEngine {
    predicates: Vec<FilterPredicate>,
}

impl FilterEngine {
    pub fn new(predicates: Vec<FilterPredicate>) -> Self {
        Self { predicates }
    }

    /// Interpreta `{campo: {operador: operando, ...}, ...}`. `null` = sem filtros.
    pub fn from_json(filters: &Value) -> Result<Self> {
        let map = match filters {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(SlackListsError::InvalidFilter(format!(
                    "filters must be an object, got {}",
                    other
                )))
            }
        };

        let mut predicates = Vec::new();
        for (field, condition) in map {
            let conditions = condition.as_object().ok_or_else(|| {
                SlackListsError::InvalidFilter(format!(
                    "filter for '{}' must be an object like {{\"equals\": ...}}",
                    field
                ))
            })?;
            for (operator, operand) in conditions {
                predicates.push(FilterPredicate::new(
                    field.clone(),
                    operator.parse()?,
                    operand.clone(),
                )?);
            }
        }
        Ok(Self { predicates })
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Valida cada predicado contra o tipo da coluna correspondente.
    /// Campos fora do schema não são checados (casam como vazios).
    pub fn check_columns(&self, columns: &[ColumnDefinition]) -> Result<()> {
        for predicate in &self.predicates {
            if let Some(column) = columns.iter().find(|c| c.matches(&predicate.field)) {
                predicate.check_kind(column.kind()?)?;
            }
        }
        Ok(())
    }

    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }

    /// Mantém a ordem original
    pub fn filter(&self, items: Vec<Item>) -> Vec<Item> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// Valor do campo já simplificado para comparação
#[derive(Debug)]
enum Subject {
    Empty,
    Scalar(Value),
    List(Vec<Value>),
}

impl Subject {
    fn from_field(field: &ItemField) -> Self {
        match field.value() {
            Ok(Some(value)) => Self::from_value(&value),
            // célula sem tipo reconhecido: usa o `value` genérico da API
            _ => match field.payload.get("value") {
                Some(Value::Array(values)) => Self::List(values.clone()),
                Some(Value::Null) | None => Self::Empty,
                Some(other) => Self::Scalar(other.clone()),
            },
        }
    }

    fn from_value(value: &FieldValue) -> Self {
        match to_simplified(value.kind(), value) {
            Ok(Value::Array(values)) => Self::List(values),
            Ok(scalar) => Self::Scalar(scalar),
            Err(_) => Self::Empty,
        }
    }

    fn equals(&self, operand: &Value) -> bool {
        match (self, operand) {
            (Self::Empty, Value::String(s)) => s.is_empty(),
            (Self::Empty, Value::Array(a)) => a.is_empty(),
            (Self::Empty, Value::Null) => true,
            (Self::Empty, _) => false,
            (Self::Scalar(value), _) => values_equal(value, operand),
            (Self::List(values), Value::Array(expected)) => same_set(values, expected),
            (Self::List(values), scalar) => same_set(values, std::slice::from_ref(scalar)),
        }
    }

    fn contains(&self, operand: &Value) -> bool {
        let needle = operand.as_str().unwrap_or_default().to_lowercase();
        match self {
            Self::Empty => needle.is_empty(),
            Self::Scalar(value) => as_text(value).to_lowercase().contains(&needle),
            Self::List(values) => values
                .iter()
                .any(|v| as_text(v).to_lowercase().contains(&needle)),
        }
    }

    fn is_in(&self, operand: &Value) -> bool {
        let candidates = operand.as_array().map(Vec::as_slice).unwrap_or_default();
        let member = |v: &Value| candidates.iter().any(|c| values_equal(v, c));
        match self {
            Self::Empty => false,
            Self::Scalar(value) => member(value),
            Self::List(values) => values.iter().any(member),
        }
    }
}

/// Igualdade estrutural; números comparados numericamente (`4 == 4.0`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn same_set(left: &[Value], right: &[Value]) -> bool {
    left.iter().all(|l| right.iter().any(|r| values_equal(l, r)))
        && right.iter().all(|r| left.iter().any(|l| values_equal(l, r)))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RichText;
    use serde_json::json;

    fn item(id: &str, fields: Value) -> Item {
        serde_json::from_value(json!({"id": id, "fields": fields})).unwrap()
    }

    fn task(id: &str, name: &str, status: &str) -> Item {
        item(
            id,
            json!([
                {"key": "name", "column_id": "Col1", "rich_text": RichText::from_plain(name)},
                {"key": "status", "column_id": "Col2", "select": [status]},
                {"key": "estimate", "column_id": "Col3", "number": [3]},
                {"key": "done", "column_id": "Col4", "checkbox": false}
            ]),
        )
    }

    fn engine(filters: Value) -> FilterEngine {
        FilterEngine::from_json(&filters).unwrap()
    }

    #[test]
    fn test_in_filter_keeps_order() {
        let items = vec![
            task("Rec1", "Buy milk", "todo"),
            task("Rec2", "Pay rent", "done"),
            task("Rec3", "Call mom", "doing"),
        ];

        let filtered = engine(json!({"status": {"in": ["todo", "doing"]}})).filter(items);
        let ids: Vec<_> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["Rec1", "Rec3"]);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let engine = FilterEngine::from_json(&Value::Null).unwrap();
        assert!(engine.is_empty());
        assert!(engine.matches(&task("Rec1", "x", "todo")));
        assert!(FilterEngine::from_json(&json!({})).unwrap().matches(&item("Rec2", json!([]))));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let t = task("Rec1", "Buy Milk", "todo");
        assert!(engine(json!({"name": {"contains": "milk"}})).matches(&t));
        assert!(engine(json!({"Col1": {"contains": "BUY"}})).matches(&t));
        assert!(!engine(json!({"name": {"contains": "bread"}})).matches(&t));
    }

    #[test]
    fn test_contains_and_not_contains_are_complements() {
        let items = vec![
            task("Rec1", "Buy Milk", "todo"),
            item("Rec2", json!([])),
            item("Rec3", json!([{"key": "name", "column_id": "Col1", "select": ["Milk", "x"]}])),
        ];
        for needle in ["milk", "MILK", "", "zzz"] {
            for it in &items {
                let yes = engine(json!({"name": {"contains": needle}})).matches(it);
                let no = engine(json!({"name": {"not_contains": needle}})).matches(it);
                assert_ne!(yes, no, "item {} needle {:?}", it.id, needle);
            }
        }
    }

    #[test]
    fn test_predicates_are_anded() {
        let t = task("Rec1", "Buy milk", "todo");
        assert!(engine(json!({"status": {"equals": "todo"}, "name": {"contains": "milk"}})).matches(&t));
        assert!(!engine(json!({"status": {"equals": "todo"}, "name": {"contains": "rent"}})).matches(&t));
        assert!(!engine(json!({"status": {"equals": "todo", "not_in": ["todo"]}})).matches(&t));
    }

    #[test]
    fn test_equals_semantics_by_kind() {
        let t = task("Rec1", "Buy milk", "todo");
        assert!(engine(json!({"name": {"equals": "Buy milk"}})).matches(&t));
        assert!(engine(json!({"status": {"equals": ["todo"]}})).matches(&t));
        assert!(engine(json!({"estimate": {"equals": 3.0}})).matches(&t));
        assert!(engine(json!({"done": {"equals": false}})).matches(&t));
        assert!(engine(json!({"done": {"not_equals": true}})).matches(&t));
    }

    #[test]
    fn test_select_set_comparison_ignores_order() {
        let t = item("Rec1", json!([{"column_id": "Col2", "user": ["U1", "U2"]}]));
        assert!(engine(json!({"Col2": {"equals": ["U2", "U1"]}})).matches(&t));
        assert!(!engine(json!({"Col2": {"equals": "U1"}})).matches(&t));
        assert!(engine(json!({"Col2": {"in": ["U2", "U9"]}})).matches(&t));
        assert!(!engine(json!({"Col2": {"not_in": ["U2"]}})).matches(&t));
    }

    #[test]
    fn test_missing_field_is_empty() {
        let t = item("Rec1", json!([]));
        assert!(!engine(json!({"status": {"equals": "todo"}})).matches(&t));
        assert!(engine(json!({"status": {"not_equals": "todo"}})).matches(&t));
        assert!(!engine(json!({"status": {"in": ["todo"]}})).matches(&t));
        assert!(engine(json!({"status": {"not_in": ["todo"]}})).matches(&t));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = FilterEngine::from_json(&json!({"status": {"like": "to%"}})).unwrap_err();
        assert!(matches!(err, SlackListsError::InvalidFilter(_)));
    }

    fn columns() -> Vec<ColumnDefinition> {
        serde_json::from_value(json!([
            {"id": "Col1", "key": "name", "name": "Name", "type": "text"},
            {"id": "Col3", "key": "estimate", "name": "Estimate", "type": "number"},
            {"id": "Col4", "key": "done", "name": "Done", "type": "checkbox"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_operator_checked_against_column_kind() {
        let columns = columns();

        for filters in [
            json!({"done": {"contains": "yes"}}),
            json!({"estimate": {"not_contains": "3"}}),
            json!({"done": {"equals": "true"}}),
            json!({"Col3": {"in": [1, "two"]}}),
        ] {
            let err = engine(filters.clone()).check_columns(&columns).unwrap_err();
            assert!(matches!(err, SlackListsError::InvalidFilter(_)), "{}", filters);
        }

        assert!(engine(json!({
            "name": {"contains": "milk"},
            "done": {"equals": false},
            "estimate": {"in": [1, 3]},
            "unknown": {"contains": "x"}
        }))
        .check_columns(&columns)
        .is_ok());
    }

    #[test]
    fn test_operand_type_mismatch_is_rejected() {
        for filters in [
            json!({"status": {"in": "todo"}}),
            json!({"name": {"contains": 3}}),
            json!({"name": "Buy milk"}),
            json!(["status"]),
        ] {
            let err = FilterEngine::from_json(&filters).unwrap_err();
            assert!(matches!(err, SlackListsError::InvalidFilter(_)), "{}", filters);
        }
    }
}
