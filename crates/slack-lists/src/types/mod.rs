//! Tipos do Slack Lists

pub mod column;
pub mod field;
pub mod item;

pub use column::{ColumnDefinition, ColumnOptions, ListStructure, SelectChoice};
pub use field::{FieldKind, FieldValue, RichText};
pub use item::{Item, ItemField, ItemsPage};
