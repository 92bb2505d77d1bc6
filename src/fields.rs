//! Table field models. The API discriminates field kinds with a flat `type`
//! tag next to the common attributes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableField {
    pub id: i64,
    pub table_id: i64,
    pub name: String,
    pub order: i64,
    pub primary: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        text_default: String,
    },
    LongText,
    Number {
        number_decimal_places: i32,
        number_negative: bool,
        number_type: NumberType,
    },
    SingleSelect {
        select_options: Vec<SelectOption>,
    },
    Url,
    LinkRow {
        link_row_table: i64,
        link_row_related_field: i64,
    },
    Boolean,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NumberType {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: i64,
    pub value: String,
    pub color: String,
}
