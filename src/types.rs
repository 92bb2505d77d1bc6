//! Data models mirroring the Baserow API resource shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw table row as returned by the rows endpoints: `id`, `order` and one
/// `field_{n}` entry per table field (or user field names when requested).
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permissions {
    Member,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionedOrderedGroup {
    pub id: i64,
    pub name: String,
    pub order: i64,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub order: i64,
    pub database_id: i64,
}

/// An application in a group. For applications of type `database` the
/// `tables` list holds the database's tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub order: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub group: Group,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// One page of a paginated listing. `previous` and `next` are page numbers
/// derived client-side; the API only reports whether a next page exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub results: Vec<T>,
}

/// One element of a `link_row` cell: the referenced row id plus its primary
/// field rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowLink {
    pub id: i64,
    pub value: String,
}
