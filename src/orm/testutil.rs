//! In-memory [`TableApi`] fake plus two mapped models, shared by the ORM
//! tests.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{RowListOptions, TableApi};
use crate::error::{ApiError, OrmError};
use crate::fields::{FieldKind, NumberType, TableField};
use crate::types::{Application, Group, Page, Row, RowLink, Table};

use super::model::{Model, ModelColumns};

/// Fake Baserow backend: one "Blog" database with a Posts and an Authors
/// table. Rows live in a mutex-guarded map; listings honor paging but not
/// filters (tests assert on the recorded options instead).
pub struct FakeApi {
    applications: Vec<Application>,
    fields: HashMap<i64, Vec<TableField>>,
    rows: Mutex<HashMap<i64, Vec<Row>>>,
    server_page_size: u32,
    last_options: Mutex<Option<RowListOptions>>,
}

pub const POSTS_TABLE: i64 = 20;
pub const AUTHORS_TABLE: i64 = 21;

fn text_field(id: i64, table_id: i64, name: &str, primary: bool) -> TableField {
    TableField {
        id,
        table_id,
        name: name.to_string(),
        order: 0,
        primary,
        kind: FieldKind::Text {
            text_default: String::new(),
        },
    }
}

fn post_row(id: i64, name: &str, views: i64) -> Row {
    let mut row = Row::new();
    row.insert("id".into(), Value::Number(id.into()));
    row.insert("order".into(), Value::Number(id.into()));
    row.insert("field_201".into(), Value::String(name.into()));
    row.insert("field_202".into(), Value::Number(views.into()));
    row.insert(
        "field_203".into(),
        serde_json::json!([{ "id": 1, "value": "ada" }]),
    );
    row
}

impl FakeApi {
    pub fn blog() -> Self {
        let group = Group {
            id: 1,
            name: "Workspace".into(),
        };
        let applications = vec![Application {
            id: 7,
            name: "Blog".into(),
            order: 0,
            kind: "database".into(),
            group,
            tables: vec![
                Table {
                    id: POSTS_TABLE,
                    name: "Posts".into(),
                    order: 0,
                    database_id: 7,
                },
                Table {
                    id: AUTHORS_TABLE,
                    name: "Authors".into(),
                    order: 1,
                    database_id: 7,
                },
            ],
        }];

        let mut fields = HashMap::new();
        fields.insert(
            POSTS_TABLE,
            vec![
                text_field(201, POSTS_TABLE, "Name", true),
                TableField {
                    id: 202,
                    table_id: POSTS_TABLE,
                    name: "Views".into(),
                    order: 1,
                    primary: false,
                    kind: FieldKind::Number {
                        number_decimal_places: 0,
                        number_negative: false,
                        number_type: NumberType::Integer,
                    },
                },
                TableField {
                    id: 203,
                    table_id: POSTS_TABLE,
                    name: "Author".into(),
                    order: 2,
                    primary: false,
                    kind: FieldKind::LinkRow {
                        link_row_table: AUTHORS_TABLE,
                        link_row_related_field: 212,
                    },
                },
            ],
        );
        fields.insert(
            AUTHORS_TABLE,
            vec![text_field(211, AUTHORS_TABLE, "Name", true)],
        );

        let mut rows = HashMap::new();
        rows.insert(
            POSTS_TABLE,
            (1..=5)
                .map(|n| post_row(n, &format!("post-{}", n), n * 10))
                .collect::<Vec<_>>(),
        );
        let mut author = Row::new();
        author.insert("id".into(), Value::Number(1.into()));
        author.insert("order".into(), Value::Number(1.into()));
        author.insert("field_211".into(), Value::String("ada".into()));
        rows.insert(AUTHORS_TABLE, vec![author]);

        FakeApi {
            applications,
            fields,
            rows: Mutex::new(rows),
            server_page_size: 100,
            last_options: Mutex::new(None),
        }
    }

    pub fn with_server_page_size(mut self, size: u32) -> Self {
        self.server_page_size = size;
        self
    }

    pub fn without_rows(self) -> Self {
        self.rows.lock().unwrap().values_mut().for_each(Vec::clear);
        self
    }

    /// Options passed to the most recent `list_rows` call.
    pub fn last_options(&self) -> Option<RowListOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableApi for FakeApi {
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError> {
        Ok(self.applications.clone())
    }

    async fn list_table_fields(&self, table_id: i64) -> Result<Vec<TableField>, ApiError> {
        Ok(self.fields.get(&table_id).cloned().unwrap_or_default())
    }

    async fn get_row(&self, table_id: i64, row_id: i64) -> Result<Row, ApiError> {
        self.rows
            .lock()
            .unwrap()
            .get(&table_id)
            .and_then(|rows| {
                rows.iter()
                    .find(|r| r.get("id").and_then(Value::as_i64) == Some(row_id))
            })
            .cloned()
            .ok_or(ApiError::Api {
                error: "ERROR_ROW_DOES_NOT_EXIST".into(),
                detail: format!("The row {} does not exist.", row_id),
            })
    }

    async fn create_row(&self, table_id: i64, record: &Row) -> Result<Row, ApiError> {
        let mut rows = self.rows.lock().unwrap();
        let table = rows.entry(table_id).or_default();
        let id = table
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        let mut row = record.clone();
        row.insert("id".into(), Value::Number(id.into()));
        row.insert("order".into(), Value::Number(id.into()));
        table.push(row.clone());
        Ok(row)
    }

    async fn update_row(&self, table_id: i64, row_id: i64, record: &Row) -> Result<Row, ApiError> {
        let mut rows = self.rows.lock().unwrap();
        let table = rows.get_mut(&table_id).ok_or(ApiError::Status(404))?;
        let row = table
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_i64) == Some(row_id))
            .ok_or(ApiError::Api {
                error: "ERROR_ROW_DOES_NOT_EXIST".into(),
                detail: format!("The row {} does not exist.", row_id),
            })?;
        for (key, value) in record {
            row.insert(key.clone(), value.clone());
        }
        Ok(row.clone())
    }

    async fn list_rows(&self, table_id: i64, options: &RowListOptions) -> Result<Page<Row>, ApiError> {
        *self.last_options.lock().unwrap() = Some(options.clone());
        let rows = self.rows.lock().unwrap();
        let all = rows.get(&table_id).cloned().unwrap_or_default();
        let page = options.page.unwrap_or(1).max(1);
        let size = options.size.unwrap_or(self.server_page_size).max(1) as usize;
        let start = (page as usize - 1) * size;
        let results: Vec<Row> = all.iter().skip(start).take(size).cloned().collect();
        let has_next = start + results.len() < all.len();
        Ok(Page {
            count: all.len() as u64,
            previous: if page > 1 { Some(page - 1) } else { None },
            next: if has_next { Some(page + 1) } else { None },
            results,
        })
    }
}

/// Test model mapped onto the Posts table.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub name: String,
    pub views: i64,
    pub author: Vec<RowLink>,
}

impl Model for Post {
    fn model_id() -> &'static str {
        "tests.Post"
    }

    fn table_name() -> Option<&'static str> {
        Some("Posts")
    }

    fn columns() -> &'static ModelColumns {
        static COLUMNS: OnceLock<ModelColumns> = OnceLock::new();
        COLUMNS.get_or_init(|| {
            ModelColumns::builder()
                .column("name", "Name")
                .column("views", "Views")
                .foreign_key("author", "Author", "tests.Author")
                .build()
        })
    }

    fn from_record(id: i64, record: HashMap<String, Value>) -> Result<Self, OrmError> {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| OrmError::Decode("Post.name".into()))?
            .to_string();
        let views = record
            .get("views")
            .and_then(Value::as_i64)
            .ok_or_else(|| OrmError::Decode("Post.views".into()))?;
        let author = match record.get("author") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| OrmError::Decode(format!("Post.author: {}", e)))?,
            None => Vec::new(),
        };
        Ok(Post {
            id: Some(id),
            name,
            views,
            author,
        })
    }

    fn to_record(&self) -> HashMap<String, Value> {
        let mut record = HashMap::new();
        record.insert("name".to_string(), Value::String(self.name.clone()));
        record.insert("views".to_string(), Value::Number(self.views.into()));
        record.insert(
            "author".to_string(),
            Value::Array(
                self.author
                    .iter()
                    .map(|link| Value::Number(link.id.into()))
                    .collect(),
            ),
        );
        record
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

/// Test model mapped onto the Authors table.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
}

impl Model for Author {
    fn model_id() -> &'static str {
        "tests.Author"
    }

    fn table_name() -> Option<&'static str> {
        Some("Authors")
    }

    fn columns() -> &'static ModelColumns {
        static COLUMNS: OnceLock<ModelColumns> = OnceLock::new();
        COLUMNS.get_or_init(|| ModelColumns::builder().column("name", "Name").build())
    }

    fn from_record(id: i64, record: HashMap<String, Value>) -> Result<Self, OrmError> {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| OrmError::Decode("Author.name".into()))?
            .to_string();
        Ok(Author { id: Some(id), name })
    }

    fn to_record(&self) -> HashMap<String, Value> {
        let mut record = HashMap::new();
        record.insert("name".to_string(), Value::String(self.name.clone()));
        record
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
