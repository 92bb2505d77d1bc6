//! Mapping between declared models and the server's internal ids.
//!
//! Generating a mapping needs a JWT-scoped client (it lists applications
//! and fields); the result can be saved as JSON and loaded later by
//! token-scoped processes that may only touch rows.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::client::TableApi;
use crate::error::OrmError;

use super::model::MappingSpec;

/// Where one model lives on the server: its table id and the internal field
/// id for each model attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMapping {
    pub table_id: i64,
    pub fields: HashMap<String, i64>,
}

impl ModelMapping {
    /// Internal field id → attribute name.
    pub fn reverse_fields(&self) -> HashMap<i64, &str> {
        self.fields
            .iter()
            .map(|(attr, id)| (*id, attr.as_str()))
            .collect()
    }
}

/// Mapping for a database and all of its models, keyed by model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMapping {
    pub database_id: i64,
    pub models: HashMap<String, ModelMapping>,
}

impl DatabaseMapping {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OrmError> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| OrmError::MappingIo(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| OrmError::MappingIo(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, OrmError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| OrmError::MappingIo(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| OrmError::MappingIo(e.to_string()))
    }
}

/// Resolve the named database and each spec's table and fields into a
/// [`DatabaseMapping`].
pub async fn generate_mapping(
    api: &dyn TableApi,
    dbname: &str,
    specs: &[MappingSpec],
) -> Result<DatabaseMapping, OrmError> {
    let applications = api.list_applications().await?;
    let db = applications
        .iter()
        .find(|app| app.name == dbname)
        .ok_or_else(|| OrmError::MissingDatabase(dbname.to_string()))?;

    let mut models = HashMap::new();
    for spec in specs {
        let table = db
            .tables
            .iter()
            .find(|t| t.name == spec.table_name)
            .ok_or_else(|| OrmError::MissingTable {
                database: dbname.to_string(),
                table: spec.table_name.clone(),
            })?;

        let table_fields = api.list_table_fields(table.id).await?;
        let mut fields = HashMap::new();
        for (attr, column) in spec.columns.iter() {
            let name = spec
                .field_name_overrides
                .get(attr)
                .map(String::as_str)
                .unwrap_or_else(|| column.column().name());
            let field = table_fields
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| OrmError::MissingField {
                    database: dbname.to_string(),
                    table: spec.table_name.clone(),
                    field: name.to_string(),
                })?;
            fields.insert(attr.to_string(), field.id);
        }

        models.insert(
            spec.model_id.clone(),
            ModelMapping {
                table_id: table.id,
                fields,
            },
        );
    }

    Ok(DatabaseMapping {
        database_id: db.id,
        models,
    })
}
