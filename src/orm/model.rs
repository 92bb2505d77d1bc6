//! The [`Model`] trait maps a Rust type onto a Baserow table.
//!
//! A model declares its columns once per process (the placeholders inside
//! must stay stable, so implementations keep them in a `OnceLock`), converts
//! between itself and raw attribute records, and can describe how it should
//! be looked up when a mapping is generated.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::OrmError;

use super::column::{Column, ForeignKey};

/// One declared column of a model: plain data or a link to another model.
#[derive(Debug, Clone)]
pub enum ModelColumn {
    Data(Column),
    ForeignKey(ForeignKey),
}

impl ModelColumn {
    /// The underlying column regardless of kind.
    pub fn column(&self) -> &Column {
        match self {
            ModelColumn::Data(column) => column,
            ModelColumn::ForeignKey(fk) => fk,
        }
    }
}

/// Ordered attribute-name → column registry of a model.
#[derive(Debug, Clone, Default)]
pub struct ModelColumns {
    columns: Vec<(String, ModelColumn)>,
}

impl ModelColumns {
    pub fn builder() -> ModelColumnsBuilder {
        ModelColumnsBuilder {
            columns: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelColumn)> {
        self.columns.iter().map(|(attr, col)| (attr.as_str(), col))
    }

    pub fn get(&self, attr: &str) -> Option<&ModelColumn> {
        self.columns
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, col)| col)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub struct ModelColumnsBuilder {
    columns: Vec<(String, ModelColumn)>,
}

impl ModelColumnsBuilder {
    fn push(&mut self, attr: &str, column: ModelColumn) {
        // `id` is the row id, not a field.
        assert!(attr != "id", "attribute name \"id\" is reserved");
        assert!(
            !self.columns.iter().any(|(name, _)| name == attr),
            "duplicate attribute {:?}",
            attr
        );
        self.columns.push((attr.to_string(), column));
    }

    /// Declare a data column: model attribute `attr` backed by the Baserow
    /// field named `field_name`.
    pub fn column(mut self, attr: &str, field_name: &str) -> Self {
        self.push(attr, ModelColumn::Data(Column::new(field_name)));
        self
    }

    /// Declare a link-row column referencing `model_id`.
    pub fn foreign_key(mut self, attr: &str, field_name: &str, model_id: &'static str) -> Self {
        self.push(attr, ModelColumn::ForeignKey(ForeignKey::new(field_name, model_id)));
        self
    }

    pub fn build(self) -> ModelColumns {
        ModelColumns {
            columns: self.columns,
        }
    }
}

/// Input to [`super::generate_mapping`]: which table a model maps to and
/// any per-mapping field-name overrides.
#[derive(Debug, Clone)]
pub struct MappingSpec {
    pub model_id: String,
    pub columns: &'static ModelColumns,
    pub table_name: String,
    pub field_name_overrides: HashMap<String, String>,
}

/// A Rust type stored as rows of a Baserow table.
pub trait Model: Sized + Send + Sync + 'static {
    /// Stable identifier of the model, used as the key in mapping files.
    fn model_id() -> &'static str;

    /// Default table name for mapping generation, if the model has one.
    fn table_name() -> Option<&'static str> {
        None
    }

    /// The model's column registry. Must return the same instance on every
    /// call (keep it in a `static OnceLock`).
    fn columns() -> &'static ModelColumns;

    /// Build an instance from the row id and an attribute-name → value
    /// record (values are raw cell JSON).
    fn from_record(id: i64, record: HashMap<String, Value>) -> Result<Self, OrmError>;

    /// Render the instance as an attribute-name → cell value record.
    fn to_record(&self) -> HashMap<String, Value>;

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Mapping spec for an explicit table name with field-name overrides
    /// (`attr -> remote field name`).
    fn spec(table_name: &str, field_name_overrides: &[(&str, &str)]) -> MappingSpec {
        MappingSpec {
            model_id: Self::model_id().to_string(),
            columns: Self::columns(),
            table_name: table_name.to_string(),
            field_name_overrides: field_name_overrides
                .iter()
                .map(|(attr, name)| (attr.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Mapping spec using the model's own [`table_name`](Self::table_name).
    fn default_spec() -> Result<MappingSpec, OrmError> {
        let table_name = Self::table_name()
            .ok_or_else(|| OrmError::MissingTableName(Self::model_id().to_string()))?;
        Ok(Self::spec(table_name, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let columns = ModelColumns::builder()
            .column("name", "Name")
            .column("views", "Views")
            .foreign_key("author", "Author", "tests.Author")
            .build();
        let attrs: Vec<&str> = columns.iter().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec!["name", "views", "author"]);
        assert!(matches!(
            columns.get("author"),
            Some(ModelColumn::ForeignKey(_))
        ));
    }

    #[test]
    #[should_panic(expected = "reserved")]
    fn id_attribute_is_rejected() {
        let _ = ModelColumns::builder().column("id", "Id");
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn duplicate_attribute_is_rejected() {
        let _ = ModelColumns::builder()
            .column("name", "Name")
            .column("name", "Other");
    }
}
