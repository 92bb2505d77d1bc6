//! Model columns. A column is declared with the user-facing field name; the
//! placeholder it carries is rewritten to the internal `field_{id}` form
//! when a filter built from it is executed.

use std::ops::Deref;

use uuid::Uuid;

use crate::filter;

/// A model column bound to a Baserow field by name.
///
/// Dereferences to [`filter::Column`] keyed by the placeholder, so the full
/// set of filter constructors (`equal`, `contains`, `date_before`, …) is
/// available directly on the column.
#[derive(Debug, Clone)]
pub struct Column {
    user_name: String,
    inner: filter::Column,
}

impl Column {
    pub fn new(user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        // Placeholder references to this id are replaced with the internal
        // field id when queries run.
        let inner = filter::Column::new(format!("{}.{}", user_name, Uuid::new_v4()));
        Column { user_name, inner }
    }

    /// The user-facing field name in Baserow.
    pub fn name(&self) -> &str {
        &self.user_name
    }

    /// The unique placeholder this column uses in filter expressions.
    pub fn placeholder(&self) -> &str {
        self.inner.name()
    }
}

impl Deref for Column {
    type Target = filter::Column;

    fn deref(&self) -> &filter::Column {
        &self.inner
    }
}

/// A column referencing rows of another model through a `link_row` field.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    column: Column,
    model_id: &'static str,
}

impl ForeignKey {
    pub fn new(user_name: impl Into<String>, model_id: &'static str) -> Self {
        ForeignKey {
            column: Column::new(user_name),
            model_id,
        }
    }

    /// Model id of the referenced model.
    pub fn model_id(&self) -> &'static str {
        self.model_id
    }
}

impl Deref for ForeignKey {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_embeds_name_and_is_unique() {
        let a = Column::new("Title");
        let b = Column::new("Title");
        assert!(a.placeholder().starts_with("Title."));
        assert_ne!(a.placeholder(), b.placeholder());
    }

    #[test]
    fn filters_are_keyed_by_placeholder() {
        let col = Column::new("Title");
        let (key, value) = col.equal("abc").to_query_parameter();
        assert_eq!(key, format!("filter__{}__equal", col.placeholder()));
        assert_eq!(value, Some("abc".to_string()));
    }
}
