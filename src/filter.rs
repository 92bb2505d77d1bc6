//! Row filter expressions rendered as `filter__{field}__{mode}` query
//! parameters.

use chrono::{DateTime, NaiveDate, Utc};

/// How multiple filters combine (`filter_type` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    And,
    Or,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::And => "AND",
            FilterType::Or => "OR",
        }
    }
}

/// The comparison applied by a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FilterMode {
    Equal,
    NotEqual,
    FilenameContains,
    Contains,
    ContainsNot,
    HigherThan,
    LowerThan,
    DateEqual,
    DateBefore,
    DateAfter,
    DateNotEqual,
    DateEqualsToday,
    DateEqualsMonth,
    DateEqualsYear,
    SingleSelectEqual,
    SingleSelectNotEqual,
    LinkRowHas,
    LinkRowHasNot,
    Boolean,
    Empty,
    NotEmpty,
}

impl FilterMode {
    /// Wire name of the mode as it appears in the query-parameter key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Equal => "equal",
            FilterMode::NotEqual => "not_equal",
            FilterMode::FilenameContains => "filename_contains",
            FilterMode::Contains => "contains",
            FilterMode::ContainsNot => "contains_not",
            FilterMode::HigherThan => "higher_than",
            FilterMode::LowerThan => "lower_than",
            FilterMode::DateEqual => "date_equal",
            FilterMode::DateBefore => "date_before",
            FilterMode::DateAfter => "date_after",
            FilterMode::DateNotEqual => "date_not_equal",
            FilterMode::DateEqualsToday => "date_equals_today",
            FilterMode::DateEqualsMonth => "date_equals_month",
            FilterMode::DateEqualsYear => "date_equals_year",
            FilterMode::SingleSelectEqual => "single_select_equal",
            FilterMode::SingleSelectNotEqual => "single_select_not_equal",
            FilterMode::LinkRowHas => "link_row_has",
            FilterMode::LinkRowHasNot => "link_row_has_not",
            FilterMode::Boolean => "boolean",
            FilterMode::Empty => "empty",
            FilterMode::NotEmpty => "not_empty",
        }
    }
}

/// A filter comparison value. Dates render as `%Y-%m-%d`, datetimes as
/// `%Y-%m-%dT%H:%M:%S%z`; everything else stringifies plainly.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::Str(s) => s.clone(),
            FilterValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FilterValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v as i64)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Str(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        FilterValue::Date(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        FilterValue::DateTime(v)
    }
}

/// One row filter: field reference, comparison mode, optional value.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub mode: FilterMode,
    pub value: Option<FilterValue>,
}

impl Filter {
    pub fn new(field: impl Into<String>, mode: FilterMode, value: Option<FilterValue>) -> Self {
        Filter {
            field: field.into(),
            mode,
            value,
        }
    }

    /// Render as a query-string pair: `filter__{field}__{mode}` plus the
    /// stringified value (valueless modes send an empty value).
    pub fn to_query_parameter(&self) -> (String, Option<String>) {
        let key = format!("filter__{}__{}", self.field, self.mode.as_str());
        (key, self.value.as_ref().map(FilterValue::render))
    }
}

/// Helper to build [`Filter`]s for a named field.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self, mode: FilterMode, value: Option<FilterValue>) -> Filter {
        Filter::new(self.name.clone(), mode, value)
    }

    pub fn equal(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::Equal, Some(value.into()))
    }

    pub fn not_equal(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::NotEqual, Some(value.into()))
    }

    pub fn filename_contains(&self, value: impl Into<String>) -> Filter {
        self.filter(FilterMode::FilenameContains, Some(FilterValue::Str(value.into())))
    }

    pub fn contains(&self, value: impl Into<String>) -> Filter {
        self.filter(FilterMode::Contains, Some(FilterValue::Str(value.into())))
    }

    pub fn contains_not(&self, value: impl Into<String>) -> Filter {
        self.filter(FilterMode::ContainsNot, Some(FilterValue::Str(value.into())))
    }

    pub fn higher_than(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::HigherThan, Some(value.into()))
    }

    pub fn lower_than(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::LowerThan, Some(value.into()))
    }

    pub fn date_equal(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::DateEqual, Some(value.into()))
    }

    pub fn date_before(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::DateBefore, Some(value.into()))
    }

    pub fn date_after(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::DateAfter, Some(value.into()))
    }

    pub fn date_not_equal(&self, value: impl Into<FilterValue>) -> Filter {
        self.filter(FilterMode::DateNotEqual, Some(value.into()))
    }

    pub fn date_equals_today(&self) -> Filter {
        self.filter(FilterMode::DateEqualsToday, None)
    }

    pub fn date_equals_month(&self, month: i64) -> Filter {
        self.filter(FilterMode::DateEqualsMonth, Some(FilterValue::Int(month)))
    }

    pub fn date_equals_year(&self, year: i64) -> Filter {
        self.filter(FilterMode::DateEqualsYear, Some(FilterValue::Int(year)))
    }

    pub fn single_select_equal(&self, value: impl Into<String>) -> Filter {
        self.filter(FilterMode::SingleSelectEqual, Some(FilterValue::Str(value.into())))
    }

    pub fn single_select_not_equal(&self, value: impl Into<String>) -> Filter {
        self.filter(
            FilterMode::SingleSelectNotEqual,
            Some(FilterValue::Str(value.into())),
        )
    }

    pub fn link_row_has(&self, row_id: i64) -> Filter {
        self.filter(FilterMode::LinkRowHas, Some(FilterValue::Int(row_id)))
    }

    pub fn link_row_has_not(&self, row_id: i64) -> Filter {
        self.filter(FilterMode::LinkRowHasNot, Some(FilterValue::Int(row_id)))
    }

    pub fn empty(&self) -> Filter {
        self.filter(FilterMode::Empty, None)
    }

    pub fn not_empty(&self) -> Filter {
        self.filter(FilterMode::NotEmpty, None)
    }
}
