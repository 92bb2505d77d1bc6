//! ORM entry point: typed queries, saves, and link-row resolution over a
//! [`TableApi`] backend.

use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::client::{RowListOptions, TableApi};
use crate::error::OrmError;
use crate::filter::Filter;
use crate::types::{Row, RowLink};

use super::mapping::{DatabaseMapping, ModelMapping};
use super::model::Model;

/// ORM facade for one mapped database.
pub struct Database {
    api: Arc<dyn TableApi>,
    mapping: DatabaseMapping,
}

impl Database {
    pub fn new(api: Arc<dyn TableApi>, mapping: DatabaseMapping) -> Self {
        Database { api, mapping }
    }

    pub fn database_id(&self) -> i64 {
        self.mapping.database_id
    }

    fn model_mapping<M: Model>(&self) -> Result<&ModelMapping, OrmError> {
        self.mapping
            .models
            .get(M::model_id())
            .ok_or_else(|| OrmError::UnknownModel(M::model_id().to_string()))
    }

    /// Start a query for rows of `M`. Filters built from the model's
    /// columns are rewritten from their placeholders to `field_{id}`.
    pub fn select<M: Model>(&self) -> Result<Query<'_, M>, OrmError> {
        let mapping = self.model_mapping::<M>()?;
        let mut placeholders = HashMap::new();
        for (attr, column) in M::columns().iter() {
            let field_id = *mapping.fields.get(attr).ok_or_else(|| {
                OrmError::Decode(format!(
                    "attribute '{}' of model '{}' missing from mapping",
                    attr,
                    M::model_id()
                ))
            })?;
            placeholders.insert(column.column().placeholder().to_string(), field_id);
        }
        Ok(Query {
            db: self,
            mapping,
            placeholders,
            filters: Vec::new(),
            page_size: None,
            _marker: PhantomData,
        })
    }

    /// Load a single row by id.
    pub async fn get<M: Model>(&self, row_id: i64) -> Result<M, OrmError> {
        let mapping = self.model_mapping::<M>()?;
        let row = self.api.get_row(mapping.table_id, row_id).await?;
        self.build_model(mapping, row)
    }

    /// Save a model instance to its backing table: create when it has no
    /// id yet (the id is assigned afterwards), update otherwise.
    pub async fn save<M: Model>(&self, row: &mut M) -> Result<(), OrmError> {
        let mapping = self.model_mapping::<M>()?;
        let values = row.to_record();
        let mut record = Row::new();
        for (attr, _) in M::columns().iter() {
            let field_id = mapping.fields.get(attr).ok_or_else(|| {
                OrmError::Decode(format!(
                    "attribute '{}' of model '{}' missing from mapping",
                    attr,
                    M::model_id()
                ))
            })?;
            let value = values.get(attr).cloned().unwrap_or(Value::Null);
            record.insert(format!("field_{}", field_id), value);
        }

        match row.id() {
            None => {
                let created = self.api.create_row(mapping.table_id, &record).await?;
                let id = created
                    .get("id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| OrmError::Decode("created row without id".into()))?;
                row.set_id(id);
            }
            Some(id) => {
                self.api.update_row(mapping.table_id, id, &record).await?;
            }
        }
        Ok(())
    }

    /// Dereference `link_row` cell values into instances of the linked
    /// model. Nothing is fetched until this is called.
    pub async fn fetch_linked<M: Model>(&self, links: &[RowLink]) -> Result<Vec<M>, OrmError> {
        let mapping = self.model_mapping::<M>()?;
        let mut out = Vec::with_capacity(links.len());
        for link in links {
            let row = self.api.get_row(mapping.table_id, link.id).await?;
            out.push(self.build_model(mapping, row)?);
        }
        Ok(out)
    }

    /// Convert a raw row into a model instance: take `id`, drop `order`,
    /// translate `field_{n}` keys to attribute names, ignore unmapped
    /// fields.
    fn build_model<M: Model>(&self, mapping: &ModelMapping, row: Row) -> Result<M, OrmError> {
        let reverse = mapping.reverse_fields();
        let mut id = None;
        let mut record = HashMap::new();
        for (key, value) in row {
            if key == "id" {
                id = value.as_i64();
                continue;
            }
            if key == "order" {
                continue;
            }
            let Some(field_id) = key.strip_prefix("field_").and_then(|s| s.parse::<i64>().ok())
            else {
                continue;
            };
            if let Some(attr) = reverse.get(&field_id) {
                record.insert(attr.to_string(), value);
            }
        }
        let id = id.ok_or_else(|| OrmError::Decode("row without id".into()))?;
        M::from_record(id, record)
    }
}

/// A query for rows of one model. Accumulates filters and paging settings,
/// then executes via [`all`](Self::all), [`first`](Self::first) or
/// [`pager`](Self::pager).
pub struct Query<'a, M: Model> {
    db: &'a Database,
    mapping: &'a ModelMapping,
    placeholders: HashMap<String, i64>,
    filters: Vec<Filter>,
    page_size: Option<u32>,
    _marker: PhantomData<M>,
}

impl<'a, M: Model> Query<'a, M> {
    /// Add a filter. Placeholder field references from this model's columns
    /// are rewritten to the internal `field_{id}` form; other field names
    /// pass through untouched.
    pub fn filter(mut self, mut filter: Filter) -> Self {
        if let Some(field_id) = self.placeholders.get(&filter.field) {
            filter.field = format!("field_{}", field_id);
        }
        self.filters.push(filter);
        self
    }

    /// Rows to request per API call.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    fn options(&self) -> RowListOptions {
        let mut options = RowListOptions::new();
        options.filters = self.filters.clone();
        options.size = self.page_size;
        options
    }

    /// Execute and return an incremental pager over matching rows.
    pub fn pager(self) -> ModelPager<'a, M> {
        let options = self.options();
        ModelPager {
            db: self.db,
            mapping: self.mapping,
            options,
            next_page: None,
            started: false,
            buffer: VecDeque::new(),
            _marker: PhantomData,
        }
    }

    /// Execute and collect all matching rows.
    pub async fn all(self) -> Result<Vec<M>, OrmError> {
        let mut pager = self.pager();
        let mut out = Vec::new();
        while let Some(row) = pager.next().await? {
            out.push(row);
        }
        Ok(out)
    }

    /// Execute and return the first matching row, or
    /// [`OrmError::NoRowReturned`] when there is none.
    pub async fn first(self) -> Result<M, OrmError> {
        let mut pager = self.page_size(1).pager();
        pager.next().await?.ok_or(OrmError::NoRowReturned)
    }
}

/// Yields model instances page by page, fetching lazily.
pub struct ModelPager<'a, M: Model> {
    db: &'a Database,
    mapping: &'a ModelMapping,
    options: RowListOptions,
    next_page: Option<u32>,
    started: bool,
    buffer: VecDeque<Row>,
    _marker: PhantomData<M>,
}

impl<M: Model> ModelPager<'_, M> {
    /// The next matching row, or `None` once the listing is exhausted.
    pub async fn next(&mut self) -> Result<Option<M>, OrmError> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return self.db.build_model(self.mapping, row).map(Some);
            }
            if self.started && self.next_page.is_none() {
                return Ok(None);
            }
            let mut options = self.options.clone();
            options.page = self.next_page;
            let page = self.db.api.list_rows(self.mapping.table_id, &options).await?;
            self.started = true;
            self.next_page = page.next;
            if page.results.is_empty() && self.next_page.is_none() {
                return Ok(None);
            }
            self.buffer.extend(page.results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testutil::{Author, FakeApi, Post};

    async fn blog_db(page_size: u32) -> (Arc<FakeApi>, Database) {
        let api = Arc::new(FakeApi::blog().with_server_page_size(page_size));
        let mapping = super::super::mapping::generate_mapping(
            api.as_ref(),
            "Blog",
            &[Post::default_spec().unwrap(), Author::default_spec().unwrap()],
        )
        .await
        .unwrap();
        let db = Database::new(api.clone(), mapping);
        (api, db)
    }

    #[tokio::test]
    async fn all_walks_every_page() {
        let (_, db) = blog_db(2).await;
        let posts: Vec<Post> = db.select::<Post>().unwrap().all().await.unwrap();
        assert_eq!(posts.len(), 5);
        assert_eq!(posts[0].name, "post-1");
        assert_eq!(posts[4].name, "post-5");
        assert!(posts.iter().all(|p| p.id.is_some()));
    }

    #[tokio::test]
    async fn first_returns_one_row_or_fails() {
        let (_, db) = blog_db(100).await;
        let first: Post = db.select::<Post>().unwrap().first().await.unwrap();
        assert_eq!(first.name, "post-1");

        let api = Arc::new(FakeApi::blog().without_rows());
        let mapping = super::super::mapping::generate_mapping(
            api.as_ref(),
            "Blog",
            &[Post::default_spec().unwrap()],
        )
        .await
        .unwrap();
        let db = Database::new(api, mapping);
        let err = db.select::<Post>().unwrap().first().await.unwrap_err();
        assert!(matches!(err, OrmError::NoRowReturned));
    }

    #[tokio::test]
    async fn filters_are_rewritten_to_field_ids() {
        let (api, db) = blog_db(100).await;
        let columns = Post::columns();
        let name_col = columns.get("name").unwrap().column();
        let _ = db
            .select::<Post>()
            .unwrap()
            .filter(name_col.equal("post-3"))
            .all()
            .await
            .unwrap();

        let recorded = api.last_options().unwrap();
        let (key, value) = recorded.filters[0].to_query_parameter();
        assert_eq!(key, "filter__field_201__equal");
        assert_eq!(value, Some("post-3".to_string()));
    }

    #[tokio::test]
    async fn foreign_filters_pass_through() {
        let (api, db) = blog_db(100).await;
        let _ = db
            .select::<Post>()
            .unwrap()
            .filter(crate::filter::Column::new("field_999").not_empty())
            .all()
            .await
            .unwrap();
        let recorded = api.last_options().unwrap();
        assert_eq!(
            recorded.filters[0].to_query_parameter().0,
            "filter__field_999__not_empty"
        );
    }

    #[tokio::test]
    async fn save_creates_then_updates() {
        let (_, db) = blog_db(100).await;
        let mut post = Post {
            id: None,
            name: "fresh".into(),
            views: 1,
            author: Vec::new(),
        };
        db.save(&mut post).await.unwrap();
        let id = post.id.expect("assigned id");

        post.views = 2;
        db.save(&mut post).await.unwrap();

        let loaded: Post = db.get(id).await.unwrap();
        assert_eq!(loaded.name, "fresh");
        assert_eq!(loaded.views, 2);
    }

    #[tokio::test]
    async fn linked_rows_fetch_on_demand() {
        let (_, db) = blog_db(100).await;
        let post: Post = db.select::<Post>().unwrap().first().await.unwrap();
        assert_eq!(post.author.len(), 1);

        let authors: Vec<Author> = db.fetch_linked(&post.author).await.unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "ada");
    }

    #[tokio::test]
    async fn unknown_model_is_reported() {
        let api = Arc::new(FakeApi::blog());
        let mapping = super::super::mapping::generate_mapping(
            api.as_ref(),
            "Blog",
            &[Post::default_spec().unwrap()],
        )
        .await
        .unwrap();
        let db = Database::new(api, mapping);
        assert!(matches!(
            db.select::<Author>(),
            Err(OrmError::UnknownModel(id)) if id == "tests.Author"
        ));
    }
}
