//! HTTP client for Baserow servers: authenticated request plumbing plus one
//! wrapper per REST endpoint.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Credentials, CredentialsCache};
use crate::error::ApiError;
use crate::fields::TableField;
use crate::filter::{Filter, FilterType};
use crate::types::{Application, Page, PermissionedOrderedGroup, Row, Table, User};

/// Parameters for the row-listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct RowListOptions {
    pub exclude: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub filter_type: Option<FilterType>,
    pub include: Option<Vec<String>>,
    pub order_by: Option<Vec<String>>,
    pub page: Option<u32>,
    pub search: Option<String>,
    pub size: Option<u32>,
    pub user_field_names: bool,
}

impl RowListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, fields: Vec<String>) -> Self {
        self.exclude = Some(fields);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }

    pub fn include(mut self, fields: Vec<String>) -> Self {
        self.include = Some(fields);
        self
    }

    pub fn order_by(mut self, fields: Vec<String>) -> Self {
        self.order_by = Some(fields);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn user_field_names(mut self, enabled: bool) -> Self {
        self.user_field_names = enabled;
        self
    }

    /// Render the query-string pairs. Valueless filter modes (`empty`,
    /// `not_empty`, `date_equals_today`) send an empty value; the server
    /// only inspects the key.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(exclude) = &self.exclude {
            params.push(("exclude".to_string(), exclude.join(",")));
        }
        for filter in &self.filters {
            let (key, value) = filter.to_query_parameter();
            params.push((key, value.unwrap_or_default()));
        }
        if let Some(filter_type) = self.filter_type {
            params.push(("filter_type".to_string(), filter_type.as_str().to_string()));
        }
        if let Some(include) = &self.include {
            params.push(("include".to_string(), include.join(",")));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("order_by".to_string(), order_by.join(",")));
        }
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(size) = self.size {
            params.push(("size".to_string(), size.to_string()));
        }
        if self.user_field_names {
            params.push(("user_field_names".to_string(), "true".to_string()));
        }
        params
    }
}

/// Optional attributes for [`BaserowClient::create_user`].
#[derive(Debug, Clone, Default)]
pub struct CreateUserOptions {
    /// Also issue a JWT for the new user; returned alongside the user.
    pub authenticate: bool,
    pub group_invitation_token: Option<String>,
    pub template_id: Option<i64>,
}

/// Wire envelope of the row-listing endpoint. `next`/`previous` are URLs;
/// the public [`Page`] carries page numbers instead.
#[derive(Deserialize)]
struct RowListEnvelope {
    count: u64,
    next: Option<String>,
    results: Vec<Row>,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    user: User,
    token: Option<String>,
}

fn page_from_envelope(envelope: RowListEnvelope, page: u32) -> Page<Row> {
    Page {
        count: envelope.count,
        previous: if page > 1 { Some(page - 1) } else { None },
        next: envelope.next.map(|_| page + 1),
        results: envelope.results,
    }
}

/// Client for Baserow servers.
///
/// Construct anonymously with [`BaserowClient::new`] for endpoints that need
/// no authentication (`token_auth`, `create_user`), or with
/// [`with_token`](Self::with_token) / [`with_jwt`](Self::with_jwt) for the
/// rest of the API.
pub struct BaserowClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl BaserowClient {
    pub fn new(url: impl Into<String>) -> Self {
        BaserowClient {
            http: reqwest::Client::new(),
            base_url: url.into().trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    /// Client authenticated with a long-lived database token.
    pub fn with_token(url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut client = Self::new(url);
        client.set_token(token);
        client
    }

    /// Client authenticated with a JWT.
    pub fn with_jwt(url: impl Into<String>, jwt: impl Into<String>) -> Self {
        let mut client = Self::new(url);
        client.set_jwt(jwt);
        client
    }

    /// Build a client from optional credential parts, rejecting the
    /// ambiguous case where both are given.
    pub fn from_parts(
        url: impl Into<String>,
        token: Option<String>,
        jwt: Option<String>,
    ) -> Result<Self, ApiError> {
        match (token, jwt) {
            (Some(_), Some(_)) => Err(ApiError::AuthConflict),
            (Some(token), None) => Ok(Self::with_token(url, token)),
            (None, Some(jwt)) => Ok(Self::with_jwt(url, jwt)),
            (None, None) => Ok(Self::new(url)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn jwt(&self) -> Option<&str> {
        self.credentials.as_ref().and_then(Credentials::jwt)
    }

    pub fn set_jwt(&mut self, jwt: impl Into<String>) {
        self.credentials = Some(Credentials::Jwt(jwt.into()));
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.credentials = Some(Credentials::Token(token.into()));
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue a request and translate error responses. 4xx/5xx with a JSON
    /// body become [`ApiError::Api`]; anything else non-success becomes
    /// [`ApiError::Status`].
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut req = self.http.request(method.clone(), self.endpoint(path));
        if let Some(credentials) = &self.credentials {
            req = req.header(AUTHORIZATION, credentials.header_value());
        }
        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        tracing::debug!(%method, path, "request");
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let is_json = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.starts_with("application/json"))
                .unwrap_or(false);
            if is_json {
                let data: Value = resp
                    .json()
                    .await
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                tracing::debug!(%method, path, %data, "error response");
                return Err(ApiError::Api {
                    error: data
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("UNKNOWN")
                        .to_string(),
                    detail: data
                        .get("detail")
                        .map(|d| match d {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| "???".to_string()),
                });
            }
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(resp)
    }

    async fn request_json<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<R, ApiError> {
        let resp = self.request(method, path, query, body).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ── Settings ────────────────────────────────────────────────────

    pub async fn get_settings(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "api/settings/", None, None)
            .await
    }

    pub async fn update_settings(&self, settings: &Value) -> Result<(), ApiError> {
        self.request(Method::PATCH, "api/settings/update/", None, Some(settings))
            .await?;
        Ok(())
    }

    // ── Users & auth ────────────────────────────────────────────────

    /// Authenticate with username and password, returning the user and a
    /// fresh JWT. Does not modify the client's credentials.
    pub async fn token_auth(&self, username: &str, password: &str) -> Result<(User, String), ApiError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let envelope: AuthEnvelope = self
            .request_json(Method::POST, "api/user/token-auth/", None, Some(&body))
            .await?;
        let token = envelope
            .token
            .ok_or_else(|| ApiError::Decode("token-auth response without token".into()))?;
        Ok((envelope.user, token))
    }

    /// Exchange a still-valid JWT for a fresh one.
    pub async fn token_refresh(&self, token: &str) -> Result<(User, String), ApiError> {
        let body = serde_json::json!({ "token": token });
        let envelope: AuthEnvelope = self
            .request_json(Method::POST, "api/user/token-refresh/", None, Some(&body))
            .await?;
        let token = envelope
            .token
            .ok_or_else(|| ApiError::Decode("token-refresh response without token".into()))?;
        Ok((envelope.user, token))
    }

    /// Register a new user. Returns the user and, when
    /// `options.authenticate` is set, a JWT.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        options: &CreateUserOptions,
    ) -> Result<(User, Option<String>), ApiError> {
        let mut body = serde_json::json!({ "name": name, "email": email, "password": password });
        if options.authenticate {
            body["authenticate"] = Value::Bool(true);
        }
        if let Some(token) = &options.group_invitation_token {
            body["group_invitation_token"] = Value::String(token.clone());
        }
        if let Some(template_id) = options.template_id {
            body["template_id"] = Value::Number(template_id.into());
        }
        let envelope: AuthEnvelope = self
            .request_json(Method::POST, "api/user/", None, Some(&body))
            .await?;
        Ok((envelope.user, envelope.token))
    }

    /// Log in with username and password, updating the client's JWT. When
    /// `cache` names a credentials file, a previously stored JWT for this
    /// URL and username is refreshed and reused; a fresh JWT is generated
    /// (and stored) only when refreshing fails.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        cache: Option<&Path>,
    ) -> Result<User, ApiError> {
        let mut store = cache.map(|path| CredentialsCache::load(Some(path)));
        if let Some(store) = &mut store {
            if let Some(cached) = store.get(&self.base_url, username).map(str::to_string) {
                tracing::info!("Refreshing JWT");
                match self.token_refresh(&cached).await {
                    Ok((user, jwt)) => {
                        store.put(&self.base_url, username, &jwt)?;
                        self.set_jwt(jwt);
                        return Ok(user);
                    }
                    Err(err) => {
                        tracing::debug!(%err, "cached JWT rejected, creating a new one");
                    }
                }
            }
        }

        tracing::info!("Creating new JWT");
        let (user, jwt) = self.token_auth(username, password).await?;
        if let Some(store) = &mut store {
            store.put(&self.base_url, username, &jwt)?;
        }
        self.set_jwt(jwt);
        Ok(user)
    }

    /// Store the client's current JWT for `username` in the credentials
    /// file, so a later [`login`](Self::login) can refresh it instead of
    /// asking for the password again. Fails with [`ApiError::MissingJwt`]
    /// when the client holds no JWT.
    pub fn save_credentials(&self, username: &str, cache: Option<&Path>) -> Result<(), ApiError> {
        let jwt = self.jwt().ok_or(ApiError::MissingJwt)?;
        let mut store = CredentialsCache::load(cache);
        store.put(&self.base_url, username, jwt)
    }

    // ── Groups & applications ───────────────────────────────────────

    pub async fn list_groups(&self) -> Result<Vec<PermissionedOrderedGroup>, ApiError> {
        self.request_json(Method::GET, "api/groups/", None, None).await
    }

    pub async fn create_group(&self, name: &str) -> Result<PermissionedOrderedGroup, ApiError> {
        let body = serde_json::json!({ "name": name });
        self.request_json(Method::POST, "api/groups/", None, Some(&body))
            .await
    }

    /// All applications across all groups the user belongs to.
    pub async fn list_all_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.request_json(Method::GET, "api/applications/", None, None)
            .await
    }

    // ── Tables ──────────────────────────────────────────────────────

    pub async fn get_database_table(&self, table_id: i64) -> Result<Table, ApiError> {
        self.request_json(
            Method::GET,
            &format!("api/database/tables/{}", table_id),
            None,
            None,
        )
        .await
    }

    pub async fn update_database_table(&self, table_id: i64, name: &str) -> Result<Table, ApiError> {
        let body = serde_json::json!({ "name": name });
        self.request_json(
            Method::PATCH,
            &format!("api/database/tables/{}", table_id),
            None,
            Some(&body),
        )
        .await
    }

    pub async fn list_database_tables(&self, database_id: i64) -> Result<Vec<Table>, ApiError> {
        self.request_json(
            Method::GET,
            &format!("api/database/tables/database/{}", database_id),
            None,
            None,
        )
        .await
    }

    pub async fn create_database_table(&self, database_id: i64, name: &str) -> Result<Table, ApiError> {
        let body = serde_json::json!({ "name": name });
        self.request_json(
            Method::POST,
            &format!("api/database/tables/database/{}/", database_id),
            None,
            Some(&body),
        )
        .await
    }

    pub async fn delete_database_table(&self, table_id: i64) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("api/database/tables/{}/", table_id),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    // ── Fields ──────────────────────────────────────────────────────

    pub async fn list_database_table_fields(&self, table_id: i64) -> Result<Vec<TableField>, ApiError> {
        self.request_json(
            Method::GET,
            &format!("api/database/fields/table/{}", table_id),
            None,
            None,
        )
        .await
    }

    /// Create a field. `field` is the raw field definition (`name`, `type`
    /// and the type-specific attributes).
    pub async fn create_database_table_field(
        &self,
        table_id: i64,
        field: &Value,
    ) -> Result<TableField, ApiError> {
        self.request_json(
            Method::POST,
            &format!("api/database/fields/table/{}/", table_id),
            None,
            Some(field),
        )
        .await
    }

    pub async fn update_database_table_field(
        &self,
        field_id: i64,
        field: &Value,
    ) -> Result<TableField, ApiError> {
        self.request_json(
            Method::PATCH,
            &format!("api/database/fields/{}/", field_id),
            None,
            Some(field),
        )
        .await
    }

    pub async fn delete_database_table_field(&self, field_id: i64) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("api/database/fields/{}/", field_id),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    // ── Rows ────────────────────────────────────────────────────────

    /// List one page of rows. Page numbers are 1-based; when `options.page`
    /// is unset the first page is fetched.
    pub async fn list_database_table_rows(
        &self,
        table_id: i64,
        options: &RowListOptions,
    ) -> Result<Page<Row>, ApiError> {
        let page = options.page.unwrap_or(1);
        let query = options.to_query();
        let envelope: RowListEnvelope = self
            .request_json(
                Method::GET,
                &format!("api/database/rows/table/{}/", table_id),
                Some(&query),
                None,
            )
            .await?;
        Ok(page_from_envelope(envelope, page))
    }

    pub async fn get_database_table_row(&self, table_id: i64, row_id: i64) -> Result<Row, ApiError> {
        self.request_json(
            Method::GET,
            &format!("api/database/rows/table/{}/{}/", table_id, row_id),
            None,
            None,
        )
        .await
    }

    pub async fn create_database_table_row(&self, table_id: i64, record: &Row) -> Result<Row, ApiError> {
        let body = Value::Object(record.clone());
        self.request_json(
            Method::POST,
            &format!("api/database/rows/table/{}/", table_id),
            None,
            Some(&body),
        )
        .await
    }

    pub async fn update_database_table_row(
        &self,
        table_id: i64,
        row_id: i64,
        record: &Row,
    ) -> Result<Row, ApiError> {
        let body = Value::Object(record.clone());
        self.request_json(
            Method::PATCH,
            &format!("api/database/rows/table/{}/{}/", table_id, row_id),
            None,
            Some(&body),
        )
        .await
    }

    pub async fn delete_database_table_row(&self, table_id: i64, row_id: i64) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("api/database/rows/table/{}/{}/", table_id, row_id),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    /// Walk all pages of a row listing. Empty pages are skipped.
    pub fn row_pager(&self, table_id: i64, options: RowListOptions) -> RowPager<'_> {
        RowPager {
            client: self,
            table_id,
            options,
            next_page: None,
            started: false,
        }
    }
}

/// Incremental page iterator over a row listing.
pub struct RowPager<'a> {
    client: &'a BaserowClient,
    table_id: i64,
    options: RowListOptions,
    next_page: Option<u32>,
    started: bool,
}

impl RowPager<'_> {
    /// The next non-empty page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Page<Row>>, ApiError> {
        loop {
            if self.started && self.next_page.is_none() {
                return Ok(None);
            }
            let mut options = self.options.clone();
            options.page = self.next_page;
            let page = self
                .client
                .list_database_table_rows(self.table_id, &options)
                .await?;
            self.started = true;
            self.next_page = page.next;
            if page.results.is_empty() {
                if self.next_page.is_none() {
                    return Ok(None);
                }
                continue;
            }
            return Ok(Some(page));
        }
    }
}

/// The slice of the API the ORM needs. Implemented by [`BaserowClient`];
/// tests substitute an in-memory fake.
#[async_trait]
pub trait TableApi: Send + Sync {
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError>;
    async fn list_table_fields(&self, table_id: i64) -> Result<Vec<TableField>, ApiError>;
    async fn get_row(&self, table_id: i64, row_id: i64) -> Result<Row, ApiError>;
    async fn create_row(&self, table_id: i64, record: &Row) -> Result<Row, ApiError>;
    async fn update_row(&self, table_id: i64, row_id: i64, record: &Row) -> Result<Row, ApiError>;
    async fn list_rows(&self, table_id: i64, options: &RowListOptions) -> Result<Page<Row>, ApiError>;
}

#[async_trait]
impl TableApi for BaserowClient {
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.list_all_applications().await
    }

    async fn list_table_fields(&self, table_id: i64) -> Result<Vec<TableField>, ApiError> {
        self.list_database_table_fields(table_id).await
    }

    async fn get_row(&self, table_id: i64, row_id: i64) -> Result<Row, ApiError> {
        self.get_database_table_row(table_id, row_id).await
    }

    async fn create_row(&self, table_id: i64, record: &Row) -> Result<Row, ApiError> {
        self.create_database_table_row(table_id, record).await
    }

    async fn update_row(&self, table_id: i64, row_id: i64, record: &Row) -> Result<Row, ApiError> {
        self.update_database_table_row(table_id, row_id, record).await
    }

    async fn list_rows(&self, table_id: i64, options: &RowListOptions) -> Result<Page<Row>, ApiError> {
        self.list_database_table_rows(table_id, options).await
    }
}
