//! Typed errors for API calls and ORM operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered 4xx/5xx with a Baserow JSON error body.
    #[error("{error}: {detail}")]
    Api { error: String, detail: String },
    /// Non-success status without a JSON error body.
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode: {0}")]
    Decode(String),
    #[error("token and jwt can not be specified at the same time")]
    AuthConflict,
    #[error("no JWT set")]
    MissingJwt,
}

#[derive(Error, Debug)]
pub enum OrmError {
    /// At least one row was expected but the query returned none.
    #[error("no row returned")]
    NoRowReturned,
    #[error("model '{0}' is not part of the database mapping")]
    UnknownModel(String),
    #[error("missing table name for model '{0}'")]
    MissingTableName(String),
    #[error("database '{0}' does not exist")]
    MissingDatabase(String),
    #[error("table '{database}/{table}' does not exist")]
    MissingTable { database: String, table: String },
    #[error("field '{database}/{table}/{field}' does not exist")]
    MissingField {
        database: String,
        table: String,
        field: String,
    },
    #[error("mapping file: {0}")]
    MappingIo(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}
