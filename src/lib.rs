//! Baserow SDK: typed async client and lightweight ORM for the Baserow
//! REST API.

pub mod auth;
pub mod client;
pub mod error;
pub mod fields;
pub mod filter;
pub mod orm;
pub mod types;

pub use auth::{Credentials, CredentialsCache, DEFAULT_CREDENTIALS_FILE};
pub use client::{BaserowClient, CreateUserOptions, RowListOptions, RowPager, TableApi};
pub use error::{ApiError, OrmError};
pub use fields::{FieldKind, NumberType, SelectOption, TableField};
pub use filter::{Column, Filter, FilterMode, FilterType, FilterValue};
pub use orm::{generate_mapping, Database, DatabaseMapping, MappingSpec, Model};
pub use types::{Application, Group, Page, PermissionedOrderedGroup, Row, RowLink, Table, User};
