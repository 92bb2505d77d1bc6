//! Example consumer: a separate Rust project that uses baserow-sdk as a
//! dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//!
//! Environment: `BASEROW_URL` plus either `BASEROW_TOKEN` (rows only) or
//! `BASEROW_USER`/`BASEROW_PASSWORD` (full API, needed the first time to
//! generate `mapping.json`).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use baserow_sdk::orm::{Database, Model, ModelColumns};
use baserow_sdk::{
    generate_mapping, BaserowClient, DatabaseMapping, OrmError, RowLink,
};
use serde_json::Value;

#[derive(Debug)]
struct Post {
    id: Option<i64>,
    name: String,
    views: i64,
    author: Vec<RowLink>,
}

impl Model for Post {
    fn model_id() -> &'static str {
        "example.Post"
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
                .foreign_key("author", "Author", "example.Author")
                .build()
        })
    }

    fn from_record(id: i64, record: HashMap<String, Value>) -> Result<Self, OrmError> {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let views = record.get("views").and_then(Value::as_i64).unwrap_or(0);
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("baserow_sdk=info")),
        )
        .init();

    let url = std::env::var("BASEROW_URL").unwrap_or_else(|_| "http://localhost".into());
    let mut client = match std::env::var("BASEROW_TOKEN") {
        Ok(token) => BaserowClient::with_token(&url, token),
        Err(_) => BaserowClient::new(&url),
    };

    if client.jwt().is_none() {
        if let (Ok(user), Ok(password)) = (
            std::env::var("BASEROW_USER"),
            std::env::var("BASEROW_PASSWORD"),
        ) {
            let user = client
                .login(&user, &password, Some(Path::new(".baserow-creds.json")))
                .await?;
            tracing::info!(username = %user.username, "logged in");
        }
    }

    // Generating a mapping needs a JWT; later runs can load the saved file
    // with only a database token.
    let mapping_path = Path::new("mapping.json");
    let has_jwt = client.jwt().is_some();
    let client = Arc::new(client);
    let mapping = if mapping_path.exists() {
        DatabaseMapping::load(mapping_path)?
    } else if has_jwt {
        let mapping =
            generate_mapping(client.as_ref(), "Blog", &[Post::default_spec()?]).await?;
        mapping.save(mapping_path)?;
        mapping
    } else {
        return Err("no mapping.json and no JWT to generate one".into());
    };

    let db = Database::new(client, mapping);

    let views = Post::columns().get("views").expect("declared column").column();
    let posts: Vec<Post> = db.select::<Post>()?.filter(views.higher_than(10)).all().await?;
    for post in &posts {
        println!(
            "#{} {} ({} views, {} author links)",
            post.id.unwrap_or_default(),
            post.name,
            post.views,
            post.author.len()
        );
    }

    let mut post = Post {
        id: None,
        name: "Hello from Rust".into(),
        views: 0,
        author: Vec::new(),
    };
    db.save(&mut post).await?;
    println!("created row {}", post.id.unwrap_or_default());

    Ok(())
}
