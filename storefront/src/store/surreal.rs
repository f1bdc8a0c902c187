//! SurrealDB document store
//!
//! Supports runtime protocol selection via URL scheme:
//! - `ws://` / `wss://` - WebSocket connections
//! - `http://` / `https://` - HTTP connections
//! - `mem://` - In-memory database (for testing)
//!
//! Each collection is a table. Records are keyed by the document id and also
//! carry it in a `doc_id` field, which is what queries filter and order on.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{document_id, DocumentStore, StoreError, StoreResult, ID_FIELD};
use crate::config::SurrealDbConfig;
use crate::query::{FilterCondition, OrderDirection, Pagination, SortSpec};

/// SurrealDB client type alias using the `Any` engine for runtime protocol selection
pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

const DOC_ID_FIELD: &str = "doc_id";

/// SurrealDB-backed [`DocumentStore`]
#[derive(Clone)]
pub struct SurrealStore {
    client: SurrealClient,
}

impl SurrealStore {
    /// Connect with exponential-backoff retries
    pub async fn connect(config: &SurrealDbConfig) -> StoreResult<Self> {
        let mut attempt = 0;
        let base_delay = Duration::from_secs(config.retry_delay_secs);

        loop {
            match try_connect(config).await {
                Ok(client) => {
                    tracing::info!(
                        attempts = attempt + 1,
                        "SurrealDB connected: url={}, ns={}, db={}",
                        sanitize_url(&config.url),
                        config.namespace,
                        config.database
                    );
                    return Ok(Self { client });
                }
                Err(e) => {
                    attempt += 1;

                    if attempt > config.max_retries {
                        tracing::error!(
                            "Failed to connect to SurrealDB after {} attempts: {}",
                            config.max_retries + 1,
                            e
                        );
                        return Err(e);
                    }

                    let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                    tracing::warn!(
                        "SurrealDB connection attempt {} failed: {}. Retrying in {:?}...",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn run(&self, sql: String, params: BTreeMap<String, Value>) -> StoreResult<Vec<Value>> {
        tracing::trace!(%sql, "SurrealDB query");
        let mut response = self
            .client
            .query(sql)
            .bind(params)
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        response
            .take::<Vec<Value>>(0)
            .map_err(|e| StoreError::query(e.to_string()))
    }

    async fn select(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        tail: &str,
        mut params: BTreeMap<String, Value>,
    ) -> StoreResult<Vec<Value>> {
        let clause = where_clause(filters, &mut params);
        params.insert("tb".into(), Value::String(collection.to_string()));
        let sql = format!("SELECT * OMIT id FROM type::table($tb){}{}", clause, tail);
        let rows = self.run(sql, params).await?;
        rows.into_iter()
            .map(|row| from_record(collection, row))
            .collect()
    }
}

#[async_trait]
impl DocumentStore for SurrealStore {
    fn backend(&self) -> &'static str {
        "surrealdb"
    }

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::query(format!("document for '{}' has no id", collection)))?
            .to_string();
        let params = BTreeMap::from([
            ("tb".to_string(), Value::String(collection.to_string())),
            ("id".to_string(), Value::String(id)),
            ("doc".to_string(), to_record(document)),
        ]);
        self.run("CREATE type::thing($tb, $id) CONTENT $doc RETURN NONE".into(), params)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let filters = [FilterCondition::eq(ID_FIELD, id)];
        let mut rows = self
            .select(collection, &filters, " LIMIT 1", BTreeMap::new())
            .await?;
        Ok(rows.pop())
    }

    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Value>> {
        let params = BTreeMap::from([
            ("tb".to_string(), Value::String(collection.to_string())),
            (
                "ids".to_string(),
                Value::Array(ids.iter().cloned().map(Value::String).collect()),
            ),
        ]);
        let sql = format!(
            "SELECT * OMIT id FROM type::table($tb) WHERE {} IN $ids",
            DOC_ID_FIELD
        );
        let rows = self.run(sql, params).await?;
        rows.into_iter()
            .map(|row| from_record(collection, row))
            .collect()
    }

    async fn find(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        sort: Option<&SortSpec>,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Value>> {
        let mut params = BTreeMap::new();
        let mut tail = String::new();

        // doc_id is time-ordered, so it doubles as insertion order and tie-breaker;
        // the tie-breaker follows the sort direction so descending is an exact reverse
        match sort {
            Some(sort) => {
                let direction = match sort.direction {
                    OrderDirection::Ascending => "ASC",
                    OrderDirection::Descending => "DESC",
                };
                tail.push_str(&format!(
                    " ORDER BY {} {}, {} {}",
                    quote_path(&sort.field),
                    direction,
                    DOC_ID_FIELD,
                    direction
                ));
            }
            None => tail.push_str(&format!(" ORDER BY {} ASC", DOC_ID_FIELD)),
        }

        if let Some(page) = pagination {
            tail.push_str(" LIMIT $limit START $start");
            params.insert("limit".into(), Value::from(page.limit));
            params.insert("start".into(), Value::from(page.offset));
        }

        self.select(collection, filters, &tail, params).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filters: &[FilterCondition],
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<Value>> {
        let mut params = BTreeMap::new();
        let mut clause = where_clause(filters, &mut params);
        if let Some(excluded) = exclude_id {
            clause.push_str(if clause.is_empty() { " WHERE " } else { " AND " });
            clause.push_str(&format!("{} != $excluded", DOC_ID_FIELD));
            params.insert("excluded".into(), Value::String(excluded.to_string()));
        }
        params.insert("tb".into(), Value::String(collection.to_string()));
        let sql = format!("SELECT * OMIT id FROM type::table($tb){} LIMIT 1", clause);
        let mut rows = self.run(sql, params).await?;
        rows.pop()
            .map(|row| from_record(collection, row))
            .transpose()
    }

    async fn count(&self, collection: &str, filters: &[FilterCondition]) -> StoreResult<u64> {
        let mut params = BTreeMap::new();
        let clause = where_clause(filters, &mut params);
        params.insert("tb".into(), Value::String(collection.to_string()));
        let sql = format!(
            "SELECT count() AS total FROM type::table($tb){} GROUP ALL",
            clause
        );
        let rows = self.run(sql, params).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("total"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    async fn replace(&self, collection: &str, id: &str, document: Value) -> StoreResult<bool> {
        let params = BTreeMap::from([
            ("tb".to_string(), Value::String(collection.to_string())),
            ("id".to_string(), Value::String(id.to_string())),
            ("doc".to_string(), to_record(document)),
        ]);
        let rows = self
            .run(
                "UPDATE type::thing($tb, $id) CONTENT $doc RETURN AFTER".into(),
                params,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let params = BTreeMap::from([
            ("tb".to_string(), Value::String(collection.to_string())),
            ("id".to_string(), Value::String(id.to_string())),
        ]);
        let rows = self
            .run("DELETE type::thing($tb, $id) RETURN BEFORE".into(), params)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .health()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))
    }
}

/// Attempt to create a SurrealDB client (single try)
async fn try_connect(config: &SurrealDbConfig) -> StoreResult<SurrealClient> {
    let url_safe = sanitize_url(&config.url);
    tracing::debug!("Connecting to SurrealDB: {}", url_safe);

    let client = surrealdb::engine::any::connect(&config.url)
        .await
        .map_err(|e| {
            StoreError::unavailable(format!(
                "Failed to connect to SurrealDB at '{}': {} ({})",
                url_safe,
                categorize_error(&e),
                e
            ))
        })?;

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client
            .signin(surrealdb::opt::auth::Root {
                username,
                password,
            })
            .await
            .map_err(|e| {
                StoreError::unavailable(format!(
                    "Failed to authenticate with SurrealDB at '{}': {} ({})",
                    url_safe,
                    categorize_error(&e),
                    e
                ))
            })?;
    }

    client
        .use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .map_err(|e| {
            StoreError::unavailable(format!(
                "Failed to select namespace '{}' / database '{}' on SurrealDB at '{}': {}",
                config.namespace,
                config.database,
                url_safe,
                e
            ))
        })?;

    Ok(client)
}

/// Sanitize connection URL for safe logging (remove credentials if present)
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..=scheme_end + 2];
            let after_at = &url[at_pos..];
            return format!("{}***{}", scheme, after_at);
        }
    }
    url.to_string()
}

fn categorize_error(err: &surrealdb::Error) -> &'static str {
    let err_str = err.to_string().to_lowercase();

    if err_str.contains("auth") || err_str.contains("credentials") || err_str.contains("signin") {
        "authentication error"
    } else if err_str.contains("connect")
        || err_str.contains("network")
        || err_str.contains("dns")
        || err_str.contains("refused")
    {
        "network error"
    } else if err_str.contains("timeout") {
        "timeout"
    } else {
        "connection error"
    }
}

/// Backtick-quote each segment of a dotted field path
fn quote_path(path: &str) -> String {
    path.split('.')
        .map(|segment| {
            let field = if segment == ID_FIELD { DOC_ID_FIELD } else { segment };
            format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn where_clause(filters: &[FilterCondition], params: &mut BTreeMap<String, Value>) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let conditions: Vec<String> = filters
        .iter()
        .enumerate()
        .map(|(i, filter)| {
            let name = format!("f{}", i);
            params.insert(name.clone(), filter.value.to_json());
            format!("{} = ${}", quote_path(&filter.field), name)
        })
        .collect();
    format!(" WHERE {}", conditions.join(" AND "))
}

fn to_record(mut document: Value) -> Value {
    if let Value::Object(map) = &mut document {
        if let Some(id) = map.remove(ID_FIELD) {
            map.insert(DOC_ID_FIELD.to_string(), id);
        }
    }
    document
}

fn from_record(collection: &str, mut row: Value) -> StoreResult<Value> {
    let Value::Object(map) = &mut row else {
        return Err(StoreError::corrupt(collection, "record is not an object"));
    };
    let id = map
        .remove(DOC_ID_FIELD)
        .ok_or_else(|| StoreError::corrupt(collection, "record has no doc_id"))?;
    map.insert(ID_FIELD.to_string(), id);
    Ok(row)
}
