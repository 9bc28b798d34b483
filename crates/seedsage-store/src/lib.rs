//! DuckDB-backed record store for seed packs.
//!
//! One flat table, `seed_packs`, with store-assigned monotonic ids. Every
//! public operation opens one connection, performs exactly one logical
//! operation and drops the connection on every exit path; there is no
//! pooling, no caching and no multi-statement transaction. Insertion is a
//! single atomic statement on a separate, parameterized path; the
//! translation layer only ever reaches the store through
//! [`SeedStore::execute_readonly`].

use std::path::PathBuf;

use chrono::NaiveDate;
use duckdb::{params, Connection};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use seedsage_core::{ColumnInfo, SchemaContext};

mod record;

pub use record::{NewSeedPack, ParseEnumError, PlantType, QuantityBucket, SeedFilter, SeedPack, UNKNOWN};

/// The one managed table.
pub const TABLE: &str = "seed_packs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("seed name must not be empty")]
    EmptySeedName,

    #[error("invalid date in store: {0}")]
    BadDate(String),

    #[error("invalid value in store: {0}")]
    BadValue(String),
}

/// Tabular result of a read-only query, with values already converted to
/// JSON.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    /// Render as `{columns, rows: [{col: val}], row_count}`.
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (i, col) in self.columns.iter().enumerate() {
                    if let Some(value) = row.get(i) {
                        obj.insert(col.clone(), value.clone());
                    }
                }
                serde_json::Value::Object(obj)
            })
            .collect();

        json!({
            "columns": self.columns,
            "rows": rows,
            "row_count": self.row_count,
        })
    }
}

/// Handle on the database file. Cheap to clone conceptually: it holds only
/// the path; connections are scoped to each call.
pub struct SeedStore {
    path: PathBuf,
}

impl SeedStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Create the table and its id sequence if missing.
    pub fn init(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE SEQUENCE IF NOT EXISTS seed_packs_id_seq;
             CREATE TABLE IF NOT EXISTS seed_packs (
                 id BIGINT PRIMARY KEY DEFAULT nextval('seed_packs_id_seq'),
                 seed_name VARCHAR NOT NULL,
                 variety VARCHAR NOT NULL DEFAULT 'unknown',
                 quantity VARCHAR NOT NULL,
                 plant_type VARCHAR NOT NULL,
                 seed_source VARCHAR NOT NULL DEFAULT 'unknown',
                 date_acquired DATE NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Insert one seed pack and return its store-assigned id.
    pub fn insert(&self, pack: &NewSeedPack) -> Result<i64, StoreError> {
        if pack.seed_name.trim().is_empty() {
            return Err(StoreError::EmptySeedName);
        }

        let variety = non_empty_or_unknown(pack.variety.as_deref());
        let seed_source = non_empty_or_unknown(pack.seed_source.as_deref());
        let date_acquired = pack
            .date_acquired
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let conn = self.connect()?;
        let id: i64 = conn.query_row(
            "INSERT INTO seed_packs (seed_name, variety, quantity, plant_type, seed_source, date_acquired)
             VALUES (?, ?, ?, ?, ?, CAST(? AS DATE))
             RETURNING id",
            params![
                pack.seed_name,
                variety,
                pack.quantity.as_str(),
                pack.plant_type.as_str(),
                seed_source,
                date_acquired.to_string(),
            ],
            |row| row.get(0),
        )?;

        debug!(id, seed_name = %pack.seed_name, "inserted seed pack");
        Ok(id)
    }

    /// List seed packs, newest acquisitions first, with optional filters.
    pub fn list(&self, filter: &SeedFilter) -> Result<Vec<SeedPack>, StoreError> {
        let mut sql = String::from(
            "SELECT id, seed_name, variety, quantity, plant_type, seed_source, \
             CAST(date_acquired AS VARCHAR) \
             FROM seed_packs",
        );

        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(plant_type) = filter.plant_type {
            clauses.push("plant_type = ?");
            args.push(plant_type.as_str().to_string());
        }
        if let Some(quantity) = filter.quantity {
            clauses.push("quantity = ?");
            args.push(quantity.as_str().to_string());
        }
        if let Some(source) = &filter.seed_source {
            clauses.push("seed_source = ?");
            args.push(source.clone());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date_acquired DESC, id DESC");

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let raw_rows: Vec<(i64, String, String, String, String, String, String)> = stmt
            .query_map(duckdb::params_from_iter(args), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        raw_rows
            .into_iter()
            .map(|(id, seed_name, variety, quantity, plant_type, seed_source, date)| {
                Ok(SeedPack {
                    id,
                    seed_name,
                    variety,
                    quantity: quantity
                        .parse()
                        .map_err(|e: ParseEnumError| StoreError::BadValue(e.to_string()))?,
                    plant_type: plant_type
                        .parse()
                        .map_err(|e: ParseEnumError| StoreError::BadValue(e.to_string()))?,
                    seed_source,
                    date_acquired: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .map_err(|_| StoreError::BadDate(date.clone()))?,
                })
            })
            .collect()
    }

    /// Produce the schema context for the managed table: columns, distinct
    /// constrained values, row count and up to 5 sample rows. One read
    /// connection per call, no retry, no caching.
    pub fn describe(&self) -> Result<SchemaContext, StoreError> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            "SELECT column_name, data_type, is_nullable \
             FROM information_schema.columns \
             WHERE table_name = ? \
             ORDER BY ordinal_position",
        )?;
        let columns: Vec<ColumnInfo> = stmt
            .query_map([TABLE], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    is_nullable: row.get::<_, String>(2)? == "YES",
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let row_count: i64 = conn.query_row("SELECT COUNT(*) FROM seed_packs", [], |row| row.get(0))?;

        let plant_types = distinct_values(&conn, "plant_type")?;
        let quantities = distinct_values(&conn, "quantity")?;
        let sources = distinct_values(&conn, "seed_source")?;

        let mut sample_stmt = conn.prepare(
            "SELECT id, seed_name, variety, quantity, plant_type, seed_source, \
             CAST(date_acquired AS VARCHAR) AS date_acquired \
             FROM seed_packs LIMIT 5",
        )?;
        let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let sample_rows: Vec<serde_json::Map<String, serde_json::Value>> = sample_stmt
            .query_map([], |row| {
                let mut obj = serde_json::Map::new();
                for (idx, name) in column_names.iter().enumerate() {
                    obj.insert(name.clone(), value_to_json(row, idx)?);
                }
                Ok(obj)
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(SchemaContext {
            table: TABLE.to_string(),
            row_count: row_count as usize,
            columns,
            plant_types,
            quantities,
            sources,
            sample_rows,
        })
    }

    /// Execute a validated read-only query and convert the rows to JSON.
    ///
    /// The caller is responsible for synthesis and gate validation; the
    /// store runs what it is given on a scoped connection.
    pub fn execute_readonly(&self, sql: &str) -> Result<QueryResult, StoreError> {
        debug!(%sql, "executing read-only query");
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut columns: Vec<String> = Vec::new();
        let mut result_rows: Vec<Vec<serde_json::Value>> = Vec::new();

        while let Some(row) = rows.next()? {
            if columns.is_empty() {
                let count = row.as_ref().column_count();
                for i in 0..count {
                    columns.push(row.as_ref().column_name(i)?.to_string());
                }
            }
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(value_to_json(row, i)?);
            }
            result_rows.push(values);
        }

        let row_count = result_rows.len();
        Ok(QueryResult {
            columns,
            rows: result_rows,
            row_count,
        })
    }
}

fn non_empty_or_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn distinct_values(conn: &Connection, column: &str) -> Result<Vec<String>, StoreError> {
    let sql = format!("SELECT DISTINCT {column} FROM {TABLE} ORDER BY 1");
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(values)
}

/// Convert one cell to JSON.
fn value_to_json(row: &duckdb::Row, idx: usize) -> duckdb::Result<serde_json::Value> {
    use duckdb::types::ValueRef;

    Ok(match row.get_ref(idx)? {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => json!(i),
        ValueRef::SmallInt(i) => json!(i),
        ValueRef::Int(i) => json!(i),
        ValueRef::BigInt(i) => json!(i),
        ValueRef::HugeInt(i) => json!(i),
        ValueRef::UTinyInt(i) => json!(i),
        ValueRef::USmallInt(i) => json!(i),
        ValueRef::UInt(i) => json!(i),
        ValueRef::UBigInt(i) => json!(i),
        ValueRef::Float(f) => json!(f),
        ValueRef::Double(f) => json!(f),
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Date32(days) => match NaiveDate::from_num_days_from_ce_opt(days + 719_163) {
            Some(date) => serde_json::Value::String(date.to_string()),
            None => serde_json::Value::Null,
        },
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
        _ => serde_json::Value::String("<unsupported>".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn temp_store(name: &str) -> SeedStore {
        let path = std::env::temp_dir().join(format!(
            "seedsage-store-test-{}-{}.duckdb",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let store = SeedStore::open(&path);
        store.init().unwrap();
        store
    }

    fn tomato() -> NewSeedPack {
        NewSeedPack {
            seed_name: "Cherokee Purple Tomato".to_string(),
            variety: Some("Cherokee Purple".to_string()),
            quantity: QuantityBucket::Few,
            plant_type: PlantType::Vegetable,
            seed_source: Some("Oak Lawn Library".to_string()),
            date_acquired: NaiveDate::from_ymd_opt(2025, 3, 14),
        }
    }

    #[test]
    fn insert_assigns_monotonic_ids() {
        let store = temp_store("monotonic-ids");
        let first = store.insert(&tomato()).unwrap();
        let second = store
            .insert(&NewSeedPack::new("Genovese Basil", QuantityBucket::Lots, PlantType::Herb))
            .unwrap();

        assert!(second > first);
    }

    #[test]
    fn insert_applies_sentinel_and_date_defaults() {
        let store = temp_store("defaults");
        store
            .insert(&NewSeedPack::new("Marigold", QuantityBucket::Medium, PlantType::Flower))
            .unwrap();

        let packs = store.list(&SeedFilter::default()).unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].variety, UNKNOWN);
        assert_eq!(packs[0].seed_source, UNKNOWN);
        assert_eq!(packs[0].date_acquired, chrono::Local::now().date_naive());
    }

    #[test]
    fn empty_seed_name_is_rejected_and_store_unchanged() {
        let store = temp_store("empty-name");
        let err = store
            .insert(&NewSeedPack::new("  ", QuantityBucket::Few, PlantType::Other))
            .unwrap_err();

        assert!(matches!(err, StoreError::EmptySeedName));
        assert!(store.list(&SeedFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_plant_type_and_orders_newest_first() {
        let store = temp_store("filters");
        store.insert(&tomato()).unwrap();
        let mut basil = NewSeedPack::new("Genovese Basil", QuantityBucket::Lots, PlantType::Herb);
        basil.date_acquired = NaiveDate::from_ymd_opt(2025, 4, 1);
        store.insert(&basil).unwrap();

        let all = store.list(&SeedFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].seed_name, "Genovese Basil");

        let herbs = store
            .list(&SeedFilter {
                plant_type: Some(PlantType::Herb),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(herbs.len(), 1);
        assert_eq!(herbs[0].plant_type, PlantType::Herb);
    }

    #[test]
    fn describe_reports_columns_count_and_distinct_values() {
        let store = temp_store("describe");
        store.insert(&tomato()).unwrap();
        store
            .insert(&NewSeedPack::new("Genovese Basil", QuantityBucket::Lots, PlantType::Herb))
            .unwrap();

        let context = store.describe().unwrap();
        assert_eq!(context.table, "seed_packs");
        assert_eq!(context.row_count, 2);

        let names: Vec<&str> = context.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "seed_name", "variety", "quantity", "plant_type", "seed_source", "date_acquired"],
        );
        assert!(context.plant_types.contains(&"Herb".to_string()));
        assert!(context.quantities.contains(&"Few".to_string()));
        assert_eq!(context.sample_rows.len(), 2);
    }

    #[test]
    fn execute_readonly_runs_the_count_template() {
        let store = temp_store("count-template");
        store.insert(&tomato()).unwrap();

        let result = store
            .execute_readonly("SELECT COUNT(*) as total_seed_packs FROM seed_packs;")
            .unwrap();
        assert_eq!(result.columns, vec!["total_seed_packs"]);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.rows[0][0], serde_json::json!(1));
    }

    #[test]
    fn execute_readonly_converts_dates_to_strings() {
        let store = temp_store("date-json");
        store.insert(&tomato()).unwrap();

        let result = store.execute_readonly("SELECT * FROM seed_packs").unwrap();
        let json = result.to_json();
        assert_eq!(json["rows"][0]["date_acquired"], serde_json::json!("2025-03-14"));
    }

    #[test]
    fn query_result_to_json_pairs_columns_with_values() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "seed_name".to_string()],
            rows: vec![vec![json!(1), json!("Marigold")]],
            row_count: 1,
        };

        let json = result.to_json();
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["rows"][0]["seed_name"], "Marigold");
    }
}
