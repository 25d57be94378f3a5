use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::model::{EntitySchema, FieldType, RawRecord, Value, KEY_FIELD};
use crate::store::traits::RecordStore;

/// PostgreSQL record store: one table per entity, one column per field
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the table for every schema that does not have one yet
    pub async fn migrate<'a>(&self, schemas: impl IntoIterator<Item = &'a EntitySchema>) -> Result<()> {
        for schema in schemas {
            sqlx::query(&create_table_sql(schema))
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create table for {}", schema.name()))?;
        }
        Ok(())
    }
}

fn column_type(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::String => "TEXT",
        FieldType::Int => "BIGINT",
        FieldType::Float => "DOUBLE PRECISION",
        FieldType::Boolean => "BOOLEAN",
        FieldType::Entity(_) => "JSONB",
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn create_table_sql(schema: &EntitySchema) -> String {
    let columns = schema
        .fields()
        .iter()
        .map(|def| {
            let primary = if def.name == KEY_FIELD { " PRIMARY KEY" } else { "" };
            format!("{} {}{}", quote(&def.name), column_type(&def.ty), primary)
        })
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(&schema.table_name()),
        columns
    )
}

fn select_sql(schema: &EntitySchema) -> String {
    // Cast every column so decoding does not depend on the exact column width
    let columns = schema
        .fields()
        .iter()
        .map(|def| {
            let col = quote(&def.name);
            format!("{}::{} AS {}", col, column_type(&def.ty), col)
        })
        .join(", ");
    format!(
        "SELECT {} FROM {} WHERE {}::TEXT = $1",
        columns,
        quote(&schema.table_name()),
        quote(KEY_FIELD)
    )
}

fn upsert_sql(schema: &EntitySchema) -> String {
    let columns = schema.fields().iter().map(|def| quote(&def.name)).join(", ");
    let params = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, def)| format!("${}::{}", i + 1, column_type(&def.ty)))
        .join(", ");
    let updates = schema
        .fields()
        .iter()
        .filter(|def| def.name != KEY_FIELD)
        .map(|def| format!("{col} = EXCLUDED.{col}", col = quote(&def.name)))
        .join(", ");

    let conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates)
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        quote(&schema.table_name()),
        columns,
        params,
        quote(KEY_FIELD),
        conflict
    )
}

fn decode_row(schema: &EntitySchema, row: &PgRow) -> Result<RawRecord> {
    let mut record = RawRecord::new();

    for def in schema.fields() {
        let name = def.name.as_str();
        let value = match &def.ty {
            FieldType::String => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            FieldType::Int => row.try_get::<Option<i64>, _>(name)?.map(Value::Int),
            FieldType::Float => row.try_get::<Option<f64>, _>(name)?.map(Value::Float),
            FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
            FieldType::Entity(_) => row
                .try_get::<Option<serde_json::Value>, _>(name)?
                .map(serde_json::from_value::<Value>)
                .transpose()?,
        };
        record.insert(def.name.clone(), value.unwrap_or(Value::Null));
    }

    Ok(record)
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: Option<&Value>,
) -> Result<Query<'q, Postgres, PgArguments>> {
    Ok(match value {
        None | Some(Value::Null) => query.bind(None::<String>),
        Some(Value::Bool(b)) => query.bind(*b),
        Some(Value::Int(i)) => query.bind(*i),
        Some(Value::Float(x)) => query.bind(*x),
        Some(Value::String(s)) => query.bind(s.clone()),
        Some(Value::Entity(record)) => query.bind(serde_json::to_value(record)?),
    })
}

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn get_record(&self, schema: &EntitySchema, key: &str) -> Result<Option<RawRecord>> {
        let row = sqlx::query(&select_sql(schema))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} '{}'", schema.name(), key))?;

        let Some(row) = row else {
            return Ok(None);
        };

        decode_row(schema, &row).map(Some)
    }

    async fn put_record(&self, schema: &EntitySchema, record: RawRecord) -> Result<()> {
        if record.get(KEY_FIELD).and_then(|v| v.as_str()).is_none() {
            return Err(anyhow!("{} record has no string '{}'", schema.name(), KEY_FIELD));
        }

        let sql = upsert_sql(schema);
        let mut query = sqlx::query(&sql);
        for def in schema.fields() {
            query = bind_value(query, record.get(&def.name))?;
        }

        query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert {}", schema.name()))?;

        Ok(())
    }
}
