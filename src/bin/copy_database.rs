//! Copies tables from one MySQL database into another, e.g. production into a
//! test instance. Each target table is cleared before its rows are copied, one
//! table at a time.
//!
//! ```text
//! SOURCE_DATABASE_URL=mysql://... TARGET_DATABASE_URL=mysql://... \
//!     COPY_TABLES=users,team_settings,leave_requests copy_database
//! ```

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use futures_util::TryStreamExt;
use log::{error, info};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Connection, MySqlPool, Row};
use std::env;

const DEFAULT_TABLES: &str = "users,team_settings,leave_requests";
const BATCH_SIZE: usize = 500;

struct CopyConfig {
    source_url: String,
    target_url: String,
    tables: Vec<String>,
}

impl CopyConfig {
    fn from_env() -> Result<Self> {
        let tables = parse_tables(
            &env::var("COPY_TABLES").unwrap_or_else(|_| DEFAULT_TABLES.to_string()),
        )?;

        Ok(Self {
            source_url: env::var("SOURCE_DATABASE_URL")
                .context("SOURCE_DATABASE_URL must be set")?,
            target_url: env::var("TARGET_DATABASE_URL")
                .context("TARGET_DATABASE_URL must be set")?,
            tables,
        })
    }
}

/// Table names end up in SQL text, so only plain identifiers pass.
fn parse_tables(raw: &str) -> Result<Vec<String>> {
    let tables: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if tables.is_empty() {
        bail!("COPY_TABLES names no tables");
    }

    if let Some(bad) = tables
        .iter()
        .find(|t| !t.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        bail!("Invalid table name: {bad}");
    }

    Ok(tables)
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?)` for `rows` rows.
fn insert_sql(table: &str, columns: &[String], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![placeholders.as_str(); rows].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list,
        values
    )
}

/// Every column read back as text so any column type can be re-inserted.
fn select_sql(table: &str, columns: &[String]) -> String {
    let select_list = columns
        .iter()
        .map(|c| format!("CAST({0} AS CHAR) AS {0}", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("SELECT {} FROM {}", select_list, quote_ident(table))
}

async fn table_columns(pool: &MySqlPool, table: &str) -> Result<Vec<String>> {
    let columns = sqlx::query_scalar::<_, String>(
        r#"
        SELECT COLUMN_NAME
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    if columns.is_empty() {
        bail!("Table {table} does not exist in the source database");
    }

    Ok(columns)
}

async fn insert_batch(
    target: &mut MySqlConnection,
    table: &str,
    columns: &[String],
    batch: &[Vec<Option<String>>],
) -> Result<()> {
    let sql = insert_sql(table, columns, batch.len());
    let mut query = sqlx::query(&sql);

    for row in batch {
        for value in row {
            query = query.bind(value.clone());
        }
    }

    query.execute(&mut *target).await?;
    Ok(())
}

async fn copy_table(source: &MySqlPool, target: &MySqlPool, table: &str) -> Result<usize> {
    let columns = table_columns(source, table).await?;

    // one connection so FOREIGN_KEY_CHECKS applies to every statement
    let mut conn = target.acquire().await?;
    sqlx::query("SET FOREIGN_KEY_CHECKS = 0")
        .execute(&mut *conn)
        .await?;

    let copied = replace_rows(source, &mut conn, table, &columns).await;

    let restored = sqlx::query("SET FOREIGN_KEY_CHECKS = 1")
        .execute(&mut *conn)
        .await;
    if let Err(e) = restored {
        // never hand a connection with checks off back to the pool
        conn.detach();
        return Err(e).context("Failed to restore FOREIGN_KEY_CHECKS");
    }

    copied
}

/// Clears `table` and refills it from `source` inside one target transaction,
/// so a failed copy leaves the previous contents in place.
async fn replace_rows(
    source: &MySqlPool,
    conn: &mut MySqlConnection,
    table: &str,
    columns: &[String],
) -> Result<usize> {
    let mut tx = conn.begin().await?;

    sqlx::query(&format!("DELETE FROM {}", quote_ident(table)))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to clear target table {table}"))?;

    let select = select_sql(table, columns);
    let mut rows = sqlx::query(&select).fetch(source);
    let mut batch: Vec<Vec<Option<String>>> = Vec::with_capacity(BATCH_SIZE);
    let mut copied = 0usize;

    while let Some(row) = rows.try_next().await? {
        batch.push(row_values(&row, columns.len())?);

        if batch.len() == BATCH_SIZE {
            insert_batch(&mut tx, table, columns, &batch).await?;
            copied += batch.len();
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&mut tx, table, columns, &batch).await?;
        copied += batch.len();
    }

    tx.commit().await?;
    Ok(copied)
}

fn row_values(row: &MySqlRow, width: usize) -> Result<Vec<Option<String>>> {
    (0..width)
        .map(|i| row.try_get::<Option<String>, _>(i).map_err(Into::into))
        .collect()
}

async fn copy_all(source: &MySqlPool, target: &MySqlPool, tables: &[String]) -> Result<()> {
    for table in tables {
        info!("Copying table {table}");
        let copied = copy_table(source, target, table)
            .await
            .with_context(|| format!("Copying table {table} failed"))?;
        info!("Copied {copied} rows into {table}");
    }
    Ok(())
}

async fn run(config: CopyConfig) -> Result<()> {
    let source = MySqlPool::connect(&config.source_url)
        .await
        .context("Failed to connect to source database")?;

    let target = match MySqlPool::connect(&config.target_url).await {
        Ok(pool) => pool,
        Err(e) => {
            source.close().await;
            return Err(e).context("Failed to connect to target database");
        }
    };

    let result = copy_all(&source, &target, &config.tables).await;

    // both pools closed whatever the outcome
    source.close().await;
    target.close().await;
    info!("Connections closed");

    result
}

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let outcome = match CopyConfig::from_env() {
        Ok(config) => run(config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => info!("Database copy finished"),
        Err(e) => {
            error!("Database copy failed: {e:#}");
            std::process::exit(1);
        }
    }
}
