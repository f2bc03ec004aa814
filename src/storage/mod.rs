use crate::config::StoreConfig;
use crate::loader::csv_sink::{is_numeric_column, COMPANY_COLUMN, PERIOD_COLUMN};
use crate::models::{CellValue, Dataset};
use crate::utils::error::LoadError;
use duckdb::{Connection, ToSql};
use std::path::Path;
use tracing::{debug, info};

/// Catalog name the Postgres database is attached under.
const ATTACHED: &str = "target";

/// Rows inserted per multi-row INSERT statement.
const INSERT_BATCH: usize = 200;

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository {
    conn: Connection,
    /// Fully qualified, quoted table name.
    table: String,
}

impl Repository {
    /// Open the destination store described by `config`.
    ///
    /// `duckdb` opens a local file (`:memory:` for an in-memory database);
    /// `postgres`/`postgresql` attaches the remote database through DuckDB's
    /// postgres extension.
    pub fn open(config: &StoreConfig) -> Result<Self, LoadError> {
        match config.scheme.as_str() {
            "duckdb" if config.database == ":memory:" => Self::open_in_memory(&config.table),
            "duckdb" => {
                let path = Path::new(&config.database);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                Ok(Self { conn, table: quote_ident(&config.table) })
            }
            "postgres" | "postgresql" => {
                let conn = Connection::open_in_memory()?;
                conn.execute_batch("INSTALL postgres; LOAD postgres;")?;
                conn.execute_batch(&format!(
                    "ATTACH '{}' AS {} (TYPE postgres)",
                    config.connection_url().replace('\'', "''"),
                    ATTACHED
                ))?;
                info!("Attached {}", config.redacted_url());
                Ok(Self {
                    conn,
                    table: format!("{}.{}", ATTACHED, quote_ident(&config.table)),
                })
            }
            other => Err(LoadError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn open_in_memory(table: &str) -> Result<Self, LoadError> {
        Ok(Self { conn: Connection::open_in_memory()?, table: quote_ident(table) })
    }

    /// Create the table from the dataset's columns unless it already exists.
    pub fn ensure_table(&self, dataset: &Dataset) -> Result<(), LoadError> {
        let mut columns = vec![format!("{} VARCHAR", quote_ident(PERIOD_COLUMN))];
        for category in dataset.categories() {
            let ty = if is_numeric_column(dataset, &category) { "DOUBLE" } else { "VARCHAR" };
            columns.push(format!("{} {}", quote_ident(&category), ty));
        }
        columns.push(format!("{} VARCHAR", quote_ident(COMPANY_COLUMN)));

        let ddl = format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table, columns.join(", "));
        debug!("{}", ddl);
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    /// Upsert-by-replace: drop every row whose period appears in `dataset`,
    /// then append the dataset. With `atomic` both steps share a transaction;
    /// otherwise the delete is committed on its own first.
    pub fn replace_periods(&self, dataset: &Dataset, atomic: bool) -> Result<usize, LoadError> {
        let periods = dataset.periods();
        if periods.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let deleted = self.delete_periods(&tx, &periods)?;
        let tx = if atomic {
            tx
        } else {
            tx.commit()?;
            self.conn.unchecked_transaction()?
        };
        info!("Deleted {} existing rows for {} periods", deleted, periods.len());

        let inserted = self.insert_all(&tx, dataset)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn delete_periods(&self, conn: &Connection, periods: &[String]) -> Result<usize, LoadError> {
        let placeholders = vec!["?"; periods.len()].join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            self.table,
            quote_ident(PERIOD_COLUMN),
            placeholders
        );
        let args: Vec<&dyn ToSql> = periods.iter().map(|p| p as &dyn ToSql).collect();
        Ok(conn.execute(&sql, args.as_slice())?)
    }

    fn insert_all(&self, conn: &Connection, dataset: &Dataset) -> Result<usize, LoadError> {
        let categories = dataset.categories();
        let mut columns = vec![quote_ident(PERIOD_COLUMN)];
        columns.extend(categories.iter().map(|c| quote_ident(c)));
        columns.push(quote_ident(COMPANY_COLUMN));

        let row_placeholder = format!("({})", vec!["?"; columns.len()].join(", "));
        let mut inserted = 0;

        for chunk in dataset.records.chunks(INSERT_BATCH) {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                self.table,
                columns.join(", "),
                vec![row_placeholder.as_str(); chunk.len()].join(", ")
            );

            let mut owned: Vec<Box<dyn ToSql>> = Vec::with_capacity(chunk.len() * columns.len());
            for record in chunk {
                owned.push(Box::new(record.period.clone()));
                for category in &categories {
                    owned.push(to_sql_value(record.get(category).unwrap_or(&CellValue::Missing)));
                }
                owned.push(Box::new(record.company.clone()));
            }
            let args: Vec<&dyn ToSql> = owned.iter().map(|b| b.as_ref()).collect();
            inserted += conn.execute(&sql, args.as_slice())?;
        }

        Ok(inserted)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn row_count(&self) -> Result<i64, LoadError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(self.conn.query_row(&sql, [], |r| r.get(0))?)
    }

    /// (period, rows) pairs, ordered by period label.
    pub fn rows_per_period(&self) -> Result<Vec<(String, i64)>, LoadError> {
        let year = quote_ident(PERIOD_COLUMN);
        let sql = format!(
            "SELECT {year}, COUNT(*) FROM {} GROUP BY {year} ORDER BY {year}",
            self.table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn to_sql_value(value: &CellValue) -> Box<dyn ToSql> {
    match value {
        CellValue::Numeric(n) => Box::new(*n),
        CellValue::Text(s) => Box::new(s.clone()),
        CellValue::Missing => Box::new(Option::<f64>::None),
    }
}

/// Double-quote an identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
