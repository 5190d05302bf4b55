//! Expense ledger contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and bulk-delete APIs over the `expenses` table.
//! - Provide live queries that re-emit after every ledger mutation.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `ExpenseRecord::validate()` before SQL mutations.
//! - Read paths reject corrupt persisted rows instead of masking them.
//! - Every successful mutation is followed by a publish to live queries,
//!   performed while the connection lock is still held.

use crate::db::DbError;
use crate::model::expense::{ExpenseId, ExpenseRecord, ExpenseValidationError};
use crate::stream::Subscribers;
use chrono::NaiveDate;
use flume::Receiver;
use log::{error, info};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use rusqlite::{params, Connection, ErrorCode, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Name of the ledger table, as tracked by `sqlite_sequence`.
pub const EXPENSES_TABLE: &str = "expenses";

const EXPENSE_SELECT_SQL: &str = "SELECT id, name, amount, date FROM expenses";
const EXPENSE_ORDER_SQL: &str = "ORDER BY date ASC, id ASC";
const DATE_FORMAT: &str = "%Y-%m-%d";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for expense persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ExpenseValidationError),
    Db(DbError),
    /// Insert with an id that already exists (abort-on-conflict).
    Conflict(ExpenseId),
    NotFound(ExpenseId),
    InvalidData(String),
    InvalidIdentifier(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Conflict(id) => write!(f, "expense id already exists: {id}"),
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted expense data: {message}"),
            Self::InvalidIdentifier(name) => write!(f, "invalid table identifier `{name}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Conflict(_)
            | Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::InvalidIdentifier(_) => None,
        }
    }
}

impl From<ExpenseValidationError> for RepoError {
    fn from(value: ExpenseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record set watched by a live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseQuery {
    All,
    /// Records dated strictly before the day.
    Before(NaiveDate),
    /// Records dated exactly on the day.
    On(NaiveDate),
}

/// Persistent store of recorded expenses.
///
/// Live queries (`stream_*`) emit the current result immediately and then
/// once after every mutation. Dropping the receiver cancels the query.
pub trait ExpenseLedger: Send + Sync {
    /// Stores a record and returns its id.
    ///
    /// A record with `id == 0` gets the next auto-increment id; any other id
    /// is stored as given and fails with `Conflict` when already taken.
    fn insert(&self, record: &ExpenseRecord) -> RepoResult<ExpenseId>;
    /// Replaces the stored record with the same id.
    fn update(&self, record: &ExpenseRecord) -> RepoResult<()>;
    /// Deletes the stored record with the same id.
    fn delete(&self, record: &ExpenseRecord) -> RepoResult<()>;
    fn get(&self, id: ExpenseId) -> RepoResult<Option<ExpenseRecord>>;
    fn list(&self, query: ExpenseQuery) -> RepoResult<Vec<ExpenseRecord>>;
    fn stream(&self, query: ExpenseQuery) -> RepoResult<Receiver<Vec<ExpenseRecord>>>;
    /// Deletes every record dated strictly before `date`; returns the count.
    fn delete_all_before(&self, date: NaiveDate) -> RepoResult<usize>;
    /// Resets the auto-increment counter of `table` to zero.
    fn reset_auto_increment(&self, table: &str) -> RepoResult<()>;

    fn list_all(&self) -> RepoResult<Vec<ExpenseRecord>> {
        self.list(ExpenseQuery::All)
    }

    fn list_before(&self, date: NaiveDate) -> RepoResult<Vec<ExpenseRecord>> {
        self.list(ExpenseQuery::Before(date))
    }

    fn list_on(&self, date: NaiveDate) -> RepoResult<Vec<ExpenseRecord>> {
        self.list(ExpenseQuery::On(date))
    }

    fn stream_all(&self) -> RepoResult<Receiver<Vec<ExpenseRecord>>> {
        self.stream(ExpenseQuery::All)
    }

    fn stream_before(&self, date: NaiveDate) -> RepoResult<Receiver<Vec<ExpenseRecord>>> {
        self.stream(ExpenseQuery::Before(date))
    }

    fn stream_on(&self, date: NaiveDate) -> RepoResult<Receiver<Vec<ExpenseRecord>>> {
        self.stream(ExpenseQuery::On(date))
    }
}

/// SQLite-backed expense ledger.
///
/// Owns its connection; all access is serialized through one mutex.
pub struct SqliteExpenseLedger {
    conn: Mutex<Connection>,
    subscribers: Subscribers<ExpenseQuery, Vec<ExpenseRecord>>,
}

impl SqliteExpenseLedger {
    /// Wraps a connection returned by `db::open_db` or `db::open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            subscribers: Subscribers::new(),
        }
    }

    /// Number of registered live queries.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&self, conn: &Connection) {
        let delivered = self
            .subscribers
            .publish_with(|query| match query_records(conn, *query) {
                Ok(records) => Some(records),
                Err(err) => {
                    error!(
                        "event=expense_publish module=repo status=error query={:?} error={}",
                        query, err
                    );
                    None
                }
            });
        info!("event=expense_publish module=repo status=ok subscribers={delivered}");
    }
}

impl ExpenseLedger for SqliteExpenseLedger {
    fn insert(&self, record: &ExpenseRecord) -> RepoResult<ExpenseId> {
        record.validate()?;
        let conn = self.conn.lock();

        let result = if record.is_unsaved() {
            conn.execute(
                "INSERT INTO expenses (name, amount, date) VALUES (?1, ?2, ?3);",
                params![
                    record.name.as_str(),
                    record.amount.to_string(),
                    date_to_db(record.date),
                ],
            )
        } else {
            conn.execute(
                "INSERT INTO expenses (id, name, amount, date) VALUES (?1, ?2, ?3, ?4);",
                params![
                    record.id,
                    record.name.as_str(),
                    record.amount.to_string(),
                    date_to_db(record.date),
                ],
            )
        };

        if let Err(err) = result {
            if is_constraint_violation(&err) {
                return Err(RepoError::Conflict(record.id));
            }
            return Err(err.into());
        }

        let id = conn.last_insert_rowid();
        info!("event=expense_insert module=repo status=ok id={id}");
        self.publish(&conn);
        Ok(id)
    }

    fn update(&self, record: &ExpenseRecord) -> RepoResult<()> {
        record.validate()?;
        let conn = self.conn.lock();

        let changed = conn.execute(
            "UPDATE expenses SET name = ?1, amount = ?2, date = ?3 WHERE id = ?4;",
            params![
                record.name.as_str(),
                record.amount.to_string(),
                date_to_db(record.date),
                record.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }

        info!("event=expense_update module=repo status=ok id={}", record.id);
        self.publish(&conn);
        Ok(())
    }

    fn delete(&self, record: &ExpenseRecord) -> RepoResult<()> {
        let conn = self.conn.lock();

        let changed = conn.execute("DELETE FROM expenses WHERE id = ?1;", [record.id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }

        info!("event=expense_delete module=repo status=ok id={}", record.id);
        self.publish(&conn);
        Ok(())
    }

    fn get(&self, id: ExpenseId) -> RepoResult<Option<ExpenseRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{EXPENSE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_expense_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, query: ExpenseQuery) -> RepoResult<Vec<ExpenseRecord>> {
        let conn = self.conn.lock();
        query_records(&conn, query)
    }

    fn stream(&self, query: ExpenseQuery) -> RepoResult<Receiver<Vec<ExpenseRecord>>> {
        let conn = self.conn.lock();
        let initial = query_records(&conn, query)?;
        Ok(self.subscribers.subscribe(query, initial))
    }

    fn delete_all_before(&self, date: NaiveDate) -> RepoResult<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM expenses WHERE date < ?1;", [date_to_db(date)])?;

        info!(
            "event=expense_purge module=repo status=ok cutoff={} removed={removed}",
            date_to_db(date)
        );
        if removed > 0 {
            self.publish(&conn);
        }
        Ok(removed)
    }

    fn reset_auto_increment(&self, table: &str) -> RepoResult<()> {
        if !IDENTIFIER_RE.is_match(table) {
            return Err(RepoError::InvalidIdentifier(table.to_string()));
        }
        let conn = self.conn.lock();
        conn.execute("UPDATE sqlite_sequence SET seq = 0 WHERE name = ?1;", [table])?;
        info!("event=expense_reset_sequence module=repo status=ok table={table}");
        Ok(())
    }
}

fn query_records(conn: &Connection, query: ExpenseQuery) -> RepoResult<Vec<ExpenseRecord>> {
    let (filter, bound) = match query {
        ExpenseQuery::All => ("", None),
        ExpenseQuery::Before(date) => ("WHERE date < ?1", Some(date_to_db(date))),
        ExpenseQuery::On(date) => ("WHERE date = ?1", Some(date_to_db(date))),
    };
    let sql = format!("{EXPENSE_SELECT_SQL} {filter} {EXPENSE_ORDER_SQL};");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match bound {
        Some(date) => stmt.query([date])?,
        None => stmt.query([])?,
    };

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_expense_row(row)?);
    }
    Ok(records)
}

fn parse_expense_row(row: &Row<'_>) -> RepoResult<ExpenseRecord> {
    let id: ExpenseId = row.get("id")?;

    let amount_text: String = row.get("amount")?;
    let amount = Decimal::from_str(&amount_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid amount `{amount_text}` in expenses.amount"))
    })?;

    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in expenses.date"))
    })?;

    let record = ExpenseRecord {
        id,
        name: row.get("name")?,
        amount,
        date,
    };
    record.validate()?;
    Ok(record)
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
    )
}
