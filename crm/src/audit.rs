//! Append-only login/logout ledger.

use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{Record, TableStore};

/// Timestamp layout used for every ledger row. Fixed-width and zero-padded,
/// which is what makes lexical date comparisons in [`AuditLog::filter`] valid.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Login,
    Logout,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Login => write!(f, "Login"),
            AuditAction::Logout => write!(f, "Logout"),
        }
    }
}

/// One ledger row. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Action")]
    pub action: AuditAction,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

impl Record for AuditEvent {
    const COLUMNS: &'static [&'static str] = &["Username", "Action", "Timestamp"];
}

/// Owns the ledger table. Rows are appended in chronological order and only
/// ever removed in bulk.
pub struct AuditLog {
    store: TableStore<AuditEvent>,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            store: TableStore::open(path),
        }
    }

    /// Appends one event stamped with the current local time and persists it.
    pub fn record(&self, username: &str, action: AuditAction) -> Result<()> {
        self.record_event(AuditEvent {
            username: username.to_string(),
            action,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        })
    }

    fn record_event(&self, event: AuditEvent) -> Result<()> {
        tracing::debug!(username = %event.username, action = %event.action, "recording audit event");
        self.store.update(|table| Ok(table.append(event)))?;
        Ok(())
    }

    /// Rows matching every supplied predicate; an omitted predicate matches
    /// all rows. Date bounds compare lexically against the formatted
    /// timestamp, so a row stamped ON the end date sorts after the bare
    /// `YYYY-MM-DD` bound and is excluded.
    pub fn filter(
        &self,
        username: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<AuditEvent>> {
        let start = start_date.map(|d| d.format("%Y-%m-%d").to_string());
        let end = end_date.map(|d| d.format("%Y-%m-%d").to_string());
        let table = self.store.load()?;
        Ok(table
            .iter()
            .filter(|event| username.is_none_or(|name| event.username == name))
            .filter(|event| start.as_deref().is_none_or(|s| event.timestamp.as_str() >= s))
            .filter(|event| end.as_deref().is_none_or(|e| event.timestamp.as_str() <= e))
            .cloned()
            .collect())
    }

    /// Rows stamped with today's local date.
    pub fn today(&self) -> Result<Vec<AuditEvent>> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let table = self.store.load()?;
        Ok(table
            .iter()
            .filter(|event| event.timestamp.starts_with(&today))
            .cloned()
            .collect())
    }

    /// Empties the entire ledger and persists the empty table.
    pub fn clear_all(&self) -> Result<()> {
        self.store.update(|table| Ok(table.clear()))?;
        tracing::info!("cleared audit log");
        Ok(())
    }
}
