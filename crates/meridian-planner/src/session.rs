//! Session and database context.
//!
//! A [`Database`] is process-wide and read-mostly: it owns the
//! [`CompareMode`] fixed at creation time. A [`Session`] is owned by one
//! execution thread for the duration of a query and carries the
//! cancellation flag that evaluation entry points must honor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compare::CompareMode;
use crate::error::{PlannerError, Result};

/// Shared database context.
#[derive(Debug)]
pub struct Database {
    name: String,
    compare_mode: CompareMode,
}

impl Database {
    /// Creates a database context with a fixed compare mode.
    pub fn new(name: impl Into<String>, compare_mode: CompareMode) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            compare_mode,
        })
    }

    /// Returns the database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value comparison configuration.
    pub fn compare_mode(&self) -> &CompareMode {
        &self.compare_mode
    }
}

/// Per-connection execution context.
#[derive(Debug)]
pub struct Session {
    database: Arc<Database>,
    cancelled: AtomicBool,
}

impl Session {
    /// Creates a session against the given database.
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the session's database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Requests cancellation of the running query.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Fails with `Cancelled` if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PlannerError::Cancelled)
        } else {
            Ok(())
        }
    }
}
