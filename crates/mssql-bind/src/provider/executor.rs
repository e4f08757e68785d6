//! The seam between the binding library and a database driver.

use std::time::Duration;

use async_trait::async_trait;

use crate::binding::ExecutorParameter;
use crate::config::CommandType;
use crate::core::SqlValue;
use crate::error::Result;
use crate::mapping::{ColumnInfo, TypeMap};

/// A command ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub command_type: CommandType,
    /// `None` leaves the executor's default in place.
    pub timeout: Option<Duration>,
    pub parameters: Vec<ExecutorParameter>,
}

/// One result set, fully buffered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<SqlValue<'static>>) -> Self {
        self.rows.push(row);
        self
    }
}

/// Outcome of an executed command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutedCommand {
    pub rows_affected: u64,
    pub result_sets: Vec<ResultSet>,
    /// Parameters after execution, with output values filled in.
    pub parameters: Vec<ExecutorParameter>,
}

/// Executes commands against a database.
///
/// Implementations wrap a driver connection or pool. Table values arrive as
/// [`ParameterValue::Structured`](crate::binding::ParameterValue::Structured)
/// and text parameters carry a size of `-1`.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &Command) -> Result<ExecutedCommand>;

    /// Called once for each result type the first time it is used.
    fn on_type_registered(&self, _type_map: &TypeMap) {}
}

#[async_trait]
impl<E: CommandExecutor + ?Sized> CommandExecutor for std::sync::Arc<E> {
    async fn execute(&self, command: &Command) -> Result<ExecutedCommand> {
        (**self).execute(command).await
    }

    fn on_type_registered(&self, type_map: &TypeMap) {
        (**self).on_type_registered(type_map)
    }
}
