//! Chunked multi-row inserts.

use sqlforge_core::{plan_chunks, Value};
use tracing::debug;

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Result;

impl<D: Driver> Connection<D> {
    /// Inserts `rows` in as many statements as the bound-parameter limit
    /// requires, one after another, and returns the total affected rows.
    ///
    /// # Errors
    ///
    /// Stops at the first chunk that fails to build or execute.
    pub async fn batch_insert<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        let chunks = plan_chunks(rows.len(), columns.len(), self.max_bound_params());
        debug!(table, rows = rows.len(), chunks = chunks.len(), "batch insert");
        let mut total = 0;
        for range in chunks {
            let mut command = self.create_command("");
            command.batch_insert(table, columns, &rows[range])?;
            total += command.execute().await?;
        }
        Ok(total)
    }
}
