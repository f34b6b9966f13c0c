//! Operations on a single record the client has already seen.
//!
//! A record only remembers which table it came from (`Record::origin`), not
//! a live client. Callers pass the `Client` in, and the record addresses
//! `client.table(origin)`. Records built locally have no origin and must go
//! through `Table` instead.

use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::{ApiError, Result};
use crate::table::Table;
use crate::types::Record;

impl Record {
    fn table(&self, client: &Client) -> Result<Table> {
        let origin = self.origin.as_ref().ok_or_else(|| {
            ApiError::InvalidRequest("record is not bound to a table; use Table operations instead".to_string())
        })?;
        if self.id.is_empty() {
            return Err(ApiError::InvalidRequest("record has no id yet".to_string()));
        }
        Ok(client.table(&origin.db_name, &origin.table_name))
    }

    /// Merge `changed_fields` into this record on the server and return the
    /// updated record.
    pub fn update_partial(&self, client: &Client, changed_fields: Map<String, Value>) -> Result<Record> {
        self.table(client)?.update_record_partial(&self.id, changed_fields)
    }

    /// Delete this record; the returned echo has `deleted` set.
    pub fn delete(&self, client: &Client) -> Result<Record> {
        let table = self.table(client)?;
        table.first(table.delete_records(&[self.id.as_str()])?)
    }
}
