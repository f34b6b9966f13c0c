//! Record operations scoped to one table.
//!
//! # Design
//! `Table` is a handle: a `Client` clone plus the `(base, table)` pair. Every
//! operation is one request, and every record that comes back is bound to
//! this table's `TableRef` so record-level calls (`Record::update_partial`,
//! `Record::delete`) know where to go. Batches keep the server's ordering,
//! which is the order they were sent in.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::client::{Client, Endpoint};
use crate::error::{ApiError, Result};
use crate::http::QueryParams;
use crate::list::ListRecords;
use crate::types::{Record, Records, TableRef, MAX_RECORDS_PER_REQUEST};

#[derive(Debug, Clone)]
pub struct Table {
    client: Client,
    reference: TableRef,
}

impl Table {
    pub(crate) fn new(client: Client, db_name: &str, table_name: &str) -> Self {
        Self {
            client,
            reference: TableRef::new(db_name, table_name),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn reference(&self) -> &TableRef {
        &self.reference
    }

    pub fn db_name(&self) -> &str {
        &self.reference.db_name
    }

    pub fn table_name(&self) -> &str {
        &self.reference.table_name
    }

    /// A handle whose requests each give up after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Table {
        Table {
            client: self.client.with_timeout(timeout),
            reference: self.reference.clone(),
        }
    }

    /// Start a list request; see `ListRecords` for the available options.
    pub fn list_records(&self) -> ListRecords {
        ListRecords::new(self.clone())
    }

    /// List records with raw query parameters.
    pub fn list_records_with_params(&self, params: &QueryParams) -> Result<Records> {
        let records: Records = self.client.get(&[self.db_name(), self.table_name()], params)?;
        Ok(records.bind(&self.reference))
    }

    pub fn get_record(&self, record_id: &str) -> Result<Record> {
        if record_id.is_empty() {
            return Err(ApiError::InvalidRequest("record id must not be empty".to_string()));
        }
        let mut record: Record = self
            .client
            .get(&[self.db_name(), self.table_name(), record_id], &QueryParams::new())?;
        record.bind(&self.reference);
        Ok(record)
    }

    /// Create up to ten records in one request.
    pub fn add_records(&self, records: &Records) -> Result<Records> {
        check_batch(records.len())?;
        let created: Records = self.client.post(self.db_name(), self.table_name(), records)?;
        Ok(created.bind(&self.reference))
    }

    /// Replace every field of up to ten records; fields left out are cleared.
    pub fn update_records(&self, records: &Records) -> Result<Records> {
        check_batch(records.len())?;
        let updated: Records = self.client.put(self.db_name(), self.table_name(), records)?;
        Ok(updated.bind(&self.reference))
    }

    /// Merge the given fields into up to ten records.
    pub fn update_records_partial(&self, records: &Records) -> Result<Records> {
        check_batch(records.len())?;
        let updated: Records = self.client.patch(self.db_name(), self.table_name(), records)?;
        Ok(updated.bind(&self.reference))
    }

    /// Merge `changed_fields` into a single record.
    pub fn update_record_partial(&self, record_id: &str, changed_fields: Map<String, Value>) -> Result<Record> {
        let batch = Records::new(vec![Record::with_id(record_id, changed_fields)]);
        self.first(self.update_records_partial(&batch)?)
    }

    /// The single record of a one-element reply.
    pub(crate) fn first(&self, records: Records) -> Result<Record> {
        if let Some(record) = records.records.first() {
            return Ok(record.clone());
        }
        let url = self
            .client
            .endpoint_url(Endpoint::Api, &[self.db_name(), self.table_name()], &QueryParams::new())?;
        Err(ApiError::Deserialization {
            url,
            body: serde_json::to_string(&records).unwrap_or_default(),
            message: "expected one record in the reply, got none".to_string(),
        })
    }

    /// Delete up to ten records; the response echoes each id with `deleted` set.
    pub fn delete_records<S: AsRef<str>>(&self, record_ids: &[S]) -> Result<Records> {
        check_batch(record_ids.len())?;
        let ids: Vec<&str> = record_ids.iter().map(AsRef::as_ref).collect();
        let deleted: Records = self.client.delete(self.db_name(), self.table_name(), &ids)?;
        Ok(deleted.bind(&self.reference))
    }
}

fn check_batch(len: usize) -> Result<()> {
    if len > MAX_RECORDS_PER_REQUEST {
        return Err(ApiError::BatchTooLarge {
            len,
            max: MAX_RECORDS_PER_REQUEST,
        });
    }
    Ok(())
}
