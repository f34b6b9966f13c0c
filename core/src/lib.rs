//! Blocking client for the Airtable-style tabular database REST API.
//!
//! # Overview
//! Bases hold tables, tables hold records, records hold a field-name to JSON
//! value map. Every operation here is one HTTP round trip:
//!
//! ```no_run
//! use airtable_core::{Client, Sort};
//!
//! # fn main() -> airtable_core::Result<()> {
//! let client = Client::new("keyXXXXXXXXXXXXXX");
//! let table = client.table("appXXXXXXXXXXXXXX", "Tasks");
//! let page = table
//!     .list_records()
//!     .with_filter_formula("NOT({Done})")
//!     .with_sort([Sort::asc("Due")])
//!     .page_size(10)
//!     .send()?;
//! for record in &page {
//!     println!("{} {:?}", record.id(), record.field("Name"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Client` owns the API key, the two base URLs, a `Transport` and a
//!   `RateLimiter`. Requests are built and parsed as plain data
//!   (`HttpRequest` / `HttpResponse`); only the transport does I/O.
//! - `Table`, `ListRecords`, `ListBases` and `BaseSchema` are handles that
//!   delegate to the client's verb helpers.
//! - Returned records remember their `(base, table)` as a `TableRef`, never a
//!   live client; record-level calls take the `Client` explicitly.
//! - Nothing is retried. Branch on `ApiError::status_code` to build a retry
//!   policy.

pub mod attachment;
pub mod base;
pub mod client;
pub mod config;
pub mod datetime;
pub mod error;
pub mod http;
pub mod list;
pub mod rate_limit;
pub mod record;
pub mod table;
pub mod transport;
pub mod types;

pub use base::{BaseSchema, ListBases};
pub use client::{Client, Endpoint, DEFAULT_BASE_URL, DEFAULT_UPLOAD_BASE_URL};
pub use config::ClientConfig;
pub use datetime::{from_date_time, to_date_time};
pub use error::{ApiError, HttpError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, QueryParams};
pub use list::{ListRecords, Sort, SortDirection};
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use table::Table;
pub use transport::{Transport, UreqTransport};
pub use types::{
    Attachment, Base, Bases, Field, FieldAttachmentDetails, FieldAttachments, Record, Records, TableRef,
    TableSchema, Tables, View, MAX_RECORDS_PER_REQUEST,
};
