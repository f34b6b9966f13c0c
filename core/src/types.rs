//! Wire types for records, attachments, bases and schema.
//!
//! # Design
//! These structs mirror the vendor's JSON shapes. The only non-wire data is
//! `origin`, the `(base, table)` pair a record or upload result came from.
//! It is a plain identifier, marked `#[serde(skip)]`, so payloads stay pure
//! and operations that need the client receive it explicitly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datetime::parse_date_time;
use crate::error::Result;

/// The vendor accepts at most this many records per create/update/delete.
pub const MAX_RECORDS_PER_REQUEST: usize = 10;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Identifies one table of one base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub db_name: String,
    pub table_name: String,
}

impl TableRef {
    pub fn new(db_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            table_name: table_name.into(),
        }
    }
}

/// One row of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the server; empty until the record is created.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createdTime", default, skip_serializing_if = "String::is_empty")]
    pub created_time: String,
    /// Set only in delete responses.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    /// Ask the server for best-effort conversion of string values.
    #[serde(default, skip_serializing_if = "is_false")]
    pub typecast: bool,
    #[serde(skip)]
    pub(crate) origin: Option<TableRef>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// A record addressing an existing row, e.g. for updates.
    pub fn with_id(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            ..Self::default()
        }
    }

    /// Server-assigned id; empty for records not yet created.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The table this record was read from or written to, if any.
    pub fn origin(&self) -> Option<&TableRef> {
        self.origin.as_ref()
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        parse_date_time(&self.created_time)
    }

    pub(crate) fn bind(&mut self, table: &TableRef) {
        self.origin = Some(table.clone());
    }
}

/// A page of records, or a batch sent to or returned from a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Records {
    pub records: Vec<Record>,
    /// Present only when more pages remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub typecast: bool,
}

impl Records {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn with_typecast(mut self, typecast: bool) -> Self {
        self.typecast = typecast;
        self
    }

    /// Token for the next page; `None` once pagination is finished.
    pub fn next_offset(&self) -> Option<&str> {
        self.offset.as_deref().filter(|o| !o.is_empty())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn bind(mut self, table: &TableRef) -> Self {
        for record in &mut self.records {
            record.bind(table);
        }
        self
    }
}

impl IntoIterator for Records {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A file to upload, with its content already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub file: String,
    pub filename: String,
}

/// Upload result: the parent record and every attachment now on the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttachments {
    /// Parent record's id.
    pub id: String,
    #[serde(rename = "createdTime", default)]
    pub created_time: String,
    /// Keyed by attachment field id.
    #[serde(rename = "fields", default)]
    pub attachments: BTreeMap<String, Vec<FieldAttachmentDetails>>,
    #[serde(skip)]
    pub(crate) origin: Option<TableRef>,
}

impl FieldAttachments {
    pub fn origin(&self) -> Option<&TableRef> {
        self.origin.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttachmentDetails {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub filename: String,
    /// In bytes.
    #[serde(default)]
    pub size: u64,
    /// Content-Type value.
    #[serde(rename = "type", default)]
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub id: String,
    pub name: String,
    #[serde(rename = "permissionLevel")]
    pub permission_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bases {
    pub bases: Vec<Base>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl Bases {
    pub fn next_offset(&self) -> Option<&str> {
        self.offset.as_deref().filter(|o| !o.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    #[serde(rename = "type")]
    pub view_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: String,
    #[serde(rename = "primaryFieldId")]
    pub primary_field_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub tables: Vec<TableSchema>,
}

impl Tables {
    /// Find a table by id or name.
    pub fn find(&self, name_or_id: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.id == name_or_id || t.name == name_or_id)
    }
}
