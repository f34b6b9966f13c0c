//! Builder for record listing requests.
//!
//! # Design
//! `ListRecords` is a value: every option consumes the builder and returns
//! it, so a configured request can be cloned and reused (for instance with a
//! different offset) without shared mutable state. Options are stored typed
//! and only turned into query parameters, and validated, by `params()`.
//!
//! Pagination is up to the caller:
//!
//! ```no_run
//! # fn run(table: &airtable_core::Table) -> airtable_core::Result<()> {
//! let mut offset = String::new();
//! loop {
//!     let page = table.list_records().page_size(10).with_offset(&offset).send()?;
//!     for record in &page {
//!         println!("{}", record.id());
//!     }
//!     match page.next_offset() {
//!         Some(next) => offset = next.to_string(),
//!         None => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::http::QueryParams;
use crate::table::Table;
use crate::types::Records;

/// The API caps `pageSize` at 100, which is also its default.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CellFormat {
    Json,
    String { time_zone: String, user_locale: String },
}

#[derive(Debug, Clone)]
#[must_use = "a list request does nothing until `send` is called"]
pub struct ListRecords {
    table: Table,
    fields: Vec<String>,
    filter_by_formula: Option<String>,
    sort: Vec<Sort>,
    view: Option<String>,
    max_records: Option<u32>,
    page_size: Option<u32>,
    offset: Option<String>,
    cell_format: CellFormat,
}

impl ListRecords {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            fields: Vec::new(),
            filter_by_formula: None,
            sort: Vec::new(),
            view: None,
            max_records: None,
            page_size: None,
            offset: None,
            cell_format: CellFormat::Json,
        }
    }

    /// Only return these fields. Repeated calls accumulate.
    pub fn return_fields<I, S>(mut self, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(field_names.into_iter().map(Into::into));
        self
    }

    /// Only return records for which `formula` evaluates truthy.
    pub fn with_filter_formula(mut self, formula: impl Into<String>) -> Self {
        self.filter_by_formula = Some(formula.into());
        self
    }

    /// Sort by these fields, in priority order. Replaces any earlier sort.
    pub fn with_sort(mut self, sort: impl IntoIterator<Item = Sort>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    /// Return the records of a view, in the view's order and filtering.
    pub fn from_view(mut self, view_name_or_id: impl Into<String>) -> Self {
        self.view = Some(view_name_or_id.into());
        self
    }

    /// Total number of records to return across all pages.
    pub fn max_records(mut self, max_records: u32) -> Self {
        self.max_records = Some(max_records);
        self
    }

    /// Records per page, at most 100.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from the offset of a previous page. An empty offset means the
    /// first page.
    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        let offset = offset.into();
        self.offset = (!offset.is_empty()).then_some(offset);
        self
    }

    /// Return cell values as strings rendered in `time_zone` and `user_locale`.
    pub fn in_string_format(mut self, time_zone: impl Into<String>, user_locale: impl Into<String>) -> Self {
        self.cell_format = CellFormat::String {
            time_zone: time_zone.into(),
            user_locale: user_locale.into(),
        };
        self
    }

    /// Give up on this request after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.table = self.table.with_timeout(timeout);
        self
    }

    /// Validate the options and render them as query parameters.
    pub fn params(&self) -> Result<QueryParams> {
        let mut params = QueryParams::new();
        for field in &self.fields {
            params.add("fields[]", field.as_str());
        }
        if let Some(formula) = &self.filter_by_formula {
            params.set("filterByFormula", formula.as_str());
        }
        for (n, sort) in self.sort.iter().enumerate() {
            params.set(format!("sort[{n}][field]"), sort.field.as_str());
            params.set(format!("sort[{n}][direction]"), sort.direction.as_str());
        }
        if let Some(view) = &self.view {
            params.set("view", view.as_str());
        }
        if let Some(max_records) = self.max_records {
            if max_records == 0 {
                return Err(ApiError::InvalidRequest("maxRecords must be at least 1".to_string()));
            }
            params.set("maxRecords", max_records.to_string());
        }
        if let Some(page_size) = self.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
                return Err(ApiError::InvalidRequest(format!(
                    "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
                )));
            }
            params.set("pageSize", page_size.to_string());
        }
        if let Some(offset) = &self.offset {
            params.set("offset", offset.as_str());
        }
        if let CellFormat::String { time_zone, user_locale } = &self.cell_format {
            if time_zone.is_empty() || user_locale.is_empty() {
                return Err(ApiError::InvalidRequest(
                    "string cell format requires a time zone and a user locale".to_string(),
                ));
            }
            params.set("cellFormat", "string");
            params.set("timeZone", time_zone.as_str());
            params.set("userLocale", user_locale.as_str());
        }
        Ok(params)
    }

    /// Send the request and return one page of records.
    pub fn send(&self) -> Result<Records> {
        let params = self.params()?;
        self.table.list_records_with_params(&params)
    }
}
