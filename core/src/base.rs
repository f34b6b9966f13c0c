//! Read-only base listing and schema retrieval.

use std::time::Duration;

use crate::client::Client;
use crate::error::Result;
use crate::http::QueryParams;
use crate::types::{Bases, Tables};

impl Client {
    /// Start a request listing the bases this API key can access.
    pub fn list_bases(&self) -> ListBases {
        ListBases {
            client: self.clone(),
            offset: None,
        }
    }

    pub fn list_bases_with_params(&self, params: &QueryParams) -> Result<Bases> {
        self.get(&["meta", "bases"], params)
    }

    /// Prepare a request for the tables, fields and views of base `db_id`.
    pub fn base_schema(&self, db_id: &str) -> BaseSchema {
        BaseSchema {
            client: self.clone(),
            db_id: db_id.to_string(),
        }
    }
}

/// One page of accessible bases; follow `Bases::next_offset` for more.
#[derive(Debug, Clone)]
#[must_use = "a list request does nothing until `send` is called"]
pub struct ListBases {
    client: Client,
    offset: Option<String>,
}

impl ListBases {
    /// Continue from a previous page. An empty offset means the first page.
    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        let offset = offset.into();
        self.offset = (!offset.is_empty()).then_some(offset);
        self
    }

    /// Give up on this request after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn send(&self) -> Result<Bases> {
        let mut params = QueryParams::new();
        if let Some(offset) = &self.offset {
            params.set("offset", offset.as_str());
        }
        self.client.list_bases_with_params(&params)
    }
}

#[derive(Debug, Clone)]
#[must_use = "a schema request does nothing until `send` is called"]
pub struct BaseSchema {
    client: Client,
    db_id: String,
}

impl BaseSchema {
    /// Give up on this request after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn db_id(&self) -> &str {
        &self.db_id
    }

    pub fn send(&self) -> Result<Tables> {
        self.client.get(&["meta", "bases", self.db_id.as_str(), "tables"], &QueryParams::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::HttpMethod;
    use crate::transport::testing::{client_with, CannedTransport};

    const BASES_PAGE: &str = r#"{
        "bases": [
            {"id": "appY3WxIBCdKPDdIa", "name": "Apartment Hunting", "permissionLevel": "create"},
            {"id": "appSW9R5uCNmRmfl6", "name": "Project Tracker", "permissionLevel": "edit"}
        ],
        "offset": "itrBase1"
    }"#;

    const SCHEMA: &str = r#"{
        "tables": [{
            "id": "tbltp8DGLhqbUmjK1",
            "name": "Apartments",
            "primaryFieldId": "fld1VnoyuotSTyxW1",
            "description": "Apartments to track.",
            "fields": [
                {"id": "fld1VnoyuotSTyxW1", "name": "Name", "type": "singleLineText", "description": "Name of the apartment"},
                {"id": "fldoaIqdn5szURHpw", "name": "Pictures", "type": "multipleAttachments", "options": {"isReversed": false}}
            ],
            "views": [{"id": "viwQpsuEDqHFqegkp", "name": "Grid view", "type": "grid"}]
        }]
    }"#;

    #[test]
    fn list_bases_hits_meta_endpoint() {
        let transport = Arc::new(CannedTransport::default());
        let client = client_with(&transport);
        transport.respond(200, BASES_PAGE);

        let bases = client.list_bases().send().unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/v0/meta/bases");
        assert_eq!(bases.bases.len(), 2);
        assert_eq!(bases.bases[1].permission_level, "edit");
        assert_eq!(bases.next_offset(), Some("itrBase1"));
    }

    #[test]
    fn list_bases_passes_offset() {
        let transport = Arc::new(CannedTransport::default());
        let client = client_with(&transport);
        transport.respond(200, r#"{"bases":[]}"#);

        let bases = client.list_bases().with_offset("itrBase1").send().unwrap();
        assert_eq!(transport.last_request().url, "http://localhost:3000/v0/meta/bases?offset=itrBase1");
        assert!(bases.bases.is_empty());
        assert_eq!(bases.next_offset(), None);
    }

    #[test]
    fn base_schema_hits_tables_endpoint() {
        let transport = Arc::new(CannedTransport::default());
        let client = client_with(&transport);
        transport.respond(200, SCHEMA);

        let tables = client.base_schema("appY3WxIBCdKPDdIa").send().unwrap();
        assert_eq!(
            transport.last_request().url,
            "http://localhost:3000/v0/meta/bases/appY3WxIBCdKPDdIa/tables"
        );
        let apartments = tables.find("Apartments").unwrap();
        assert_eq!(apartments.primary_field_id, "fld1VnoyuotSTyxW1");
        assert_eq!(apartments.fields[1].field_type, "multipleAttachments");
        assert_eq!(apartments.fields[1].options["isReversed"], false);
        assert_eq!(apartments.views[0].view_type, "grid");
    }

    #[test]
    fn schema_surfaces_404() {
        let transport = Arc::new(CannedTransport::default());
        let client = client_with(&transport);
        transport.respond(404, "");
        assert!(client.base_schema("appMissing").send().unwrap_err().is_not_found());
    }

    #[test]
    fn timeouts_reach_meta_requests() {
        let transport = Arc::new(CannedTransport::default());
        let client = client_with(&transport);

        transport.respond(200, BASES_PAGE);
        client.list_bases().timeout(Duration::from_millis(750)).send().unwrap();
        assert_eq!(transport.last_request().timeout, Some(Duration::from_millis(750)));

        transport.respond(200, r#"{"tables":[]}"#);
        client.base_schema("app1").timeout(Duration::from_secs(3)).send().unwrap();
        assert_eq!(transport.last_request().timeout, Some(Duration::from_secs(3)));
    }
}
