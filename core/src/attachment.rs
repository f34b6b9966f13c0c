//! Attachment uploads.
//!
//! Uploads are the only calls that go to the upload host
//! (`Client::upload_base_url`) instead of the API host.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ApiError, Result};
use crate::table::Table;
use crate::types::{Attachment, FieldAttachments};

impl Attachment {
    /// Wrap already base64-encoded file content.
    pub fn new(content_type: impl Into<String>, filename: impl Into<String>, file_base64: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            file: file_base64.into(),
            filename: filename.into(),
        }
    }

    /// Encode raw file bytes.
    pub fn from_bytes(content_type: impl Into<String>, filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(content_type, filename, STANDARD.encode(bytes))
    }
}

impl Table {
    /// Upload a file into an attachment field of a record.
    ///
    /// Returns every attachment now present on the field.
    pub fn upload_attachment(
        &self,
        record_id: &str,
        field_id_or_name: &str,
        attachment: &Attachment,
    ) -> Result<FieldAttachments> {
        if record_id.is_empty() || field_id_or_name.is_empty() {
            return Err(ApiError::InvalidRequest(
                "uploads need both a record id and an attachment field".to_string(),
            ));
        }
        let mut result: FieldAttachments =
            self.client()
                .post_attachment(self.db_name(), record_id, field_id_or_name, attachment)?;
        result.origin = Some(self.reference().clone());
        Ok(result)
    }
}
