//! In-memory stand-in for the tabular database REST API.
//!
//! Serves records, bases, schema and attachment uploads with the vendor's
//! URL layout, JSON shapes, batch limit and error bodies, so the client can
//! be exercised end to end without network access.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MOCK_API_KEY: &str = "keyMockServer";
pub const MAX_RECORDS_PER_REQUEST: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
pub const BASES_PAGE_SIZE: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: String,
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecordList {
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeletedRecord {
    pub id: String,
    pub deleted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Base {
    pub id: String,
    pub name: String,
    #[serde(rename = "permissionLevel")]
    pub permission_level: String,
}

#[derive(Deserialize)]
pub struct WriteRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct WriteBatch {
    pub records: Vec<WriteRecord>,
    #[serde(default)]
    pub typecast: bool,
}

#[derive(Deserialize)]
pub struct UploadAttachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub file: String,
    pub filename: String,
}

pub struct Store {
    api_key: String,
    bases: Vec<Base>,
    records: HashMap<(String, String), Vec<Record>>,
}

impl Store {
    fn seeded(api_key: &str) -> Self {
        let base = |id: &str, name: &str, level: &str| Base {
            id: id.to_string(),
            name: name.to_string(),
            permission_level: level.to_string(),
        };
        Self {
            api_key: api_key.to_string(),
            bases: vec![
                base("appMockTasks", "Tasks", "create"),
                base("appMockCrm", "CRM", "edit"),
                base("appMockArchive", "Archive", "read"),
            ],
            records: HashMap::new(),
        }
    }

    fn has_base(&self, id: &str) -> bool {
        self.bases.iter().any(|b| b.id == id)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// A vendor-shaped error body: `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug)]
pub struct MockError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl MockError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST_UNKNOWN", message)
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = json!({"error": {"type": self.kind, "message": self.message}});
        (self.status, Json(body)).into_response()
    }
}

type Reply<T> = Result<Json<T>, MockError>;

pub fn app() -> Router {
    app_with_key(MOCK_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded(api_key)));
    let api = Router::new()
        .route("/meta/bases", get(list_bases))
        .route("/meta/bases/{base}/tables", get(base_schema))
        .route(
            "/{base}/{table}",
            get(list_records)
                .post(create_records)
                .put(replace_records)
                .patch(update_records)
                .delete(delete_records),
        )
        .route("/{base}/{table}/{record}", get(get_record));
    let content = Router::new().route("/{base}/{record}/{field}/uploadAttachment", post(upload_attachment));

    Router::new()
        .nest("/v0", api)
        .nest("/content/v0", content)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), MockError> {
    let expected = format!("Bearer {}", store.api_key);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(MockError::new(
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION_REQUIRED",
            "Authentication required",
        )),
    }
}

fn require_base(store: &Store, base: &str) -> Result<(), MockError> {
    if store.has_base(base) {
        Ok(())
    } else {
        Err(MockError::not_found(format!("Could not find base {base}")))
    }
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn new_id(prefix: &str) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &raw[..14])
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn parse_count(params: &[(String, String)], key: &str) -> Result<Option<usize>, MockError> {
    param(params, key)
        .map(|raw| {
            raw.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| MockError::invalid(format!("{key} must be a positive integer")))
        })
        .transpose()
}

/// Offsets are `itr{index}` tokens handed out by earlier pages.
fn parse_offset(params: &[(String, String)]) -> Result<usize, MockError> {
    match param(params, "offset") {
        None => Ok(0),
        Some(raw) => raw
            .strip_prefix("itr")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| MockError::invalid(format!("offset {raw} is not valid"))),
    }
}

fn check_batch(len: usize) -> Result<(), MockError> {
    if len == 0 || len > MAX_RECORDS_PER_REQUEST {
        return Err(MockError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_RECORDS",
            format!("Requests must contain between 1 and {MAX_RECORDS_PER_REQUEST} records"),
        ));
    }
    Ok(())
}

async fn list_bases(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Reply<Value> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let start = parse_offset(&params)?;
    let end = (start + BASES_PAGE_SIZE).min(store.bases.len());
    let page = store.bases.get(start..end).unwrap_or_default();

    let mut body = json!({"bases": page});
    if end < store.bases.len() {
        body["offset"] = json!(format!("itr{end}"));
    }
    Ok(Json(body))
}

async fn base_schema(State(db): State<Db>, headers: HeaderMap, Path(base): Path<String>) -> Reply<Value> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;
    Ok(Json(json!({
        "tables": [{
            "id": format!("tbl{base}"),
            "name": "Tasks",
            "primaryFieldId": "fldName",
            "description": "Things to do",
            "fields": [
                {"id": "fldName", "name": "Name", "type": "singleLineText", "description": ""},
                {"id": "fldDone", "name": "Done", "type": "checkbox", "options": {"color": "greenBright", "icon": "check"}},
                {"id": "fldFiles", "name": "Attachments", "type": "multipleAttachments", "options": {"isReversed": false}}
            ],
            "views": [{"id": "viwGrid", "name": "Grid view", "type": "grid"}]
        }]
    })))
}

async fn list_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Reply<RecordList> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;

    let page_size = parse_count(&params, "pageSize")?.unwrap_or(MAX_PAGE_SIZE);
    if page_size > MAX_PAGE_SIZE {
        return Err(MockError::invalid(format!("pageSize must be at most {MAX_PAGE_SIZE}")));
    }
    let all = store.records.get(&(base, table)).map(Vec::as_slice).unwrap_or_default();
    let limit = parse_count(&params, "maxRecords")?.map_or(all.len(), |n| n.min(all.len()));
    let start = parse_offset(&params)?;
    if start > limit {
        return Err(MockError::invalid("offset is past the end of the table"));
    }
    let end = (start + page_size).min(limit);

    let projection: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "fields[]")
        .map(|(_, v)| v.as_str())
        .collect();
    let records = all[start..end]
        .iter()
        .cloned()
        .map(|mut record| {
            if !projection.is_empty() {
                record.fields.retain(|name, _| projection.contains(&name.as_str()));
            }
            record
        })
        .collect();

    debug!("listed records {start}..{end} of {limit}");
    Ok(Json(RecordList {
        records,
        offset: (end < limit).then(|| format!("itr{end}")),
    }))
}

async fn get_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table, id)): Path<(String, String, String)>,
) -> Reply<Record> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;
    store
        .records
        .get(&(base, table))
        .and_then(|records| records.iter().find(|r| r.id == id))
        .cloned()
        .map(Json)
        .ok_or_else(|| MockError::not_found(format!("Record {id} not found")))
}

async fn create_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Json(batch): Json<WriteBatch>,
) -> Reply<RecordList> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;
    check_batch(batch.records.len())?;

    let created: Vec<Record> = batch
        .records
        .into_iter()
        .map(|input| Record {
            id: new_id("rec"),
            created_time: now(),
            fields: input.fields,
        })
        .collect();
    store
        .records
        .entry((base, table))
        .or_default()
        .extend(created.iter().cloned());
    Ok(Json(RecordList {
        records: created,
        offset: None,
    }))
}

async fn replace_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Json(batch): Json<WriteBatch>,
) -> Reply<RecordList> {
    write_records(db, headers, base, table, batch, true).await
}

async fn update_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Json(batch): Json<WriteBatch>,
) -> Reply<RecordList> {
    write_records(db, headers, base, table, batch, false).await
}

/// Apply a PUT (`replace`) or PATCH batch. Either every record exists and
/// all are written, or nothing changes.
async fn write_records(
    db: Db,
    headers: HeaderMap,
    base: String,
    table: String,
    batch: WriteBatch,
    replace: bool,
) -> Reply<RecordList> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;
    check_batch(batch.records.len())?;

    let records = store.records.entry((base, table)).or_default();
    let mut positions = Vec::with_capacity(batch.records.len());
    for input in &batch.records {
        let id = input
            .id
            .as_deref()
            .ok_or_else(|| MockError::invalid("Every record in an update needs an id"))?;
        let position = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| MockError::not_found(format!("Record {id} not found")))?;
        positions.push(position);
    }

    let mut updated = Vec::with_capacity(positions.len());
    for (input, position) in batch.records.into_iter().zip(positions) {
        let record = &mut records[position];
        if replace {
            record.fields = input.fields;
        } else {
            record.fields.extend(input.fields);
        }
        updated.push(record.clone());
    }
    Ok(Json(RecordList {
        records: updated,
        offset: None,
    }))
}

async fn delete_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Reply<Value> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;

    let ids: Vec<String> = params
        .into_iter()
        .filter(|(k, _)| k == "records[]")
        .map(|(_, v)| v)
        .collect();
    check_batch(ids.len())?;

    let records = store.records.entry((base, table)).or_default();
    if let Some(missing) = ids.iter().find(|id| !records.iter().any(|r| &r.id == *id)) {
        return Err(MockError::not_found(format!("Record {missing} not found")));
    }
    records.retain(|r| !ids.contains(&r.id));

    let deleted: Vec<DeletedRecord> = ids
        .into_iter()
        .map(|id| DeletedRecord { id, deleted: true })
        .collect();
    Ok(Json(json!({"records": deleted})))
}

async fn upload_attachment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((base, record_id, field)): Path<(String, String, String)>,
    Json(upload): Json<UploadAttachment>,
) -> Reply<Value> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    require_base(&store, &base)?;

    let size = STANDARD
        .decode(upload.file.as_bytes())
        .map_err(|_| MockError::invalid("file must be base64 encoded"))?
        .len();
    let record = store
        .records
        .iter_mut()
        .filter(|((b, _), _)| *b == base)
        .flat_map(|(_, records)| records.iter_mut())
        .find(|r| r.id == record_id)
        .ok_or_else(|| MockError::not_found(format!("Record {record_id} not found")))?;

    let attachment_id = new_id("att");
    let details = json!({
        "id": attachment_id,
        "url": format!("https://mock.local/attachments/{attachment_id}/{}", upload.filename),
        "filename": upload.filename,
        "size": size,
        "type": upload.content_type,
    });
    let attachments = record
        .fields
        .entry(field.clone())
        .or_insert_with(|| Value::Array(Vec::new()));
    match attachments {
        Value::Array(items) => items.push(details),
        other => *other = Value::Array(vec![details]),
    }

    let mut fields = Map::new();
    fields.insert(field.clone(), record.fields[&field].clone());
    Ok(Json(json!({
        "id": record.id,
        "createdTime": record.created_time,
        "fields": fields,
    })))
}
