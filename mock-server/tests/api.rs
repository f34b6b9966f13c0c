use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Base, DeletedRecord, Record, RecordList, MOCK_API_KEY};
use serde::Deserialize;
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {MOCK_API_KEY}"))
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    request("GET", uri, "")
}

#[derive(Deserialize)]
struct Deleted {
    records: Vec<DeletedRecord>,
}

#[derive(Deserialize)]
struct BasesPage {
    bases: Vec<Base>,
    offset: Option<String>,
}

// --- auth ---

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v0/appMockTasks/Tasks").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"]["type"], "AUTHENTICATION_REQUIRED");
}

// --- list ---

#[tokio::test]
async fn list_empty_table() {
    let resp = app().oneshot(get("/v0/appMockTasks/Tasks")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: RecordList = body_json(resp).await;
    assert!(list.records.is_empty());
    assert!(list.offset.is_none());
}

#[tokio::test]
async fn unknown_base_returns_404() {
    let resp = app().oneshot(get("/v0/appMissing/Tasks")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_page_returns_422() {
    let resp = app().oneshot(get("/v0/appMockTasks/Tasks?pageSize=101")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- create ---

#[tokio::test]
async fn create_assigns_ids_and_times() {
    let resp = app()
        .oneshot(request(
            "POST",
            "/v0/appMockTasks/Tasks",
            r#"{"records":[{"fields":{"Name":"a"}},{"fields":{"Name":"b"}}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: RecordList = body_json(resp).await;
    assert_eq!(list.records.len(), 2);
    assert!(list.records.iter().all(|r| r.id.starts_with("rec")));
    assert!(list.records.iter().all(|r| r.created_time.ends_with('Z')));
    assert_eq!(list.records[1].fields["Name"], "b");
}

#[tokio::test]
async fn create_more_than_ten_returns_422() {
    let records: Vec<String> = (0..11).map(|i| format!(r#"{{"fields":{{"n":{i}}}}}"#)).collect();
    let body = format!(r#"{{"records":[{}]}}"#, records.join(","));
    let resp = app().oneshot(request("POST", "/v0/appMockTasks/Tasks", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"]["type"], "INVALID_RECORDS");
}

// --- get / update / delete missing ---

#[tokio::test]
async fn get_missing_record_returns_404() {
    let resp = app().oneshot(get("/v0/appMockTasks/Tasks/recMissing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_missing_record_returns_404() {
    let resp = app()
        .oneshot(request(
            "PATCH",
            "/v0/appMockTasks/Tasks",
            r#"{"records":[{"id":"recMissing","fields":{}}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_record_returns_404() {
    let resp = app()
        .oneshot(request("DELETE", "/v0/appMockTasks/Tasks?records%5B%5D=recMissing", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- meta ---

#[tokio::test]
async fn bases_are_paginated() {
    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(get("/v0/meta/bases")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let first: BasesPage = body_json(resp).await;
    assert_eq!(first.bases.len(), 2);
    let offset = first.offset.expect("more bases expected");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/v0/meta/bases?offset={offset}")))
        .await
        .unwrap();
    let second: BasesPage = body_json(resp).await;
    assert_eq!(second.bases.len(), 1);
    assert!(second.offset.is_none());
}

#[tokio::test]
async fn schema_lists_tables() {
    let resp = app().oneshot(get("/v0/meta/bases/appMockTasks/tables")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["tables"][0]["name"], "Tasks");
    assert_eq!(body["tables"][0]["primaryFieldId"], "fldName");

    let resp = app().oneshot(get("/v0/meta/bases/appMissing/tables")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn record_lifecycle() {
    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "POST",
            "/v0/appMockTasks/Tasks",
            r#"{"records":[{"fields":{"Name":"Walk dog","Done":false}}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: RecordList = body_json(resp).await;
    let id = created.records[0].id.clone();

    // patch merges
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "PATCH",
            "/v0/appMockTasks/Tasks",
            &format!(r#"{{"records":[{{"id":"{id}","fields":{{"Done":true}}}}]}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: RecordList = body_json(resp).await;
    assert_eq!(patched.records[0].fields["Name"], "Walk dog");
    assert_eq!(patched.records[0].fields["Done"], true);

    // put replaces
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "PUT",
            "/v0/appMockTasks/Tasks",
            &format!(r#"{{"records":[{{"id":"{id}","fields":{{"Name":"Walk cat"}}}}]}}"#),
        ))
        .await
        .unwrap();
    let replaced: RecordList = body_json(resp).await;
    assert_eq!(replaced.records[0].fields["Name"], "Walk cat");
    assert!(replaced.records[0].fields.get("Done").is_none());

    // upload
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "POST",
            &format!("/content/v0/appMockTasks/{id}/Attachments/uploadAttachment"),
            r#"{"contentType":"text/plain","file":"aGVsbG8=","filename":"hello.txt"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let uploaded: serde_json::Value = body_json(resp).await;
    assert_eq!(uploaded["id"], id.as_str());
    assert_eq!(uploaded["fields"]["Attachments"][0]["size"], 5);
    assert_eq!(uploaded["fields"]["Attachments"][0]["type"], "text/plain");

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/v0/appMockTasks/Tasks/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Record = body_json(resp).await;
    assert_eq!(fetched.fields["Attachments"][0]["filename"], "hello.txt");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &format!("/v0/appMockTasks/Tasks?records%5B%5D={id}"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Deleted = body_json(resp).await;
    assert_eq!(deleted.records, vec![DeletedRecord { id: id.clone(), deleted: true }]);

    // get after delete is a 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/v0/appMockTasks/Tasks/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pages_and_projects_fields() {
    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "POST",
            "/v0/appMockTasks/Tasks",
            r#"{"records":[{"fields":{"Name":"a","Notes":"x"}},{"fields":{"Name":"b","Notes":"y"}},{"fields":{"Name":"c","Notes":"z"}}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/v0/appMockTasks/Tasks?pageSize=2&fields%5B%5D=Name"))
        .await
        .unwrap();
    let first: RecordList = body_json(resp).await;
    assert_eq!(first.records.len(), 2);
    assert!(first.records.iter().all(|r| r.fields.get("Notes").is_none()));
    let offset = first.offset.expect("second page expected");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/v0/appMockTasks/Tasks?pageSize=2&offset={offset}")))
        .await
        .unwrap();
    let second: RecordList = body_json(resp).await;
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].fields["Name"], "c");
    assert!(second.offset.is_none());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/v0/appMockTasks/Tasks?maxRecords=1"))
        .await
        .unwrap();
    let capped: RecordList = body_json(resp).await;
    assert_eq!(capped.records.len(), 1);
    assert!(capped.offset.is_none());
}
