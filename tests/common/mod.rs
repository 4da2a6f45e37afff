//! Shared helpers for router tests against the in-memory store

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use property_ledger::{
    app::{create_app, AppState},
    config::Settings,
    repository::MemoryRepository,
    services::LlmClient,
};
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "property-ledger-test-boundary";

pub fn test_app() -> Router {
    test_app_with(Settings::default())
}

pub fn test_app_with(settings: Settings) -> Router {
    let llm = LlmClient::new(&settings.llm).unwrap();
    create_app(AppState::new(MemoryRepository::new(), settings, llm))
}

/// Send a request and decode the JSON body (`Null` when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Single-part multipart body with the given field name
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub async fn post_multipart(app: &Router, uri: &str, body: Body) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap(),
    )
    .await
}

/// Create a property and return its JSON
pub async fn create_property(app: &Router, name: &str, management_type: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/properties",
        serde_json::json!({
            "name": name,
            "managementType": management_type,
            "propertyManagerId": "pm-1",
            "accountantId": "acc-1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

/// Create a building under `property_id` and return its JSON
pub async fn create_building(app: &Router, property_id: &str, street: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/buildings",
        serde_json::json!({
            "propertyId": property_id,
            "address": { "street": street, "houseNumber": "10", "city": "Berlin" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

/// Minimal single-page PDF. `text` is drawn with a `Tj` operator; `None`
/// leaves the content stream empty.
pub fn pdf_document(text: Option<&str>) -> Vec<u8> {
    let content = match text {
        Some(text) => format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET"),
        None => String::new(),
    };
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }

    let xref_start = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

/// App whose LLM client talks to `llm_url` (a mock server)
pub fn test_app_with_llm(llm_url: String) -> Router {
    let mut settings = Settings::default();
    settings.llm.api_url = llm_url;
    settings.llm.api_key = "test-key".to_string();
    test_app_with(settings)
}

/// Chat-completion body whose first choice carries `content`
pub fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}
