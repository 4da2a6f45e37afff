//! HTTP client for the property backend.

use anyhow::{Context, Result};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::extraction::{ExtractedDocument, ParseFileResponse};
use crate::domain::{
    Building, BulkCreateUnitsResponse, NewBuilding, NewProperty, NewUnitBatch, Property,
    PropertyDetail, PropertySummary,
};

/// Every failure is flattened into one human-readable message
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
        }
    }
}

/// Error body of the backend; `error` is accepted for older servers
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Operations the wizard needs from the backend
pub trait PropertyApi: Send + Sync {
    fn list_properties(
        &self,
    ) -> impl Future<Output = Result<Vec<PropertySummary>, ClientError>> + Send;

    fn get_property(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<PropertyDetail, ClientError>> + Send;

    fn create_property(
        &self,
        input: &NewProperty,
    ) -> impl Future<Output = Result<Property, ClientError>> + Send;

    fn delete_property(&self, id: Uuid) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn create_building(
        &self,
        input: &NewBuilding,
    ) -> impl Future<Output = Result<Building, ClientError>> + Send;

    fn create_units_bulk(
        &self,
        batch: &NewUnitBatch,
    ) -> impl Future<Output = Result<BulkCreateUnitsResponse, ClientError>> + Send;

    /// Upload a document and return the structured data extracted from it
    fn parse_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<ExtractedDocument, ClientError>> + Send;
}

/// reqwest-backed [`PropertyApi`]
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ClientError> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<R>().await?)
    }

    /// Pass successful responses through, flatten the rest
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ServerErrorBody>().await.ok();
        let message = body
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        warn!(status = %status, message = %message, "Backend request failed");
        Err(ClientError::Api { status, message })
    }
}

impl PropertyApi for ApiClient {
    async fn list_properties(&self) -> Result<Vec<PropertySummary>, ClientError> {
        self.send(self.client.get(self.url("/properties"))).await
    }

    async fn get_property(&self, id: Uuid) -> Result<PropertyDetail, ClientError> {
        self.send(self.client.get(self.url(&format!("/properties/{id}"))))
            .await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_property(&self, input: &NewProperty) -> Result<Property, ClientError> {
        self.send(self.client.post(self.url("/properties")).json(input))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_property(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/properties/{id}")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_building(&self, input: &NewBuilding) -> Result<Building, ClientError> {
        self.send(self.client.post(self.url("/buildings")).json(input))
            .await
    }

    #[instrument(skip(self, batch), fields(building_id = %batch.building_id, count = batch.units.len()))]
    async fn create_units_bulk(
        &self,
        batch: &NewUnitBatch,
    ) -> Result<BulkCreateUnitsResponse, ClientError> {
        self.send(self.client.post(self.url("/units/bulk")).json(batch))
            .await
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn parse_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ClientError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        debug!("Uploading document for parsing");
        let response: ParseFileResponse = self
            .send(self.client.post(self.url("/ai/parse-file")).multipart(form))
            .await?;
        Ok(response.parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManagementType;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), 5).unwrap()
    }

    fn new_property() -> NewProperty {
        NewProperty {
            name: "Integration Property".to_string(),
            management_type: ManagementType::Mv,
            property_manager_id: "pm-1".to_string(),
            accountant_id: "acc-1".to_string(),
            declaration_of_division: None,
        }
    }

    #[tokio::test]
    async fn server_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/properties")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "code": "VALIDATION_ERROR", "message": "managementType must be either \"WEG\" or \"MV\"" })
                    .to_string(),
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .create_property(&new_property())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "managementType must be either \"WEG\" or \"MV\""
        );
    }

    #[tokio::test]
    async fn bodyless_failure_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/properties")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client_for(&server).list_properties().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn created_property_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("POST", "/properties")
            .match_body(mockito::Matcher::PartialJson(json!({
                "name": "Integration Property",
                "managementType": "MV"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": id,
                    "uniqueNumber": "MV00001",
                    "name": "Integration Property",
                    "managementType": "MV",
                    "propertyManagerId": "pm-1",
                    "accountantId": "acc-1",
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-01-01T00:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let property = client_for(&server)
            .create_property(&new_property())
            .await
            .unwrap();
        assert_eq!(property.id, id);
        assert_eq!(property.unique_number, "MV00001");
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("DELETE", format!("/properties/{id}").as_str())
            .with_status(204)
            .create_async()
            .await;

        client_for(&server).delete_property(id).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn parse_file_unwraps_parsed_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ai/parse-file")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "parsed": {
                        "buildings": [{ "address": { "street": "Main", "houseNumber": "1" } }],
                        "units": [{ "buildingIndex": 0, "unitNumber": "101", "type": "Apartment",
                                    "sizeSqm": 50, "coOwnershipShare": 0.5 }]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let doc = client_for(&server)
            .parse_file("doc.pdf", "application/pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert_eq!(doc.buildings.len(), 1);
        assert_eq!(doc.units[0].unit_number.as_deref(), Some("101"));
    }
}
