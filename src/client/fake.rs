//! [`PropertyApi`] backed by the in-memory repository, for client tests.

use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::api::{ClientError, PropertyApi};
use crate::domain::extraction::ExtractedDocument;
use crate::domain::{
    Building, BulkCreateUnitsResponse, NewBuilding, NewProperty, NewUnitBatch, Property,
    PropertyDetail, PropertySummary,
};
use crate::error::ApiError;
use crate::repository::{MemoryRepository, PropertyRepository, RepositoryError};

#[derive(Default)]
pub(crate) struct FakeApi {
    repo: MemoryRepository,
    unit_failure: Option<String>,
    parse_result: Option<Result<ExtractedDocument, String>>,
    bulk_calls: AtomicUsize,
    parse_calls: AtomicUsize,
}

impl FakeApi {
    /// Every bulk unit call is rejected with `message`
    pub(crate) fn failing_units(message: &str) -> Self {
        Self {
            unit_failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn parsing(result: Result<ExtractedDocument, String>) -> Self {
        Self {
            parse_result: Some(result),
            ..Default::default()
        }
    }

    pub(crate) fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn property_count(&self) -> usize {
        self.repo.list_properties().await.map(|p| p.len()).unwrap_or(0)
    }
}

/// Same status and message the server would answer with
fn to_client_error(err: RepositoryError) -> ClientError {
    let err = ApiError::from(err);
    ClientError::Api {
        status: err.status_code(),
        message: err.public_message(),
    }
}

fn bad_request(message: &str) -> ClientError {
    ClientError::Api {
        status: StatusCode::BAD_REQUEST,
        message: message.to_string(),
    }
}

impl PropertyApi for FakeApi {
    async fn list_properties(&self) -> Result<Vec<PropertySummary>, ClientError> {
        self.repo.list_properties().await.map_err(to_client_error)
    }

    async fn get_property(&self, id: Uuid) -> Result<PropertyDetail, ClientError> {
        self.repo
            .get_property(id)
            .await
            .map_err(to_client_error)?
            .ok_or_else(|| to_client_error(RepositoryError::NotFound("Property")))
    }

    async fn create_property(&self, input: &NewProperty) -> Result<Property, ClientError> {
        self.repo
            .create_property(input.clone())
            .await
            .map_err(to_client_error)
    }

    async fn delete_property(&self, id: Uuid) -> Result<(), ClientError> {
        match self.repo.delete_property(id).await.map_err(to_client_error)? {
            true => Ok(()),
            false => Err(to_client_error(RepositoryError::NotFound("Property"))),
        }
    }

    async fn create_building(&self, input: &NewBuilding) -> Result<Building, ClientError> {
        self.repo
            .create_building(input.clone())
            .await
            .map_err(to_client_error)
    }

    async fn create_units_bulk(
        &self,
        batch: &NewUnitBatch,
    ) -> Result<BulkCreateUnitsResponse, ClientError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.unit_failure {
            return Err(bad_request(message));
        }
        self.repo
            .create_units_bulk(batch.clone())
            .await
            .map(BulkCreateUnitsResponse::from)
            .map_err(to_client_error)
    }

    async fn parse_file(
        &self,
        _file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ClientError> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        match &self.parse_result {
            Some(Ok(document)) => Ok(document.clone()),
            Some(Err(message)) => Err(bad_request(message)),
            None => Err(bad_request("No file uploaded")),
        }
    }
}
