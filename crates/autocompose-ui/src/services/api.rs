//! HTTP client for the Autocompose server (REST).

use async_trait::async_trait;
use autocompose_api_models::{
    ErrorBody, JobId, JobStatusReport, StartJobRequest, StartJobResponse,
    ToggleSelectionRequest, ToggleSelectionResponse, UpdateColumnsResponse,
};
use gloo_net::http::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::config::ControllerConfig;
use crate::core::error::ApiError;
use crate::core::grid::GridColumns;
use crate::core::jobs::{JobAction, JobApi};
use crate::core::selection::SelectionApi;

const TOGGLE_SELECTION: &str = "toggle_selection";
const START_JOB: &str = "start_job";
const CHECK_JOB_STATUS: &str = "check_job_status";
const UPDATE_COLUMNS: &str = "update_columns";

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    config: ControllerConfig,
}

impl ApiClient {
    pub(crate) const fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = Request::get(&self.config.url(path))
            .send()
            .await
            .map_err(|err| transport(operation, &err))?;
        decode(operation, &response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = Request::post(&self.config.url(path))
            .json(body)
            .map_err(|err| transport(operation, &err))?
            .send()
            .await
            .map_err(|err| transport(operation, &err))?;
        decode(operation, &response).await
    }

    pub(crate) async fn update_columns(
        &self,
        columns: GridColumns,
    ) -> Result<UpdateColumnsResponse, ApiError> {
        self.post_json(UPDATE_COLUMNS, "/update_columns", &columns.request())
            .await
    }
}

#[async_trait(?Send)]
impl SelectionApi for ApiClient {
    async fn toggle_selection(
        &self,
        request: &ToggleSelectionRequest,
    ) -> Result<ToggleSelectionResponse, ApiError> {
        self.post_json(TOGGLE_SELECTION, "/api/toggle_selection", request)
            .await
    }
}

#[async_trait(?Send)]
impl JobApi for ApiClient {
    async fn start_job(
        &self,
        action: JobAction,
        request: &StartJobRequest,
    ) -> Result<JobId, ApiError> {
        let response: StartJobResponse = self
            .post_json(START_JOB, action.path_segment(), request)
            .await?;
        response
            .into_job_id()
            .map_err(|source| ApiError::Response {
                operation: START_JOB,
                source,
            })
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ApiError> {
        let path = format!(
            "/check_job_status/{}",
            urlencoding::encode(job_id.as_str())
        );
        self.get_json(CHECK_JOB_STATUS, &path).await
    }
}

fn transport(operation: &'static str, err: &gloo_net::Error) -> ApiError {
    ApiError::Transport {
        operation,
        detail: err.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: &Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let ok = response.ok();
    let body = response
        .text()
        .await
        .map_err(|err| transport(operation, &err))?;
    if !ok {
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|error| error.reason().map(str::to_string));
        return Err(ApiError::Status {
            operation,
            status,
            detail,
        });
    }
    serde_json::from_str(&body).map_err(|err| ApiError::Decode {
        operation,
        detail: err.to_string(),
    })
}
