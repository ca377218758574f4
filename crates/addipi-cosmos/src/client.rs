//! Cosmos DB REST client for the jobs container.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use addipi_scheduler::{Job, JobStatus, JobStore, StoreError};

use crate::auth::{MasterKey, rfc1123_date};

/// Database holding the job queue.
pub const JOBS_DATABASE: &str = "addipi";

/// Container holding the job documents.
pub const JOBS_CONTAINER: &str = "jobs";

const API_VERSION: &str = "2018-12-31";

/// Response envelope for document queries.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(rename = "Documents")]
    documents: Vec<T>,
}

/// Job store backed by a Cosmos DB container.
#[derive(Debug)]
pub struct CosmosJobStore {
    http: Client,
    endpoint: String,
    key: MasterKey,
    collection_link: String,
}

impl CosmosJobStore {
    /// Create a store for the given account endpoint and master key.
    pub fn new(endpoint: &str, key: &str) -> Result<Self, StoreError> {
        let key = MasterKey::new(key)
            .map_err(|e| StoreError::Auth(format!("invalid master key: {e}")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key,
            collection_link: format!("dbs/{JOBS_DATABASE}/colls/{JOBS_CONTAINER}"),
        })
    }

    fn docs_url(&self) -> String {
        format!("{}/{}/docs", self.endpoint, self.collection_link)
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/docs/{}", self.endpoint, self.collection_link, id)
    }

    /// Run a parameterized SQL query against the container.
    async fn run_query<T: DeserializeOwned>(
        &self,
        body: &serde_json::Value,
    ) -> Result<Vec<T>, StoreError> {
        let date = rfc1123_date(Utc::now());
        let auth = self
            .key
            .authorization("POST", "docs", &self.collection_link, &date);

        let response = self
            .http
            .post(self.docs_url())
            .header("Authorization", auth)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-documentdb-isquery", "True")
            .header("x-ms-documentdb-query-enablecrosspartition", "True")
            .header("Content-Type", "application/query+json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let response = check_status(response, None).await?;
        let parsed: QueryResponse<T> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(parsed.documents)
    }
}

#[async_trait]
impl JobStore for CosmosJobStore {
    async fn query_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, StoreError> {
        let body = json!({
            "query": "SELECT * FROM c WHERE c.status = @status AND c.scheduledAt <= @now",
            "parameters": [
                { "name": "@status", "value": JobStatus::Scheduled.as_str() },
                { "name": "@now", "value": now.to_rfc3339_opts(SecondsFormat::Millis, true) },
            ],
        });

        let jobs: Vec<Job> = self.run_query(&body).await?;
        debug!(count = jobs.len(), "due-job query complete");
        Ok(jobs)
    }

    async fn mark_job(&self, job: &Job, new_status: JobStatus) -> Result<Job, StoreError> {
        let mut updated = job.clone();
        updated.status = new_status;
        // The precondition travels in the If-Match header, not the body.
        updated.etag = None;

        let resource_link = format!("{}/docs/{}", self.collection_link, job.id);
        let date = rfc1123_date(Utc::now());
        let auth = self.key.authorization("PUT", "docs", &resource_link, &date);

        let mut request = self
            .http
            .put(self.doc_url(&job.id))
            .header("Authorization", auth)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header(
                "x-ms-documentdb-partitionkey",
                serde_json::to_string(&[&job.id])?,
            )
            .json(&updated);

        match &job.etag {
            Some(etag) => request = request.header("If-Match", etag),
            // Documents inserted without a read-back carry no token; the
            // replace is then unconditional, as the original service did.
            None => debug!(job_id = %job.id, "no etag on job, replacing unconditionally"),
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let response = check_status(response, Some(&job.id)).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<u64, StoreError> {
        let body = json!({
            "query": "SELECT VALUE COUNT(1) FROM c WHERE c.status = @status",
            "parameters": [
                { "name": "@status", "value": status.as_str() },
            ],
        });

        let counts: Vec<u64> = self.run_query(&body).await?;
        counts
            .first()
            .copied()
            .ok_or_else(|| StoreError::InvalidResponse("empty count result".to_string()))
    }
}

/// Map a Cosmos response status onto the store error taxonomy.
async fn check_status(
    response: reqwest::Response,
    job_id: Option<&str>,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Auth(format!(
            "{status}: {body}"
        ))),
        StatusCode::PRECONDITION_FAILED => Err(StoreError::Conflict {
            id: job_id.unwrap_or("<unknown>").to_string(),
        }),
        _ => Err(StoreError::Unavailable(format!("{status}: {body}"))),
    }
}
