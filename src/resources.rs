//! Typed wrappers for the main JobMatch resources.
//!
//! Every call goes through [`ApiClient`], so bearer injection, refresh and
//! retry apply unchanged. Entity payloads are left as JSON values; only the
//! envelope and pagination shapes are typed.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::client::{ApiClient, ApiRequest, ApiResponse, QueryParams, UploadForm};
use crate::error::{ClientError, Result};

/// Page request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct Pageable {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Entries like `"createdAt,desc"`; each becomes its own `sort` parameter.
    #[builder(default)]
    pub sort: Vec<String>,
}

impl Pageable {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            sort: Vec::new(),
        }
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort.push(sort.into());
        self
    }

    pub fn to_query(&self) -> QueryParams {
        self.append_to(QueryParams::new())
    }

    fn append_to(&self, query: QueryParams) -> QueryParams {
        query
            .push_opt("page", self.page)
            .push_opt("size", self.size)
            .push_all("sort", &self.sort)
    }
}

/// Spring-style page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Contract,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobStatus {
    Open,
    Closed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ApplicationStatus {
    Applied,
    InReview,
    Interview,
    Offered,
    Rejected,
}

/// Job listing filters.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
pub struct JobSearch {
    pub keyword: Option<String>,
    pub job_type: Option<JobType>,
    pub job_category: Option<u64>,
    pub location: Option<String>,
    pub min_salary: Option<u64>,
    pub max_salary: Option<u64>,
    pub company_name: Option<String>,
    pub status: Option<JobStatus>,
    /// ISO date, e.g. `2025-01-31`.
    pub application_deadline_after: Option<String>,
    #[builder(default)]
    pub page: Pageable,
}

impl JobSearch {
    pub fn to_query(&self) -> QueryParams {
        let query = QueryParams::new()
            .push_opt("keyword", self.keyword.as_deref())
            .push_opt("jobType", self.job_type)
            .push_opt("jobCategory", self.job_category)
            .push_opt("location", self.location.as_deref())
            .push_opt("minSalary", self.min_salary)
            .push_opt("maxSalary", self.max_salary)
            .push_opt("companyName", self.company_name.as_deref())
            .push_opt("status", self.status)
            .push_opt(
                "applicationDeadlineAfter",
                self.application_deadline_after.as_deref(),
            );
        self.page.append_to(query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: String,
    pub cv_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

type Envelope<T> = Result<ApiResponse<T>>;

impl ApiClient {
    pub async fn current_user(&self) -> Envelope<Value> {
        self.get("/me/profile").await
    }

    pub async fn update_profile(&self, profile: &Value) -> Envelope<Value> {
        self.put("/me/profile", profile).await
    }

    pub async fn jobs(&self, search: &JobSearch) -> Envelope<Page<Value>> {
        self.send_json(ApiRequest::get("/jobs").with_query(&search.to_query()))
            .await
    }

    pub async fn search_jobs(&self, search: &JobSearch) -> Envelope<Page<Value>> {
        self.send_json(ApiRequest::get("/jobs/search").with_query(&search.to_query()))
            .await
    }

    /// Jobs posted by the logged-in recruiter.
    pub async fn recruiter_jobs(&self, page: &Pageable) -> Envelope<Page<Value>> {
        self.send_json(ApiRequest::get("/me/jobs").with_query(&page.to_query()))
            .await
    }

    pub async fn job(&self, id: &str) -> Envelope<Value> {
        self.get(&format!("/jobs/{id}")).await
    }

    pub async fn create_job(&self, job: &Value) -> Envelope<Value> {
        self.post("/jobs", job).await
    }

    pub async fn update_job(&self, id: &str, job: &Value) -> Envelope<Value> {
        self.put(&format!("/jobs/{id}"), job).await
    }

    pub async fn delete_job(&self, id: &str) -> Result<()> {
        self.send(ApiRequest::delete(format!("/jobs/{id}"))).await?;
        Ok(())
    }

    pub async fn cvs(&self) -> Envelope<Vec<Value>> {
        self.get("/cvs").await
    }

    pub async fn deleted_cvs(&self) -> Envelope<Vec<Value>> {
        self.get("/cvs/deleted").await
    }

    pub async fn upload_cv(&self, form: UploadForm) -> Envelope<Value> {
        self.upload_file("/cvs", form).await
    }

    pub async fn delete_cv(&self, id: &str) -> Envelope<Value> {
        self.delete(&format!("/cvs/{id}")).await
    }

    pub async fn restore_cv(&self, id: &str) -> Envelope<Value> {
        self.send_json(ApiRequest::post(format!("/cvs/{id}/restore")))
            .await
    }

    pub async fn download_cv(&self, id: &str) -> Result<Vec<u8>> {
        self.download(&format!("/cvs/{id}/download")).await
    }

    pub async fn applications(&self, page: &Pageable) -> Envelope<Page<Value>> {
        self.send_json(ApiRequest::get("/applications").with_query(&page.to_query()))
            .await
    }

    pub async fn application(&self, id: &str) -> Envelope<Value> {
        self.get(&format!("/applications/{id}")).await
    }

    pub async fn create_application(&self, application: &NewApplication) -> Envelope<Value> {
        self.post("/applications", application).await
    }

    /// A `success: false` envelope is surfaced as an error.
    pub async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Envelope<Value> {
        let query = QueryParams::new().push("status", status);
        let request = ApiRequest::put(format!("/applications/{id}/status")).with_query(&query);
        let envelope: ApiResponse<Value> = self.send_json(request).await?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "Failed to update application status".to_string());
            return Err(ClientError::http(400, message));
        }
        Ok(envelope)
    }

    pub async fn withdraw_application(&self, id: &str) -> Envelope<Value> {
        self.delete(&format!("/applications/{id}")).await
    }
}
