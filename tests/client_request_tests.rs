mod auth_support;

use jobmatch_client::auth::{LoginRequest, RegisterRequest, Role};
use jobmatch_client::client::{ApiRequest, FilePart, UploadForm};
use jobmatch_client::error::{ClientError, ErrorCategory};
use jobmatch_client::resources::{ApplicationStatus, JobSearch, JobType, Pageable};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use auth_support::{auth_body, fresh, harness};

fn is_multipart(request: &Request) -> bool {
    request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

#[tokio::test]
async fn server_message_is_surfaced_on_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": { "title": ["must not be blank"] }
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let err = h
        .client
        .post::<Value, _>("/jobs", &json!({ "title": "" }))
        .await
        .unwrap_err();
    match err {
        ClientError::Http {
            status,
            message,
            errors,
            ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Validation failed");
            assert_eq!(errors.unwrap()["title"], vec!["must not be blank".to_string()]);
        }
        other => panic!("expected Http, got {other:?}"),
    }
    assert!(h.storage.current().is_some(), "non-auth errors keep the session");
}

#[tokio::test]
async fn server_error_without_body_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/9"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let err = h.client.get::<Value>("/jobs/9").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.category(), ErrorCategory::Server);
    assert!(err.is_retryable());
    assert!(err.to_string().contains("Service Unavailable"), "{err}");
}

#[tokio::test]
async fn connection_failure_is_a_network_error() {
    let uri = {
        let server = MockServer::builder().start().await;
        server.uri()
    };
    let h = {
        let server = MockServer::start().await;
        let mut h = harness(&server, Some(fresh("A1", "R1")));
        // Point at the address of the server that has already shut down.
        let config = h.client.config().clone().with_base_url(uri);
        let transport = std::sync::Arc::new(
            jobmatch_client::client::ReqwestTransport::new(config.timeout).unwrap(),
        );
        h.client = jobmatch_client::client::ApiClient::with_parts(config, transport, h.store().clone());
        h
    };

    let err = h.client.get::<Value>("/me/profile").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
    assert!(h.storage.current().is_some(), "network errors do not clear credentials");
}

#[tokio::test]
async fn upload_is_multipart_and_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cvs"))
        .and(header("authorization", "Bearer A1"))
        .and(is_multipart)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "id": 12, "fileName": "cv.pdf" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let form = UploadForm::new(FilePart::new("cv.pdf", b"%PDF-1.4".to_vec())).text("title", "Backend");
    let envelope = h.client.upload_cv(form).await.expect("upload");
    assert!(envelope.success);
    assert_eq!(envelope.data["id"], 12);
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cvs/12/download"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 binary".to_vec()),
        )
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let bytes = h.client.download_cv("12").await.expect("download");
    assert_eq!(bytes, b"%PDF-1.4 binary".to_vec());
}

#[tokio::test]
async fn request_with_custom_headers_and_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/4"))
        .and(header("x-request-id", "abc"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-request-id", "abc".parse().unwrap());
    let value = h
        .client
        .request(reqwest::Method::DELETE, "/jobs/4", None, Some(headers))
        .await
        .expect("delete");
    assert!(value.is_null());
}

#[tokio::test]
async fn login_without_refresh_token_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "A1", "expiresIn": 3600 }
        })))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let err = h
        .client
        .login(&LoginRequest::new("ada@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)), "got {err:?}");
    assert!(h.storage.current().is_none());
    assert_eq!(h.storage.saves(), 0);
}

#[tokio::test]
async fn login_stores_complete_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("A1", "R1")))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let response = h
        .client
        .login(&LoginRequest::new("ada@example.com", "pw"))
        .await
        .expect("login");
    assert_eq!(response.token_type.as_deref(), Some("Bearer"));

    let bundle = h.store().get().expect("stored");
    assert_eq!(bundle.access_token(), "A1");
    assert_eq!(bundle.refresh_token(), "R1");
    assert_eq!(
        bundle.expires_at(),
        bundle.issued_at_time() + chrono::Duration::seconds(3600)
    );
    assert!(h.client.is_authenticated());
}

#[tokio::test]
async fn register_conflict_has_friendly_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "fullName": "Ada",
            "email": "ada@example.com",
            "phoneNumber": "555",
            "password": "pw",
            "role": "CANDIDATE"
        })))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let request = RegisterRequest::builder()
        .full_name("Ada".to_string())
        .email("ada@example.com".to_string())
        .phone_number("555".to_string())
        .password("pw".to_string())
        .role(Role::Candidate)
        .build();
    let err = h.client.register(&request).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Conflict);
    assert!(err.to_string().contains("Email is already registered"), "{err}");
    assert!(h.storage.current().is_none());
}

#[tokio::test]
async fn logout_is_idempotent_and_tolerates_server_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({ "accessToken": "A1", "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    h.client.logout().await;
    assert!(h.storage.current().is_none());

    // Nothing stored: no request, still empty.
    h.client.logout().await;
    assert!(h.storage.current().is_none());
    assert!(!h.client.is_authenticated());
    assert_eq!(h.expired_count(), 0);
}

#[tokio::test]
async fn job_search_encodes_filters_and_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .and(query_param("keyword", "rust developer"))
        .and(query_param("jobType", "FULL_TIME"))
        .and(query_param("page", "0"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "data": {
                "content": [{ "id": 1, "title": "Rust Developer" }],
                "totalElements": 1,
                "totalPages": 1,
                "number": 0,
                "size": 5
            },
            "timestamp": "2025-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let search = JobSearch::builder()
        .keyword("rust developer".to_string())
        .job_type(JobType::FullTime)
        .page(Pageable::new(0, 5))
        .build();
    let envelope = h.client.search_jobs(&search).await.expect("search");
    assert_eq!(envelope.data.total_elements, 1);
    assert_eq!(envelope.data.content[0]["title"], "Rust Developer");
}

#[tokio::test]
async fn unsuccessful_status_update_envelope_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/applications/3/status"))
        .and(query_param("status", "IN_REVIEW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Status change not allowed",
            "data": null
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let err = h
        .client
        .update_application_status("3", ApplicationStatus::InReview)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Status change not allowed"));
}

#[tokio::test]
async fn send_json_decodes_typed_payload() {
    #[derive(serde::Deserialize)]
    struct Profile {
        email: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "email": "ada@example.com" }
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Some(fresh("A1", "R1")));
    let envelope: jobmatch_client::client::ApiResponse<Profile> = h
        .client
        .send_json(ApiRequest::get("/me/profile"))
        .await
        .expect("typed");
    assert_eq!(envelope.into_data().unwrap().email, "ada@example.com");
}
