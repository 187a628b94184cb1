//! CLI handlers for raw API calls.

use reqwest::Method;

use crate::client::{ApiClient, ApiRequest, FilePart, UploadForm};

use super::{print_json, BodyArgs, PathArgs, UploadArgs};

/// Handle `jobmatch get|delete <path>`.
pub async fn handle_simple(
    client: &ApiClient,
    method: Method,
    args: PathArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = client.send(ApiRequest::new(method, args.path)).await?;
    print_json(&value);
    Ok(())
}

/// Handle `jobmatch post|put <path> [--data <json>]`.
pub async fn handle_with_body(
    client: &ApiClient,
    method: Method,
    args: BodyArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = match args.data.as_deref() {
        Some(raw) => Some(
            serde_json::from_str::<serde_json::Value>(raw)
                .map_err(|e| format!("--data is not valid JSON: {e}"))?,
        ),
        None => None,
    };
    let value = client.request(method, &args.path, body, None).await?;
    print_json(&value);
    Ok(())
}

/// Handle `jobmatch upload <path> <file>`.
pub async fn handle_upload(client: &ApiClient, args: UploadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file = FilePart::from_path(&args.file).await?;
    let mut form = UploadForm::with_field(args.field, file);
    for (name, value) in args.extra {
        form = form.text(name, value);
    }
    let value = client
        .send(ApiRequest::post(args.path).with_upload(form))
        .await?;
    print_json(&value);
    Ok(())
}
