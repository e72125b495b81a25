//! Form HTTP Routes
//!
//! One set of endpoints serves every registered form type:
//!
//! - `GET    /forms`                       registered form types
//! - `GET    /forms/:form`                 records of a type
//! - `POST   /forms/:form`                 create (JSON or multipart)
//! - `GET    /forms/:form/revision/next`   label the next create would get
//! - `GET    /forms/:form/:id`             one record
//! - `PUT    /forms/:form/:id`             partial update (JSON or multipart)
//! - `DELETE /forms/:form/:id`             delete
//!
//! Multipart bodies may carry a `data` part holding a JSON object, plain
//! text parts (stored as string fields) and one file part named after the
//! form type's upload field.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::forms::{FormError, FormKind, FormKindInfo, FormService};
use crate::uploads::Upload;

/// Multipart part holding the JSON body
const DATA_PART: &str = "data";

// ==================
// Shared State
// ==================

pub struct FormsState {
    pub service: FormService,
}

impl FormsState {
    pub fn new(service: FormService) -> Self {
        Self { service }
    }
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct FormKindsResponse {
    pub forms: Vec<FormKindInfo>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub form: &'static str,
    pub records: Vec<Value>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRevisionResponse {
    pub form: &'static str,
    pub revision_no: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ==================
// Form Routes
// ==================

pub fn form_routes(state: Arc<FormsState>) -> Router {
    Router::new()
        .route("/", get(list_kinds_handler))
        .route("/:form", get(list_records_handler).post(create_handler))
        .route("/:form/revision/next", get(next_revision_handler))
        .route(
            "/:form/:id",
            get(get_record_handler)
                .put(update_handler)
                .delete(delete_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: status.as_u16(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    error(StatusCode::BAD_REQUEST, message)
}

fn form_error(e: FormError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %e, "form request failed");
    }
    error(status, e.to_string())
}

fn resolve_kind(form: &str) -> Result<FormKind, ApiError> {
    FormKind::from_slug(form).ok_or_else(|| form_error(FormError::UnknownForm(form.to_string())))
}

/// A parsed create/update request body
struct Submission {
    body: Value,
    upload: Option<Upload>,
}

async fn read_submission(kind: FormKind, request: Request) -> Result<Submission, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| error(e.status(), e.body_text()))?;
        read_multipart(kind, multipart).await
    } else {
        let Json(body) = Json::<Value>::from_request(request, &())
            .await
            .map_err(|e| error(e.status(), e.body_text()))?;
        Ok(Submission { body, upload: None })
    }
}

async fn read_multipart(kind: FormKind, mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut body = Map::new();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if kind.upload_field() != Some(name.as_str()) {
                return Err(bad_request(format!(
                    "Unexpected file field '{}' for form '{}'",
                    name,
                    kind.slug()
                )));
            }
            if upload.is_some() {
                return Err(bad_request("Only one file may be uploaded per submission"));
            }

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| error(e.status(), e.body_text()))?;

            upload = Some(Upload {
                file_name,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| error(e.status(), e.body_text()))?;

        if name == DATA_PART {
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(fields)) => body.extend(fields),
                Ok(_) => return Err(bad_request("The 'data' part must be a JSON object")),
                Err(e) => return Err(bad_request(format!("Invalid JSON in 'data' part: {}", e))),
            }
        } else if !name.is_empty() {
            body.insert(name, Value::String(text));
        }
    }

    Ok(Submission {
        body: Value::Object(body),
        upload,
    })
}

// ==================
// Handlers
// ==================

async fn list_kinds_handler() -> Json<FormKindsResponse> {
    let forms: Vec<FormKindInfo> = FormKind::all().iter().map(FormKind::info).collect();
    Json(FormKindsResponse {
        total: forms.len(),
        forms,
    })
}

async fn list_records_handler(
    State(state): State<Arc<FormsState>>,
    Path(form): Path<String>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let kind = resolve_kind(&form)?;
    let records = state.service.list(kind).map_err(form_error)?;

    Ok(Json(RecordsResponse {
        form: kind.slug(),
        total: records.len(),
        records,
    }))
}

async fn create_handler(
    State(state): State<Arc<FormsState>>,
    Path(form): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = resolve_kind(&form)?;
    let submission = read_submission(kind, request).await?;

    let record = state
        .service
        .create(kind, submission.body, submission.upload)
        .map_err(form_error)?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn next_revision_handler(
    State(state): State<Arc<FormsState>>,
    Path(form): Path<String>,
) -> Result<Json<NextRevisionResponse>, ApiError> {
    let kind = resolve_kind(&form)?;
    let label = state.service.next_create_label(kind).map_err(form_error)?;

    Ok(Json(NextRevisionResponse {
        form: kind.slug(),
        revision_no: label.to_string(),
    }))
}

async fn get_record_handler(
    State(state): State<Arc<FormsState>>,
    Path((form, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = resolve_kind(&form)?;
    let record = state.service.get(kind, &id).map_err(form_error)?;
    Ok(Json(record))
}

async fn update_handler(
    State(state): State<Arc<FormsState>>,
    Path((form, id)): Path<(String, String)>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let kind = resolve_kind(&form)?;
    let submission = read_submission(kind, request).await?;

    let record = state
        .service
        .update(kind, &id, submission.body, submission.upload)
        .map_err(form_error)?;

    Ok(Json(record))
}

async fn delete_handler(
    State(state): State<Arc<FormsState>>,
    Path((form, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = resolve_kind(&form)?;
    state.service.delete(kind, &id).map_err(form_error)?;
    Ok(StatusCode::NO_CONTENT)
}
