use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use application::{
    services::RecordKind, ApplicantDto, ChatMessageDto, ConfirmOutcome, JobDetail,
    NotificationDto, ProfileView,
};
use domain::{Job, JobId, NotificationId, UserId};

use crate::{
    auth::AuthUser,
    error::ApiError,
    payloads::{
        ApiPath, ApiQuery, ApplyPayload, CreateJobPayload, DeleteRecordPayload, LoginPayload,
        RegisterPayload, ResendConfirmationPayload, SearchQuery, UpdateProfilePayload,
        ValidatedJson,
    },
    state::AppState,
    websocket::websocket_upgrade,
};

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm-email/{token}", get(confirm_email))
        .route("/resend-confirmation", post(resend_confirmation))
        .route(
            "/profile/{username}",
            get(get_profile).put(update_profile).delete(delete_profile_record),
        )
        .route("/jobs/create", post(create_job))
        .route("/api/jobs", get(list_jobs))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/{job_id}", get(job_detail))
        .route("/jobs/{job_id}/apply", post(apply_to_job))
        .route("/jobs/{job_id}/applicants", get(job_applicants))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{notification_id}", put(mark_notification_read))
        .route("/api/chat-history/{other_user_id}", get(chat_history))
        .route("/ws", get(websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "忽略无效的 CORS 源");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let result = state.auth_service.register(payload.into()).await?;
    let message = if result.confirmation_sent {
        "User registered successfully. Please check your email to confirm your account."
    } else {
        "User registered, but the confirmation email could not be sent."
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": message,
            "user_id": result.user_id,
            "confirmation_sent": result.confirmation_sent,
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<Json<Value>, ApiError> {
    let result = state.auth_service.login(payload.into()).await?;
    Ok(Json(json!({
        "message": "Login successful",
        "access_token": result.access_token,
        "user_id": result.user_id,
        "username": result.username,
        "role": result.role,
    })))
}

async fn confirm_email(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .auth_service
        .confirm_email(&token)
        .await
        .map_err(ApiError::from_confirmation)?;
    let message = match outcome {
        ConfirmOutcome::Confirmed => "You have confirmed your account. Thanks!",
        ConfirmOutcome::AlreadyConfirmed => "Account already confirmed.",
    };
    Ok(Json(json!({ "message": message })))
}

async fn resend_confirmation(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResendConfirmationPayload>,
) -> Result<Json<Value>, ApiError> {
    state.auth_service.resend_confirmation(payload.email).await?;
    Ok(Json(
        json!({ "message": "A new confirmation email has been sent." }),
    ))
}

async fn get_profile(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<ProfileView>, ApiError> {
    Ok(Json(state.profile_service.get(&username).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(username): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .profile_service
        .update(caller, &username, payload.into())
        .await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

async fn delete_profile_record(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(username): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<DeleteRecordPayload>,
) -> Result<Json<Value>, ApiError> {
    let kind: RecordKind = payload.kind.parse().map_err(ApiError::from)?;
    state
        .profile_service
        .delete_record(caller, &username, kind, payload.id)
        .await?;
    let message = match kind {
        RecordKind::Education => "Education record deleted successfully",
        RecordKind::Experience => "Experience record deleted successfully",
    };
    Ok(Json(json!({ "message": message })))
}

async fn create_job(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateJobPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let job = state.job_service.create(author, payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Job created successfully", "job_id": job.id })),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let jobs: Vec<Job> = state.job_service.list().await?;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn search_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let jobs = state
        .job_service
        .search(query.query.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn job_detail(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    ApiPath(job_id): ApiPath<i64>,
) -> Result<Json<JobDetail>, ApiError> {
    Ok(Json(state.job_service.detail(JobId::new(job_id)).await?))
}

async fn apply_to_job(
    State(state): State<AppState>,
    AuthUser(applicant): AuthUser,
    ApiPath(job_id): ApiPath<i64>,
    payload: Option<ValidatedJson<ApplyPayload>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = payload
        .map(|ValidatedJson(payload)| payload)
        .unwrap_or_default();
    let application = state
        .job_service
        .apply(applicant, JobId::new(job_id), payload.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Application submitted successfully",
            "application_id": application.id,
        })),
    ))
}

async fn job_applicants(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(job_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let applicants: Vec<ApplicantDto> = state
        .job_service
        .applicants(caller, JobId::new(job_id))
        .await?;
    Ok(Json(json!({ "applicants": applicants })))
}

async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<NotificationDto>>, ApiError> {
    let notifications = state.notification_service.list(caller).await?;
    Ok(Json(
        notifications.into_iter().map(NotificationDto::from).collect(),
    ))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let notification = state
        .notification_service
        .mark_read(caller, NotificationId::new(notification_id))
        .await?;
    Ok(Json(json!({
        "message": "Notification marked as read",
        "notification": NotificationDto::from(notification),
    })))
}

async fn chat_history(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(other_user_id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let messages: Vec<ChatMessageDto> = state
        .chat_service
        .history(caller, UserId::new(other_user_id))
        .await?
        .iter()
        .map(ChatMessageDto::from)
        .collect();
    Ok(Json(json!({ "messages": messages })))
}
