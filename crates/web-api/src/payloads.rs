//! HTTP 请求体定义，在边界处完成结构校验

use application::services::{
    ApplyRequest, CreateJobRequest, EducationInput, ExperienceInput, LoginRequest,
    RegisterRequest, UpdateProfileRequest,
};
use axum::{
    extract::{FromRequest, FromRequestParts, OptionalFromRequest, Path, Query, Request},
    http::request::Parts,
    Json,
};
use chrono::NaiveDate;
use domain::{EducationId, ExperienceId};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::error::ApiError;

/// 反序列化后再执行 `Validate`，两类失败都映射为 `VALIDATION_ERROR`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// 请求体可以缺省；一旦声明为 JSON 就必须能解析并通过校验
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let Some(Json(value)) =
            <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?
        else {
            return Ok(None);
        };
        value.validate()?;
        Ok(Some(Self(value)))
    }
}

/// 路径参数，解析失败时返回 `VALIDATION_ERROR`
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// 查询参数，解析失败时返回 `VALIDATION_ERROR`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    pub role: Option<String>,
}

impl From<RegisterPayload> for RegisterRequest {
    fn from(payload: RegisterPayload) -> Self {
        Self {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role: payload.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl From<LoginPayload> for LoginRequest {
    fn from(payload: LoginPayload) -> Self {
        Self {
            email: payload.email,
            password: payload.password,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendConfirmationPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub keywords: String,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub min_budget: i32,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub max_budget: i32,
}

impl From<CreateJobPayload> for CreateJobRequest {
    fn from(payload: CreateJobPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            keywords: payload.keywords,
            min_budget: payload.min_budget,
            max_budget: payload.max_budget,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplyPayload {
    pub cover_letter: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub resume_file: Option<String>,
}

impl From<ApplyPayload> for ApplyRequest {
    fn from(payload: ApplyPayload) -> Self {
        Self {
            cover_letter: payload.cover_letter,
            resume_file: payload.resume_file,
        }
    }
}

// 长度上限与 migrations/0001_init.sql 的列宽一致
#[derive(Debug, Deserialize, Validate)]
pub struct EducationPayload {
    pub id: Option<i64>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub degree: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub field: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub school_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExperiencePayload {
    pub id: Option<i64>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub position: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub company_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 80, message = "must be 1-80 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub job: Option<String>,
    #[validate(length(max = 20, message = "must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub address: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub resume_file: Option<String>,
    pub cover_letter: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub company_name: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub education: Vec<EducationPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub experience: Vec<ExperiencePayload>,
}

impl From<UpdateProfilePayload> for UpdateProfileRequest {
    fn from(payload: UpdateProfilePayload) -> Self {
        Self {
            name: payload.name,
            job: payload.job,
            phone: payload.phone,
            address: payload.address,
            resume_file: payload.resume_file,
            cover_letter: payload.cover_letter,
            company_name: payload.company_name,
            education: payload
                .education
                .into_iter()
                .map(|edu| EducationInput {
                    id: edu.id.map(EducationId::new),
                    degree: edu.degree,
                    field: edu.field,
                    start_date: edu.start_date,
                    end_date: edu.end_date,
                    school_name: edu.school_name,
                })
                .collect(),
            experience: payload
                .experience
                .into_iter()
                .map(|exp| ExperienceInput {
                    id: exp.id.map(ExperienceId::new),
                    position: exp.position,
                    company_name: exp.company_name,
                    start_date: exp.start_date,
                    end_date: exp.end_date,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteRecordPayload {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "is required"))]
    pub kind: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_register_fields_fail_validation() {
        let payload: RegisterPayload = serde_json::from_value(serde_json::json!({
            "username": "",
            "email": "a@example.com",
            "password": "",
        }))
        .unwrap();

        let err = ApiError::from(payload.validate().unwrap_err());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.message(), "password: is required; username: is required");
    }

    #[test]
    fn profile_payload_parses_iso_dates() {
        let payload: UpdateProfilePayload = serde_json::from_value(serde_json::json!({
            "education": [{
                "degree": "BSc",
                "field": "CS",
                "start_date": "2015-09-01",
                "end_date": "2019-06-30",
                "school_name": "State University"
            }],
            "experience": [{ "id": 7, "position": "Engineer" }]
        }))
        .unwrap();

        let request = UpdateProfileRequest::from(payload);
        assert_eq!(request.education[0].start_date, NaiveDate::from_ymd_opt(2015, 9, 1));
        assert_eq!(request.experience[0].id, Some(ExperienceId::new(7)));
        assert!(request.name.is_none());
    }

    #[test]
    fn profile_fields_respect_column_widths() {
        let payload: UpdateProfilePayload = serde_json::from_value(serde_json::json!({
            "phone": "0".repeat(21),
            "job": "j".repeat(255),
        }))
        .unwrap();
        let err = ApiError::from(payload.validate().unwrap_err());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.message(), "phone: must be at most 20 characters");

        let payload: UpdateProfilePayload = serde_json::from_value(serde_json::json!({
            "experience": [{ "position": "p".repeat(256) }]
        }))
        .unwrap();
        let err = ApiError::from(payload.validate().unwrap_err());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(
            err.message(),
            "experience[0].position: must be at most 255 characters"
        );
    }
}
