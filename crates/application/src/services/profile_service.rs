use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use domain::{
    DomainError, EducationId, EducationWrite, ExperienceId, ExperienceWrite, JobRepository,
    NewEducation, NewExperience, ProfileChanges, ProfileRepository, ProfileSave, RecordWrite,
    User, UserId, UserRepository, Username,
};

use crate::{dto::ProfileView, error::ApplicationError};

/// 教育经历写入；带 `id` 为更新，否则为新建（此时全部字段必填）
#[derive(Debug, Clone, Default)]
pub struct EducationInput {
    pub id: Option<EducationId>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub school_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExperienceInput {
    pub id: Option<ExperienceId>,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub job: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub resume_file: Option<String>,
    pub cover_letter: Option<String>,
    pub company_name: Option<String>,
    pub education: Vec<EducationInput>,
    pub experience: Vec<ExperienceInput>,
}

/// 可单独删除的资料子记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Education,
    Experience,
}

impl FromStr for RecordKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "education" => Ok(Self::Education),
            "experience" => Ok(Self::Experience),
            _ => Err(DomainError::validation_error(
                "type",
                "expected education or experience",
            )),
        }
    }
}

pub struct ProfileServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub job_repository: Arc<dyn JobRepository>,
}

pub struct ProfileService {
    deps: ProfileServiceDependencies,
}

impl ProfileService {
    pub fn new(deps: ProfileServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn get(&self, username: &str) -> Result<ProfileView, ApplicationError> {
        let user = self.find_user(username).await?;
        self.view(user).await
    }

    pub async fn update(
        &self,
        caller: UserId,
        username: &str,
        request: UpdateProfileRequest,
    ) -> Result<ProfileView, ApplicationError> {
        let mut user = self.owned_profile(caller, username).await?;

        let name = match request.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                let name = Username::parse(name)?;
                if name != user.username {
                    let taken = self.deps.user_repository.find_by_username(&name).await?;
                    if taken.is_some_and(|other| other.id != user.id) {
                        return Err(DomainError::DuplicateUsername.into());
                    }
                }
                Some(name)
            }
            None => None,
        };

        user.apply_profile_changes(ProfileChanges {
            name,
            job: request.job,
            phone: request.phone,
            address: request.address,
            resume_file: request.resume_file,
            cover_letter: request.cover_letter,
            company_name: request.company_name,
        });

        let mut education = Vec::with_capacity(request.education.len());
        for input in request.education {
            if let Some(write) = self.education_write(user.id, input).await? {
                education.push(write);
            }
        }
        let mut experience = Vec::with_capacity(request.experience.len());
        for input in request.experience {
            if let Some(write) = self.experience_write(user.id, input).await? {
                experience.push(write);
            }
        }

        let user = self
            .deps
            .profile_repository
            .save_profile(ProfileSave {
                user,
                education,
                experience,
            })
            .await?;

        tracing::info!(user_id = %user.id, "个人资料已更新");
        self.view(user).await
    }

    /// 删除调用者自己的教育或工作经历
    pub async fn delete_record(
        &self,
        caller: UserId,
        username: &str,
        kind: RecordKind,
        record_id: i64,
    ) -> Result<(), ApplicationError> {
        let user = self.owned_profile(caller, username).await?;
        let profiles = &self.deps.profile_repository;

        match kind {
            RecordKind::Education => {
                let id = EducationId::new(record_id);
                match profiles.find_education(id).await? {
                    Some(record) if record.user_id == user.id => {
                        profiles.delete_education(id).await?
                    }
                    _ => return Err(DomainError::not_found("education").into()),
                }
            }
            RecordKind::Experience => {
                let id = ExperienceId::new(record_id);
                match profiles.find_experience(id).await? {
                    Some(record) if record.user_id == user.id => {
                        profiles.delete_experience(id).await?
                    }
                    _ => return Err(DomainError::not_found("experience").into()),
                }
            }
        }
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<User, ApplicationError> {
        let username = Username::parse(username)?;
        Ok(self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .ok_or(DomainError::UserNotFound)?)
    }

    async fn owned_profile(
        &self,
        caller: UserId,
        username: &str,
    ) -> Result<User, ApplicationError> {
        let user = self.find_user(username).await?;
        if user.id != caller {
            return Err(DomainError::unauthorized("modify another user's profile").into());
        }
        Ok(user)
    }

    async fn view(&self, user: User) -> Result<ProfileView, ApplicationError> {
        let jobs = self.deps.job_repository.list_by_author(user.id).await?;
        let education = self.deps.profile_repository.list_education(user.id).await?;
        let experience = self.deps.profile_repository.list_experience(user.id).await?;
        Ok(ProfileView::new(user, jobs, education, experience))
    }

    /// 他人的记录或不存在的记录被忽略
    async fn education_write(
        &self,
        owner: UserId,
        input: EducationInput,
    ) -> Result<Option<EducationWrite>, ApplicationError> {
        let Some(id) = input.id else {
            return Ok(Some(RecordWrite::Create(NewEducation {
                user_id: owner,
                degree: require("degree", input.degree)?,
                field: require("field", input.field)?,
                start_date: require("start_date", input.start_date)?,
                end_date: require("end_date", input.end_date)?,
                school_name: require("school_name", input.school_name)?,
            })));
        };

        let existing = self.deps.profile_repository.find_education(id).await?;
        Ok(existing
            .filter(|record| record.user_id == owner)
            .map(|mut record| {
                overwrite(&mut record.degree, input.degree);
                overwrite(&mut record.field, input.field);
                overwrite(&mut record.school_name, input.school_name);
                if let Some(start) = input.start_date {
                    record.start_date = start;
                }
                if let Some(end) = input.end_date {
                    record.end_date = end;
                }
                RecordWrite::Update(record)
            }))
    }

    async fn experience_write(
        &self,
        owner: UserId,
        input: ExperienceInput,
    ) -> Result<Option<ExperienceWrite>, ApplicationError> {
        let Some(id) = input.id else {
            return Ok(Some(RecordWrite::Create(NewExperience {
                user_id: owner,
                position: require("position", input.position)?,
                company_name: require("company_name", input.company_name)?,
                start_date: require("start_date", input.start_date)?,
                end_date: require("end_date", input.end_date)?,
            })));
        };

        let existing = self.deps.profile_repository.find_experience(id).await?;
        Ok(existing
            .filter(|record| record.user_id == owner)
            .map(|mut record| {
                overwrite(&mut record.position, input.position);
                overwrite(&mut record.company_name, input.company_name);
                if let Some(start) = input.start_date {
                    record.start_date = start;
                }
                if let Some(end) = input.end_date {
                    record.end_date = end;
                }
                RecordWrite::Update(record)
            }))
    }
}

fn require<T>(field: &str, value: Option<T>) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::validation_error(field, "is required"))
}

fn overwrite(field: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = value;
    }
}
