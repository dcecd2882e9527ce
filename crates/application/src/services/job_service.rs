use std::collections::HashMap;
use std::sync::Arc;

use domain::{
    DomainError, Job, JobApplication, JobId, JobRepository, NewJob, NewJobApplication,
    NewNotification, UserId, UserRepository,
};

use crate::{
    clock::Clock,
    dto::{ApplicantDto, JobDetail},
    error::ApplicationError,
};

#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub min_budget: i32,
    pub max_budget: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
    pub resume_file: Option<String>,
}

pub struct JobServiceDependencies {
    pub job_repository: Arc<dyn JobRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 职位发布、搜索与申请
pub struct JobService {
    deps: JobServiceDependencies,
}

impl JobService {
    pub fn new(deps: JobServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create(
        &self,
        author_id: UserId,
        request: CreateJobRequest,
    ) -> Result<Job, ApplicationError> {
        let title = required("title", request.title)?;
        let description = required("description", request.description)?;

        self.deps
            .user_repository
            .find_by_id(author_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let job = self
            .deps
            .job_repository
            .create(NewJob {
                author_id,
                title,
                description,
                keywords: request.keywords.trim().to_owned(),
                min_budget: request.min_budget,
                max_budget: request.max_budget,
            })
            .await?;

        tracing::info!(job_id = %job.id, author_id = %author_id, "职位已发布");
        Ok(job)
    }

    pub async fn list(&self) -> Result<Vec<Job>, ApplicationError> {
        Ok(self.deps.job_repository.list_all().await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Job>, ApplicationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::validation_error("query", "cannot be empty").into());
        }
        Ok(self.deps.job_repository.search(query).await?)
    }

    /// 职位详情，附带每位申请人自己的资料
    pub async fn detail(&self, job_id: JobId) -> Result<JobDetail, ApplicationError> {
        let job = self.find_job(job_id).await?;
        let applicants = self.applicants_of(job.id).await?;
        Ok(JobDetail { job, applicants })
    }

    /// 申请职位，并在同一事务中给职位作者写入通知
    pub async fn apply(
        &self,
        user_id: UserId,
        job_id: JobId,
        request: ApplyRequest,
    ) -> Result<JobApplication, ApplicationError> {
        let job = self.find_job(job_id).await?;
        let repository = &self.deps.job_repository;

        // 快速拒绝；并发重复申请由唯一约束兜底
        if repository.find_application(job_id, user_id).await?.is_some() {
            return Err(DomainError::DuplicateApplication.into());
        }

        let notification = NewNotification::new(
            job.author_id,
            job.application_notice(user_id),
            self.deps.clock.now(),
        );
        let (application, _) = repository
            .create_application_with_notification(
                NewJobApplication {
                    job_id,
                    user_id,
                    cover_letter: request.cover_letter.filter(|v| !v.is_empty()),
                    resume_file: request.resume_file.filter(|v| !v.is_empty()),
                },
                notification,
            )
            .await?;

        tracing::info!(job_id = %job_id, user_id = %user_id, "收到职位申请");
        Ok(application)
    }

    /// 只有职位作者可以查看申请人
    pub async fn applicants(
        &self,
        requester: UserId,
        job_id: JobId,
    ) -> Result<Vec<ApplicantDto>, ApplicationError> {
        let job = self.find_job(job_id).await?;
        if !job.is_authored_by(requester) {
            return Err(DomainError::unauthorized("view applicants of another user's job").into());
        }
        self.applicants_of(job.id).await
    }

    async fn find_job(&self, job_id: JobId) -> Result<Job, ApplicationError> {
        Ok(self
            .deps
            .job_repository
            .find_by_id(job_id)
            .await?
            .ok_or(DomainError::not_found("job"))?)
    }

    async fn applicants_of(&self, job_id: JobId) -> Result<Vec<ApplicantDto>, ApplicationError> {
        let applications = self.deps.job_repository.list_applications(job_id).await?;
        let ids: Vec<UserId> = applications.iter().map(|a| a.user_id).collect();
        let users: HashMap<UserId, _> = self
            .deps
            .user_repository
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(applications
            .iter()
            .filter_map(|application| {
                users
                    .get(&application.user_id)
                    .map(|user| ApplicantDto::new(user, application))
            })
            .collect())
    }
}

fn required(field: &str, value: String) -> Result<String, DomainError> {
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Err(DomainError::validation_error(field, "cannot be empty"));
    }
    Ok(value)
}
