//! 职位与职位申请

use serde::{Deserialize, Serialize};

use crate::value_objects::{JobApplicationId, JobId, UserId};

/// 职位实体
///
/// `max_budget >= min_budget` 不做强制校验。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub min_budget: i32,
    pub max_budget: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub min_budget: i32,
    pub max_budget: i32,
}

impl NewJob {
    pub fn into_job(self, id: JobId) -> Job {
        Job {
            id,
            author_id: self.author_id,
            title: self.title,
            description: self.description,
            keywords: self.keywords,
            min_budget: self.min_budget,
            max_budget: self.max_budget,
        }
    }
}

impl Job {
    /// 标题或关键词包含查询串（不区分大小写）
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.keywords.to_lowercase().contains(&needle)
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// 发给职位作者的申请通知文本
    pub fn application_notice(&self, applicant_id: UserId) -> String {
        format!(
            "User {} has applied to your job \"{}\".",
            applicant_id, self.title
        )
    }
}

/// 职位申请，每个 (job_id, user_id) 至多一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: JobApplicationId,
    pub job_id: JobId,
    pub user_id: UserId,
    pub cover_letter: Option<String>,
    pub resume_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobApplication {
    pub job_id: JobId,
    pub user_id: UserId,
    pub cover_letter: Option<String>,
    pub resume_file: Option<String>,
}

impl NewJobApplication {
    pub fn into_application(self, id: JobApplicationId) -> JobApplication {
        JobApplication {
            id,
            job_id: self.job_id,
            user_id: self.user_id,
            cover_letter: self.cover_letter,
            resume_file: self.resume_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        NewJob {
            author_id: UserId::new(1),
            title: "Rust Backend Engineer".into(),
            description: "Build services".into(),
            keywords: "tokio, axum, postgres".into(),
            min_budget: 100,
            max_budget: 200,
        }
        .into_job(JobId::new(3))
    }

    #[test]
    fn search_matches_title_or_keywords_case_insensitively() {
        let job = job();
        assert!(job.matches("rust"));
        assert!(job.matches("AXUM"));
        assert!(!job.matches("python"));
    }

    #[test]
    fn application_notice_names_applicant_and_title() {
        assert_eq!(
            job().application_notice(UserId::new(7)),
            "User 7 has applied to your job \"Rust Backend Engineer\"."
        );
    }
}
