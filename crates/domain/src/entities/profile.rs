//! 教育经历与工作经历，均归属于唯一的用户。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::value_objects::{EducationId, ExperienceId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub id: EducationId,
    pub user_id: UserId,
    pub degree: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub school_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEducation {
    pub user_id: UserId,
    pub degree: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub school_name: String,
}

impl NewEducation {
    pub fn into_education(self, id: EducationId) -> Education {
        Education {
            id,
            user_id: self.user_id,
            degree: self.degree,
            field: self.field,
            start_date: self.start_date,
            end_date: self.end_date,
            school_name: self.school_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: ExperienceId,
    pub user_id: UserId,
    pub position: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExperience {
    pub user_id: UserId,
    pub position: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewExperience {
    pub fn into_experience(self, id: ExperienceId) -> Experience {
        Experience {
            id,
            user_id: self.user_id,
            position: self.position,
            company_name: self.company_name,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// 子记录写入：新建或更新已有记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordWrite<N, E> {
    Create(N),
    Update(E),
}

pub type EducationWrite = RecordWrite<NewEducation, Education>;
pub type ExperienceWrite = RecordWrite<NewExperience, Experience>;
