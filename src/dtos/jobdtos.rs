// dtos/jobdtos.rs
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::jobmodel::{ApplicationStatus, JobType};

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_salary_range"))]
pub struct CreateJobDto {
    #[validate(length(min = 3, max = 255))]
    pub title: String,
    #[validate(length(min = 20))]
    pub description: String,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub job_type: JobType,
    #[validate(range(min = 0.0))]
    pub salary_min: Option<f64>,
    #[validate(range(min = 0.0))]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn validate_salary_range(dto: &CreateJobDto) -> Result<(), ValidationError> {
    match (dto.salary_min, dto.salary_max) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("salary_range");
            err.message = Some("salary_min cannot exceed salary_max".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyJobDto {
    pub job_id: Uuid,
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplicationStatusDto {
    pub status: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_range_must_be_ordered() {
        let job = CreateJobDto {
            title: "Backend engineer".to_string(),
            description: "Build and operate our marketplace services.".to_string(),
            location: Some("Remote".to_string()),
            job_type: JobType::Contract,
            salary_min: Some(5000.0),
            salary_max: Some(1000.0),
            skills: vec![],
        };
        assert!(job.validate().is_err());

        let job = CreateJobDto {
            salary_max: Some(9000.0),
            ..job
        };
        assert!(job.validate().is_ok());
    }
}
