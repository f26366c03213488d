//! Resource DTOs mirrored from the backend.
//!
//! Every resource is identified by the backend's `_id`. Fields the backend may
//! omit default to empty values so one sparse record cannot fail a whole page.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub job_title: String,
  #[serde(default)]
  pub job_description: String,
  #[serde(default)]
  pub skills_required: Vec<String>,
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub job_type: String,
  pub thumbnail: Option<String>,
  pub created_at: Option<String>,
}

pub const JOB_TYPES: &[&str] = &["FULLTIME", "PARTTIME", "INTERNSHIP", "CONTRACT", "FREELANCE"];

fn validate_job_type(value: &str) -> Result<(), ValidationError> {
  if JOB_TYPES.contains(&value) {
    Ok(())
  } else {
    let mut err = ValidationError::new("job_type");
    err.message = Some("Select a valid job type".into());
    Err(err)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
  #[validate(length(min = 1, message = "Job title is required"))]
  pub job_title: String,
  #[validate(length(min = 1, message = "Job description is required"))]
  pub job_description: String,
  #[validate(length(min = 1, message = "Add at least one skill"))]
  pub skills_required: Vec<String>,
  #[validate(length(min = 1, message = "Location is required"))]
  pub location: String,
  #[validate(custom(function = "validate_job_type"))]
  pub job_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
}

/// Application submitted against a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub job_title: String,
  pub portfolio_link: Option<String>,
  pub resume: Option<String>,
  pub cover_note: Option<String>,
  pub created_at: Option<String>,
}

/// Staff record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub role: String,
  #[serde(default)]
  pub department: String,
  pub profile_image: Option<String>,
  pub joining_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
  #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
  pub name: String,
  #[validate(email(message = "Enter a valid email address"))]
  pub email: String,
  #[validate(length(min = 10, max = 15, message = "Phone must be 10-15 digits"))]
  pub phone: String,
  #[validate(length(min = 1, message = "Role is required"))]
  pub role: String,
  #[validate(length(min = 1, message = "Department is required"))]
  pub department: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub joining_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub profile_image: Option<String>,
}

/// Platform user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub role: String,
  pub phone_number: Option<String>,
  pub picture: Option<String>,
  pub created_at: Option<String>,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub age_category: String,
  #[serde(default)]
  pub product_type: String,
  pub thumbnail: Option<String>,
  pub created_at: Option<String>,
}

pub const AGE_CATEGORIES: &[&str] = &["6-12", "13-16", "17-19", "20+"];

fn validate_age_category(value: &str) -> Result<(), ValidationError> {
  if AGE_CATEGORIES.contains(&value) {
    Ok(())
  } else {
    let mut err = ValidationError::new("age_category");
    err.message = Some("Select a valid age category".into());
    Err(err)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
  #[validate(length(min = 1, message = "Title is required"))]
  pub title: String,
  #[validate(length(min = 1, message = "Description is required"))]
  pub description: String,
  #[validate(range(min = 0.0, message = "Price cannot be negative"))]
  pub price: f64,
  #[validate(custom(function = "validate_age_category"))]
  pub age_category: String,
  #[validate(length(min = 1, message = "Product type is required"))]
  pub product_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
}

/// Workshop enquiry left on the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopEnquiry {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub workshop_name: String,
  pub message: Option<String>,
  pub created_at: Option<String>,
}

/// Request for a call back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub phone: String,
  pub email: Option<String>,
  #[serde(default)]
  pub status: String,
  pub assigned_to: Option<String>,
  pub created_at: Option<String>,
}

pub const CALL_STATUSES: &[&str] = &["pending", "in-progress", "completed", "cancelled"];

/// Result of an assessment taken on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub assessment_type: String,
  pub score: Option<f64>,
  pub result: Option<String>,
  pub sample_report: Option<String>,
  pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_job_deserializes_with_missing_fields() {
    let job: Job = serde_json::from_str(r#"{"_id": "j1", "jobTitle": "Engineer"}"#).unwrap();
    assert_eq!(job.id, "j1");
    assert_eq!(job.job_title, "Engineer");
    assert!(job.skills_required.is_empty());
    assert!(job.thumbnail.is_none());
  }

  #[test]
  fn test_job_payload_serializes_camel_case() {
    let payload = JobPayload {
      job_title: "Engineer".to_string(),
      job_description: "Build things".to_string(),
      skills_required: vec!["TS".to_string()],
      location: "Remote".to_string(),
      job_type: "FULLTIME".to_string(),
      thumbnail: None,
    };
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["jobTitle"], "Engineer");
    assert_eq!(value["skillsRequired"][0], "TS");
    assert!(value.get("thumbnail").is_none());
  }

  #[test]
  fn test_job_payload_validation() {
    let mut payload = JobPayload {
      job_title: "Engineer".to_string(),
      job_description: "Build things".to_string(),
      skills_required: vec!["TS".to_string()],
      location: "Remote".to_string(),
      job_type: "FULLTIME".to_string(),
      thumbnail: None,
    };
    assert!(payload.validate().is_ok());

    payload.job_type = "SOMETIMES".to_string();
    payload.skills_required.clear();
    let errors = payload.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("job_type"));
    assert!(fields.contains_key("skills_required"));
  }

  #[test]
  fn test_employee_payload_email_validation() {
    let payload = EmployeePayload {
      name: "Asha".to_string(),
      email: "not-an-email".to_string(),
      phone: "9876543210".to_string(),
      role: "Designer".to_string(),
      department: "Creative".to_string(),
      joining_date: None,
      profile_image: None,
    };
    let errors = payload.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("email"));
  }

  #[test]
  fn test_product_payload_rejects_negative_price() {
    let payload = ProductPayload {
      title: "Comic pack".to_string(),
      description: "Six comics".to_string(),
      price: -1.0,
      age_category: "6-12".to_string(),
      product_type: "comic".to_string(),
      thumbnail: None,
    };
    let errors = payload.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("price"));
  }
}
