//! Static description of each remote resource and its edit form.

use reqwest::Method;
use serde::Serialize;
use validator::Validate;

use crate::cache::{Cacheable, Tag};
use crate::list_query::SortOrder;

use super::forms::{self, FieldErrors, FieldKind, FormField, FormValues};
use super::types::{
  Application, AssessmentReport, CallRequest, Employee, EmployeePayload, Job, JobPayload, Product,
  ProductPayload, User, WorkshopEnquiry, AGE_CATEGORIES, CALL_STATUSES, JOB_TYPES,
};

/// A collection exposed by the backend under `PATH`.
pub trait Resource: Cacheable + std::fmt::Debug {
  /// Collection path relative to the API base URL
  const PATH: &'static str;
  /// Tag every cached view of this resource provides
  const TAG: Tag;
  /// Singular display name ("Job")
  const LABEL: &'static str;
  /// Plural display name ("Jobs")
  const PLURAL: &'static str;
  const DEFAULT_SORT: &'static str;
  const DEFAULT_ORDER: SortOrder;
  /// Wire names of fields the server sorts by
  const SORT_FIELDS: &'static [&'static str];
  /// Field updated with PATCH, and its allowed values
  const STATUS: Option<(&'static str, &'static [&'static str])> = None;
  const DELETABLE: bool = true;

  fn id(&self) -> &str;
}

/// A resource that can be created and edited through a form.
pub trait Editable: Resource {
  type Payload: Serialize + Validate + Clone + Send + Sync + 'static;

  const UPDATE_METHOD: Method = Method::PUT;
  /// Form field holding a file that is uploaded before the mutation
  const UPLOAD_FIELD: Option<&'static str> = None;

  fn form_fields() -> Vec<FormField>;

  /// Current values, used to prefill the edit form
  fn form_values(&self) -> FormValues;

  /// Build the payload, recording every field that cannot be parsed in
  /// `errors` and leaving a placeholder in its place. Validation rules run
  /// separately through `Validate`.
  fn payload_from_form(values: &FormValues, errors: &mut FieldErrors) -> Self::Payload;

  /// Write an uploaded file's URL into the payload
  fn attach_upload(payload: &mut Self::Payload, url: String);
}

fn values<const N: usize>(pairs: [(&str, String); N]) -> FormValues {
  pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Keep an existing remote URL, drop a local path (it is uploaded instead)
fn remote_only(values: &FormValues, key: &str) -> Option<String> {
  forms::optional_text(values, key).filter(|v| forms::is_remote_url(v))
}

impl Resource for Job {
  const PATH: &'static str = "/career/jobs";
  const TAG: Tag = "Jobs";
  const LABEL: &'static str = "Job";
  const PLURAL: &'static str = "Jobs";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "jobTitle", "location", "jobType"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Editable for Job {
  type Payload = JobPayload;

  const UPLOAD_FIELD: Option<&'static str> = Some("thumbnail");

  fn form_fields() -> Vec<FormField> {
    vec![
      FormField::new("job_title", "Job Title", FieldKind::Text),
      FormField::new("job_description", "Description", FieldKind::Multiline),
      FormField::new("skills_required", "Skills (comma separated)", FieldKind::List),
      FormField::new("location", "Location", FieldKind::Text),
      FormField::new("job_type", "Job Type", FieldKind::Select(JOB_TYPES)),
      FormField::new("thumbnail", "Thumbnail", FieldKind::File).optional(),
    ]
  }

  fn form_values(&self) -> FormValues {
    values([
      ("job_title", self.job_title.clone()),
      ("job_description", self.job_description.clone()),
      ("skills_required", self.skills_required.join(", ")),
      ("location", self.location.clone()),
      ("job_type", self.job_type.clone()),
      ("thumbnail", self.thumbnail.clone().unwrap_or_default()),
    ])
  }

  fn payload_from_form(values: &FormValues, _errors: &mut FieldErrors) -> JobPayload {
    JobPayload {
      job_title: forms::text(values, "job_title"),
      job_description: forms::text(values, "job_description"),
      skills_required: forms::list(values, "skills_required"),
      location: forms::text(values, "location"),
      job_type: forms::text(values, "job_type"),
      thumbnail: remote_only(values, "thumbnail"),
    }
  }

  fn attach_upload(payload: &mut JobPayload, url: String) {
    payload.thumbnail = Some(url);
  }
}

impl Resource for Application {
  const PATH: &'static str = "/career/applications";
  const TAG: Tag = "Applications";
  const LABEL: &'static str = "Application";
  const PLURAL: &'static str = "Applications";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "name", "email", "jobTitle"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Resource for Employee {
  const PATH: &'static str = "/employees";
  const TAG: Tag = "Employees";
  const LABEL: &'static str = "Employee";
  const PLURAL: &'static str = "Employees";
  const DEFAULT_SORT: &'static str = "name";
  const DEFAULT_ORDER: SortOrder = SortOrder::Asc;
  const SORT_FIELDS: &'static [&'static str] = &["name", "email", "role", "department", "joiningDate"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Editable for Employee {
  type Payload = EmployeePayload;

  const UPLOAD_FIELD: Option<&'static str> = Some("profile_image");

  fn form_fields() -> Vec<FormField> {
    vec![
      FormField::new("name", "Name", FieldKind::Text),
      FormField::new("email", "Email", FieldKind::Text),
      FormField::new("phone", "Phone", FieldKind::Text),
      FormField::new("role", "Role", FieldKind::Text),
      FormField::new("department", "Department", FieldKind::Text),
      FormField::new("joining_date", "Joining Date (YYYY-MM-DD)", FieldKind::Text).optional(),
      FormField::new("profile_image", "Profile Image", FieldKind::File).optional(),
    ]
  }

  fn form_values(&self) -> FormValues {
    values([
      ("name", self.name.clone()),
      ("email", self.email.clone()),
      ("phone", self.phone.clone()),
      ("role", self.role.clone()),
      ("department", self.department.clone()),
      ("joining_date", self.joining_date.clone().unwrap_or_default()),
      ("profile_image", self.profile_image.clone().unwrap_or_default()),
    ])
  }

  fn payload_from_form(values: &FormValues, errors: &mut FieldErrors) -> EmployeePayload {
    let joining_date = forms::optional_text(values, "joining_date");
    if let Some(date) = &joining_date {
      if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        errors.insert(
          "joining_date".to_string(),
          "Use the YYYY-MM-DD format".to_string(),
        );
      }
    }

    EmployeePayload {
      name: forms::text(values, "name"),
      email: forms::text(values, "email"),
      phone: forms::text(values, "phone"),
      role: forms::text(values, "role"),
      department: forms::text(values, "department"),
      joining_date,
      profile_image: remote_only(values, "profile_image"),
    }
  }

  fn attach_upload(payload: &mut EmployeePayload, url: String) {
    payload.profile_image = Some(url);
  }
}

impl Resource for User {
  const PATH: &'static str = "/user/all-users";
  const TAG: Tag = "Users";
  const LABEL: &'static str = "User";
  const PLURAL: &'static str = "Users";
  const DEFAULT_SORT: &'static str = "name";
  const DEFAULT_ORDER: SortOrder = SortOrder::Asc;
  const SORT_FIELDS: &'static [&'static str] = &["name", "email", "role", "createdAt"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Resource for Product {
  const PATH: &'static str = "/products";
  const TAG: Tag = "Products";
  const LABEL: &'static str = "Product";
  const PLURAL: &'static str = "Products";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "title", "price", "ageCategory"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Editable for Product {
  type Payload = ProductPayload;

  const UPLOAD_FIELD: Option<&'static str> = Some("thumbnail");

  fn form_fields() -> Vec<FormField> {
    vec![
      FormField::new("title", "Title", FieldKind::Text),
      FormField::new("description", "Description", FieldKind::Multiline),
      FormField::new("price", "Price", FieldKind::Number),
      FormField::new("age_category", "Age Category", FieldKind::Select(AGE_CATEGORIES)),
      FormField::new("product_type", "Product Type", FieldKind::Text),
      FormField::new("thumbnail", "Thumbnail", FieldKind::File).optional(),
    ]
  }

  fn form_values(&self) -> FormValues {
    values([
      ("title", self.title.clone()),
      ("description", self.description.clone()),
      ("price", self.price.to_string()),
      ("age_category", self.age_category.clone()),
      ("product_type", self.product_type.clone()),
      ("thumbnail", self.thumbnail.clone().unwrap_or_default()),
    ])
  }

  fn payload_from_form(values: &FormValues, errors: &mut FieldErrors) -> ProductPayload {
    ProductPayload {
      title: forms::text(values, "title"),
      description: forms::text(values, "description"),
      price: forms::number(values, "price", errors),
      age_category: forms::text(values, "age_category"),
      product_type: forms::text(values, "product_type"),
      thumbnail: remote_only(values, "thumbnail"),
    }
  }

  fn attach_upload(payload: &mut ProductPayload, url: String) {
    payload.thumbnail = Some(url);
  }
}

impl Resource for WorkshopEnquiry {
  const PATH: &'static str = "/workshop/enquiries";
  const TAG: Tag = "Enquiries";
  const LABEL: &'static str = "Enquiry";
  const PLURAL: &'static str = "Workshop Enquiries";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "name", "workshopName"];

  fn id(&self) -> &str {
    &self.id
  }
}

impl Resource for CallRequest {
  const PATH: &'static str = "/call-requests";
  const TAG: Tag = "CallRequests";
  const LABEL: &'static str = "Call Request";
  const PLURAL: &'static str = "Call Requests";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "name", "status"];
  const STATUS: Option<(&'static str, &'static [&'static str])> = Some(("status", CALL_STATUSES));

  fn id(&self) -> &str {
    &self.id
  }
}

impl Resource for AssessmentReport {
  const PATH: &'static str = "/assessment/reports";
  const TAG: Tag = "Assessments";
  const LABEL: &'static str = "Assessment";
  const PLURAL: &'static str = "Assessment Reports";
  const DEFAULT_SORT: &'static str = "createdAt";
  const DEFAULT_ORDER: SortOrder = SortOrder::Desc;
  const SORT_FIELDS: &'static [&'static str] = &["createdAt", "name", "score"];
  const DELETABLE: bool = false;

  fn id(&self) -> &str {
    &self.id
  }
}
