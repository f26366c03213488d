//! Column layouts for each resource table.

use crate::api::types::{
  Application, AssessmentReport, CallRequest, Employee, Job, Product, User, WorkshopEnquiry,
};
use crate::ui::renderfns::short_date;
use crate::ui::table::{Column, Tabular};

fn date(raw: &Option<String>) -> String {
  raw.as_deref().map(short_date).unwrap_or_default()
}

fn opt(raw: &Option<String>) -> String {
  raw.clone().unwrap_or_default()
}

impl Tabular for Job {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("jobTitle", "Title", |j| j.job_title.clone()),
      Column::text("location", "Location", |j| j.location.clone()),
      Column::text("jobType", "Type", |j| j.job_type.clone()),
      Column::text("skillsRequired", "Skills", |j| j.skills_required.join(", ")),
      Column::image("thumbnail", "Thumbnail", |j| opt(&j.thumbnail)),
      Column::text("createdAt", "Posted", |j| date(&j.created_at)),
    ]
  }
}

impl Tabular for Application {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |a| a.name.clone()),
      Column::text("jobTitle", "Position", |a| a.job_title.clone()),
      Column::text("email", "Email", |a| a.email.clone()),
      Column::text("phone", "Phone", |a| a.phone.clone()),
      Column::link("portfolioLink", "Portfolio", |a| opt(&a.portfolio_link)),
      Column::link("resume", "Resume", |a| opt(&a.resume)),
      Column::text("createdAt", "Applied", |a| date(&a.created_at)),
    ]
  }
}

impl Tabular for Employee {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |e| e.name.clone()),
      Column::text("role", "Role", |e| e.role.clone()),
      Column::text("department", "Department", |e| e.department.clone()),
      Column::text("email", "Email", |e| e.email.clone()),
      Column::text("phone", "Phone", |e| e.phone.clone()),
      Column::image("profileImage", "Photo", |e| opt(&e.profile_image)),
      Column::text("joiningDate", "Joined", |e| date(&e.joining_date)),
    ]
  }
}

impl Tabular for User {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |u| u.name.clone()),
      Column::text("email", "Email", |u| u.email.clone()),
      Column::text("role", "Role", |u| u.role.clone()),
      Column::text("phoneNumber", "Phone", |u| opt(&u.phone_number)),
      Column::image("picture", "Avatar", |u| opt(&u.picture)),
      Column::text("createdAt", "Joined", |u| date(&u.created_at)),
    ]
  }
}

impl Tabular for Product {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("title", "Title", |p| p.title.clone()),
      Column::text("price", "Price", |p| format!("{:.2}", p.price)),
      Column::text("ageCategory", "Age", |p| p.age_category.clone()),
      Column::text("productType", "Type", |p| p.product_type.clone()),
      Column::image("thumbnail", "Thumbnail", |p| opt(&p.thumbnail)),
      Column::text("createdAt", "Added", |p| date(&p.created_at)),
    ]
  }
}

impl Tabular for WorkshopEnquiry {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |w| w.name.clone()),
      Column::text("workshopName", "Workshop", |w| w.workshop_name.clone()),
      Column::text("email", "Email", |w| w.email.clone()),
      Column::text("phone", "Phone", |w| w.phone.clone()),
      Column::text("message", "Message", |w| opt(&w.message)),
      Column::text("createdAt", "Received", |w| date(&w.created_at)),
    ]
  }
}

impl Tabular for CallRequest {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |c| c.name.clone()),
      Column::text("status", "Status", |c| c.status.clone()),
      Column::text("phone", "Phone", |c| c.phone.clone()),
      Column::text("email", "Email", |c| opt(&c.email)),
      Column::text("assignedTo", "Assigned To", |c| opt(&c.assigned_to)),
      Column::text("createdAt", "Requested", |c| date(&c.created_at)),
    ]
  }
}

impl Tabular for AssessmentReport {
  fn columns() -> Vec<Column<Self>> {
    vec![
      Column::text("name", "Name", |a| a.name.clone()),
      Column::text("assessmentType", "Assessment", |a| a.assessment_type.clone()),
      Column::text("score", "Score", |a| {
        a.score.map(|s| format!("{}", s)).unwrap_or_default()
      }),
      Column::text("result", "Result", |a| opt(&a.result)),
      Column::text("email", "Email", |a| a.email.clone()),
      Column::link("sampleReport", "Report", |a| opt(&a.sample_report)),
      Column::text("createdAt", "Taken", |a| date(&a.created_at)),
    ]
  }
}
