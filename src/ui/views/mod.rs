mod json_table;
mod resource_detail;
mod resource_form;
mod resource_list;

pub use json_table::JsonTableView;
pub use resource_detail::ResourceDetailView;
pub use resource_form::ResourceFormView;
pub use resource_list::{OpenForm, ResourceListView};
