pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod forms;
pub mod keys;
pub mod mutation;
pub mod resource;
pub mod types;

pub use api_types::CollectionPage;
pub use cached_client::CachedApi;
pub use client::ApiClient;
pub use mutation::{MutationDispatcher, MutationError, MutationKind};
pub use resource::{Editable, Resource};
