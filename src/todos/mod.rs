//! Todo items: model, validation, HTTP routes and response mapping.

pub mod model;
pub mod response;
pub mod routes;
pub mod validation;

pub use model::{TodoDraft, TodoItem, TodoPayload};
pub use routes::{TodoState, todo_routes};
