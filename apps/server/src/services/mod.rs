//! Business logic between the routes and the repository.

pub mod grading;
pub mod selection;
pub mod sessions;
