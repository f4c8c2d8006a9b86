pub mod comment;
pub mod gallery;
pub mod news;
pub mod program;
pub mod user;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
