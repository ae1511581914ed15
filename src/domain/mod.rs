pub mod repository;
pub mod types;

pub use repository::{QuestionRepository, RepoError};
pub use types::*;
