pub mod error;
pub mod project;
pub mod repository;
pub mod result;
pub mod storage;

pub use error::*;
pub use project::*;
pub use repository::*;
pub use result::*;
pub use storage::*;
