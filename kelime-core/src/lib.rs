pub mod clock;
pub mod errors;
pub mod filters;
pub mod models;
pub mod repo;
pub mod scheduler;
pub mod session;
pub mod stats;

pub use clock::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use repo::*;
pub use scheduler::*;
pub use session::*;
pub use stats::*;
