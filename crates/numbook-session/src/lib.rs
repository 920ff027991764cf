pub mod engine;
pub mod error;
pub mod reply;

pub use engine::Engine;
pub use error::{Result, SessionError, SessionErrorKind};
pub use reply::{Completion, OutputFile, Reply, Summary};
