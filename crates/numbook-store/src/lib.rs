pub mod convert;
pub mod error;
pub mod paths;
pub mod plan;
pub mod sessions;
pub mod sources;
pub mod vcf;

pub use convert::{run_conversion, ConversionJob, ConversionReport};
pub use error::{Result, StoreError, StoreErrorKind};
pub use paths::SessionLayout;
pub use plan::{plan_batches, plan_outputs, OutputPlan, PlannedBatch};
pub use sessions::{Session, SessionStore};
