pub mod ids;
pub mod names;
pub mod phone;
pub mod session;

pub use ids::{RecordId, SessionId, UserId};
pub use names::{ContactName, OutputBase};
pub use phone::{CanonicalNumber, PhoneRules};
pub use session::{
    is_source_file_name, is_text_upload, transition, ConversionRequest, Effect, Input,
    SessionData, SessionState, Transition,
};
