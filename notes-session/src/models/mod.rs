pub mod request;
pub mod session;

pub use request::ApiRequest;
pub use session::{BearerToken, Identity, SessionEvent, SessionPhase, SessionState};
