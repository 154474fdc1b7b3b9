//! Session domain - authenticated logins and their inbound credentials

mod clock;
mod credential;
mod entity;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{extract_bearer_token, InboundRequest};
pub use entity::{redact_token, Session, SessionToken};
