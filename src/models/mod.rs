mod api_credential;
mod complaint;
mod payment_intent;
mod rti_request;
mod user;

pub use api_credential::*;
pub use complaint::*;
pub use payment_intent::*;
pub use rti_request::*;
pub use user::*;
