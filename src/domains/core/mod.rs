pub mod backend;
pub mod busy;
pub mod json;

pub use backend::{ApiFormsBackend, FormsBackend};
pub use busy::{BusyFlag, BusyGuard};
