//! Request and response shapes shared by the API and the tasks

mod auth;
mod ml;
mod users;

pub use auth::*;
pub use ml::*;
pub use users::*;
