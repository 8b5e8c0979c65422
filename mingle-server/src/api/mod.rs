pub mod auth;
pub mod comments;
pub mod error;
pub mod friends;
pub mod profile;
pub mod stream;
pub mod uploads;

pub use error::{ApiError, ApiResult};
