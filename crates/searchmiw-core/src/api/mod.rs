//! Authenticated access to the SearchMIW gateway (REST + GraphQL).

pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod graphql;
pub(crate) mod wire;

pub use auth::{AuthClient, AuthError};
pub use dispatcher::{Dispatcher, DispatcherConfig, USER_AGENT};
pub use error::{RequestError, RequestErrorKind, RequestResult};
