//! Generic CRUD service layer on top of SeaORM.
//! - One `Service<M>` per entity, owning the `Session` it works in.
//! - Writes commit immediately unless batched with `add_to_session`.
//! - Failed writes are rolled back and surface as `ServiceError::CommitFailed`.

pub mod errors;
pub mod primary_key;
pub mod session;
pub mod selection;
pub mod pagination;
pub mod utils;
pub mod crud;
pub mod player_service;
pub mod team_service;
#[cfg(test)]
pub mod test_support;

pub use crud::{Batch, Operation, Service, ServiceModel};
pub use errors::ServiceError;
pub use pagination::Pagination;
pub use primary_key::{format_primary_key, KeyFormatError};
pub use selection::{Rows, Selection};
pub use session::Session;
pub use utils::safe_commit;
