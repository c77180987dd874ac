//! Authorization for the HTTP layer.
//!
//! Handlers name the permission they need through the extractor type:
//!
//! ```ignore
//! async fn delete_project(auth: Authorized<DeleteProject>, ...) -> AppResult<...>
//! ```
//!
//! Extraction resolves the caller from the session cookie (401 when there is
//! none) and then asks the [`RoleRegistry`](crate::roles::RoleRegistry)
//! whether any of the caller's tags grants the permission (403 otherwise).
//! Both checks run before the body is read.

mod guard;
mod principal;

pub use guard::{
    authorize, Authenticated, Authorized, CreateProject, DeleteProject, EditProject, Guard, ReadProject,
};
pub use principal::Principal;
