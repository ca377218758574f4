//! Health and metrics HTTP surface for the Addipi printer service.
//!
//! Reports process liveness only; the health endpoint does not depend on
//! scheduler or store state.

mod error;
mod routes;

pub use error::WebError;
pub use routes::create_router;
