//! Clank Engine HTTP surface: routes, error taxonomy and request logging.

pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorKind};
pub use routes::build_router;
pub use state::AppState;
