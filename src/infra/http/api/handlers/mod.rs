//! API handlers organized by resource type.
//!
//! Each submodule contains handlers for one resource. Handlers translate
//! HTTP inputs into service calls and wrap results in the shared envelope.

mod posts;
mod saved_posts;
mod users;

pub use posts::*;
pub use saved_posts::*;
pub use users::*;
