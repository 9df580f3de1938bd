//! API handlers organized by resource type.

mod cache;
mod inbox;
mod posts;
mod reviews;
mod users;

pub use cache::*;
pub use inbox::*;
pub use posts::*;
pub use reviews::*;
pub use users::*;
