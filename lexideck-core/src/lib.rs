pub mod audio;
pub mod cache;
pub mod classify;
pub mod controller;
pub mod errors;
pub mod filters;
pub mod models;
pub mod progress;
pub mod reply;
pub mod repo;
pub mod session;
pub mod source;

pub use audio::*;
pub use cache::*;
pub use classify::*;
pub use controller::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use progress::*;
pub use repo::*;
pub use session::*;
pub use source::*;
