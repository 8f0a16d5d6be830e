pub mod ids;
pub mod message;
pub mod request;

pub use ids::*;
pub use message::*;
pub use request::*;
