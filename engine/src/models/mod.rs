pub mod candidates;
pub mod request;

pub use candidates::*;
pub use request::*;
