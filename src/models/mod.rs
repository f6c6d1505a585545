pub mod document;
pub mod mode;
pub mod request;
pub mod response;

pub use document::*;
pub use mode::*;
pub use request::*;
pub use response::*;
