mod logger;
pub use logger::*;

pub mod redact;
pub use redact::{MASK, Payload, SensitiveFilter};

mod facade;
pub use facade::Log;
