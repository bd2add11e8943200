mod filter;
pub use filter::{MASK, SENSITIVE_KEYS, SensitiveFilter};

mod payload;
pub use payload::Payload;

mod writer;
pub use writer::{RedactingMakeWriter, RedactingWriter};
