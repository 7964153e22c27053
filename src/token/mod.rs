// Internal modules
mod header;
mod numeric_date;
mod payload;
mod signature;
#[allow(clippy::module_inception)]
mod token;

// Public API exports
pub use header::{DEFAULT_TOKEN_TYPE, Header, RESERVED_HEADER_NAMES};
pub use numeric_date::NumericDate;
pub use payload::{Audience, Payload, RESERVED_CLAIM_NAMES};
pub use signature::Signature;
pub use token::{DEFAULT_EXPIRATION_RESERVE, Token};

pub(crate) use token::RawToken;
