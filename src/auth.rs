//! GitHub App identity, repository names, signed assertions, and access tokens.

pub mod assertion;
pub mod id;
pub mod token;

pub use assertion::*;
pub use id::*;
pub use token::*;
