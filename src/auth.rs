//! Service account identity, validated identifiers, and bearer tokens.

pub mod credential;
pub mod id;
pub mod token;

pub use credential::*;
pub use id::*;
pub use token::*;
