pub mod error;
pub mod identifier;
pub mod password;
pub mod token;

pub use error::CryptoError;
pub use identifier::{IdentifierGenerator, RandomIdGenerator};
pub use password::{hash_password, verify_password};
pub use token::{generate_session_token, token_digest, SessionToken};
