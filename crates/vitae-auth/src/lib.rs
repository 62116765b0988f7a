//! Account security: bcrypt password hashing, signed email confirmation
//! tokens, and server-side login sessions with sliding expiry.

pub mod password;
pub mod session;
pub mod token;

pub use password::{hash_password, verify_password};
pub use session::{Session, SessionManager};
pub use token::TokenSigner;
