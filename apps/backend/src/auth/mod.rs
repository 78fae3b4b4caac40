pub mod tokens;

pub use tokens::{Authenticator, PlayerClaims, TokenAuth};
