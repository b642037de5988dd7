//! Bearer token validation adapters.
//!
//! - `JwtSessionValidator` - HS256 tokens from the storefront session service
//! - `MockSessionValidator` - fixed token table for tests

mod jwt;
mod mock;

pub use jwt::JwtSessionValidator;
pub use mock::MockSessionValidator;
