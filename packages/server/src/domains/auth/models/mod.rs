pub mod identifier;
pub mod otp;

pub use identifier::{hash_identifier, is_admin_identifier, Identifier};
pub use otp::OtpCode;
