//! Auth domain - OTP sign-in and JWT session tokens
//!
//! Responsibilities:
//! - One-time-code authentication for emails and phone numbers
//! - Account creation on first verification
//! - JWT token management
//! - Identifier hashing for privacy

pub mod actions;
pub mod jwt;
pub mod models;

pub use jwt::{Claims, JwtService};
