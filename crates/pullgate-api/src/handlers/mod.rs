//! HTTP handlers

pub mod health;
pub mod internal;
pub mod token;

pub use health::*;
pub use internal::*;
pub use token::*;
