//! Domain model shared by the shutter services and their consumers.

pub mod photo;
pub mod profile;
pub mod token;

pub use photo::Photo;
pub use profile::Profile;
pub use token::Token;
