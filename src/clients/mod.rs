pub mod email_verification;

pub use email_verification::{EmailVerdict, EmailVerifier, KickboxClient, spawn_verification};
