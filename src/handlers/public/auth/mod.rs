// handlers/public/auth/mod.rs - Public authentication handlers

pub mod login;    // POST /auth/login
pub mod password; // POST /auth/forgot-password, POST /auth/reset-password
pub mod signup;   // POST /auth/signup

pub use login::login;
pub use password::{forgot_password, reset_password};
pub use signup::signup;
