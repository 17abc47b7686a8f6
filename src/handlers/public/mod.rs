// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation, token acquisition and password recovery. Nothing here
// has a trusted caller, so every input is validated before it reaches the
// identity provider.
pub mod auth;
