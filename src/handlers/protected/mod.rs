// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind `require_authenticated`, so handlers receive
// the caller as `Extension<Principal>`. Routes that address a user,
// establishment or jammer then ask the access gate whether that principal
// may touch it before reading or writing anything.

pub mod establishment; // GET /estabelecimento/:id/jammers
pub mod jammer;        // PATCH /jammer/:id
pub mod session;       // GET /auth/verify
pub mod user;          // GET /user/:user_id/estabelecimentos[-completo]
