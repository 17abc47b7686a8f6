// handlers/elevated/mod.rs - Elevated handlers (admin flag required)
//
// Routes under /admin/* run behind `require_authenticated` and then
// `require_admin`. Ownership plays no part here: an admin may read and
// write every user's establishments and jammers.

pub mod admin;
