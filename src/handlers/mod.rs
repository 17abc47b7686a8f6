// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (bearer token) → Elevated (bearer token + admin flag)
//
// The tier decides which guards the router stacks in front of a handler;
// ownership of individual establishments and jammers is checked inside the
// protected handlers through the access gate, since it depends on the path.
pub mod elevated;
pub mod protected;
pub mod public;
