pub mod establishment;
pub mod jammer;
pub mod user;

pub use establishment::{Establishment, EstablishmentWithJammers, EstablishmentWithOwner, NewEstablishment, OwnerSummary};
pub use jammer::{Jammer, JammerOwnership, NewJammer};
pub use user::{NewUser, User};
