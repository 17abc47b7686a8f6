pub mod establishment;
pub mod jammer;
pub mod users;

pub use establishment::{create_establishment, delete_establishment, list_establishments};
pub use jammer::{create_jammer, delete_jammer, list_jammers};
pub use users::list_users;
