pub mod appointment;
pub mod payment;
pub mod user;

pub use appointment::*;
pub use payment::*;
pub use user::*;
