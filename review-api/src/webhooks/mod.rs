pub mod events;
pub mod payload;
pub mod route;
pub mod signature;
