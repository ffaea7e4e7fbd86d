pub mod dns;
pub mod store;
pub mod system;
