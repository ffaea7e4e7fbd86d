pub mod json_host_store;

pub use json_host_store::{reverse_name, JsonHostStore};
