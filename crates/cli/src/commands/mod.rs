pub mod daemon;
pub mod hosts;
