pub mod process;
pub mod supervisor;

pub use process::{is_group_alive, signal_group, Signal};
pub use supervisor::{DaemonSupervisor, StopPolicy};
