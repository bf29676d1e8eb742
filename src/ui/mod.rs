//! Terminal front end for running the bridge without a control-panel host

mod console;

pub use console::{run_console, ConfigLoader, ConsoleHost};
