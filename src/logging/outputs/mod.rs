//! Output handlers for logging destinations.

pub mod console;

pub use console::ConsoleOutput;
