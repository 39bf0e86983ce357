pub mod command;
pub mod render;
pub mod repl;

pub use self::repl::run_repl;
