mod command;
mod controller;
mod event;

pub use command::*;
pub use controller::*;
pub use event::*;
