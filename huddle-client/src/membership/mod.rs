mod room_client;

pub use room_client::*;
