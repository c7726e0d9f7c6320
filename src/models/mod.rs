mod devices;
mod push;

pub use devices::*;
pub use push::*;
