//! Key/value payload types shared by reads, writes and watch notifications.

mod codec;
mod value;

pub use codec::*;
pub use value::*;
