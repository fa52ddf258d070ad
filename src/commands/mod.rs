pub mod call;
pub mod common;

pub use call::{run_call, CallArgs};
