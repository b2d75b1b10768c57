pub mod commands;
pub mod diff;

pub use commands::{AliasRemoval, GitCli};
pub use diff::{capture, CaptureError};
