pub mod extract;
pub mod helper;
pub mod init;
pub mod sync;
pub mod validate;

mod command_result;

pub use command_result::*;
