//! 命令定义和实现

pub mod convert;
pub mod replay;

pub use convert::ConvertCommand;
pub use replay::ReplayCommand;
