pub mod vm;

pub use vm::*;
