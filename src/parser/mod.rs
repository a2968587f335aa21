mod common;
mod java;
pub mod zul;

pub use common::Parser;
pub use java::JavaParser;
pub use zul::ZulParser;
