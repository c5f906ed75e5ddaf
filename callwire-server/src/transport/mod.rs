mod connection;
mod reader;
mod writer;

pub use connection::*;
pub use reader::*;
pub use writer::*;
