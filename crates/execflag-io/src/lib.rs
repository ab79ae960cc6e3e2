//! CSV ingestion and export for execflag frames.

mod error;
mod reader;
mod writer;

pub use error::IoError;
pub use reader::FrameReader;
pub use writer::FrameWriter;
