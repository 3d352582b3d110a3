//! Graph ingestion and result output

pub mod input;
pub mod output;

pub use input::{EdgeList, EdgeListReader, VertexRecord};
pub use output::{OutputFormat, ResultWriter};
