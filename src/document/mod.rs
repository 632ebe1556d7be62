mod error;
mod load;
mod loader;
mod parse;

pub use error::LoadError;
pub use load::{DocumentSource, ScanRequest, load_document};
pub use loader::DocumentLoader;
pub use parse::{CallReference, Declaration, ModuleEntry, SourceDocument, parse_document};
