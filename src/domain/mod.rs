mod document;
mod patch;

pub use document::{
    Document, DocumentInfo, InputPort, LinkTarget, OutputPort, SPEC_VERSION,
};
pub use patch::DocumentPatch;
