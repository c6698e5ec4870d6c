#![deny(rust_2018_idioms)]

pub mod codec;
pub mod domain;
mod error;
pub mod form;
pub mod lookup;
pub mod remote;
pub mod schema;
pub mod session;
pub mod store;

pub use error::EditorError;

pub mod prelude {
    pub use super::EditorError;
    pub use super::domain::{
        Document, DocumentInfo, DocumentPatch, InputPort, LinkTarget, OutputPort,
    };
    pub use super::remote::{LookupService, PersistenceApi, SchemaSource};
    pub use super::session::{
        CloseOutcome, EditorMode, EditorOptions, EditorServices, EditorSession, EditorState,
    };
}
