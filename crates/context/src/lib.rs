//! Context-assembly pipeline for RelayDesk.
//!
//! Loads the knowledge and directives documents, selects FAQ entries,
//! compiles the policy block, optionally consults a retrieval service, and
//! assembles the ordered message list handed to the model.

pub mod assembler;
pub mod faq;
pub mod loader;
pub mod policy;
pub mod retrieval;

pub use assembler::{AssembledContext, AssemblerConfig, ContextAssembler, ContextLayer};
pub use faq::FaqLimits;
pub use loader::{DocumentLoader, DocumentSource, FsSource, HttpSource};
pub use retrieval::HttpRetriever;
