//! Log Entry Decoding
//!
//! Entry bodies are JSON envelopes tagged with a kind and API version. Each
//! supported kind has a fixed mapping from its spec to [`ExtractedFields`].

pub mod envelope;
pub mod kinds;

pub use envelope::{EntryBody, EntryKind, Envelope, KindRegistry, LogEntry, ProposedEntry};
pub use kinds::{
    DataSpec, ExtractedFields, HashSpec, PackageSpec, PublicKeySpec, SignatureSpec,
    SignedArtifactSpec,
};
