//! Providers and the streams they produce.
//!
//! Sourcerers and embeds are trait objects registered in a
//! [`Registry`](crate::registry::Registry); the
//! [`Runner`](crate::runner::Runner) drives them.

pub mod context;
pub mod provider;
pub mod providers;

pub use context::{ProgressFn, ScrapeContext};
pub use provider::{
    CapabilityFlag, Embed, EmbedReference, Sourcerer, SourcererOutput, Stream, StreamKind,
    StreamSource,
};
