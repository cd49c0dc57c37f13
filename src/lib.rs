pub mod config;
pub mod events;
pub mod locale;
pub mod pipeline;
pub mod providers;
pub mod remote;
pub mod source;
pub mod timing;

pub const USER_AGENT: &str = concat!("prospector/", env!("CARGO_PKG_VERSION"));

pub use config::PipelineConfig;
pub use pipeline::{RunContext, SearchBackend, SearchOutput, SearchPipeline};
pub use source::{QueryMap, Source, SourceMetadata};
