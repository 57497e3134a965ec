/// Pulumi YAML program rendering and CLI client
pub mod client;
pub mod program;

pub use client::PulumiClient;
pub use program::Program;
