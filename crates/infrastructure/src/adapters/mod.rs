//! Port adapters

mod engine_provider_adapter;

pub use engine_provider_adapter::EngineProviderAdapter;
