// Adapters layer: concrete implementations for external systems (storage, http, processes).

pub mod http;
pub mod process;
pub mod storage;

pub use http::HttpRuleSource;
pub use process::CommandCompiler;
pub use storage::LocalStorage;
