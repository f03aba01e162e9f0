pub mod batch;
pub mod convert;
pub mod fetch;
pub mod forge;
pub mod publish;

pub use crate::domain::model::{CompileReport, FailurePolicy, RuleSetFile};
pub use crate::domain::ports::{RuleCompiler, RuleSource, Storage};
pub use crate::utils::error::Result;
