pub mod dispatch;
pub mod flow;
pub mod folders;
pub mod logging;
pub mod rule;
pub mod target;
pub mod types;
pub mod validate;

pub use dispatch::DispatchConfig;
pub use flow::FlowConfig;
pub use folders::FoldersConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use rule::{Action, RuleConfig, Trigger};
pub use target::TargetConfig;
pub use types::HumanDuration;
