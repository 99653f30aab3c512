mod batch;
mod commands;
mod dispatcher;
mod error;
mod registry;

pub mod listener;
pub mod script;

pub use batch::{ConfigBatch, ConfigKey, DEFAULT_CONFIG_KEYS};
pub use commands::{CommandAction, CommandEntry, CommandTable, PayloadSpec, PublishStep};
pub use dispatcher::{Dispatcher, Invocation, NodeSelector, Plan, Publisher, Timing};
pub use error::{DispatchError, Result};
pub use registry::{NodeRegistry, DEFAULT_NODES};
