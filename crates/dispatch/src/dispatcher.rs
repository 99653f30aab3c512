use std::future::Future;
use std::path::Path;
use std::time::Duration;

use link::{topics, NodeLink};
use tracing::info;

use crate::batch::ConfigBatch;
use crate::commands::{CommandAction, CommandTable, PublishStep};
use crate::error::{DispatchError, Result};
use crate::registry::NodeRegistry;
use crate::script;

/// Sink for outgoing node commands.
pub trait Publisher {
    fn publish(&self, topic: &str, payload: &str) -> impl Future<Output = anyhow::Result<()>>;
}

impl Publisher for NodeLink {
    async fn publish(&self, topic: &str, payload: &str) -> anyhow::Result<()> {
        NodeLink::publish(self, topic, payload).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after a single command so the client can flush it
    pub settle_delay: Duration,
    /// Wait after every publish of a `cfg` or `file` replay
    pub publish_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self { settle_delay: Duration::from_secs(1), publish_interval: Duration::from_secs(1) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// Index into the node registry, as typed by the user
    Index(String),
    /// Node identifier given directly
    Fixed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub node: NodeSelector,
    pub keyword: String,
    pub argument: Option<String>,
}

/// Fully validated work for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Publish { node_id: String, steps: Vec<PublishStep>, delay: Duration },
    Listen { node_id: String },
}

impl Plan {
    pub fn node_id(&self) -> &str {
        match self {
            Plan::Publish { node_id, .. } | Plan::Listen { node_id } => node_id,
        }
    }
}

pub struct Dispatcher {
    registry: NodeRegistry,
    commands: CommandTable,
    batch: ConfigBatch,
    timing: Timing,
}

impl Dispatcher {
    pub fn new(
        registry: NodeRegistry,
        commands: CommandTable,
        batch: ConfigBatch,
        timing: Timing,
    ) -> Self {
        Self { registry, commands, batch, timing }
    }

    /// Splits positional arguments into `<node> <command> [argument]`, or
    /// `<command> [argument]` when the node is fixed.
    pub fn parse_args(&self, positional: &[String], fixed_node: Option<&str>) -> Result<Invocation> {
        let mut args = positional.iter().map(|a| a.trim().to_string());
        let node = match fixed_node {
            Some(id) => NodeSelector::Fixed(id.trim().to_string()),
            None => NodeSelector::Index(args.next().ok_or(DispatchError::Usage)?),
        };
        let keyword = args.next().ok_or(DispatchError::Usage)?;
        let argument = args.next();
        if args.next().is_some() {
            return Err(DispatchError::Usage);
        }
        Ok(Invocation { node, keyword, argument })
    }

    /// Resolves node, command and payload. Nothing is published here, so any
    /// error leaves the nodes untouched.
    pub fn prepare(&self, invocation: &Invocation) -> Result<Plan> {
        let node_id = match &invocation.node {
            NodeSelector::Index(selector) => self.registry.select(selector)?.to_string(),
            NodeSelector::Fixed(id) => {
                if id.is_empty() || id.contains(&['/', '+', '#'][..]) {
                    return Err(DispatchError::InvalidNodeSelector {
                        selector: id.clone(),
                        count: self.registry.len(),
                    });
                }
                id.clone()
            }
        };

        let entry = self.commands.resolve(&invocation.keyword)?;
        let argument = invocation.argument.as_deref();

        let plan = match &entry.action {
            CommandAction::Publish { topic, payload } => {
                let payload = payload.resolve(&entry.keyword, argument)?;
                Plan::Publish {
                    node_id,
                    steps: vec![PublishStep::new(topic.as_str(), payload)],
                    delay: self.timing.settle_delay,
                }
            }
            CommandAction::ConfigBatch => Plan::Publish {
                node_id,
                steps: self.batch.steps(),
                delay: self.timing.publish_interval,
            },
            CommandAction::Script => {
                let path = argument.filter(|p| !p.is_empty()).ok_or(DispatchError::MissingFilename)?;
                Plan::Publish {
                    node_id,
                    steps: script::load_script(Path::new(path))?,
                    delay: self.timing.publish_interval,
                }
            }
            CommandAction::Listen => Plan::Listen { node_id },
        };
        Ok(plan)
    }

    /// Publishes every step in order, waiting `delay` after each one. The
    /// first failure aborts the rest of the sequence.
    pub async fn execute<P: Publisher>(
        &self,
        publisher: &P,
        node_id: &str,
        steps: &[PublishStep],
        delay: Duration,
    ) -> Result<usize> {
        for (i, step) in steps.iter().enumerate() {
            let topic = topics::build_topic(node_id, &step.suffix);
            publisher.publish(&topic, &step.payload).await.map_err(DispatchError::transport)?;
            info!("[{}/{}] {} <- {:?}", i + 1, steps.len(), topic, step.payload);
            tokio::time::sleep(delay).await;
        }
        Ok(steps.len())
    }

    /// Usage line listing the known nodes and commands. With a fixed node the
    /// node selector is left out, matching [`Dispatcher::parse_args`].
    pub fn usage(&self, program: &str, fixed_node: bool) -> String {
        let commands = self.commands.keywords().collect::<Vec<_>>().join(", ");
        if fixed_node {
            format!("usage {} --node-id <ID> <cmd [{}]> [argument]", program, commands)
        } else {
            format!(
                "usage {} <nodeid [{}]> <cmd [{}]> [argument]",
                program,
                self.registry.listing().join(", "),
                commands
            )
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(
            NodeRegistry::default(),
            CommandTable::default(),
            ConfigBatch::default(),
            Timing::default(),
        )
    }
}
