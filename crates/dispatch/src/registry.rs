use crate::error::{DispatchError, Result};

pub const DEFAULT_NODES: &[&str] = &["Node_85d904", "Node_f4a98f", "Node_513b66"];

/// Known node identifiers, selected on the command line by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRegistry {
    nodes: Vec<String>,
}

impl NodeRegistry {
    pub fn new(nodes: Vec<String>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(DispatchError::InvalidTable("node list is empty".to_string()));
        }
        for (i, node) in nodes.iter().enumerate() {
            if node.is_empty() || node.contains(&['/', '+', '#'][..]) {
                return Err(DispatchError::InvalidTable(format!("invalid node id '{}'", node)));
            }
            if nodes[..i].contains(node) {
                return Err(DispatchError::InvalidTable(format!("duplicate node id '{}'", node)));
            }
        }
        Ok(Self { nodes })
    }

    /// Resolves a decimal index in `[0, len)` to its node identifier.
    pub fn select(&self, selector: &str) -> Result<&str> {
        selector
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| self.nodes.get(idx))
            .map(String::as_str)
            .ok_or_else(|| DispatchError::InvalidNodeSelector {
                selector: selector.to_string(),
                count: self.nodes.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// `Node_x: idx=0` lines for usage output.
    pub fn listing(&self) -> Vec<String> {
        self.iter().enumerate().map(|(i, n)| format!("{}: idx={}", n, i)).collect()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self { nodes: DEFAULT_NODES.iter().map(|n| n.to_string()).collect() }
    }
}
