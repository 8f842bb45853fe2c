//! Fluent tree construction
//!
//! Leaves are added first, then internal nodes join previously created
//! nodes, which yields the required numbering for free. Validation happens
//! once, in [`PhyloTreeBuilder::build`].

use std::collections::HashMap;

use super::{GroupId, NodeIndex, NodeSpec, PhyloTree, TreeError};

/// Builder for [`PhyloTree`] (fluent API)
#[derive(Debug, Default)]
pub struct PhyloTreeBuilder {
    group_names: Vec<String>,
    group_lookup: HashMap<String, GroupId>,
    nodes: Vec<NodeSpec>,
}

impl PhyloTreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group name (idempotent) and return its id.
    pub fn group(&mut self, name: &str) -> GroupId {
        if let Some(&id) = self.group_lookup.get(name) {
            return id;
        }
        let id = GroupId::new(self.group_names.len());
        self.group_names.push(name.to_string());
        self.group_lookup.insert(name.to_string(), id);
        id
    }

    /// Add a leaf carrying `counts` sequences per named group.
    pub fn leaf(&mut self, branch_length: Option<f64>, counts: &[(&str, u32)]) -> NodeIndex {
        let group_counts = counts
            .iter()
            .map(|&(name, count)| (self.group(name), count))
            .collect();
        self.push(NodeSpec {
            parent: None,
            children: None,
            branch_length,
            group_counts,
        })
    }

    /// Add an internal node above `left` and `right`.
    pub fn join(&mut self, left: NodeIndex, right: NodeIndex, branch_length: Option<f64>) -> NodeIndex {
        let index = self.nodes.len();
        for child in [left, right] {
            if let Some(spec) = self.nodes.get_mut(child) {
                spec.parent = Some(index);
            }
        }
        self.push(NodeSpec {
            parent: None,
            children: Some((left, right)),
            branch_length,
            group_counts: Vec::new(),
        })
    }

    /// Validate and assemble the tree.
    pub fn build(self) -> Result<PhyloTree, TreeError> {
        PhyloTree::from_nodes(self.group_names, self.nodes)
    }

    fn push(&mut self, spec: NodeSpec) -> NodeIndex {
        self.nodes.push(spec);
        self.nodes.len() - 1
    }
}
