//! Task graphs as plain data.
//!
//! A graph is an arena of nodes. Each task declares the nodes whose outputs it
//! reads, and those declarations are the only edges. Because a task can only
//! reference nodes that already exist, every graph is acyclic by construction.

use crate::core::error::SplitError;

/// Index of a node in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Something that can be placed in a [`TaskGraph`]
pub trait TaskNode {
    /// Nodes whose outputs this task reads
    fn dependencies(&self) -> Vec<NodeId>;

    /// Short human-readable description used in logs and errors
    fn describe(&self) -> String;
}

#[derive(Debug)]
pub struct Node<T> {
    pub task: T,
    pub dependencies: Vec<NodeId>,
    /// Scratch space the task is expected to need, in bytes (advisory)
    pub disk_hint: Option<u64>,
}

#[derive(Debug)]
pub struct TaskGraph<T> {
    nodes: Vec<Node<T>>,
}

impl<T: TaskNode> TaskGraph<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a task after the nodes it depends on
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the task references a node that is
    /// not (yet) in this graph.
    pub fn add(&mut self, task: T, disk_hint: Option<u64>) -> Result<NodeId, SplitError> {
        let id = NodeId(self.nodes.len());
        let mut dependencies = task.dependencies();
        if let Some(bad) = dependencies.iter().find(|d| d.0 >= id.0) {
            return Err(SplitError::consistency(format!(
                "task '{}' depends on {bad}, which is not in the graph",
                task.describe()
            )));
        }
        dependencies.sort_unstable();
        dependencies.dedup();
        self.nodes.push(Node {
            task,
            dependencies,
            disk_hint,
        });
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    /// For every node, the nodes that read its output
    #[must_use]
    pub fn dependents(&self) -> Vec<Vec<NodeId>> {
        let mut dependents = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.dependencies {
                dependents[dep.0].push(NodeId(i));
            }
        }
        dependents
    }

    /// Group nodes into stages: every node lands one stage after its latest dependency.
    /// Nodes in the same stage are independent of each other.
    #[must_use]
    pub fn stages(&self) -> Vec<Vec<NodeId>> {
        let mut level = vec![0usize; self.nodes.len()];
        let mut stages: Vec<Vec<NodeId>> = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            // Dependencies always precede their dependents in the arena
            let l = node
                .dependencies
                .iter()
                .map(|d| level[d.0] + 1)
                .max()
                .unwrap_or(0);
            level[i] = l;
            if stages.len() <= l {
                stages.resize_with(l + 1, Vec::new);
            }
            stages[l].push(NodeId(i));
        }
        stages
    }

    /// Consume the graph, yielding its nodes in id order
    pub fn into_nodes(self) -> impl Iterator<Item = (NodeId, Node<T>)> {
        self.nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }
}

impl<T: TaskNode> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
