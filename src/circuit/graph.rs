//! Circuit arena: owns every node and component.

use crate::components::Component;
use crate::error::{Result, VoltaicError};

use super::types::{ComponentId, Node, NodeId};

/// A circuit under construction or simulation.
///
/// Nodes live in an arena indexed by their id, so `NodeId(n)` is always
/// `nodes[n]`. The first node created is ground. Components hold node ids,
/// never references.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    /// Node arena, indexed by id
    nodes: Vec<Node>,

    /// Nodes in the order components first referenced them
    registered: Vec<NodeId>,

    /// All components in registration order
    components: Vec<Component>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the next free id. The first call yields ground.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id));
        id
    }

    /// Create `count` nodes at once.
    pub fn create_nodes(&mut self, count: usize) -> Vec<NodeId> {
        (0..count).map(|_| self.create_node()).collect()
    }

    /// The ground node, creating it if this circuit has no nodes yet.
    pub fn ground(&mut self) -> NodeId {
        if self.nodes.is_empty() {
            self.create_node()
        } else {
            NodeId::GROUND
        }
    }

    /// Connect `component` between `n1` and `n2` and take ownership of it.
    ///
    /// Both nodes are registered on first use; registering a known node again
    /// is a no-op.
    pub fn add_component(
        &mut self,
        component: impl Into<Component>,
        n1: NodeId,
        n2: NodeId,
    ) -> Result<ComponentId> {
        for node in [n1, n2] {
            if node.0 >= self.nodes.len() {
                return Err(VoltaicError::NodeNotFound {
                    node: node.to_string(),
                });
            }
        }

        let mut component = component.into();
        component.connect(n1, n2);
        let id = ComponentId(self.components.len());
        self.components.push(component);

        for node in [n1, n2] {
            if !self.registered.contains(&node) {
                self.registered.push(node);
            }
        }
        Ok(id)
    }

    /// Registered nodes, in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.registered.iter().map(|id| &self.nodes[id.0])
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Solved voltage at a node; ground and unknown nodes read 0.
    pub fn node_voltage(&self, id: NodeId) -> f64 {
        self.node(id).map_or(0.0, |n| n.voltage)
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Current through a component, 0 for unknown ids.
    pub fn component_current(&self, id: ComponentId) -> f64 {
        self.component(id).map_or(0.0, |c| c.current(&self.nodes))
    }

    /// Number of nodes spanned by the system, ground included:
    /// one more than the largest registered id.
    pub fn num_nodes(&self) -> usize {
        self.registered.iter().map(|id| id.0 + 1).max().unwrap_or(0)
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.registered.contains(&id)
    }

    /// Split borrow used by the solver's write-back phase.
    pub(crate) fn parts_mut(&mut self) -> (&mut [Node], &mut [Component]) {
        (&mut self.nodes, &mut self.components)
    }
}
