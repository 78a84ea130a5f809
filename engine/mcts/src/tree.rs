//! Arena-backed search tree.
//!
//! Nodes are stored in a contiguous vector and referenced by index.
//! Advancing the root extracts the chosen subtree into a fresh arena,
//! reclaiming every sibling subtree at once.

use std::collections::VecDeque;

use crate::node::{Node, NodeId};

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn new(root: Node) -> Tree {
        Tree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Make `new_root` the root, discarding everything not reachable from
    /// it. Node ids are reassigned.
    pub fn reroot(&mut self, new_root: NodeId) {
        let mut old: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();

        // BFS from the new root, assigning ids in discovery order.
        let mut queue = VecDeque::from([new_root]);
        let mut next_id = 1u32; // the new root becomes 0
        let mut nodes = Vec::new();

        while let Some(old_id) = queue.pop_front() {
            let mut node = old[old_id.0 as usize]
                .take()
                .expect("subtree nodes are visited exactly once");
            for edge in &mut node.edges {
                if let Some(child) = edge.child {
                    queue.push_back(child);
                    edge.child = Some(NodeId(next_id));
                    next_id += 1;
                }
            }
            nodes.push(node);
        }

        self.nodes = nodes;
        self.root = NodeId(0);
    }
}
