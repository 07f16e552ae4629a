// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural tree primitive: parent links, ordered children, and slot storage.
//!
//! The arena owns every node. A parent lists its children in alternative order;
//! children refer back to the parent by [`NodeId`] only, so the tree is acyclic
//! by construction and needs no reference counting.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::types::NodeId;

/// A member of a rooted, ordered, variable-arity tree.
#[derive(Clone, Debug)]
pub struct Node<T> {
    generation: u32,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 2]>,
    alternative: u32,
    depth: u32,
    data: T,
}

impl<T> Node<T> {
    fn new(generation: u32, parent: Option<NodeId>, alternative: u32, depth: u32, data: T) -> Self {
        Self {
            generation,
            parent,
            children: SmallVec::new(),
            alternative,
            depth,
            data,
        }
    }

    /// Parent of this node, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in alternative order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Number of materialized children.
    pub fn number_of_children(&self) -> u32 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "child counts come from u32 alternative counts."
        )]
        let n = self.children.len() as u32;
        n
    }

    /// Index of this node among its parent's children (0 for the root).
    pub fn alternative(&self) -> u32 {
        self.alternative
    }

    /// Distance from the root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `true` for the root node.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Payload stored in this node.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable payload stored in this node.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Slot storage for a single tree.
#[derive(Clone, Debug)]
pub struct NodeArena<T> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    fn allocate(&mut self, parent: Option<NodeId>, alternative: u32, depth: u32, data: T) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, parent, alternative, depth, data));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, parent, alternative, depth, data)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId indices are 32-bit."
        )]
        NodeId::new(idx as u32, generation)
    }

    /// Insert a parentless node.
    pub fn insert_root(&mut self, data: T) -> NodeId {
        self.allocate(None, 0, 0, data)
    }

    /// Append a child to `parent`; its alternative is the parent's previous child count.
    ///
    /// Panics if `parent` is stale.
    pub fn insert_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let (alternative, depth) = {
            let p = self.node(parent);
            (p.number_of_children(), p.depth + 1)
        };
        let id = self.allocate(Some(parent), alternative, depth, data);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Remove every node. Outstanding identifiers become stale.
    pub fn clear(&mut self) {
        for (idx, slot) in self.nodes.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Returns `true` if no node is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, slot)| {
            let node = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId indices are 32-bit."
            )]
            Some((NodeId::new(idx as u32, node.generation), node))
        })
    }

    /// Access a live node.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .filter(|n| n.generation == id.1)
    }

    /// Access a live node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|slot| slot.as_mut())
            .filter(|n| n.generation == id.1)
    }

    /// Access a node; panics if `id` is stale.
    pub fn node(&self, id: NodeId) -> &Node<T> {
        self.get(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.get_mut(id).expect("dangling NodeId")
    }

    /// Payload of a node; panics if `id` is stale.
    pub fn data(&self, id: NodeId) -> &T {
        &self.node(id).data
    }

    /// Mutable payload of a node; panics if `id` is stale.
    pub fn data_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.node_mut(id).data
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children())
    }

    /// The `alternative`-th child of a live node.
    pub fn child_of(&self, id: NodeId, alternative: u32) -> Option<NodeId> {
        self.children_of(id).get(alternative as usize).copied()
    }

    /// Nodes from the root down to `id` (inclusive), or empty for stale ids.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        if !self.is_alive(id) {
            return path;
        }
        let mut current = Some(id);
        while let Some(n) = current {
            path.push(n);
            current = self.parent_of(n);
        }
        path.reverse();
        path
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    /// This is a standard tree traversal that does not wrap around.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        let node = self.get(current)?;
        if let Some(&first_child) = node.children.first() {
            return Some(first_child);
        }

        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next_sibling) = self.next_sibling(node) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    /// Get the previous node in reverse depth-first traversal order.
    ///
    /// Returns `None` if no previous node exists or if the current node is stale.
    pub fn prev_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        if let Some(prev_sibling) = self.prev_sibling(current) {
            return Some(self.last_in_subtree(prev_sibling));
        }
        self.parent_of(current)
    }

    /// The next sibling to the right, if any.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let alternative = self.node(node).alternative;
        self.child_of(parent, alternative + 1)
    }

    /// The next sibling to the left, if any.
    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let alternative = self.node(node).alternative.checked_sub(1)?;
        self.child_of(parent, alternative)
    }

    fn last_in_subtree(&self, mut node: NodeId) -> NodeId {
        while let Some(&last_child) = self.node(node).children.last() {
            node = last_child;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> (NodeArena<&'static str>, [NodeId; 5]) {
        //      root
        //     /    \
        //    a      b
        //   / \
        //  c   d
        let mut arena = NodeArena::new();
        let root = arena.insert_root("root");
        let a = arena.insert_child(root, "a");
        let b = arena.insert_child(root, "b");
        let c = arena.insert_child(a, "c");
        let d = arena.insert_child(a, "d");
        (arena, [root, a, b, c, d])
    }

    #[test]
    fn alternatives_follow_insertion_order() {
        let (arena, [root, a, b, c, d]) = sample();
        assert_eq!(arena.node(a).alternative(), 0);
        assert_eq!(arena.node(b).alternative(), 1);
        assert_eq!(arena.node(d).alternative(), 1);
        assert_eq!(arena.node(c).depth(), 2);
        assert_eq!(arena.child_of(root, 1), Some(b));
        assert_eq!(arena.child_of(root, 2), None);
        assert_eq!(arena.parent_of(c), Some(a));
        assert!(arena.node(root).is_root());
    }

    #[test]
    fn depth_first_traversal() {
        let (arena, [root, a, b, c, d]) = sample();
        let mut order = vec![root];
        let mut current = root;
        while let Some(next) = arena.next_depth_first(current) {
            order.push(next);
            current = next;
        }
        assert_eq!(order, vec![root, a, c, d, b]);

        let mut reverse = vec![b];
        let mut current = b;
        while let Some(prev) = arena.prev_depth_first(current) {
            reverse.push(prev);
            current = prev;
        }
        assert_eq!(reverse, vec![b, d, c, a, root]);
    }

    #[test]
    fn path_from_root_is_inclusive() {
        let (arena, [root, a, _, _, d]) = sample();
        assert_eq!(arena.path_from_root(d), vec![root, a, d]);
        assert_eq!(arena.path_from_root(root), vec![root]);
    }

    #[test]
    fn clear_makes_ids_stale_and_reuses_slots() {
        let (mut arena, [root, a, ..]) = sample();
        assert_eq!(arena.len(), 5);
        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.is_alive(root));
        assert!(!arena.is_alive(a));
        assert!(arena.children_of(root).is_empty());

        let fresh = arena.insert_root("fresh");
        assert!(arena.is_alive(fresh));
        assert_ne!(fresh, root, "reused slot must bump the generation");
        assert_eq!(arena.len(), 1);
        let live: Vec<NodeId> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(live, vec![fresh]);
    }
}
