use crate::node::{NodeKind, SchemaNode};
use crate::path::NodePath;

/// Visitor pattern for traversing schema nodes immutably
///
/// The default implementations walk the entire tree depth-first, parents
/// before children. Override `visit_container` or `visit_content` to act on
/// one kind of node; call the matching `walk_*` function to keep descending.
pub trait Visitor: Sized {
    fn visit_node(&mut self, path: &NodePath, node: &SchemaNode) {
        walk_node(self, path, node);
    }

    fn visit_container(&mut self, path: &NodePath, node: &SchemaNode) {
        walk_children(self, path, node);
    }

    fn visit_content(&mut self, _path: &NodePath, _node: &SchemaNode) {
        // Leaf node, no children to walk
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, path: &NodePath, node: &SchemaNode) {
    match &node.kind {
        NodeKind::Container { .. } => visitor.visit_container(path, node),
        NodeKind::Content(_) => visitor.visit_content(path, node),
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, path: &NodePath, node: &SchemaNode) {
    for child in node.children() {
        visitor.visit_node(&path.join(child.key.clone()), child);
    }
}
