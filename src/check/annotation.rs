use crate::parser::ast::{Decl, NodeId, NodeKind, Tree};

/// A declaration carries the marker as its own flag.
pub fn decl_has_annotation(tree: &Tree, decl: NodeId) -> bool {
    matches!(tree.as_decl(decl), Some(Decl::Var { annotated: true, .. }))
}

/// The wrapper directly annotating `stmt`, if any. The wrapper's slot must name `stmt` itself.
pub fn own_wrapper(tree: &Tree, stmt: NodeId) -> Option<NodeId> {
    let parent = tree.parent(stmt)?;
    match tree.kind(parent)? {
        NodeKind::Annotated { stmt: Some(inner) } if *inner == stmt => Some(parent),
        _ => None,
    }
}

pub fn stmt_has_annotation(tree: &Tree, stmt: NodeId) -> bool {
    own_wrapper(tree, stmt).is_some()
}
