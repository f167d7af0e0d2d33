//! Depth-first AST traversal.
//!
//! [`walk`] visits nodes pre-order, calling [`Visitor::enter`] before
//! descending into children and [`Visitor::exit`] after. Returning
//! [`VisitControl::SkipSubtree`] from `enter` prunes the node's children
//! (its own `exit` still runs). Sibling order matches source order, and the
//! traversal only ever descends into `children` — span and attribute fields
//! are not nodes.
//!
//! The visitor is generic over the tree's lifetime so callbacks may collect
//! node references for later passes; traversal borrows nodes immutably, so
//! a rule may also start a nested walk from inside its own visitor.

use crate::ast::AstNode;

/// Signal returned by [`Visitor::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    /// Descend into the node's children.
    Continue,
    /// Do not visit this node's children.
    SkipSubtree
}

/// Enter/exit callbacks for [`walk`].
pub trait Visitor<'a> {
    fn enter(&mut self, _node: &'a AstNode, _parent: Option<&'a AstNode>) -> VisitControl {
        VisitControl::Continue
    }

    fn exit(&mut self, _node: &'a AstNode, _parent: Option<&'a AstNode>) {}
}

/// Depth-first pre-order traversal with enter/exit callbacks.
pub fn walk<'a>(root: &'a AstNode, visitor: &mut dyn Visitor<'a>) {
    walk_inner(root, None, visitor);
}

fn walk_inner<'a>(node: &'a AstNode, parent: Option<&'a AstNode>, visitor: &mut dyn Visitor<'a>) {
    let control = visitor.enter(node, parent);
    if control == VisitControl::Continue {
        for child in &node.children {
            walk_inner(child, Some(node), visitor);
        }
    }
    visitor.exit(node, parent);
}

/// Closure-based traversal for rules that only need an enter callback.
pub fn for_each_node<'a, F>(root: &'a AstNode, callback: F)
where
    F: FnMut(&'a AstNode, Option<&'a AstNode>) -> VisitControl
{
    struct FnVisitor<F>(F);

    impl<'a, F> Visitor<'a> for FnVisitor<F>
    where
        F: FnMut(&'a AstNode, Option<&'a AstNode>) -> VisitControl
    {
        fn enter(&mut self, node: &'a AstNode, parent: Option<&'a AstNode>) -> VisitControl {
            (self.0)(node, parent)
        }
    }

    walk(root, &mut FnVisitor(callback));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn sample_tree() -> AstNode {
        AstNode::new(NodeKind::SourceUnit, None).with_children(vec![
            AstNode::new(NodeKind::ContractDefinition, None).with_children(vec![
                AstNode::new(NodeKind::FunctionDefinition, None).with_children(vec![
                    AstNode::new(NodeKind::Block, None),
                ]),
                AstNode::new(NodeKind::StateVariableDeclaration, None),
            ]),
            AstNode::new(NodeKind::PragmaDirective, None),
        ])
    }

    #[test]
    fn test_pre_order_with_source_sibling_order() {
        let tree = sample_tree();
        let mut kinds = Vec::new();
        for_each_node(&tree, |node, _| {
            kinds.push(node.kind);
            VisitControl::Continue
        });
        assert_eq!(
            kinds,
            vec![
                NodeKind::SourceUnit,
                NodeKind::ContractDefinition,
                NodeKind::FunctionDefinition,
                NodeKind::Block,
                NodeKind::StateVariableDeclaration,
                NodeKind::PragmaDirective,
            ]
        );
    }

    #[test]
    fn test_skip_subtree_prunes_children() {
        let tree = sample_tree();
        let mut kinds = Vec::new();
        for_each_node(&tree, |node, _| {
            kinds.push(node.kind);
            if node.kind == NodeKind::ContractDefinition {
                VisitControl::SkipSubtree
            } else {
                VisitControl::Continue
            }
        });
        assert_eq!(
            kinds,
            vec![
                NodeKind::SourceUnit,
                NodeKind::ContractDefinition,
                NodeKind::PragmaDirective,
            ]
        );
    }

    #[test]
    fn test_exit_runs_after_children() {
        struct Order {
            events: Vec<String>
        }

        impl<'a> Visitor<'a> for Order {
            fn enter(&mut self, node: &'a AstNode, _parent: Option<&'a AstNode>) -> VisitControl {
                self.events.push(format!("enter {}", node.kind));
                VisitControl::Continue
            }

            fn exit(&mut self, node: &'a AstNode, _parent: Option<&'a AstNode>) {
                self.events.push(format!("exit {}", node.kind));
            }
        }

        let tree = AstNode::new(NodeKind::SourceUnit, None).with_children(vec![
            AstNode::new(NodeKind::ContractDefinition, None),
        ]);
        let mut visitor = Order {
            events: Vec::new()
        };
        walk(&tree, &mut visitor);
        assert_eq!(
            visitor.events,
            vec![
                "enter SourceUnit",
                "enter ContractDefinition",
                "exit ContractDefinition",
                "exit SourceUnit",
            ]
        );
    }

    #[test]
    fn test_parent_is_passed() {
        let tree = sample_tree();
        let mut saw_block_parent = false;
        for_each_node(&tree, |node, parent| {
            if node.kind == NodeKind::Block {
                saw_block_parent = parent.map(|p| p.kind) == Some(NodeKind::FunctionDefinition);
            }
            VisitControl::Continue
        });
        assert!(saw_block_parent);
    }

    #[test]
    fn test_collected_references_outlive_the_walk() {
        let tree = sample_tree();
        let mut functions: Vec<&AstNode> = Vec::new();
        for_each_node(&tree, |node, _| {
            if node.kind == NodeKind::FunctionDefinition {
                functions.push(node);
            }
            VisitControl::Continue
        });
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].children.len(), 1);
    }

    #[test]
    fn test_reentrant_walk() {
        let tree = sample_tree();
        let mut nested_count = 0;
        for_each_node(&tree, |node, _| {
            if node.kind == NodeKind::ContractDefinition {
                for_each_node(node, |_, _| {
                    nested_count += 1;
                    VisitControl::Continue
                });
            }
            VisitControl::Continue
        });
        // Contract + function + block + state variable.
        assert_eq!(nested_count, 4);
    }
}
