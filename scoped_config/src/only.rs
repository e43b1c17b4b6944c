//! Detection of exclusive focus above a node.

use crate::tree::{NodeId, ScopeNode, ScopeTree};

/// Whether any strict ancestor of `node` has a direct child carrying the
/// only marker.
///
/// The node itself is not inspected; harness logic uses this to relax
/// post-conditions when a run is filtered down to focused tests.
///
/// # Examples
///
/// ```
/// use scoped_config::{ConfigSchema, Declaration, ScopeTree, has_only};
///
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("root")
///         .child(Declaration::suite("focused").only())
///         .child(Declaration::test("plain", |_| Ok(()))),
/// )?;
/// let plain = tree.tests()[0];
/// assert!(has_only(&tree, plain));
/// assert!(!has_only(&tree, tree.root()));
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[must_use]
pub fn has_only(tree: &ScopeTree, node: NodeId) -> bool {
    tree.ancestors(node).any(|suite| has_only_child(tree, suite))
}

fn has_only_child(tree: &ScopeTree, suite: &ScopeNode) -> bool {
    suite
        .children()
        .iter()
        .filter_map(|child| tree.node(*child))
        .any(ScopeNode::is_only)
}

#[cfg(test)]
mod tests {
    use super::has_only;
    use crate::{ConfigSchema, Declaration, ScopeTree};

    fn noop() -> Declaration {
        Declaration::test("noop", |_| Ok(()))
    }

    #[test]
    fn plain_tree_has_no_focus() {
        let tree = ScopeTree::build(
            ConfigSchema::default(),
            Declaration::suite("root")
                .child(Declaration::suite("a").child(noop())),
        )
        .expect("tree builds");
        let test = tree.tests()[0];
        assert!(!has_only(&tree, test));
        assert!(!tree.has_exclusive());
    }

    #[test]
    fn focus_on_distant_ancestor_sibling_is_seen() {
        let tree = ScopeTree::build(
            ConfigSchema::default(),
            Declaration::suite("root")
                .child(Declaration::suite("focused").only().child(noop()))
                .child(
                    Declaration::suite("a")
                        .child(Declaration::suite("b").child(noop())),
                ),
        )
        .expect("tree builds");
        let tests = tree.tests();
        assert!(has_only(&tree, tests[0]));
        assert!(has_only(&tree, tests[1]));
        assert!(tree.is_focused(tests[0]));
        assert!(!tree.is_focused(tests[1]));
    }

    #[test]
    fn own_marker_is_not_inspected() {
        let tree = ScopeTree::build(ConfigSchema::default(), Declaration::suite("root").only())
            .expect("tree builds");
        assert!(!has_only(&tree, tree.root()));
        assert!(tree.has_exclusive());
    }

    #[test]
    fn focused_test_marks_its_siblings() {
        let tree = ScopeTree::build(
            ConfigSchema::default(),
            Declaration::suite("root")
                .child(noop().only())
                .child(noop()),
        )
        .expect("tree builds");
        for test in tree.tests() {
            assert!(has_only(&tree, test));
        }
    }
}
