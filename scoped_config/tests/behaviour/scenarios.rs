//! Binds the nested-suite feature file to the step registry.

use crate::fixtures::{TreeContext, tree_context};
use rstest_bdd_macros::scenarios;

scenarios!(
    "tests/features/nested_suites.feature",
    fixtures = [tree_context: TreeContext]
);
