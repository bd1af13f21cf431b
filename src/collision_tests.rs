//! Selector Name Collision Tests
//!
//! Two nodes deriving the same selector name:
//! - the later node takes the name
//! - the earlier node moves to an `_alternative`
//! - no usable alternative rejects the specification

#[cfg(test)]
mod tests {
    use crate::{create_selectors, CompileError, SpecNode, Value, ERR_DUPLICATE_NAME};
    use serde_json::json;

    fn state() -> Value {
        Value::from(json!({
            "a": { "b": "from a" },
            "c": { "b": "from c" },
            "d": { "b": "from d" }
        }))
    }

    #[test]
    fn test_later_node_wins_and_earlier_moves() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new()))
            .child("c", SpecNode::new().child("b", SpecNode::new().alternative("otherB")));

        let compiled = create_selectors(&spec).unwrap();
        let s = state();
        assert_eq!(compiled["selectB"].select_state(&s), Value::from("from c"));
        assert_eq!(compiled["selectOtherB"].select_state(&s), Value::from("from a"));
        assert_eq!(compiled.len(), 5);
    }

    #[test]
    fn test_earlier_node_uses_its_own_alternative() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new().alternative("bOfA")))
            .child("c", SpecNode::new().child("b", SpecNode::new().alternative("bOfC")));

        let compiled = create_selectors(&spec).unwrap();
        let s = state();
        assert_eq!(compiled["selectB"].select_state(&s), Value::from("from c"));
        assert_eq!(compiled["selectBOfA"].select_state(&s), Value::from("from a"));
        assert!(!compiled.contains("selectBOfC"));
    }

    #[test]
    fn test_collision_without_alternative_is_rejected() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new()))
            .child("c", SpecNode::new().child("b", SpecNode::new()));

        let err = create_selectors(&spec).unwrap_err();
        assert_eq!(err.code(), ERR_DUPLICATE_NAME);
        assert_eq!(err.to_string(), "selector name already in use: selectB");
    }

    #[test]
    fn test_alternative_does_not_reach_descendants() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new()))
            .child(
                "c",
                SpecNode::new().alternative("a").child("b", SpecNode::new()),
            );

        let err = create_selectors(&spec).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateSelectorName { ref name } if name == "selectB"));
    }

    #[test]
    fn test_three_nodes_sharing_a_name() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new().alternative("firstB")))
            .child("c", SpecNode::new().child("b", SpecNode::new().alternative("secondB")))
            .child("d", SpecNode::new().child("b", SpecNode::new()));

        let compiled = create_selectors(&spec).unwrap();
        let s = state();
        assert_eq!(compiled["selectB"].select_state(&s), Value::from("from d"));
        assert_eq!(compiled["selectSecondB"].select_state(&s), Value::from("from c"));
        assert_eq!(compiled["selectFirstB"].select_state(&s), Value::from("from a"));
    }

    #[test]
    fn test_unexported_node_never_collides() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().child("b", SpecNode::new()))
            .child("c", SpecNode::new().child("b", SpecNode::new().export(false)));

        let compiled = create_selectors(&spec).unwrap();
        assert_eq!(compiled["selectB"].select_state(&state()), Value::from("from a"));
    }

    #[test]
    fn test_names_entry_collides() {
        let spec = SpecNode::new()
            .child("a", SpecNode::new().names(["first", "shared"]))
            .child("c", SpecNode::new().name("shared").alternative("otherShared"));

        let compiled = create_selectors(&spec).unwrap();
        assert!(compiled["selectFirst"].same_as(&compiled["selectOtherShared"]));
        assert!(!compiled["selectShared"].same_as(&compiled["selectFirst"]));
    }

    #[test]
    fn test_root_name_cannot_be_taken() {
        let spec = SpecNode::new().child("state", SpecNode::new());
        let err = create_selectors(&spec).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateSelectorName { ref name } if name == "selectState"));

        let spec = SpecNode::new().child("state", SpecNode::new().alternative("nestedState"));
        let compiled = create_selectors(&spec).unwrap();
        let s = Value::from(json!({ "state": "inner" }));
        assert!(compiled["selectState"].select_state(&s).as_map().is_some());
        assert_eq!(compiled["selectNestedState"].select_state(&s), Value::from("inner"));
    }

    #[test]
    fn test_failed_compilation_is_repeatable() {
        let spec = SpecNode::new()
            .child("x", SpecNode::new())
            .child("y", SpecNode::new().name("x"));

        for _ in 0..2 {
            assert!(create_selectors(&spec).is_err());
        }
    }
}
