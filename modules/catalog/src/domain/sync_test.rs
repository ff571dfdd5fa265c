//! Unit tests for the reconciliation planner. These run against plain
//! structs; applying plans on a real store is covered by the service
//! tests.

#[cfg(test)]
mod tests {
    use crate::domain::sync::{counter_key, reconcile, text_key};

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: u32,
        attr: &'static str,
        lang: Option<&'static str>,
        value: &'static str,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Input {
        attr: &'static str,
        lang: Option<&'static str>,
        value: &'static str,
    }

    fn row(id: u32, attr: &'static str, lang: Option<&'static str>, value: &'static str) -> Row {
        Row {
            id,
            attr,
            lang,
            value,
        }
    }

    fn input(attr: &'static str, lang: Option<&'static str>, value: &'static str) -> Input {
        Input { attr, lang, value }
    }

    fn plan_text(
        existing: Vec<Row>,
        desired: Vec<Input>,
    ) -> crate::domain::sync::SyncPlan<Row, Input> {
        reconcile(
            existing,
            desired,
            |r| text_key(r.attr, r.lang),
            |i| text_key(i.attr, i.lang),
            |r, i| r.value != i.value,
        )
    }

    // =========================================================================
    // Positional reconciliation (strings / descriptions)
    // =========================================================================

    #[test]
    fn test_identical_desired_list_is_a_noop() {
        let existing = vec![
            row(1, "title", Some("en"), "Shop"),
            row(2, "title", Some("de"), "Laden"),
        ];
        let desired = vec![
            input("title", Some("en"), "Shop"),
            input("title", Some("de"), "Laden"),
        ];

        let plan = plan_text(existing, desired);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_changed_value_updates_in_place() {
        let existing = vec![row(1, "title", Some("en"), "Shop")];
        let desired = vec![input("title", Some("en"), "Store")];

        let plan = plan_text(existing, desired);
        assert!(plan.delete.is_empty());
        assert!(plan.insert.is_empty());
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 1);
        assert_eq!(plan.update[0].1.value, "Store");
    }

    #[test]
    fn test_shrinking_a_group_deletes_surplus_and_keeps_first_row_id() {
        // Two undifferentiated values for the same (attr, lang); desired
        // keeps one with a new value. The surviving row keeps its id.
        let existing = vec![
            row(1, "alias", Some("en"), "first"),
            row(2, "alias", Some("en"), "second"),
        ];
        let desired = vec![input("alias", Some("en"), "renamed")];

        let plan = plan_text(existing, desired);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 1);
        assert_eq!(plan.update[0].1.value, "renamed");
        assert_eq!(plan.delete.len(), 1);
        assert_eq!(plan.delete[0].id, 2);
        assert!(plan.insert.is_empty());
    }

    #[test]
    fn test_growing_a_group_inserts_surplus_only() {
        let existing = vec![row(1, "alias", None, "a")];
        let desired = vec![input("alias", None, "a"), input("alias", None, "b")];

        let plan = plan_text(existing, desired);
        assert!(plan.delete.is_empty());
        assert!(plan.update.is_empty());
        assert_eq!(plan.insert.len(), 1);
        assert_eq!(plan.insert[0].value, "b");
    }

    #[test]
    fn test_groups_reconcile_independently() {
        let existing = vec![
            row(1, "title", Some("en"), "Shop"),
            row(2, "title", Some("de"), "Laden"),
            row(3, "alias", None, "shop"),
        ];
        // Drop the German title, rename the alias, add a French title.
        let desired = vec![
            input("title", Some("en"), "Shop"),
            input("title", Some("fr"), "Boutique"),
            input("alias", None, "store"),
        ];

        let plan = plan_text(existing, desired);
        assert_eq!(plan.delete.len(), 1);
        assert_eq!(plan.delete[0].id, 2);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 3);
        assert_eq!(plan.insert.len(), 1);
        assert_eq!(plan.insert[0].lang, Some("fr"));
    }

    #[test]
    fn test_missing_language_and_neutral_language_are_the_same_group() {
        let existing = vec![row(1, "alias", None, "a")];
        let desired = vec![input("alias", None, "b")];

        let plan = plan_text(existing, desired);
        assert_eq!(plan.update.len(), 1);
        assert!(plan.delete.is_empty() && plan.insert.is_empty());
    }

    #[test]
    fn test_empty_desired_deletes_everything() {
        let existing = vec![row(1, "title", Some("en"), "Shop"), row(2, "alias", None, "s")];

        let plan = plan_text(existing, vec![]);
        assert_eq!(plan.delete.len(), 2);
        assert!(plan.update.is_empty() && plan.insert.is_empty());
    }

    // =========================================================================
    // Keyed reconciliation (counters)
    // =========================================================================

    #[derive(Clone, Debug, PartialEq)]
    struct CounterRow {
        id: u32,
        attr: &'static str,
        point: Option<&'static str>,
        count: f64,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct CounterIn {
        attr: &'static str,
        point: Option<&'static str>,
        count: f64,
    }

    fn plan_counters(
        existing: Vec<CounterRow>,
        desired: Vec<CounterIn>,
    ) -> crate::domain::sync::SyncPlan<CounterRow, CounterIn> {
        reconcile(
            existing,
            desired,
            |r| counter_key(r.attr, r.point),
            |i| counter_key(i.attr, i.point),
            |r, i| (r.count - i.count).abs() > f64::EPSILON,
        )
    }

    #[test]
    fn test_counter_same_key_different_count_is_an_update() {
        let existing = vec![CounterRow {
            id: 1,
            attr: "price",
            point: None,
            count: 5.0,
        }];
        let desired = vec![CounterIn {
            attr: "price",
            point: None,
            count: 9.5,
        }];

        let plan = plan_counters(existing, desired);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 1);
        assert!(plan.delete.is_empty() && plan.insert.is_empty());
    }

    #[test]
    fn test_counter_only_touched_keys_are_written() {
        let existing = vec![
            CounterRow {
                id: 1,
                attr: "price",
                point: Some("p1"),
                count: 5.0,
            },
            CounterRow {
                id: 2,
                attr: "price",
                point: Some("p2"),
                count: 7.0,
            },
            CounterRow {
                id: 3,
                attr: "area",
                point: None,
                count: 40.0,
            },
        ];
        // p1 unchanged, p2 removed, area changed, rating added.
        let desired = vec![
            CounterIn {
                attr: "price",
                point: Some("p1"),
                count: 5.0,
            },
            CounterIn {
                attr: "area",
                point: None,
                count: 44.0,
            },
            CounterIn {
                attr: "rating",
                point: None,
                count: 4.0,
            },
        ];

        let plan = plan_counters(existing, desired);
        assert_eq!(plan.delete.len(), 1);
        assert_eq!(plan.delete[0].id, 2);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 3);
        assert_eq!(plan.insert.len(), 1);
        assert_eq!(plan.insert[0].attr, "rating");
    }

    #[test]
    fn test_counter_point_distinguishes_rows_with_the_same_attribute() {
        let existing = vec![CounterRow {
            id: 1,
            attr: "price",
            point: None,
            count: 5.0,
        }];
        let desired = vec![CounterIn {
            attr: "price",
            point: Some("p1"),
            count: 5.0,
        }];

        let plan = plan_counters(existing, desired);
        assert_eq!(plan.delete.len(), 1);
        assert_eq!(plan.insert.len(), 1);
        assert!(plan.update.is_empty());
    }

    // =========================================================================
    // Membership reconciliation (points / files / join rows)
    // =========================================================================

    #[test]
    fn test_membership_plans_never_update() {
        let existing = vec!["a", "b", "c"];
        let desired = vec!["b", "c", "d"];

        let plan = reconcile(
            existing,
            desired,
            |r: &&str| (*r).to_owned(),
            |i: &&str| (*i).to_owned(),
            |_, _| false,
        );
        assert_eq!(plan.delete, vec!["a"]);
        assert!(plan.update.is_empty());
        assert_eq!(plan.insert, vec!["d"]);
    }
}
