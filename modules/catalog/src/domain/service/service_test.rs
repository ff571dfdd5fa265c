//! Service tests against an in-memory SQLite database with the real
//! migrations applied. The seeded access rules give READ to everyone and
//! ALL to the `admins` group.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use trellis_session::Caller;

    use crate::domain::error::DomainError;
    use crate::domain::model::{
        AttributesInput, CounterInput, DescriptionInput, ListParams, Method, PermissionInput,
        SortDir, SortKey, StringFilter, StringInput,
    };
    use crate::domain::service::{
        BlockWrite, Catalog, CatalogConfig, ElementWrite, Registration, UserWrite,
    };
    use crate::infra::storage::migrations::Migrator;

    /// Single-connection pool: every query sees the same in-memory file.
    async fn inmem_db() -> DatabaseConnection {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1);
        let db = Database::connect(opts)
            .await
            .expect("failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("failed to run migrations");
        db
    }

    async fn service() -> Arc<Catalog> {
        Arc::new(Catalog::new(inmem_db().await, CatalogConfig::default()))
    }

    fn admin() -> Caller {
        Caller {
            user_id: Some("u-admin".to_owned()),
            login: Some("admin".to_owned()),
            groups: vec!["admins".to_owned()],
        }
    }

    fn member_of(groups: &[&str]) -> Caller {
        Caller {
            user_id: Some("u-member".to_owned()),
            login: Some("member".to_owned()),
            groups: groups.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn public_read() -> PermissionInput {
        PermissionInput {
            group_id: None,
            method: Method::Read,
        }
    }

    fn string_attr(attr: &str, lang: Option<&str>, value: &str) -> StringInput {
        StringInput {
            attribute_id: attr.to_owned(),
            language_id: lang.map(str::to_owned),
            value: value.to_owned(),
        }
    }

    fn counter_attr(attr: &str, point: Option<&str>, count: f64) -> CounterInput {
        CounterInput {
            attribute_id: attr.to_owned(),
            point_id: point.map(str::to_owned),
            measure_id: None,
            count,
        }
    }

    fn public_block(strings: Vec<StringInput>, counters: Vec<CounterInput>) -> BlockWrite {
        BlockWrite {
            attributes: AttributesInput {
                strings,
                counters,
                ..Default::default()
            },
            permissions: vec![public_read()],
        }
    }

    // =========================================================================
    // Create and view shape
    // =========================================================================

    #[tokio::test]
    async fn test_create_block_returns_grouped_attributes() {
        let svc = service().await;
        let view = svc
            .create_block(
                &admin(),
                Some("b1".to_owned()),
                public_block(
                    vec![string_attr("title", Some("en"), "Shop")],
                    vec![counter_attr("price", None, 5.0)],
                ),
            )
            .await
            .unwrap();

        assert_eq!(view.scalar.id, "b1");
        assert_eq!(view.attributes.strings.len(), 1);
        assert_eq!(view.attributes.strings[0].value, "Shop");
        assert_eq!(view.attributes.counters.len(), 1);
        assert_eq!(view.attributes.counters[0].count, 5.0);
        assert!(view.attributes.descriptions.is_empty());
        assert!(view.attributes.points.is_empty());
        assert!(view.attributes.files.is_empty());
    }

    #[tokio::test]
    async fn test_create_injects_admin_all_entry() {
        let svc = service().await;
        let view = svc
            .create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();

        assert!(view
            .permissions
            .iter()
            .any(|p| p.group.as_deref() == Some("admins") && p.method == Method::All));
        assert!(view
            .permissions
            .iter()
            .any(|p| p.group.is_none() && p.method == Method::Read));
    }

    #[tokio::test]
    async fn test_create_with_blank_id_is_rejected() {
        let svc = service().await;
        let err = svc
            .create_block(&admin(), Some("   ".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "id"));
    }

    #[tokio::test]
    async fn test_create_duplicate_id_is_rejected() {
        let svc = service().await;
        svc.create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();
        let err = svc
            .create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "id"));
    }

    // =========================================================================
    // Guard ordering and method-level access
    // =========================================================================

    #[tokio::test]
    async fn test_non_admin_cannot_write() {
        let svc = service().await;
        let err = svc
            .create_block(
                &member_of(&["users"]),
                Some("b1".to_owned()),
                public_block(vec![], vec![]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found_before_permission() {
        let svc = service().await;
        // Anonymous caller with zero groups still learns the id does not
        // exist; existence is checked before the ACL.
        let err = svc.get_block(&Caller::anonymous(), "nope").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_admin_only_resource_denied_with_exact_message() {
        let svc = service().await;
        svc.create_block(
            &admin(),
            Some("b-sec".to_owned()),
            BlockWrite {
                attributes: AttributesInput::default(),
                permissions: vec![PermissionInput {
                    group_id: Some("admins".to_owned()),
                    method: Method::Read,
                }],
            },
        )
        .await
        .unwrap();

        let err = svc.get_block(&member_of(&["users"]), "b-sec").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: READ on Block with id b-sec"
        );
    }

    #[tokio::test]
    async fn test_admin_only_resource_filtered_from_list() {
        let svc = service().await;
        svc.create_block(
            &admin(),
            Some("b-sec".to_owned()),
            BlockWrite {
                attributes: AttributesInput::default(),
                permissions: vec![PermissionInput {
                    group_id: Some("admins".to_owned()),
                    method: Method::Read,
                }],
            },
        )
        .await
        .unwrap();
        svc.create_block(&admin(), Some("b-pub".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();

        let page = svc
            .list_blocks(&member_of(&["users"]), ListParams::default())
            .await
            .unwrap();
        let ids: Vec<&str> = page.data.iter().map(|v| v.scalar.id.as_str()).collect();
        assert_eq!(ids, vec!["b-pub"]);
        assert_eq!(page.count, 1);

        // The admin sees both.
        let page = svc.list_blocks(&admin(), ListParams::default()).await.unwrap();
        assert_eq!(page.count, 2);
    }

    // =========================================================================
    // Pagination after visibility and filters
    // =========================================================================

    #[tokio::test]
    async fn test_page_window_over_visible_rows_in_creation_order() {
        let svc = service().await;
        for id in ["b1", "b2", "b3", "b4"] {
            svc.create_block(&admin(), Some(id.to_owned()), public_block(vec![], vec![]))
                .await
                .unwrap();
        }

        let page = svc
            .list_blocks(
                &Caller::anonymous(),
                ListParams {
                    limit: Some(2),
                    offset: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ids: Vec<&str> = page.data.iter().map(|v| v.scalar.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b3"]);
        assert_eq!(page.count, 4);
    }

    #[tokio::test]
    async fn test_counter_range_filter() {
        let svc = service().await;
        svc.create_element(
            &admin(),
            Some("e1".to_owned()),
            ElementWrite {
                attributes: AttributesInput {
                    counters: vec![counter_attr("price", None, 5.0)],
                    ..Default::default()
                },
                permissions: vec![public_read()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.create_element(
            &admin(),
            Some("e2".to_owned()),
            ElementWrite {
                attributes: AttributesInput {
                    counters: vec![counter_attr("price", None, 10.0)],
                    ..Default::default()
                },
                permissions: vec![public_read()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut params = ListParams::default();
        params.filters.counters.push(crate::domain::model::CounterFilter {
            attribute_id: "price".to_owned(),
            min: Some(8.0),
            ..Default::default()
        });

        let page = svc.list_elements(&Caller::anonymous(), params).await.unwrap();
        let ids: Vec<&str> = page.data.iter().map(|v| v.scalar.id.as_str()).collect();
        assert_eq!(ids, vec!["e2"]);
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn test_string_filter_and_attribute_sort() {
        let svc = service().await;
        for (id, title) in [("b1", "Cherry"), ("b2", "Apple"), ("b3", "Banana")] {
            svc.create_block(
                &admin(),
                Some(id.to_owned()),
                public_block(vec![string_attr("title", Some("en"), title)], vec![]),
            )
            .await
            .unwrap();
        }
        // A block without the sorted attribute still appears, after the
        // matched rows.
        svc.create_block(&admin(), Some("b4".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();

        let params = ListParams {
            sort: Some((
                SortKey::StringAttr {
                    attribute_id: "title".to_owned(),
                    language_id: Some("en".to_owned()),
                },
                SortDir::Asc,
            )),
            ..Default::default()
        };
        let page = svc.list_blocks(&Caller::anonymous(), params).await.unwrap();
        let ids: Vec<&str> = page.data.iter().map(|v| v.scalar.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b3", "b1", "b4"]);

        let mut params = ListParams::default();
        params.filters.strings.push(StringFilter {
            attribute_id: "title".to_owned(),
            language_id: Some("en".to_owned()),
            value: Some("Apple".to_owned()),
            like: None,
        });
        let page = svc.list_blocks(&Caller::anonymous(), params).await.unwrap();
        let ids: Vec<&str> = page.data.iter().map(|v| v.scalar.id.as_str()).collect();
        assert_eq!(ids, vec!["b2"]);
    }

    // =========================================================================
    // Reconciliation on update
    // =========================================================================

    #[tokio::test]
    async fn test_description_shrink_preserves_surviving_row_id() {
        let svc = service().await;
        let view = svc
            .create_block(
                &admin(),
                Some("b1".to_owned()),
                BlockWrite {
                    attributes: AttributesInput {
                        descriptions: vec![
                            DescriptionInput {
                                attribute_id: "about".to_owned(),
                                language_id: Some("en".to_owned()),
                                value: "first".to_owned(),
                            },
                            DescriptionInput {
                                attribute_id: "about".to_owned(),
                                language_id: Some("en".to_owned()),
                                value: "second".to_owned(),
                            },
                        ],
                        ..Default::default()
                    },
                    permissions: vec![public_read()],
                },
            )
            .await
            .unwrap();
        assert_eq!(view.attributes.descriptions.len(), 2);
        let first_id = view.attributes.descriptions[0].id;

        let updated = svc
            .update_block(
                &admin(),
                "b1",
                BlockWrite {
                    attributes: AttributesInput {
                        descriptions: vec![DescriptionInput {
                            attribute_id: "about".to_owned(),
                            language_id: Some("en".to_owned()),
                            value: "rewritten".to_owned(),
                        }],
                        ..Default::default()
                    },
                    permissions: vec![public_read()],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.attributes.descriptions.len(), 1);
        assert_eq!(updated.attributes.descriptions[0].id, first_id);
        assert_eq!(updated.attributes.descriptions[0].value, "rewritten");
    }

    #[tokio::test]
    async fn test_repeated_update_preserves_row_identity() {
        let svc = service().await;
        let body = || public_block(
            vec![string_attr("title", Some("en"), "Shop")],
            vec![counter_attr("price", None, 5.0)],
        );
        svc.create_block(&admin(), Some("b1".to_owned()), body())
            .await
            .unwrap();

        let first = svc.update_block(&admin(), "b1", body()).await.unwrap();
        let second = svc.update_block(&admin(), "b1", body()).await.unwrap();

        assert_eq!(
            first.attributes.strings[0].id,
            second.attributes.strings[0].id
        );
        assert_eq!(
            first.attributes.counters[0].id,
            second.attributes.counters[0].id
        );
    }

    #[tokio::test]
    async fn test_counter_update_touches_only_changed_keys() {
        let svc = service().await;
        let created = svc
            .create_block(
                &admin(),
                Some("b1".to_owned()),
                public_block(
                    vec![],
                    vec![
                        counter_attr("price", Some("p1"), 5.0),
                        counter_attr("area", None, 40.0),
                    ],
                ),
            )
            .await
            .unwrap();
        let price_id = created
            .attributes
            .counters
            .iter()
            .find(|c| c.attribute_id == "price")
            .unwrap()
            .id;

        // price unchanged, area changes value, rating is new.
        let updated = svc
            .update_block(
                &admin(),
                "b1",
                public_block(
                    vec![],
                    vec![
                        counter_attr("price", Some("p1"), 5.0),
                        counter_attr("area", None, 44.0),
                        counter_attr("rating", None, 4.5),
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(updated.attributes.counters.len(), 3);
        let price = updated
            .attributes
            .counters
            .iter()
            .find(|c| c.attribute_id == "price")
            .unwrap();
        assert_eq!(price.id, price_id);
        let area = updated
            .attributes
            .counters
            .iter()
            .find(|c| c.attribute_id == "area")
            .unwrap();
        assert_eq!(area.count, 44.0);
    }

    #[tokio::test]
    async fn test_omitted_kind_deletes_all_its_rows() {
        let svc = service().await;
        svc.create_block(
            &admin(),
            Some("b1".to_owned()),
            public_block(
                vec![string_attr("title", None, "Shop")],
                vec![counter_attr("price", None, 5.0)],
            ),
        )
        .await
        .unwrap();

        // Counters omitted entirely: destructive by default.
        let updated = svc
            .update_block(
                &admin(),
                "b1",
                public_block(vec![string_attr("title", None, "Shop")], vec![]),
            )
            .await
            .unwrap();

        assert!(updated.attributes.counters.is_empty());
        assert_eq!(updated.attributes.strings.len(), 1);
    }

    #[tokio::test]
    async fn test_acl_update_replaces_verbatim_without_admin_injection() {
        let svc = service().await;
        svc.create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();

        let updated = svc
            .update_block(
                &admin(),
                "b1",
                BlockWrite {
                    attributes: AttributesInput::default(),
                    permissions: vec![PermissionInput {
                        group_id: Some("editors".to_owned()),
                        method: Method::All,
                    }],
                },
            )
            .await
            .unwrap();

        // The submitted list is stored verbatim; the create-time entries
        // (public READ, admin ALL) are gone.
        assert_eq!(updated.permissions.len(), 1);
        assert_eq!(updated.permissions[0].group.as_deref(), Some("editors"));
    }

    // =========================================================================
    // Element memberships and input-level permission
    // =========================================================================

    #[tokio::test]
    async fn test_element_memberships_are_reconciled() {
        let svc = service().await;
        for id in ["blk-a", "blk-b"] {
            svc.create_block(&admin(), Some(id.to_owned()), public_block(vec![], vec![]))
                .await
                .unwrap();
        }

        let view = svc
            .create_element(
                &admin(),
                Some("e1".to_owned()),
                ElementWrite {
                    permissions: vec![public_read()],
                    blocks: vec!["blk-a".to_owned(), "blk-b".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.scalar.blocks, vec!["blk-a", "blk-b"]);

        let updated = svc
            .update_element(
                &admin(),
                "e1",
                ElementWrite {
                    permissions: vec![public_read()],
                    blocks: vec!["blk-b".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.scalar.blocks, vec!["blk-b"]);
    }

    #[tokio::test]
    async fn test_element_write_requires_write_on_referenced_block() {
        let svc = service().await;
        svc.create_block(&admin(), Some("blk".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();
        // Drop every entry that would grant the admin WRITE on the block.
        svc.update_block(
            &admin(),
            "blk",
            BlockWrite {
                attributes: AttributesInput::default(),
                permissions: vec![PermissionInput {
                    group_id: Some("editors".to_owned()),
                    method: Method::All,
                }],
            },
        )
        .await
        .unwrap();

        let err = svc
            .create_element(
                &admin(),
                Some("e1".to_owned()),
                ElementWrite {
                    permissions: vec![public_read()],
                    blocks: vec!["blk".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PermissionDenied { method: Method::Write, .. }
        ));
    }

    #[tokio::test]
    async fn test_element_referencing_missing_block_is_not_found() {
        let svc = service().await;
        let err = svc
            .create_element(
                &admin(),
                Some("e1".to_owned()),
                ElementWrite {
                    permissions: vec![public_read()],
                    blocks: vec!["ghost".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    // =========================================================================
    // Delete
    // =========================================================================

    #[tokio::test]
    async fn test_delete_cascades_attribute_rows() {
        let svc = service().await;
        svc.create_block(
            &admin(),
            Some("b1".to_owned()),
            public_block(vec![string_attr("title", None, "Shop")], vec![]),
        )
        .await
        .unwrap();

        svc.delete_block(&admin(), "b1").await.unwrap();

        let err = svc.get_block(&admin(), "b1").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        // Re-creating under the same id starts from a clean slate.
        let view = svc
            .create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();
        assert!(view.attributes.strings.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_cannot_delete() {
        let svc = service().await;
        svc.create_block(&admin(), Some("b1".to_owned()), public_block(vec![], vec![]))
            .await
            .unwrap();
        let err = svc.delete_block(&Caller::anonymous(), "b1").await.unwrap_err();
        assert!(matches!(err, DomainError::AccessDenied { .. }));
    }

    // =========================================================================
    // Users, registration, authentication
    // =========================================================================

    #[tokio::test]
    async fn test_registration_requires_password() {
        let svc = service().await;
        let err = svc
            .register_user(Registration {
                id: None,
                login: "alice".to_owned(),
                password: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "password"));
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let svc = service().await;
        let view = svc
            .register_user(Registration {
                id: Some("u1".to_owned()),
                login: "alice".to_owned(),
                password: "hunter2-but-longer".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(view.scalar.login, "alice");

        let auth = svc
            .authenticate("alice", "hunter2-but-longer")
            .await
            .unwrap();
        assert_eq!(auth.id, "u1");
        assert!(auth.groups.is_empty());

        let err = svc.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
        let err = svc.authenticate("nobody", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_user_groups_flow_into_authentication() {
        let svc = service().await;
        let view = svc
            .create_user(
                &admin(),
                Some("u1".to_owned()),
                UserWrite {
                    login: "bob".to_owned(),
                    password: Some("builder-password".to_owned()),
                    groups: vec!["admins".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.scalar.groups, vec!["admins"]);

        let auth = svc.authenticate("bob", "builder-password").await.unwrap();
        assert_eq!(auth.groups, vec!["admins"]);
    }

    #[tokio::test]
    async fn test_duplicate_login_is_rejected() {
        let svc = service().await;
        svc.register_user(Registration {
            id: None,
            login: "alice".to_owned(),
            password: "first-password".to_owned(),
        })
        .await
        .unwrap();

        let err = svc
            .register_user(Registration {
                id: None,
                login: "alice".to_owned(),
                password: "second-password".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "login"));
    }
}
