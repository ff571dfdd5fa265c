#[cfg(test)]
mod tests {
    use crate::api::rest::query::parse_list_params;
    use crate::domain::error::DomainError;
    use crate::domain::model::{SortDir, SortKey};

    #[test]
    fn test_empty_query_is_default() {
        let params = parse_list_params("").unwrap();
        assert!(params.filters.is_empty());
        assert!(params.sort.is_none());
        assert_eq!(params.limit, None);
        assert_eq!(params.offset, None);
    }

    #[test]
    fn test_limit_offset_parsed() {
        let params = parse_list_params("limit=20&offset=40").unwrap();
        assert_eq!(params.limit, Some(20));
        assert_eq!(params.offset, Some(40));
    }

    #[test]
    fn test_bad_limit_rejected() {
        let err = parse_list_params("limit=abc").unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "limit"));
    }

    #[test]
    fn test_string_filter_with_all_fields() {
        let params = parse_list_params(
            "string%5B0%5D%5Battr%5D=title&string%5B0%5D%5Blang%5D=en&string%5B0%5D%5Blike%5D=shop",
        )
        .unwrap();
        assert_eq!(params.filters.strings.len(), 1);
        let f = &params.filters.strings[0];
        assert_eq!(f.attribute_id, "title");
        assert_eq!(f.language_id.as_deref(), Some("en"));
        assert_eq!(f.like.as_deref(), Some("shop"));
        assert_eq!(f.value, None);
    }

    #[test]
    fn test_unencoded_brackets_also_accepted() {
        let params = parse_list_params("string[0][attr]=title&string[0][value]=Shop").unwrap();
        assert_eq!(params.filters.strings.len(), 1);
        assert_eq!(params.filters.strings[0].value.as_deref(), Some("Shop"));
    }

    #[test]
    fn test_multiple_descriptors_keep_index_order() {
        let params = parse_list_params(
            "counter[1][attr]=area&counter[1][max]=90&counter[0][attr]=price&counter[0][min]=8",
        )
        .unwrap();
        assert_eq!(params.filters.counters.len(), 2);
        assert_eq!(params.filters.counters[0].attribute_id, "price");
        assert_eq!(params.filters.counters[0].min, Some(8.0));
        assert_eq!(params.filters.counters[1].attribute_id, "area");
        assert_eq!(params.filters.counters[1].max, Some(90.0));
    }

    #[test]
    fn test_point_filter_requires_both_fields() {
        let err = parse_list_params("point[0][attr]=region").unwrap_err();
        assert!(
            matches!(err, DomainError::WrongData { field, .. } if field == "point[0][point]")
        );
    }

    #[test]
    fn test_string_filter_requires_attr() {
        let err = parse_list_params("string[0][like]=shop").unwrap_err();
        assert!(
            matches!(err, DomainError::WrongData { field, .. } if field == "string[0][attr]")
        );
    }

    #[test]
    fn test_counter_value_must_be_numeric() {
        let err = parse_list_params("counter[0][attr]=price&counter[0][min]=cheap").unwrap_err();
        assert!(
            matches!(err, DomainError::WrongData { field, .. } if field == "counter[0][min]")
        );
    }

    #[test]
    fn test_unknown_filter_field_rejected() {
        let err = parse_list_params("string[0][regex]=x").unwrap_err();
        assert!(matches!(err, DomainError::WrongData { .. }));
    }

    #[test]
    fn test_native_sort_keys() {
        let params = parse_list_params("order=createdAt").unwrap();
        assert_eq!(params.sort, Some((SortKey::CreatedAt, SortDir::Asc)));

        let params = parse_list_params("order=updatedAt&orderDir=desc").unwrap();
        assert_eq!(params.sort, Some((SortKey::UpdatedAt, SortDir::Desc)));
    }

    #[test]
    fn test_attribute_sort_key_with_language() {
        let params = parse_list_params("order=string:title:en&orderDir=desc").unwrap();
        assert_eq!(
            params.sort,
            Some((
                SortKey::StringAttr {
                    attribute_id: "title".to_owned(),
                    language_id: Some("en".to_owned()),
                },
                SortDir::Desc
            ))
        );
    }

    #[test]
    fn test_attribute_sort_key_without_language() {
        let params = parse_list_params("order=string:title").unwrap();
        assert_eq!(
            params.sort,
            Some((
                SortKey::StringAttr {
                    attribute_id: "title".to_owned(),
                    language_id: None,
                },
                SortDir::Asc
            ))
        );
    }

    #[test]
    fn test_unsupported_sort_key_rejected() {
        let err = parse_list_params("order=price").unwrap_err();
        assert!(matches!(err, DomainError::WrongData { field, .. } if field == "order"));
    }

    #[test]
    fn test_unknown_top_level_keys_ignored() {
        let params = parse_list_params("utm_source=mail&limit=5").unwrap();
        assert_eq!(params.limit, Some(5));
        assert!(params.filters.is_empty());
    }
}
