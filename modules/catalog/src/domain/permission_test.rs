#[cfg(test)]
mod tests {
    use crate::domain::model::Method;
    use crate::domain::permission::{AclEntry, can_access};

    fn entry(group: Option<&str>, method: Method) -> AclEntry {
        AclEntry {
            group_id: group.map(str::to_owned),
            method,
        }
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_null_group_entry_matches_any_caller() {
        let entries = vec![entry(None, Method::Read)];
        assert!(can_access(&entries, &groups(&[]), Method::Read));
        assert!(can_access(&entries, &groups(&["users"]), Method::Read));
    }

    #[test]
    fn test_all_method_matches_every_requested_method() {
        let entries = vec![entry(Some("admins"), Method::All)];
        let g = groups(&["admins"]);
        assert!(can_access(&entries, &g, Method::Read));
        assert!(can_access(&entries, &g, Method::Write));
        assert!(can_access(&entries, &g, Method::Delete));
    }

    #[test]
    fn test_group_entry_requires_membership() {
        let entries = vec![entry(Some("admins"), Method::Read)];
        assert!(!can_access(&entries, &groups(&["users"]), Method::Read));
        assert!(can_access(&entries, &groups(&["users", "admins"]), Method::Read));
    }

    #[test]
    fn test_method_must_match_unless_all() {
        let entries = vec![entry(None, Method::Read)];
        assert!(!can_access(&entries, &groups(&[]), Method::Write));
        assert!(!can_access(&entries, &groups(&[]), Method::Delete));
    }

    #[test]
    fn test_empty_acl_denies_everyone() {
        assert!(!can_access(&[], &groups(&["admins"]), Method::Read));
        assert!(!can_access(&[], &groups(&[]), Method::Read));
    }

    #[test]
    fn test_any_single_matching_entry_grants() {
        let entries = vec![
            entry(Some("editors"), Method::Write),
            entry(Some("admins"), Method::All),
            entry(None, Method::Read),
        ];
        assert!(can_access(&entries, &groups(&["guests"]), Method::Read));
        assert!(can_access(&entries, &groups(&["editors"]), Method::Write));
        assert!(!can_access(&entries, &groups(&["guests"]), Method::Write));
    }
}
