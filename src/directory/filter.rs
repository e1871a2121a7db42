//! Group search filter construction
//!
//! Every value coming from a caller is escaped with [`ldap3::ldap_escape`]
//! except objectGUID terms, which are rendered byte by byte as `\xx` and are
//! filter-safe by construction.

use std::borrow::Cow;
use std::fmt::Write;

use crate::config::DirectoryConfig;
use crate::error::{LdapdexError, Result};
use crate::models::{GroupAttribute, GroupQuery, SearchScope, SearchTerm};

/// A filter ready to be sent to the directory, with the base and scope it
/// applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterPlan {
    pub filter: String,
    pub base: String,
    pub scope: SearchScope,
}

/// Escape a literal for use inside a filter assertion
pub fn escape_value(value: &str) -> Cow<'_, str> {
    ldap3::ldap_escape(value)
}

/// Render a binary objectGUID as the `\xx\xx...` form accepted in filters
pub fn guid_to_filter_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for byte in bytes {
        let _ = write!(out, "\\{:02x}", byte);
    }
    out
}

fn clause(attr: GroupAttribute, term: &SearchTerm, exact_match: bool) -> Option<String> {
    let name = attr.ldap_name();
    match attr {
        GroupAttribute::Dn => None,
        GroupAttribute::ObjectGuid => {
            if term.is_empty() {
                return Some(format!("({}=*)", name));
            }
            let guid = guid_to_filter_string(term.as_bytes());
            if exact_match {
                Some(format!("({}={})", name, guid))
            } else {
                Some(format!("({}=*{}*)", name, guid))
            }
        }
        _ => {
            if term.is_empty() {
                return Some(format!("({}=*)", name));
            }
            let text = term.as_text();
            let value = escape_value(&text);
            if exact_match {
                Some(format!("({}={})", name, value))
            } else {
                Some(format!("({}=*{}*)", name, value))
            }
        }
    }
}

/// Build the filter expression for a group query.
///
/// Clauses are ANDed with `object_class_filter`. Fails with
/// [`LdapdexError::InvalidQuery`] when no attribute produces a clause, so an
/// unbounded search is never issued.
pub fn build_filter(query: &GroupQuery, object_class_filter: &str) -> Result<String> {
    let clauses: Vec<String> = query
        .terms()
        .filter_map(|(attr, term)| clause(attr, term, query.is_exact()))
        .collect();

    if clauses.is_empty() {
        return Err(LdapdexError::InvalidQuery(
            "no useful filter criteria given".to_string(),
        ));
    }

    let filter = format!("(&{}{})", clauses.concat(), object_class_filter);
    debug_assert!(is_well_formed(&filter));
    Ok(filter)
}

/// Build the filter and resolve the base and scope it runs against.
///
/// A `dn` term overrides the base, then the query's own base, then the
/// configured groups base.
pub fn plan_search(query: &GroupQuery, config: &DirectoryConfig) -> Result<FilterPlan> {
    let filter = build_filter(query, &config.object_class_filter())?;

    let base = match query.term(GroupAttribute::Dn) {
        Some(dn) if !dn.is_empty() => dn.as_text().into_owned(),
        _ => query
            .base()
            .unwrap_or_else(|| config.groups_base())
            .to_string(),
    };

    Ok(FilterPlan {
        filter,
        base,
        scope: query.scope().unwrap_or(config.groups_scope),
    })
}

/// Filter matching groups, optionally restricted to those listing `member`
pub fn membership_filter(object_class_filter: &str, member: Option<&str>) -> String {
    match member {
        Some(dn) => format!("(&{}(member={}))", object_class_filter, escape_value(dn)),
        None => object_class_filter.to_string(),
    }
}

/// Shallow grammar check: balanced parentheses, a single outer expression.
pub fn is_well_formed(filter: &str) -> bool {
    if !filter.starts_with('(') || !filter.ends_with(')') {
        return false;
    }
    let mut depth = 0i32;
    for (i, ch) in filter.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 || (depth == 0 && i != filter.len() - 1) {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const OC: &str = "(objectClass=groupOfNames)";

    #[test]
    fn test_exact_match_clause() {
        let query = GroupQuery::new().with(GroupAttribute::Cn, "ops").exact(true);
        let filter = build_filter(&query, OC).unwrap();
        assert_eq!(filter, "(&(cn=ops)(objectClass=groupOfNames))");
    }

    #[test]
    fn test_substring_clause() {
        let query = GroupQuery::new().with(GroupAttribute::Cn, "ops");
        let filter = build_filter(&query, OC).unwrap();
        assert!(filter.contains("(cn=*ops*)"));
    }

    #[test]
    fn test_empty_term_is_presence_check() {
        let query = GroupQuery::new().with(GroupAttribute::Mail, "").exact(true);
        let filter = build_filter(&query, OC).unwrap();
        assert!(filter.contains("(mail=*)"));
    }

    #[test]
    fn test_values_are_escaped() {
        let query = GroupQuery::new()
            .with(GroupAttribute::Cn, "a*(b)\\")
            .exact(true);
        let filter = build_filter(&query, OC).unwrap().to_ascii_lowercase();
        assert!(filter.contains("(cn=a\\2a\\28b\\29\\5c)"));
        assert!(is_well_formed(&filter));
    }

    #[test]
    fn test_guid_is_not_double_escaped() {
        let guid = vec![0x01, 0xab, 0x2a];
        assert_eq!(guid_to_filter_string(&guid), "\\01\\ab\\2a");

        let query = GroupQuery::new().with(GroupAttribute::ObjectGuid, guid);
        let filter = build_filter(&query, OC).unwrap();
        assert!(filter.contains("(objectGUID=*\\01\\ab\\2a*)"));
    }

    #[test]
    fn test_guid_exact_and_empty() {
        let query = GroupQuery::new()
            .with(GroupAttribute::ObjectGuid, vec![0x01u8, 0xab, 0x2a])
            .exact(true);
        assert_eq!(
            build_filter(&query, OC).unwrap(),
            "(&(objectGUID=\\01\\ab\\2a)(objectClass=groupOfNames))"
        );

        let query = GroupQuery::new().with(GroupAttribute::ObjectGuid, Vec::<u8>::new());
        assert_eq!(
            build_filter(&query, OC).unwrap(),
            "(&(objectGUID=*)(objectClass=groupOfNames))"
        );
    }

    #[test]
    fn test_no_clause_is_invalid() {
        let err = build_filter(&GroupQuery::new(), OC).unwrap_err();
        assert!(matches!(err, LdapdexError::InvalidQuery(_)));

        let dn_only = GroupQuery::new().with(GroupAttribute::Dn, "ou=groups,dc=x");
        assert!(matches!(
            build_filter(&dn_only, OC),
            Err(LdapdexError::InvalidQuery(_))
        ));

        let unknown_only = GroupQuery::from_pairs([("shoeSize", "42")]);
        assert!(build_filter(&unknown_only, OC).is_err());
    }

    #[test]
    fn test_dn_overrides_base() {
        let config = DirectoryConfig::new("ldap://dir", "dc=x").with_groups_base("ou=groups,dc=x");
        let query = GroupQuery::new()
            .with(GroupAttribute::Cn, "ops")
            .with(GroupAttribute::Dn, "ou=teams,dc=x")
            .with_base("ou=ignored,dc=x");
        let plan = plan_search(&query, &config).unwrap();
        assert_eq!(plan.base, "ou=teams,dc=x");
        assert!(!plan.filter.contains("dn="));

        let query = GroupQuery::new().with(GroupAttribute::Cn, "ops");
        let plan = plan_search(&query, &config).unwrap();
        assert_eq!(plan.base, "ou=groups,dc=x");
        assert_eq!(plan.scope, SearchScope::Subtree);
    }

    #[test]
    fn test_query_scope_override() {
        let config = DirectoryConfig::default();
        let query = GroupQuery::new()
            .with(GroupAttribute::Cn, "ops")
            .with_scope(SearchScope::OneLevel);
        assert_eq!(plan_search(&query, &config).unwrap().scope, SearchScope::OneLevel);
    }

    #[test]
    fn test_membership_filter() {
        assert_eq!(membership_filter(OC, None), OC);
        assert_eq!(
            membership_filter(OC, Some("uid=jo,dc=x")),
            "(&(objectClass=groupOfNames)(member=uid=jo,dc=x))"
        );
    }

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed("(&(cn=a)(objectClass=x))"));
        assert!(!is_well_formed("(cn=a)(cn=b)"));
        assert!(!is_well_formed("(cn=a"));
        assert!(!is_well_formed("cn=a"));
    }
}
