use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Directory attributes a group query may constrain.
///
/// Variant order is the order clauses appear in a built filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupAttribute {
    Cn,
    Mail,
    Dn,
    ObjectGuid,
    Description,
    Member,
    UniqueMember,
    Owner,
    Ou,
    DisplayName,
    SamAccountName,
}

impl GroupAttribute {
    pub const ALL: [GroupAttribute; 11] = [
        GroupAttribute::Cn,
        GroupAttribute::Mail,
        GroupAttribute::Dn,
        GroupAttribute::ObjectGuid,
        GroupAttribute::Description,
        GroupAttribute::Member,
        GroupAttribute::UniqueMember,
        GroupAttribute::Owner,
        GroupAttribute::Ou,
        GroupAttribute::DisplayName,
        GroupAttribute::SamAccountName,
    ];

    /// Attribute name as it appears in a search filter
    pub fn ldap_name(&self) -> &'static str {
        match self {
            GroupAttribute::Cn => "cn",
            GroupAttribute::Mail => "mail",
            GroupAttribute::Dn => "dn",
            GroupAttribute::ObjectGuid => "objectGUID",
            GroupAttribute::Description => "description",
            GroupAttribute::Member => "member",
            GroupAttribute::UniqueMember => "uniqueMember",
            GroupAttribute::Owner => "owner",
            GroupAttribute::Ou => "ou",
            GroupAttribute::DisplayName => "displayName",
            GroupAttribute::SamAccountName => "sAMAccountName",
        }
    }

    /// Look up an attribute by name; LDAP attribute names are case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.ldap_name().eq_ignore_ascii_case(name))
    }
}

/// Value searched for on a single attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchTerm {
    Text(String),
    /// Raw bytes, e.g. an Active Directory objectGUID
    Binary(Vec<u8>),
}

impl SearchTerm {
    pub fn is_empty(&self) -> bool {
        match self {
            SearchTerm::Text(s) => s.is_empty(),
            SearchTerm::Binary(b) => b.is_empty(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SearchTerm::Text(s) => s.as_bytes(),
            SearchTerm::Binary(b) => b,
        }
    }

    /// Text form of the term; binary terms are decoded lossily
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            SearchTerm::Text(s) => Cow::Borrowed(s.as_str()),
            SearchTerm::Binary(b) => String::from_utf8_lossy(b),
        }
    }
}

impl From<&str> for SearchTerm {
    fn from(value: &str) -> Self {
        SearchTerm::Text(value.to_string())
    }
}

impl From<String> for SearchTerm {
    fn from(value: String) -> Self {
        SearchTerm::Text(value)
    }
}

impl From<Vec<u8>> for SearchTerm {
    fn from(value: Vec<u8>) -> Self {
        SearchTerm::Binary(value)
    }
}

impl From<&[u8]> for SearchTerm {
    fn from(value: &[u8]) -> Self {
        SearchTerm::Binary(value.to_vec())
    }
}

/// Depth of a directory search below its base
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchScope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

impl From<SearchScope> for ldap3::Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => ldap3::Scope::Base,
            SearchScope::OneLevel => ldap3::Scope::OneLevel,
            SearchScope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// Parameters of a group search
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuery {
    terms: BTreeMap<GroupAttribute, SearchTerm>,
    exact_match: bool,
    base: Option<String>,
    scope: Option<SearchScope>,
}

impl GroupQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from loosely typed `(attribute, term)` pairs.
    ///
    /// Pairs naming an attribute outside [`GroupAttribute::ALL`] are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SearchTerm>,
    {
        let mut query = Self::new();
        for (name, term) in pairs {
            match GroupAttribute::from_name(name.as_ref()) {
                Some(attr) => {
                    query.terms.insert(attr, term.into());
                }
                None => {
                    tracing::debug!(
                        attribute = name.as_ref(),
                        "ignoring unrecognized group attribute"
                    );
                }
            }
        }
        query
    }

    pub fn with(mut self, attr: GroupAttribute, term: impl Into<SearchTerm>) -> Self {
        self.terms.insert(attr, term.into());
        self
    }

    pub fn exact(mut self, exact_match: bool) -> Self {
        self.exact_match = exact_match;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (GroupAttribute, &SearchTerm)> {
        self.terms.iter().map(|(attr, term)| (*attr, term))
    }

    pub fn term(&self, attr: GroupAttribute) -> Option<&SearchTerm> {
        self.terms.get(&attr)
    }

    pub fn is_exact(&self) -> bool {
        self.exact_match
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn scope(&self) -> Option<SearchScope> {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_is_case_insensitive() {
        assert_eq!(GroupAttribute::from_name("CN"), Some(GroupAttribute::Cn));
        assert_eq!(
            GroupAttribute::from_name("objectguid"),
            Some(GroupAttribute::ObjectGuid)
        );
        assert_eq!(GroupAttribute::from_name("userPassword"), None);
    }

    #[test]
    fn test_from_pairs_drops_unknown_attributes() {
        let query = GroupQuery::from_pairs([("cn", "ops"), ("shoeSize", "42")]);
        let attrs: Vec<_> = query.terms().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec![GroupAttribute::Cn]);
    }

    #[test]
    fn test_terms_follow_attribute_order() {
        let query = GroupQuery::new()
            .with(GroupAttribute::Description, "x")
            .with(GroupAttribute::Cn, "y");
        let attrs: Vec<_> = query.terms().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec![GroupAttribute::Cn, GroupAttribute::Description]);
    }

    #[test]
    fn test_search_term_emptiness() {
        assert!(SearchTerm::from("").is_empty());
        assert!(SearchTerm::from(Vec::new()).is_empty());
        assert!(!SearchTerm::from(vec![0u8]).is_empty());
    }
}
