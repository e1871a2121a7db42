use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value placed in `cn` when a search degrades to an exception record
pub const NOT_APPLICABLE: &str = "n/a";

/// A normalized group entry: the entry's DN plus the first value of every
/// non-empty attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    dn: String,
    attributes: BTreeMap<String, String>,
}

impl GroupRecord {
    pub(crate) fn new(dn: String, mut attributes: BTreeMap<String, String>) -> Self {
        attributes.retain(|name, _| !name.eq_ignore_ascii_case("dn"));
        Self { dn, attributes }
    }

    /// Synthetic record carrying a directory failure in the `dn` field
    pub(crate) fn exception(message: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("cn".to_string(), NOT_APPLICABLE.to_string());
        Self {
            dn: message.into(),
            attributes,
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn cn(&self) -> Option<&str> {
        self.get("cn")
    }

    /// Look up an attribute; `"dn"` resolves to the entry's DN
    pub fn get(&self, attr: &str) -> Option<&str> {
        if attr == "dn" {
            return Some(&self.dn);
        }
        self.attributes.get(attr).map(String::as_str)
    }

    /// Attributes other than `dn`
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Flatten into a single map including the `dn` key
    pub fn into_map(self) -> BTreeMap<String, String> {
        let mut map = self.attributes;
        map.insert("dn".to_string(), self.dn);
        map
    }
}

/// `(cn, dn)` pair returned when listing groups
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupSummary {
    pub cn: String,
    pub dn: String,
}

impl GroupSummary {
    pub fn new(cn: impl Into<String>, dn: impl Into<String>) -> Self {
        Self {
            cn: cn.into(),
            dn: dn.into(),
        }
    }

    pub fn field(&self, field: GroupField) -> &str {
        match field {
            GroupField::Cn => &self.cn,
            GroupField::Dn => &self.dn,
        }
    }
}

/// One column of a [`GroupSummary`], for listings that return only names
/// or only DNs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupField {
    Cn,
    Dn,
}

impl GroupField {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("cn") {
            Some(GroupField::Cn)
        } else if name.eq_ignore_ascii_case("dn") {
            Some(GroupField::Dn)
        } else {
            None
        }
    }
}
