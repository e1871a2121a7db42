/// Split a distinguished name into its RDN components.
///
/// Commas escaped with a backslash stay inside their component. With
/// `notypes` each component is reduced to its value (`cn=ops` -> `ops`).
pub fn explode_dn(dn: &str, notypes: bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            ',' => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|rdn| rdn.trim().to_string())
        .filter(|rdn| !rdn.is_empty())
        .map(|rdn| {
            if notypes {
                match rdn.split_once('=') {
                    Some((_, value)) => value.trim().to_string(),
                    None => rdn,
                }
            } else {
                rdn
            }
        })
        .collect()
}

/// Value of the leftmost RDN, e.g. the group name of `cn=ops,ou=groups`
pub fn leading_rdn_value(dn: &str) -> Option<String> {
    explode_dn(dn, true).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_with_types() {
        assert_eq!(
            explode_dn("cn=ops, ou=groups,dc=example", false),
            vec!["cn=ops", "ou=groups", "dc=example"]
        );
    }

    #[test]
    fn test_explode_without_types() {
        assert_eq!(
            explode_dn("cn=ops,ou=groups", true),
            vec!["ops", "groups"]
        );
    }

    #[test]
    fn test_escaped_comma_stays_in_component() {
        assert_eq!(
            explode_dn("cn=Smith\\, J,ou=people", true),
            vec!["Smith\\, J", "people"]
        );
    }

    #[test]
    fn test_empty_dn() {
        assert!(explode_dn("", false).is_empty());
        assert_eq!(leading_rdn_value(""), None);
        assert_eq!(leading_rdn_value("cn=ops,dc=x").as_deref(), Some("ops"));
    }
}
