//! Public-suffix matching (§4.3): `include_match ∧ ¬exclude_match` over a
//! list of rules, each either a plain suffix (`com`, `co.uk`), a wildcard
//! (`*.ck`), or an exclusion (`!www.ck`). No crate in the corpus provides
//! this, so it's grounded directly on the grammar the spec describes rather
//! than on a teacher file; the embedded list below is a deliberately small
//! curated subset (see DESIGN.md) rather than the full Mozilla PSL, and
//! `PublicSuffixList::with_rules` accepts a caller-supplied superset.

/// A loaded, queryable set of public-suffix rules.
pub struct PublicSuffixList {
    rules: Vec<String>,
}

impl PublicSuffixList {
    pub fn with_rules(rules: Vec<String>) -> Self {
        PublicSuffixList { rules }
    }

    /// The packaged default list: common gTLDs, ccTLDs, and a handful of
    /// widely used multi-label private registries.
    pub fn default_list() -> Self {
        PublicSuffixList::with_rules(DEFAULT_RULES.iter().map(|s| s.to_string()).collect())
    }

    /// Whether `domain` (already lowercased) is itself a public suffix.
    pub fn is_public_suffix(&self, domain: &str) -> bool {
        let include = self.rules.iter().filter(|r| !r.starts_with('!')).any(|rule| rule_matches(rule, domain));
        let exclude = self.rules.iter().filter(|r| r.starts_with('!')).any(|rule| rule_matches(&rule[1..], domain));
        include && !exclude
    }
}

fn rule_matches(rule: &str, domain: &str) -> bool {
    let rule_labels: Vec<&str> = rule.split('.').collect();
    let domain_labels: Vec<&str> = domain.split('.').collect();

    if rule_labels.len() != domain_labels.len() {
        return false;
    }

    rule_labels.iter().zip(domain_labels.iter()).all(|(rule_label, domain_label)| *rule_label == "*" || rule_label.eq_ignore_ascii_case(domain_label))
}

const DEFAULT_RULES: &[&str] = &[
    "com", "net", "org", "edu", "gov", "mil", "int", "biz", "info", "name", "pro",
    "uk", "de", "fr", "jp", "cn", "ru", "br", "in", "au", "ca", "us", "io", "co",
    "co.uk", "org.uk", "ac.uk", "gov.uk",
    "com.au", "net.au", "org.au",
    "co.jp", "ne.jp", "or.jp",
    "com.br", "net.br",
    "co.in", "net.in", "org.in",
    "github.io", "herokuapp.com", "netlify.app", "pages.dev", "vercel.app",
    "*.ck",
    "!www.ck",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_plain_and_two_label_suffixes() {
        let list = PublicSuffixList::default_list();
        assert!(list.is_public_suffix("com"));
        assert!(list.is_public_suffix("co.uk"));
        assert!(!list.is_public_suffix("example.com"));
    }

    #[test]
    fn wildcard_rule_with_exclusion() {
        let list = PublicSuffixList::default_list();
        assert!(list.is_public_suffix("foo.ck"));
        assert!(!list.is_public_suffix("www.ck"));
    }

    #[test]
    fn caller_supplied_rules_are_honored() {
        let list = PublicSuffixList::with_rules(vec!["example.com".to_string()]);
        assert!(list.is_public_suffix("example.com"));
        assert!(!list.is_public_suffix("other.com"));
    }
}
