/// Directory-safe form of an instance name: lower-cased, spaces become hyphens.
pub fn kebab_slug(s: &str) -> String {
    s.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_slug_lowercases_and_hyphenates() {
        assert_eq!(kebab_slug("Variant Caller"), "variant-caller");
        assert_eq!(kebab_slug("BQSR  Stage"), "bqsr--stage");
        assert_eq!(kebab_slug("manager"), "manager");
    }

    #[test]
    fn test_kebab_slug_keeps_other_characters() {
        assert_eq!(kebab_slug("Align_v2.1"), "align_v2.1");
    }
}
