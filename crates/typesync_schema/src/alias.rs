/// Convert a type or property name into its alias.
///
/// Words are split on anything that is not alphanumeric and joined in
/// camelCase. Case inside a word is kept, so `NewsPage` becomes `newsPage`.
/// Leading digits are dropped because aliases must start with a letter.
pub fn to_alias(name: &str) -> String {
    let mut alias = String::with_capacity(name.len());

    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = if alias.is_empty() {
            word.trim_start_matches(|c: char| c.is_numeric())
        } else {
            word
        };

        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };

        if alias.is_empty() {
            alias.extend(first.to_lowercase());
        } else {
            alias.extend(first.to_uppercase());
        }
        alias.push_str(chars.as_str());
    }

    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_alias("NewsPage"), "newsPage");
        assert_eq!(to_alias("Article"), "article");
    }

    #[test]
    fn test_separators() {
        assert_eq!(to_alias("news page"), "newsPage");
        assert_eq!(to_alias("Home_Page"), "homePage");
        assert_eq!(to_alias("  body-text  "), "bodyText");
    }

    #[test]
    fn test_leading_digits_dropped() {
        assert_eq!(to_alias("2nd Page"), "ndPage");
        assert_eq!(to_alias("123"), "");
    }
}
