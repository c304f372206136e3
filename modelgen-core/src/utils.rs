//! Shared string utilities.

use indexmap::IndexMap;

/// Replace `${name}` placeholders with values from `vars`.
///
/// Unknown placeholders and unterminated `${` sequences are left untouched.
pub fn replace_vars(text: &str, vars: &IndexMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => result.push_str(value),
                    None => result.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Check if a string contains at least one `${...}` placeholder.
pub fn has_vars(text: &str) -> bool {
    text.find("${")
        .is_some_and(|start| text[start + 2..].contains('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> IndexMap<String, String> {
        IndexMap::from([
            ("root".to_string(), "/tmp/out".to_string()),
            ("pkg".to_string(), "com.example".to_string()),
        ])
    }

    #[test]
    fn test_replace_vars() {
        assert_eq!(replace_vars("${root}/src", &vars()), "/tmp/out/src");
        assert_eq!(
            replace_vars("${pkg}.${pkg}", &vars()),
            "com.example.com.example"
        );
        assert_eq!(replace_vars("plain", &vars()), "plain");
        assert_eq!(replace_vars("", &vars()), "");
    }

    #[test]
    fn test_replace_vars_unknown_left_untouched() {
        assert_eq!(replace_vars("${missing}/x", &vars()), "${missing}/x");
        assert_eq!(replace_vars("a ${root", &vars()), "a ${root");
    }

    #[test]
    fn test_has_vars() {
        assert!(has_vars("${root}"));
        assert!(!has_vars("$root"));
        assert!(!has_vars("${root"));
    }
}
