/// Whether `name` is an acceptable native host name.
///
/// Names are dot-separated segments of lowercase ASCII letters, digits and
/// underscores, e.g. `com.example.my_host`. Empty segments (leading, trailing
/// or doubled dots) are rejected. This is checked before a name is ever used
/// to build a filesystem path.
pub fn is_valid_host_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reverse_domain_names() {
        for name in ["a", "com.example.host", "my_host.v2", "x1.y_2.z3"] {
            assert!(is_valid_host_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "",
            ".leading",
            "trailing.",
            "double..dot",
            "Upper.case",
            "has-dash",
            "../escape",
            "with/slash",
            "spa ce",
            "ünicode",
        ] {
            assert!(!is_valid_host_name(name), "{name:?} should be invalid");
        }
    }
}
