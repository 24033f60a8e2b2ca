//! Security probe classification for security-testing scenarios

/// Fields whose values are expected to be numeric
const NUMERIC_FIELDS: &[&str] = &["#minPrice", "#maxPrice"];

/// Label the kind of probe a fill value represents
pub fn classify_security_probe(target: &str, value: &str) -> String {
    let lower = value.to_lowercase();
    let upper = value.to_uppercase();
    let numeric_field = NUMERIC_FIELDS.contains(&target);

    let kind = if lower.contains("<script") || lower.contains("alert") {
        "XSS test"
    } else if upper.contains("' OR") || value.contains("1=1") {
        "SQL injection test"
    } else if numeric_field && value.starts_with('-') {
        "Negative value test"
    } else if numeric_field && !is_plain_number(value) {
        "Non-numeric test"
    } else {
        "Input validation test"
    };

    format!("{} in {}", kind, target)
}

fn is_plain_number(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| *c != '-' && *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify_security_probe("#q", "<SCRIPT>x"), "XSS test in #q");
        assert_eq!(classify_security_probe("#q", "' or 1=1 --"), "SQL injection test in #q");
        assert_eq!(classify_security_probe("#minPrice", "-5"), "Negative value test in #minPrice");
        assert_eq!(classify_security_probe("#maxPrice", "abc"), "Non-numeric test in #maxPrice");
        assert_eq!(classify_security_probe("#maxPrice", "200"), "Input validation test in #maxPrice");
        assert_eq!(classify_security_probe("#email", "abc"), "Input validation test in #email");
    }
}
