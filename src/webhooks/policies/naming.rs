//! Task naming validation policy.
//!
//! Validates:
//! - Every task name is a DNS-1123 label
//! - Task names are unique within the Job (exact, case-sensitive match)

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::ValidationContext;

/// Maximum length of a DNS-1123 label
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Pattern a DNS-1123 label must match in full
pub const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";

const DNS1123_LABEL_ERR_MSG: &str = "a DNS-1123 label must consist of lower case alphanumeric \
     characters or '-', and must start and end with an alphanumeric character";

/// Validate task name format and uniqueness
pub fn validate(ctx: &ValidationContext<'_>) -> Vec<String> {
    let mut violations = Vec::new();
    let mut seen = BTreeSet::new();

    for task in &ctx.job.spec.tasks {
        let errors = dns1123_label_errors(&task.name);
        if !errors.is_empty() {
            violations.push(format!(
                "task name '{}' is invalid: [{}]",
                task.name,
                errors.join(", ")
            ));
        }

        if !seen.insert(task.name.as_str()) {
            violations.push(format!("duplicated task name {}", task.name));
        }
    }

    violations
}

/// Reasons `value` is not a DNS-1123 label; empty when it is one.
pub fn dns1123_label_errors(value: &str) -> Vec<String> {
    // Pattern: ^[a-z0-9]([-a-z0-9]*[a-z0-9])?$
    static LABEL_RE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).ok());

    let mut errors = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {DNS1123_LABEL_MAX_LENGTH} characters"
        ));
    }
    if !LABEL_RE.as_ref().is_some_and(|re| re.is_match(value)) {
        errors.push(format!(
            "{DNS1123_LABEL_ERR_MSG} (e.g. 'my-name',  or '123-abc', \
             regex used for validation is '{DNS1123_LABEL_FMT}')"
        ));
    }
    errors
}
