//! Regex safety validator
//!
//! Scans every text field of an action (target plus string payload values,
//! one level of nesting) against families of injection and tampering
//! patterns. Each family reports at most one reason per field, formatted
//! `safety:<family>:<pattern>`.

use committee_domain::validation::schema_reasons;
use committee_domain::{Action, ActionValidator, ValidationContext, ValidationReport};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

const SQL_INJECTION: &[&str] = &[
    r"'\s*OR\s+1\s*=\s*1",
    r"';\s*DROP\s+TABLE",
    r"--",
    r"'\s*OR\s+'1'\s*=\s*'1",
    r"UNION\s+SELECT",
    r"';",
];

const XSS: &[&str] = &[
    r"<script[^>]*>",
    r"javascript:",
    r"onerror\s*=",
    r"onload\s*=",
    r"<iframe",
];

const COMMAND_INJECTION: &[&str] = &[
    r";\s*rm\s+-rf",
    r"\|\s*cat\s+/etc/passwd",
    r"&&",
    r"\|\|",
    r"`.*`",
    r"\$\(.*\)",
];

const PATH_TRAVERSAL: &[&str] = &[r"\.\./", r"\.\.", r"\\\\\.\.\\\\"];

// `(?:[^0-9]|$)` stands in for a negative digit lookahead
const PRICE_MANIPULATION: &[&str] = &[
    r#"price["']?\s*:\s*-"#,
    r#"price["']?\s*:\s*0(?:\.0+)?(?:[^0-9]|$)"#,
    r#"price["']?\s*:\s*9{5,}"#,
];

const QUANTITY_MANIPULATION: &[&str] = &[
    r#"quantity["']?\s*:\s*-"#,
    r#"quantity["']?\s*:\s*0(?:[^0-9]|$)"#,
    r#"quantity["']?\s*:\s*\d{3,}"#,
];

const STOCK_MANIPULATION: &[&str] = &[r#"stock["']?\s*:\s*-"#];

static DEFAULT_FAMILIES: LazyLock<Vec<PatternFamily>> = LazyLock::new(|| {
    [
        ("sql_injection", SQL_INJECTION),
        ("xss", XSS),
        ("command_injection", COMMAND_INJECTION),
        ("path_traversal", PATH_TRAVERSAL),
        ("price_manipulation", PRICE_MANIPULATION),
        ("quantity_manipulation", QUANTITY_MANIPULATION),
        ("stock_manipulation", STOCK_MANIPULATION),
    ]
    .into_iter()
    .map(|(name, patterns)| PatternFamily::compile_lossy(name, patterns))
    .collect()
});

/// A named group of case-insensitive patterns
#[derive(Debug, Clone)]
pub struct PatternFamily {
    name: String,
    patterns: Vec<(String, Regex)>,
}

impl PatternFamily {
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Ok((p.to_string(), Regex::new(&format!("(?i){}", p))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            name: name.into(),
            patterns,
        })
    }

    fn compile_lossy(name: &str, patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Regex::new(&format!("(?i){}", p)) {
                Ok(re) => Some((p.to_string(), re)),
                Err(e) => {
                    warn!("Skipping invalid {} pattern {}: {}", name, p, e);
                    None
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            patterns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First pattern matching `text`, in declaration order
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(source, _)| source.as_str())
    }
}

/// Schema checks plus regex safety families
#[derive(Debug, Clone)]
pub struct PatternValidator {
    families: Vec<PatternFamily>,
    safety_enabled: bool,
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternValidator {
    /// Validator with the built-in families
    pub fn new() -> Self {
        Self {
            families: DEFAULT_FAMILIES.clone(),
            safety_enabled: true,
        }
    }

    /// Globally switch safety scanning; scenarios can only turn it further off
    pub fn with_safety_checks(mut self, enabled: bool) -> Self {
        self.safety_enabled = enabled;
        self
    }

    pub fn with_family(mut self, family: PatternFamily) -> Self {
        self.families.push(family);
        self
    }

    pub fn family_names(&self) -> Vec<&str> {
        self.families.iter().map(PatternFamily::name).collect()
    }

    fn safety_reasons(&self, action: &Action) -> Vec<String> {
        let mut reasons = Vec::new();
        for text in action.text_fields() {
            for family in &self.families {
                if let Some(pattern) = family.first_match(&text) {
                    reasons.push(format!("safety:{}:{}", family.name, pattern));
                }
            }
        }
        reasons
    }
}

impl ActionValidator for PatternValidator {
    fn validate(&self, action: &Action, ctx: &ValidationContext) -> ValidationReport {
        let safety = if self.safety_enabled && ctx.safety_checks {
            self.safety_reasons(action)
        } else {
            Vec::new()
        };
        if !safety.is_empty() {
            debug!("Safety patterns matched for {}: {:?}", action, safety);
        }
        ValidationReport::from_reasons(schema_reasons(action), safety)
    }
}
