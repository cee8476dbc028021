use std::fmt;

/// Canonical binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparator {
    #[default]
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    /// Resolve a shortcut token, case-insensitively.
    /// Unknown tokens fall back to equality.
    pub fn resolve(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" | "===" => Self::Eq,

            "noteq" | "not" | "ne" | "nq" | "no" | "!" | "!=" | "!==" | "<>" => Self::Ne,

            "lt" | "<" => Self::Lt,

            "gt" | "bt" | "mt" | ">" => Self::Gt,

            "ltoreq" | "ltoe" | "lte" | "le" | "<=" | "<==" => Self::Le,

            "gtoreq" | "btoreq" | "mtoreq" | "gtoe" | "btoe" | "mtoe" | "gte" | "bte" | "mte"
            | "ge" | "be" | "me" | ">=" | ">==" => Self::Ge,

            _ => Self::Eq,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

impl From<&str> for Comparator {
    fn from(token: &str) -> Self {
        Self::resolve(token)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Shortcut token straight to its SQL operator text.
pub fn resolve_comparator(token: &str) -> &'static str {
    Comparator::resolve(token).as_sql()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_alias_resolves() {
        let table: &[(&str, &[&str])] = &[
            ("=", &["eq", "=", "==", "==="]),
            (
                "<>",
                &["noteq", "not", "ne", "nq", "no", "!", "!=", "!==", "<>"],
            ),
            ("<", &["lt", "<"]),
            (">", &["gt", "bt", "mt", ">"]),
            ("<=", &["ltoreq", "ltoe", "lte", "le", "<=", "<=="]),
            (
                ">=",
                &[
                    "gtoreq", "btoreq", "mtoreq", "gtoe", "btoe", "mtoe", "gte", "bte", "mte",
                    "ge", "be", "me", ">=", ">==",
                ],
            ),
        ];
        for (op, aliases) in table {
            for alias in *aliases {
                assert_eq!(resolve_comparator(alias), *op, "alias {alias}");
            }
        }
    }

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(Comparator::resolve("GTE"), Comparator::Ge);
        assert_eq!(Comparator::resolve("NoTeQ"), Comparator::Ne);
    }

    #[test]
    fn unknown_tokens_fall_back_to_equality() {
        assert_eq!(resolve_comparator("like"), "=");
        assert_eq!(resolve_comparator(""), "=");
        assert_eq!(resolve_comparator("nil"), "=");
    }
}
