use std::fmt;

/// Machine-readable error codes for scripts and dashboards consuming `tally`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfig,
    UnsupportedConfigFormat,
    SourceUnavailable,
    MalformedExport,
    ItemNotFound,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::InvalidConfig => "E1003",
            Self::UnsupportedConfigFormat => "E1004",
            Self::SourceUnavailable => "E4001",
            Self::MalformedExport => "E4002",
            Self::ItemNotFound => "E2001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfig => "Invalid configuration",
            Self::UnsupportedConfigFormat => "Unsupported config file format",
            Self::SourceUnavailable => "Issue source unavailable",
            Self::MalformedExport => "Malformed issue export",
            Self::ItemNotFound => "Item not found",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the config file and retry."),
            Self::InvalidConfig => {
                Some("Set --jira-server, --jira-token and --jira-jql, the JIRA_* env vars, or the [jira] config section.")
            }
            Self::UnsupportedConfigFormat => Some("Use a .toml, .yaml, .yml or .json config file."),
            Self::SourceUnavailable => Some("Check the server URL, token and network access."),
            Self::MalformedExport => {
                Some("Export issues with `expand=changelog` from the Jira search API.")
            }
            Self::ItemNotFound => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// Snake-case identifier used in structured CLI error output.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ConfigParseError => "config_parse_error",
            Self::InvalidConfig => "invalid_config",
            Self::UnsupportedConfigFormat => "unsupported_config_format",
            Self::SourceUnavailable => "source_unavailable",
            Self::MalformedExport => "malformed_export",
            Self::ItemNotFound => "item_not_found",
            Self::InternalUnexpected => "internal_unexpected",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 7] = [
        ErrorCode::ConfigParseError,
        ErrorCode::InvalidConfig,
        ErrorCode::UnsupportedConfigFormat,
        ErrorCode::SourceUnavailable,
        ErrorCode::MalformedExport,
        ErrorCode::ItemNotFound,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let rendered = code.code();
            assert_eq!(rendered.len(), 5);
            assert!(rendered.starts_with('E'));
            assert!(rendered.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn slugs_are_snake_case() {
        for code in ALL {
            assert!(
                code.slug()
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '_'),
                "bad slug {}",
                code.slug()
            );
        }
    }
}
