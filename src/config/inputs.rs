// ABOUTME: Named action inputs read from the process environment.
// ABOUTME: INPUT_<NAME> wins over the plain SCREAMING_SNAKE variable derived from the name.

use std::collections::HashMap;

/// Snapshot of environment variables that inputs are resolved from.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    vars: HashMap<String, String>,
}

impl Inputs {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up an input by its camelCase name.
    ///
    /// Checks `INPUT_<NAME>` (the Actions runner convention) and then the
    /// variable named by [`env_key`]. Blank values count as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        let action_key = format!("INPUT_{}", name.trim().replace(' ', "_").to_uppercase());
        self.var(&action_key)
            .or_else(|| self.var(&env_key(name)))
            .map(str::to_string)
    }

    /// A raw variable, ignoring blank values.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| parse_bool(&v))
    }
}

/// `nowToken` -> `NOW_TOKEN`, `teamId` -> `TEAM_ID`.
pub fn env_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            key.push('_');
        }
        if ch == '-' || ch == ' ' {
            key.push('_');
        } else {
            key.extend(ch.to_uppercase());
        }
    }
    key
}

/// `true`, `1`, `yes` and `on` (any case) are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Split a comma- or newline-separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
