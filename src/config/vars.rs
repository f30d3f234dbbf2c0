//! Environment variable interpolation for config files.
//!
//! Supports `$VAR`, `${VAR}`, `${VAR:-default}` (default when unset or
//! empty) and `$$` as an escape for a literal `$`.

use regex::Regex;
use std::env;
use std::sync::LazyLock;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$                                # literal $
        |
        \$\{([A-Za-z_][A-Za-z0-9_]*)        # ${VAR (group 1)
            (?::-([^}]*))?                  # optional :-default (group 2)
        \}
        |
        \$([A-Za-z_][A-Za-z0-9_]*)          # bare $VAR (group 3)
        ",
    )
    .expect("invalid interpolation pattern")
});

/// Interpolate environment variables in the given text.
///
/// All failures are accumulated so the user sees every missing variable at
/// once rather than one per invocation.
pub fn interpolate(input: &str) -> Result<String, Vec<String>> {
    let mut errors = Vec::new();

    let text = VAR_PATTERN.replace_all(input, |caps: &regex::Captures| {
        let matched = caps.get(0).unwrap().as_str();
        if matched == "$$" {
            return "$".to_string();
        }

        let name = caps
            .get(1)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let default = caps.get(2).map(|m| m.as_str());

        match env::var(name) {
            Ok(value) if value.is_empty() && default.is_some() => {
                default.unwrap_or_default().to_string()
            }
            Ok(value) => value,
            Err(_) => match default {
                Some(d) => d.to_string(),
                None => {
                    errors.push(format!("environment variable '{name}' is not set"));
                    matched.to_string()
                }
            },
        }
    });

    if errors.is_empty() {
        Ok(text.into_owned())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();
        // SAFETY: tests in this module use distinct variable names and
        // restore the environment before returning.
        for (key, value) in vars {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
        let result = f();
        for (key, original) in saved {
            match original {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
        result
    }

    #[test]
    fn substitutes_bare_and_braced() {
        with_env(
            &[
                ("BRREG_VARS_A", Some("one")),
                ("BRREG_VARS_B", Some("two")),
            ],
            || {
                let out = interpolate("a: $BRREG_VARS_A, b: ${BRREG_VARS_B}").unwrap();
                assert_eq!(out, "a: one, b: two");
            },
        );
    }

    #[test]
    fn default_applies_when_unset_or_empty() {
        with_env(
            &[
                ("BRREG_VARS_UNSET", None),
                ("BRREG_VARS_EMPTY", Some("")),
            ],
            || {
                let out =
                    interpolate("${BRREG_VARS_UNSET:-x} ${BRREG_VARS_EMPTY:-y}").unwrap();
                assert_eq!(out, "x y");
            },
        );
    }

    #[test]
    fn missing_variables_are_all_reported() {
        with_env(
            &[("BRREG_VARS_M1", None), ("BRREG_VARS_M2", None)],
            || {
                let errors = interpolate("$BRREG_VARS_M1 $BRREG_VARS_M2").unwrap_err();
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("BRREG_VARS_M1"));
            },
        );
    }

    #[test]
    fn dollar_escape() {
        assert_eq!(interpolate("cost: $$5").unwrap(), "cost: $5");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "connection_string: none of this is a variable";
        assert_eq!(interpolate(text).unwrap(), text);
    }
}
