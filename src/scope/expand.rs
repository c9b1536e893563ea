//! `{{ name }}` expression expansion.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::JobError;

/// Matches `{{ name }}` with optional inner whitespace.
static VAR_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("variable expression pattern is valid")
});

/// Any other non-empty `{{ ... }}` pair, such as `{{ my var }}` or `{{ $x }}`.
static MALFORMED_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^{}]*)\}\}").expect("malformed expression pattern is valid")
});

/// Fails when a literal segment still holds a brace pair with a name in it.
/// Empty pairs (`{{}}`) are left alone.
fn reject_malformed(segment: &str) -> Result<(), JobError> {
    let leftover = MALFORMED_EXPR
        .captures_iter(segment)
        .filter_map(|caps| caps.get(1))
        .map(|inner| inner.as_str().trim())
        .find(|inner| !inner.is_empty());
    match leftover {
        Some(name) => Err(JobError::UnresolvedVariable {
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Substitutes every reference in `expr` with the value returned by `lookup`.
///
/// Fails on the first name `lookup` cannot resolve, and on brace pairs whose
/// content is not a valid name; nothing is returned partially substituted.
/// Substituted values are not expanded again.
pub(crate) fn expand<'s>(
    expr: &str,
    lookup: impl Fn(&str) -> Option<&'s str>,
) -> Result<String, JobError> {
    if !expr.contains("{{") {
        return Ok(expr.to_string());
    }

    let mut out = String::with_capacity(expr.len());
    let mut last = 0;
    for caps in VAR_EXPR.captures_iter(expr) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = lookup(name.as_str()).ok_or_else(|| JobError::UnresolvedVariable {
            name: name.as_str().to_string(),
        })?;

        let literal = &expr[last..whole.start()];
        reject_malformed(literal)?;
        out.push_str(literal);
        out.push_str(value);
        last = whole.end();
    }
    reject_malformed(&expr[last..])?;
    out.push_str(&expr[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<&'static str> {
        match name {
            "user" => Some("alice"),
            "dir.out" => Some("/tmp/out"),
            "brace" => Some("{{ user }}"),
            _ => None,
        }
    }

    #[test]
    fn test_no_references_is_noop() {
        assert_eq!(expand("plain text", lookup).unwrap(), "plain text");
        assert_eq!(expand("", lookup).unwrap(), "");
        assert_eq!(expand("{ not } {{}}", lookup).unwrap(), "{ not } {{}}");
    }

    #[test]
    fn test_substitution() {
        assert_eq!(
            expand("hi {{user}}, out={{ dir.out }}/{{  user  }}", lookup).unwrap(),
            "hi alice, out=/tmp/out/alice"
        );
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        assert_eq!(expand("{{ brace }}", lookup).unwrap(), "{{ user }}");
    }

    #[test]
    fn test_malformed_reference_is_error() {
        for (expr, name) in [
            ("{{ my var }}", "my var"),
            ("echo {{ $x }}", "$x"),
            ("{{ user }} then {{ user! }}", "user!"),
            ("{{ a/b }} {{ user }}", "a/b"),
        ] {
            assert_eq!(
                expand(expr, lookup),
                Err(JobError::UnresolvedVariable { name: name.into() }),
                "{expr}"
            );
        }
    }

    #[test]
    fn test_unresolved_is_error() {
        let err = expand("{{ user }} {{ missing }}", lookup).unwrap_err();
        assert_eq!(
            err,
            JobError::UnresolvedVariable {
                name: "missing".into()
            }
        );
    }
}
