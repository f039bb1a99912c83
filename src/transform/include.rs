//! `@@include` template expansion.
//!
//! Directive syntax: `@@include('path/to/partial.html'[, { "json": "context" }])`.
//! Paths are relative to the including file. Inside an included file,
//! `@@name` (or `@@a.b` for nested values) is replaced by the value from the
//! context passed to it; unknown names are left untouched.

use regex::{Captures, Regex};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DIRECTIVE: &str = "@@include(";

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@@([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("Cannot read {path} (included from {from})")]
    Missing {
        path: PathBuf,
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Include cycle: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    Cycle(Vec<PathBuf>),
    #[error("Malformed @@include in {file}: {message}")]
    Syntax { file: PathBuf, message: String },
    #[error("Invalid include context in {file}")]
    Context {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Expand every directive in the file at `path`.
pub fn expand_file(path: &Path) -> Result<String, IncludeError> {
    let text = fs::read_to_string(path).map_err(|source| IncludeError::Missing {
        path: path.to_path_buf(),
        from: path.to_path_buf(),
        source,
    })?;
    let mut stack = vec![identity(path)];
    expand_with(&text, path, &Map::new(), &mut stack)
}

/// Expand directives in `text`, which was read from `file`.
pub fn expand(text: &str, file: &Path, context: &Map<String, Value>) -> Result<String, IncludeError> {
    let mut stack = vec![identity(file)];
    expand_with(text, file, context, &mut stack)
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn expand_with(
    text: &str,
    file: &Path,
    context: &Map<String, Value>,
    stack: &mut Vec<PathBuf>,
) -> Result<String, IncludeError> {
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(DIRECTIVE) {
        out.push_str(&rest[..start]);
        let after = &rest[start + DIRECTIVE.len()..];
        let directive = parse_directive(after).map_err(|message| IncludeError::Syntax {
            file: file.to_path_buf(),
            message,
        })?;

        let mut child_context = context.clone();
        if let Some(json) = directive.context {
            let parsed: Map<String, Value> = serde_json::from_str(json)
                .map_err(|source| IncludeError::Context { file: file.to_path_buf(), source })?;
            child_context.extend(parsed);
        }

        let target = dir.join(directive.path);
        let key = identity(&target);
        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(IncludeError::Cycle(chain));
        }

        let included = fs::read_to_string(&target).map_err(|source| IncludeError::Missing {
            path: target.clone(),
            from: file.to_path_buf(),
            source,
        })?;

        stack.push(key);
        let expanded = expand_with(&included, &target, &child_context, stack)?;
        stack.pop();

        out.push_str(&substitute(&expanded, &child_context));
        rest = &after[directive.consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

struct Directive<'a> {
    path: &'a str,
    context: Option<&'a str>,
    /// Bytes consumed after `@@include(`, including the closing paren
    consumed: usize,
}

fn parse_directive(input: &str) -> Result<Directive<'_>, String> {
    let bytes = input.as_bytes();
    let mut i = skip_ws(bytes, 0);

    let quote = *bytes.get(i).ok_or("unexpected end of input")?;
    if quote != b'\'' && quote != b'"' {
        return Err("expected a quoted path".to_string());
    }
    let path_start = i + 1;
    let path_len = input[path_start..]
        .find(quote as char)
        .ok_or("unterminated path string")?;
    let path = &input[path_start..path_start + path_len];
    i = skip_ws(bytes, path_start + path_len + 1);

    let mut context = None;
    if bytes.get(i) == Some(&b',') {
        i = skip_ws(bytes, i + 1);
        if bytes.get(i) != Some(&b'{') {
            return Err("expected a JSON object after ','".to_string());
        }
        let end = matching_brace(bytes, i).ok_or("unbalanced braces in context")?;
        context = Some(&input[i..=end]);
        i = skip_ws(bytes, end + 1);
    }

    if bytes.get(i) != Some(&b')') {
        return Err("expected ')'".to_string());
    }

    Ok(Directive { path, context, consumed: i + 1 })
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

/// Index of the `}` closing the `{` at `open`, skipping string literals.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[open..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn substitute(text: &str, context: &Map<String, Value>) -> String {
    if context.is_empty() {
        return text.to_string();
    }
    VARIABLE
        .replace_all(text, |caps: &Captures| match lookup(context, &caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn lookup<'a>(context: &'a Map<String, Value>, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut value = context.get(parts.next()?)?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_plain_include() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "_header.html", "<header>Hi</header>");
        let index = write(temp.path(), "index.html", "<body>@@include('_header.html')</body>");

        assert_eq!(expand_file(&index).unwrap(), "<body><header>Hi</header></body>");
    }

    #[test]
    fn test_context_and_nesting() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "parts/_title.html", "<h1>@@title</h1>");
        write(
            temp.path(),
            "parts/_head.html",
            "<head>@@include(\"_title.html\")<meta name=\"x\" content=\"@@meta.author\"></head>",
        );
        let index = write(
            temp.path(),
            "index.html",
            "@@include('parts/_head.html', {\n  \"title\": \"Shop {1}\",\n  \"meta\": {\"author\": \"Ann\"}\n})",
        );

        assert_eq!(
            expand_file(&index).unwrap(),
            "<head><h1>Shop {1}</h1><meta name=\"x\" content=\"Ann\"></head>"
        );
    }

    #[test]
    fn test_unknown_variable_untouched() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "_p.html", "@@missing and @@count");
        let index = write(temp.path(), "index.html", "@@include('_p.html', {\"count\": 3})");

        assert_eq!(expand_file(&index).unwrap(), "@@missing and 3");
    }

    #[test]
    fn test_cycle_detected() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "_a.html", "@@include('_b.html')");
        write(temp.path(), "_b.html", "@@include('_a.html')");
        let index = write(temp.path(), "index.html", "@@include('_a.html')");

        assert!(matches!(expand_file(&index), Err(IncludeError::Cycle(chain)) if chain.len() == 4));
    }

    #[test]
    fn test_missing_partial() {
        let temp = TempDir::new().unwrap();
        let index = write(temp.path(), "index.html", "@@include('_nope.html')");

        assert!(matches!(expand_file(&index), Err(IncludeError::Missing { .. })));
    }

    #[test]
    fn test_malformed_directive() {
        let temp = TempDir::new().unwrap();
        let index = write(temp.path(), "index.html", "@@include(_header.html)");

        assert!(matches!(expand_file(&index), Err(IncludeError::Syntax { .. })));
    }
}
