//! Conservative SVG minification.
//!
//! Removes comments, the XML prolog, the doctype and whitespace between
//! tags; collapses whitespace runs inside tags. Attribute values (including
//! `viewBox`) and `<style>`/`<script>` contents are left untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static PROLOG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<\?xml.*?\?>").expect("valid regex"));
static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!DOCTYPE[^>\[]*(\[.*?\])?\s*>").expect("valid regex"));
static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").expect("valid regex"));
static RAW_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(style|script)\b[^>]*>.*?</(?:style|script)\s*>").expect("valid regex")
});

pub fn minify_svg(svg: &str) -> String {
    let text = PROLOG.replace_all(svg, "");
    let text = DOCTYPE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");

    // Leave raw blocks alone, minify everything between them.
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for block in RAW_BLOCK.find_iter(&text) {
        out.push_str(&minify_markup(&text[last..block.start()]));
        out.push_str(block.as_str());
        last = block.end();
    }
    out.push_str(&minify_markup(&text[last..]));

    BETWEEN_TAGS.replace_all(out.trim(), "><").into_owned()
}

/// Collapse whitespace runs outside quoted attribute values.
fn minify_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut in_tag = false;
    let mut pending_space = false;

    for c in text.chars() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            // Drop whitespace before the end of a tag.
            if !(in_tag && (c == '>' || c == '/')) && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '"' | '\'' if in_tag => quote = Some(c),
            _ => {}
        }
        out.push(c);
    }
    if pending_space && !out.is_empty() {
        out.push(' ');
    }
    out
}
