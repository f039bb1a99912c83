//! Wrap raster `<img>` tags in `<picture>` with a WebP `<source>`.

use once_cell::sync::Lazy;
use regex::Regex;

static TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<picture\b[^>]*>)|(</picture\s*>)|(<img\b[^>]*>)").expect("valid regex")
});

static SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Rewrite every `<img>` that references a JPEG or PNG and is not already
/// inside a `<picture>`.
pub fn wrap_images(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut depth = 0usize;
    let mut last = 0;

    for caps in TAGS.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.get(1).is_some() {
            depth += 1;
            continue;
        }
        if caps.get(2).is_some() {
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth > 0 {
            continue;
        }
        let tag = whole.as_str();
        let Some(webp) = webp_source(tag) else { continue };

        out.push_str(&html[last..whole.start()]);
        out.push_str("<picture><source srcset=\"");
        out.push_str(&webp);
        out.push_str("\" type=\"image/webp\">");
        out.push_str(tag);
        out.push_str("</picture>");
        last = whole.end();
    }

    out.push_str(&html[last..]);
    out
}

/// WebP sibling URL for an `<img>` tag's `src`, if it is a raster image.
fn webp_source(tag: &str) -> Option<String> {
    let caps = SRC.captures(tag)?;
    let src = caps.get(1).or_else(|| caps.get(2))?.as_str();

    let end = src.find(['?', '#']).unwrap_or(src.len());
    let (path, suffix) = src.split_at(end);
    let dot = path.rfind('.')?;
    let ext = &path[dot + 1..];
    if ext.contains('/') || !RASTER_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        return None;
    }
    Some(format!("{}.webp{}", &path[..dot], suffix))
}
