//! Vendor prefixing, minification and source maps via lightningcss.

use anyhow::{anyhow, Result};
use lightningcss::rules::CssRuleList;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;

#[derive(Debug, Clone)]
pub struct CssOutput {
    /// Stylesheet text ending in a `sourceMappingURL` comment
    pub code: String,
    /// Source map JSON
    pub map: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CssOptions<'a> {
    /// Name recorded as the map's single source. The input text is embedded
    /// as that source's content, so mappings resolve into the text passed to
    /// [`process`], not into whatever it was compiled from.
    pub source_name: &'a str,
    /// File name of the map, referenced from the trailing comment
    pub map_name: &'a str,
    pub targets: Targets,
    pub minify: bool,
}

/// Prefix (and optionally minify) `css` for the configured targets.
pub fn process(css: &str, options: CssOptions<'_>) -> Result<CssOutput> {
    process_with(css, options, |_| {})
}

/// Like [`process`], with `edit` applied to the parsed top-level rules
/// before prefixing.
pub fn process_with<F>(css: &str, options: CssOptions<'_>, edit: F) -> Result<CssOutput>
where
    F: for<'i> FnOnce(&mut CssRuleList<'i>),
{
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions { filename: options.source_name.to_string(), ..ParserOptions::default() },
    )
    .map_err(|e| anyhow!("Failed to parse CSS for {}: {}", options.source_name, e))?;

    edit(&mut sheet.rules);
    sheet
        .minify(MinifyOptions { targets: options.targets, ..MinifyOptions::default() })
        .map_err(|e| anyhow!("Failed to transform CSS for {}: {}", options.source_name, e))?;

    let mut source_map = SourceMap::new("/");
    let index = source_map.add_source(options.source_name);
    source_map
        .set_source_content(index as usize, css)
        .map_err(|e| anyhow!("Failed to build source map: {:?}", e))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: options.minify,
            targets: options.targets,
            source_map: Some(&mut source_map),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("Failed to print CSS for {}: {}", options.source_name, e))?;

    let map = source_map
        .to_json(None)
        .map_err(|e| anyhow!("Failed to serialize source map: {:?}", e))?;

    let mut code = printed.code;
    if !options.minify {
        code.push('\n');
    }
    code.push_str(&format!("/*# sourceMappingURL={} */\n", options.map_name));

    Ok(CssOutput { code, map })
}
