//! Browser support policy: browserslist queries resolved once and shared by
//! the CSS prefixer and the script bundler.

use anyhow::Result;
use lightningcss::targets::{Browsers, Targets};

/// Bundler target used when the queries resolve to no known browser.
const FALLBACK_SCRIPT_TARGET: &str = "es2015";

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPolicy {
    browsers: Option<Browsers>,
}

impl BrowserPolicy {
    pub fn from_queries(queries: &[String]) -> Result<Self> {
        let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
            .map_err(|e| anyhow::anyhow!("Invalid browserslist query {:?}: {}", queries, e))?;
        Ok(Self { browsers })
    }

    /// Targets for lightningcss prefixing and minification.
    pub fn css_targets(&self) -> Targets {
        Targets { browsers: self.browsers, ..Targets::default() }
    }

    /// Comma-separated target list in the bundler's `--target` format,
    /// e.g. `chrome109,firefox115,safari15.6`.
    pub fn script_target(&self) -> String {
        let Some(b) = self.browsers else {
            return FALLBACK_SCRIPT_TARGET.to_string();
        };

        let entries = [
            ("chrome", b.chrome),
            ("edge", b.edge),
            ("firefox", b.firefox),
            ("ie", b.ie),
            ("ios", b.ios_saf),
            ("opera", b.opera),
            ("safari", b.safari),
        ];
        let targets: Vec<String> = entries
            .iter()
            .filter_map(|(name, version)| version.map(|v| format!("{}{}", name, format_version(v))))
            .collect();

        if targets.is_empty() {
            FALLBACK_SCRIPT_TARGET.to_string()
        } else {
            targets.join(",")
        }
    }
}

/// lightningcss packs versions as `major << 16 | minor << 8 | patch`.
fn format_version(packed: u32) -> String {
    let major = packed >> 16;
    let minor = (packed >> 8) & 0xff;
    if minor == 0 {
        major.to_string()
    } else {
        format!("{}.{}", major, minor)
    }
}
