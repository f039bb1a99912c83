//! Sass compilation.

use std::path::Path;

/// Compile the Sass entry point at `path` to expanded CSS. `@use`/`@import`
/// resolve relative to the file and to its directory.
pub fn compile(path: &Path) -> Result<String, Box<grass::Error>> {
    let mut options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .quiet(true);
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }
    grass::from_path(path, &options)
}
