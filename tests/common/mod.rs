//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use assembly::config::Config;
use assembly::BuildContext;
use image::{ImageFormat, Rgb, RgbImage};
use walkdir::WalkDir;

pub const OUTPUT: &str = "site";

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn context(root: &Path) -> BuildContext {
    let mut config = Config::default();
    config.paths.output = Some(OUTPUT.to_string());
    BuildContext::new(root, config)
}

/// A minimal TrueType font with the tables the converters care about.
pub fn ttf() -> Vec<u8> {
    let tables: [(&[u8; 4], Vec<u8>); 4] = [
        (b"OS/2", vec![0, 4, 1, 2, 3, 4]),
        (b"glyf", vec![7u8; 120]),
        (b"head", vec![0, 1, 0, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0x5f, 0x0f, 0x3c, 0xf5]),
        (b"name", b"Integration test font. ".repeat(10)),
    ];

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in &tables {
        let sum = data.chunks(4).fold(0u32, |acc, c| {
            let mut word = [0u8; 4];
            word[..c.len()].copy_from_slice(c);
            acc.wrapping_add(u32::from_be_bytes(word))
        });
        out.extend_from_slice(*tag);
        out.extend_from_slice(&sum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        out.resize((out.len() + 3) & !3, 0);
    }
    out
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Every file under `dir` with its contents, sorted by path.
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().strip_prefix(dir).unwrap().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}

/// A small but complete source tree. Scripts are left out so the build
/// does not depend on a bundler being installed.
pub fn sample_project(root: &Path) {
    write(root, "src/_header.html", "<header>@@title</header>");
    write(
        root,
        "src/index.html",
        "<html><body>@@include('_header.html', {\"title\": \"Welcome\"})\n<img src=\"img/photo.png\" alt=\"\"></body></html>\n",
    );
    write(
        root,
        "src/sass/style.scss",
        "@mixin font($family, $file, $weight, $style) {\n\
         \x20 @font-face {\n\
         \x20   font-family: $family;\n\
         \x20   src: url(\"../fonts/#{$file}.woff2\") format(\"woff2\");\n\
         \x20   font-weight: unquote($weight);\n\
         \x20   font-style: unquote($style);\n\
         \x20 }\n\
         }\n\
         @import \"fonts/fonts\";\n\
         .hero { background: url(\"../img/photo.png\") no-repeat; }\n\
         @media (max-width: 600px) { .hero { display: none; } }\n\
         .nav { user-select: none; }\n\
         @media (min-width: 900px) { .nav { display: flex; } }\n",
    );
    write(root, "src/fonts/Roboto-Regular.ttf", ttf());
    write(root, "src/img/photo.png", png(24, 24));
    write(root, "src/img/icons/dot.svg", "<?xml version=\"1.0\"?>\n<svg viewBox=\"0 0 2 2\">\n  <circle r=\"1\"/>\n</svg>\n");
}
