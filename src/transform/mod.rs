//! Transformations applied by the tasks. Each works on in-memory content
//! and knows nothing about the project layout.

pub mod browsers;
pub mod bundle;
pub mod css;
pub mod include;
pub mod media_queries;
pub mod picture;
pub mod raster;
pub mod sass;
pub mod sfnt;
pub mod svg;
pub mod webp_css;
pub mod woff;
