//! Next-gen image class rewriting for stylesheets.
//!
//! A style rule whose `background`/`background-image` points at a JPEG or PNG
//! keeps its selector but gets the `.webp` URL, and a fallback rule prefixed
//! with [`NO_WEBP_CLASS`] restores the original image for browsers without
//! WebP.

use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::Property;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::selector::{Combinator, Component, Selector, SelectorList};
use lightningcss::values::ident::Ident;
use lightningcss::values::image::Image;
use once_cell::sync::Lazy;
use regex::Regex;

/// Class the client sets on `<html>` when WebP is unsupported.
pub const NO_WEBP_CLASS: &str = "no-webp";

static RASTER_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+)\.(?:jpe?g|png)((?:[?#].*)?)$").expect("valid regex"));

/// The `.webp` counterpart of a JPEG or PNG URL.
fn webp_url(url: &str) -> Option<String> {
    let caps = RASTER_URL.captures(url)?;
    Some(format!("{}.webp{}", &caps[1], &caps[2]))
}

fn is_raster(image: &Image<'_>) -> bool {
    matches!(image, Image::Url(url) if RASTER_URL.is_match(&url.url))
}

fn to_webp(image: &mut Image<'_>) {
    if let Image::Url(url) = image {
        if let Some(webp) = webp_url(&url.url) {
            url.url = webp.into();
        }
    }
}

/// Background declarations that reference a raster image.
fn is_raster_background(property: &Property<'_>) -> bool {
    match property {
        Property::Background(layers) => layers.iter().any(|layer| is_raster(&layer.image)),
        Property::BackgroundImage(images) => images.iter().any(is_raster),
        _ => false,
    }
}

fn rewrite_property(property: &mut Property<'_>) {
    match property {
        Property::Background(layers) => layers.iter_mut().for_each(|layer| to_webp(&mut layer.image)),
        Property::BackgroundImage(images) => images.iter_mut().for_each(to_webp),
        _ => {}
    }
}

/// Rewrite every style rule in `rules`, descending into `@media` and
/// `@supports`.
pub fn rewrite_backgrounds(rules: &mut CssRuleList<'_>) {
    let mut out = Vec::with_capacity(rules.0.len());

    for rule in rules.0.drain(..) {
        match rule {
            CssRule::Media(mut media) => {
                rewrite_backgrounds(&mut media.rules);
                out.push(CssRule::Media(media));
            }
            CssRule::Supports(mut supports) => {
                rewrite_backgrounds(&mut supports.rules);
                out.push(CssRule::Supports(supports));
            }
            CssRule::Style(mut style) => {
                let fallback = fallback_rule(&style);
                if fallback.is_some() {
                    style.declarations.declarations.iter_mut().for_each(rewrite_property);
                    style.declarations.important_declarations.iter_mut().for_each(rewrite_property);
                }
                out.push(CssRule::Style(style));
                out.extend(fallback.map(CssRule::Style));
            }
            other => out.push(other),
        }
    }

    rules.0 = out;
}

/// The `.no-webp` rule carrying the original raster backgrounds of `style`.
fn fallback_rule<'i>(style: &StyleRule<'i>) -> Option<StyleRule<'i>> {
    let pick = |props: &[Property<'i>]| -> Vec<Property<'i>> {
        props.iter().filter(|p| is_raster_background(p)).cloned().collect()
    };
    let declarations = DeclarationBlock {
        declarations: pick(&style.declarations.declarations),
        important_declarations: pick(&style.declarations.important_declarations),
    };
    if declarations.declarations.is_empty() && declarations.important_declarations.is_empty() {
        return None;
    }

    Some(StyleRule {
        selectors: SelectorList::new(style.selectors.0.iter().map(prefixed).collect()),
        vendor_prefix: style.vendor_prefix,
        declarations,
        rules: CssRuleList(Vec::new()),
        loc: style.loc,
    })
}

/// `selector` as a descendant of [`NO_WEBP_CLASS`].
fn prefixed<'i>(selector: &Selector<'i>) -> Selector<'i> {
    // Raw order is right-to-left by compound, left-to-right inside one.
    let mut compounds: Vec<Vec<Component<'i>>> = vec![Vec::new()];
    let mut combinators = Vec::new();
    for component in selector.iter_raw_match_order() {
        match component {
            Component::Combinator(combinator) => {
                combinators.push(*combinator);
                compounds.push(Vec::new());
            }
            other => {
                if let Some(compound) = compounds.last_mut() {
                    compound.push(other.clone());
                }
            }
        }
    }

    let mut parse_order = vec![
        Component::Class(Ident(NO_WEBP_CLASS.into())),
        Component::Combinator(Combinator::Descendant),
    ];
    while let Some(compound) = compounds.pop() {
        parse_order.extend(compound);
        if let Some(combinator) = combinators.pop() {
            parse_order.push(Component::Combinator(combinator));
        }
    }
    Selector::from(parse_order)
}
