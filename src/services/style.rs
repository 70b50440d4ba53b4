//! Style resolution for typography and color metrics.
//!
//! Without a rendering engine there is no cascade to consult, so the default
//! resolver only sees what an element declares about itself: its inline `style`
//! attribute and the legacy presentational attributes (`<font face color size>`,
//! `bgcolor`). Anything backed by a real engine can implement [`StyleResolver`]
//! and report itself as precise.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

lazy_static! {
    static ref COLOR_TOKEN: Regex =
        Regex::new(r"(?i)(#[0-9a-f]{3,8}\b|rgba?\([^)]*\)|hsla?\([^)]*\))").unwrap();
    static ref FONT_SHORTHAND: Regex = Regex::new(
        r"(?i)(\d+(?:\.\d+)?(?:px|em|rem|pt|%|vw|vh)|xx-small|x-small|small|medium|large|x-large|xx-large|smaller|larger)(?:\s*/\s*\S+)?\s+(.+)$"
    )
    .unwrap();
}

const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "gray", "grey",
    "silver", "maroon", "navy", "teal", "olive", "lime", "aqua", "fuchsia", "pink", "brown",
    "gold", "beige", "transparent", "currentcolor",
];

/// Style values an element resolves to, normalized for set membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
}

pub trait StyleResolver: Send + Sync {
    fn resolve(&self, element: &ElementRef<'_>) -> ResolvedStyle;

    /// True when values come from real computed styles. Imprecise resolvers get
    /// their counts supplemented and clamped by the extractor.
    fn is_precise(&self) -> bool {
        false
    }
}

/// Best-effort resolver reading inline declarations only.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleResolver;

impl InlineStyleResolver {
    pub fn new() -> Self {
        Self
    }

    fn apply_declaration(style: &mut ResolvedStyle, property: &str, value: &str) {
        match property {
            "font-family" => style.font_family = Some(normalize_family(value)),
            "font-size" => style.font_size = Some(normalize_value(value)),
            "color" => style.color = Some(normalize_color(value)),
            "background-color" => style.background_color = Some(normalize_color(value)),
            "background" => {
                if let Some(color) = extract_color(value) {
                    style.background_color = Some(color);
                }
            }
            "font" => {
                if let Some(caps) = FONT_SHORTHAND.captures(value) {
                    style.font_size = Some(normalize_value(&caps[1]));
                    style.font_family = Some(normalize_family(&caps[2]));
                }
            }
            _ => {}
        }
    }
}

impl StyleResolver for InlineStyleResolver {
    fn resolve(&self, element: &ElementRef<'_>) -> ResolvedStyle {
        let el = element.value();
        let mut style = ResolvedStyle::default();

        if el.name() == "font" {
            if let Some(face) = el.attr("face") {
                style.font_family = Some(normalize_family(face));
            }
            if let Some(size) = el.attr("size") {
                style.font_size = Some(format!("font-size-{}", size.trim()));
            }
            if let Some(color) = el.attr("color") {
                style.color = Some(normalize_color(color));
            }
        }

        if let Some(bgcolor) = el.attr("bgcolor") {
            style.background_color = Some(normalize_color(bgcolor));
        }

        if let Some(inline) = el.attr("style") {
            for (property, value) in parse_declarations(inline) {
                Self::apply_declaration(&mut style, &property, &value);
            }
        }

        style
    }
}

/// Splits an inline `style` attribute into lowercased `(property, value)` pairs.
pub fn parse_declarations(inline: &str) -> Vec<(String, String)> {
    inline
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn normalize_family(value: &str) -> String {
    value
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Lowercases and strips whitespace so `rgb(0, 0, 0)` and `RGB(0,0,0)` compare equal.
pub fn normalize_color(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// True for background values that paint nothing.
pub fn is_transparent(color: &str) -> bool {
    color == "transparent" || color == "rgba(0,0,0,0)"
}

fn extract_color(value: &str) -> Option<String> {
    if let Some(m) = COLOR_TOKEN.find(value) {
        return Some(normalize_color(m.as_str()));
    }
    value
        .split_whitespace()
        .map(|token| token.to_lowercase())
        .find(|token| NAMED_COLORS.contains(&token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    fn resolve_first(html: &str, selector: &str) -> ResolvedStyle {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        let element = document.select(&selector).next().unwrap();
        InlineStyleResolver::new().resolve(&element)
    }

    #[test]
    fn reads_inline_declarations() {
        let style = resolve_first(
            r#"<p style="Color: #FFF; background-color: rgb(0, 0, 0); font-family: 'Open Sans', Arial; font-size: 14px !important">x</p>"#,
            "p",
        );
        assert_eq!(style.color.as_deref(), Some("#fff"));
        assert_eq!(style.background_color.as_deref(), Some("rgb(0,0,0)"));
        assert_eq!(style.font_family.as_deref(), Some("open sans,arial"));
        assert_eq!(style.font_size.as_deref(), Some("14px"));
    }

    #[test]
    fn background_shorthand_yields_its_color() {
        let style = resolve_first(
            r#"<div style="background: url(a.png) no-repeat #123456">x</div>"#,
            "div",
        );
        assert_eq!(style.background_color.as_deref(), Some("#123456"));

        let named = resolve_first(r#"<div style="background: white">x</div>"#, "div");
        assert_eq!(named.background_color.as_deref(), Some("white"));
    }

    #[test]
    fn font_shorthand_splits_size_and_family() {
        let style = resolve_first(
            r#"<span style="font: italic 12px/1.5 Georgia, serif">x</span>"#,
            "span",
        );
        assert_eq!(style.font_size.as_deref(), Some("12px"));
        assert_eq!(style.font_family.as_deref(), Some("georgia,serif"));
    }

    #[test]
    fn legacy_attributes_count() {
        let style = resolve_first(
            r#"<table bgcolor="Red"><tr><td><font face="Verdana" color="red" size="3">x</font></td></tr></table>"#,
            "font",
        );
        assert_eq!(style.font_family.as_deref(), Some("verdana"));
        assert_eq!(style.color.as_deref(), Some("red"));

        let table = resolve_first(r#"<table bgcolor="Red"><tr><td>x</td></tr></table>"#, "table");
        assert_eq!(table.background_color.as_deref(), Some("red"));
    }

    #[test]
    fn unstyled_element_resolves_to_nothing() {
        assert_eq!(resolve_first("<p>plain</p>", "p"), ResolvedStyle::default());
    }

    #[test]
    fn transparent_backgrounds() {
        assert!(is_transparent(&normalize_color("rgba(0, 0, 0, 0)")));
        assert!(is_transparent("transparent"));
        assert!(!is_transparent("#000"));
    }
}
