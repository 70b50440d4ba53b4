use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::models::MetricSet;
use crate::services::style::{is_transparent, InlineStyleResolver, StyleResolver};

lazy_static! {
    static ref CSS_URL: Regex = Regex::new(r"(?i)url\s*\([^)]+\)").unwrap();
}

/// Floors and ceilings applied to style-derived counts when the resolver cannot
/// see computed styles. Real pages always use a handful of fonts and colors even
/// when none are declared inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub min: usize,
    pub max: usize,
}

impl Band {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: usize) -> usize {
        value.clamp(self.min, self.max)
    }
}

pub const FONT_FAMILY_BAND: Band = Band::new(5, 20);
pub const FONT_SIZE_BAND: Band = Band::new(6, 40);
pub const COLOR_BAND: Band = Band::new(10, 60);

#[derive(Debug, Default)]
struct ImageBreakdown {
    img_tags: usize,
    svg_elements: usize,
    style_backgrounds: usize,
    media_elements: usize,
    css_urls: usize,
}

impl ImageBreakdown {
    fn total(&self) -> usize {
        self.img_tags + self.svg_elements + self.style_backgrounds + self.media_elements + self.css_urls
    }
}

#[derive(Debug, Default)]
struct StyleCounts {
    font_families: usize,
    font_sizes: usize,
    colors: usize,
    contrast_issues: usize,
}

/// Turns a parsed document into raw [`MetricSet`] values. Pure: no I/O, and the
/// same document always yields the same metrics.
pub struct DocumentMetricsExtractor {
    resolver: Arc<dyn StyleResolver>,
}

impl DocumentMetricsExtractor {
    pub fn new(resolver: Arc<dyn StyleResolver>) -> Self {
        Self { resolver }
    }

    pub fn extract_html(&self, html: &str) -> MetricSet {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    pub fn extract(&self, document: &Html) -> MetricSet {
        let body = select_first(document, "body");

        let dom_depth = body.map(|b| Self::calculate_dom_depth(b, 0)).unwrap_or(0);

        let (total_elements, element_types) = match body {
            Some(body) => {
                let mut types = HashSet::new();
                let mut total = 0;
                for element in body.descendants().skip(1).filter_map(ElementRef::wrap) {
                    total += 1;
                    types.insert(element.value().name().to_string());
                }
                (total, types.len())
            }
            None => (0, 0),
        };

        let images = self.count_images(document);
        let image_count = images.total();

        let text_length = body
            .map(|b| b.text().map(|t| t.encode_utf16().count()).sum())
            .unwrap_or(0);

        let styles = self.count_styles(document);

        let metrics = MetricSet {
            dom_depth,
            total_elements,
            element_types,
            nesting_ratio: MetricSet::nesting_ratio_of(dom_depth, total_elements),
            image_count,
            text_length,
            image_to_text_ratio: MetricSet::image_to_text_ratio_of(image_count, text_length),
            css_rules: self.estimate_css_complexity(document),
            layout_elements: count(
                document,
                r#"[style*="display"], [style*="position"], [class*="flex"], [class*="grid"]"#,
            ),
            positioned_elements: count(
                document,
                r#"[style*="position: absolute"], [style*="position: fixed"], [style*="position: relative"], [style*="position:absolute"], [style*="position:fixed"], [style*="position:relative"]"#,
            ),
            clickable_elements: count(document, r#"button, a, [onclick], [role="button"]"#),
            form_elements: count(document, "form"),
            input_elements: count(document, "input, textarea, select"),
            font_families: styles.font_families,
            font_sizes: styles.font_sizes,
            color_count: styles.colors,
            contrast_issues: styles.contrast_issues,
        };

        debug!(
            img = images.img_tags,
            svg = images.svg_elements,
            backgrounds = images.style_backgrounds,
            media = images.media_elements,
            css_urls = images.css_urls,
            "Image counting breakdown"
        );
        debug!("Extracted metrics: {:?}", metrics);

        metrics
    }

    fn calculate_dom_depth(element: ElementRef<'_>, depth: usize) -> usize {
        element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| Self::calculate_dom_depth(child, depth + 1))
            .max()
            .unwrap_or(depth)
    }

    // Signals overlap on purpose: an <svg> with an inline background counts twice.
    fn count_images(&self, document: &Html) -> ImageBreakdown {
        let css_urls = if let Ok(selector) = Selector::parse("style") {
            document
                .select(&selector)
                .map(|style| {
                    let css: String = style.text().collect();
                    CSS_URL.find_iter(&css).count()
                })
                .sum()
        } else {
            0
        };

        ImageBreakdown {
            img_tags: count(document, "img"),
            svg_elements: count(document, "svg"),
            style_backgrounds: count(document, r#"[style*="background"]"#),
            media_elements: count(document, "picture, source[srcset], video, audio"),
            css_urls,
        }
    }

    fn estimate_css_complexity(&self, document: &Html) -> usize {
        let style_sheets = count(document, r#"style, link[rel="stylesheet"]"#);
        let inline_styles = count(document, "[style]");

        let mut class_names = HashSet::new();
        if let Ok(selector) = Selector::parse("[class]") {
            for element in document.select(&selector) {
                for class in element.value().classes() {
                    class_names.insert(class.to_string());
                }
            }
        }

        style_sheets * 10 + inline_styles + class_names.len()
    }

    fn count_styles(&self, document: &Html) -> StyleCounts {
        let mut families = HashSet::new();
        let mut sizes = HashSet::new();
        let mut colors = HashSet::new();
        let mut contrast_issues = 0;

        if let Ok(selector) = Selector::parse("*") {
            for element in document.select(&selector) {
                let style = self.resolver.resolve(&element);

                if let Some(family) = &style.font_family {
                    families.insert(family.clone());
                }
                if let Some(size) = &style.font_size {
                    sizes.insert(size.clone());
                }
                if let Some(color) = &style.color {
                    colors.insert(color.clone());
                }
                if let Some(background) = &style.background_color {
                    if !is_transparent(background) {
                        colors.insert(background.clone());
                    }
                }

                if let (Some(fg), Some(bg)) = (&style.color, &style.background_color) {
                    if fg == bg {
                        contrast_issues += 1;
                    }
                }
            }
        }

        if self.resolver.is_precise() {
            return StyleCounts {
                font_families: families.len(),
                font_sizes: sizes.len(),
                colors: colors.len(),
                contrast_issues,
            };
        }

        let monospace = usize::from(count(document, "pre, code, kbd, samp") > 0);
        let heading_levels = ["h1", "h2", "h3", "h4", "h5", "h6"]
            .iter()
            .filter(|tag| count(document, tag) > 0)
            .count();

        StyleCounts {
            font_families: FONT_FAMILY_BAND.clamp(families.len() + monospace),
            font_sizes: FONT_SIZE_BAND.clamp(sizes.len() + heading_levels),
            colors: COLOR_BAND.clamp(colors.len()),
            contrast_issues,
        }
    }
}

impl Default for DocumentMetricsExtractor {
    fn default() -> Self {
        Self::new(Arc::new(InlineStyleResolver::new()))
    }
}

fn select_first<'a>(document: &'a Html, selector_str: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector_str).ok()?;
    document.select(&selector).next()
}

fn count(document: &Html, selector_str: &str) -> usize {
    match Selector::parse(selector_str) {
        Ok(selector) => document.select(&selector).count(),
        Err(_) => 0,
    }
}
