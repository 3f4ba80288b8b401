//! Icon rasterization requests and SVG recoloring.

use iconflow_core::{HexColor, IconRef};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

/// Correlates a rasterization request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterTicket(pub u64);

impl fmt::Display for RasterTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host service turning an icon asset into pixels.
///
/// `request` must return immediately. The host later reports the result
/// through `Editor::icon_ready` with the same ticket. Implementations are
/// expected to run the markup through [`recolor_svg`] before rasterizing.
pub trait IconRasterizer {
    fn request(&mut self, ticket: RasterTicket, icon: &IconRef, color: HexColor);
}

static FILL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>^|\s)fill\s*=\s*"(?P<value>[^"]*)""#)
        .expect("fill attribute pattern")
});

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>^|\s)style\s*=\s*"(?P<value>[^"]*)""#)
        .expect("style attribute pattern")
});

static STYLE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<style[^>]*>)(.*?)(</style>)").expect("style element pattern")
});

static FILL_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>^|[;{])(?P<ws>\s*)fill\s*:\s*(?P<value>[^;}]*)")
        .expect("fill declaration pattern")
});

/// Rewrite every fill in an SVG document to `color`.
///
/// Covers `fill` attributes, `fill` declarations in `style` attributes and
/// in `<style>` rules. `none` fills stay unfilled.
pub fn recolor_svg(markup: &str, color: HexColor) -> String {
    let hex = color.to_hex();

    let markup = FILL_ATTR.replace_all(markup, |caps: &Captures| {
        if is_none(&caps["value"]) {
            caps[0].to_string()
        } else {
            format!("{}fill=\"{hex}\"", &caps["lead"])
        }
    });

    let markup = STYLE_ATTR.replace_all(&markup, |caps: &Captures| {
        format!(
            "{}style=\"{}\"",
            &caps["lead"],
            recolor_declarations(&caps["value"], &hex)
        )
    });

    STYLE_ELEMENT
        .replace_all(&markup, |caps: &Captures| {
            format!(
                "{}{}{}",
                &caps[1],
                recolor_declarations(&caps[2], &hex),
                &caps[3]
            )
        })
        .into_owned()
}

fn recolor_declarations(css: &str, hex: &str) -> String {
    FILL_DECL
        .replace_all(css, |caps: &Captures| {
            if is_none(&caps["value"]) {
                caps[0].to_string()
            } else {
                format!("{}{}fill:{hex}", &caps["lead"], &caps["ws"])
            }
        })
        .into_owned()
}

fn is_none(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("none")
}
