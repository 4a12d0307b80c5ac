//! Resolved CSS styles, the visual-styling predicates built on them, and the
//! normalized `StyleRecord` attached to extracted text.
//!
//! Everything here is pure: predicates and mappings operate on plain values
//! so they can be exercised without a rendering engine.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::units;

/// The subset of `getComputedStyle` a snapshot carries for every element.
///
/// Values are the browser's resolved strings (`"16px"`, `"rgba(0, 0, 0, 0)"`,
/// `"none"`); empty strings stand for "not reported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub position: String,
    pub color: String,
    pub background_color: String,
    pub background_image: String,
    pub border_top_width: String,
    pub border_right_width: String,
    pub border_bottom_width: String,
    pub border_left_width: String,
    pub border_radius: String,
    pub box_shadow: String,
    pub backdrop_filter: String,
    pub webkit_backdrop_filter: String,
    pub font_family: String,
    pub font_weight: String,
    pub font_style: String,
    pub font_size: String,
    pub text_decoration: String,
    pub text_transform: String,
    pub text_align: String,
    pub line_height: String,
    pub margin_top: String,
    pub margin_bottom: String,
    pub padding_left: String,
    pub transform: String,
}

fn is_none(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == "none"
}

impl ResolvedStyle {
    /// display ≠ none, visibility ≠ hidden, opacity ≠ 0
    pub fn is_visible(&self) -> bool {
        self.display != "none"
            && self.visibility != "hidden"
            && self.opacity.trim().parse::<f64>().map_or(true, |o| o != 0.0)
    }

    pub fn has_background_color(&self) -> bool {
        Rgba::parse(&self.background_color).map_or(false, |c| c.a > 0.0)
    }

    pub fn has_background_image(&self) -> bool {
        !is_none(&self.background_image)
    }

    pub fn has_border(&self) -> bool {
        [
            &self.border_top_width,
            &self.border_right_width,
            &self.border_bottom_width,
            &self.border_left_width,
        ]
        .iter()
        .any(|w| units::parse_px(w).map_or(false, |px| px > 0.0))
    }

    pub fn has_box_shadow(&self) -> bool {
        !is_none(&self.box_shadow)
    }

    /// Any corner radius other than zero (`"0px"` or `"0px 0px"` are zero).
    pub fn has_border_radius(&self) -> bool {
        self.border_radius
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|part| !part.is_empty())
            .any(|part| units::parse_px(part.trim_end_matches('%')).map_or(false, |v| v != 0.0))
    }

    pub fn has_backdrop_filter(&self) -> bool {
        !is_none(&self.backdrop_filter) || !is_none(&self.webkit_backdrop_filter)
    }

    pub fn is_out_of_flow(&self) -> bool {
        self.position == "absolute" || self.position == "fixed"
    }

    pub fn font_size_pt(&self) -> f64 {
        units::parse_pt(&self.font_size).unwrap_or(12.0)
    }

    /// Line height in points; `normal` falls back to 1.2 × font size.
    pub fn line_spacing_pt(&self) -> f64 {
        units::parse_pt(&self.line_height)
            .filter(|v| *v > 0.0)
            .unwrap_or_else(|| self.font_size_pt() * 1.2)
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == "italic" || self.font_style == "oblique"
    }

    pub fn is_underlined(&self) -> bool {
        self.text_decoration.contains("underline")
    }

    pub fn weight(&self) -> u16 {
        parse_font_weight(&self.font_weight)
    }

    pub fn text_transform(&self) -> TextTransform {
        TextTransform::parse(&self.text_transform)
    }

    pub fn alignment(&self) -> Alignment {
        Alignment::parse(&self.text_align)
    }

    /// Rotation in degrees recovered from a resolved `matrix(a, b, c, d, e, f)`.
    pub fn rotation_degrees(&self) -> Option<f64> {
        let inner = self
            .transform
            .trim()
            .strip_prefix("matrix(")?
            .strip_suffix(')')?;
        let parts: Vec<f64> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        if parts.len() != 6 {
            return None;
        }
        let deg = parts[1].atan2(parts[0]).to_degrees();
        let deg = (deg * 100.0).round() / 100.0;
        if deg == 0.0 {
            None
        } else {
            Some(if deg < 0.0 { deg + 360.0 } else { deg })
        }
    }
}

/// Has a visible box treatment worth preserving as an image: background
/// color or image, a border, a shadow, rounded corners on a background, or
/// a backdrop filter.
pub fn is_visually_styled(style: &ResolvedStyle) -> bool {
    let background = style.has_background_color();
    let background_image = style.has_background_image();
    background
        || background_image
        || style.has_border()
        || style.has_box_shadow()
        || (style.has_border_radius() && (background || background_image))
        || style.has_backdrop_filter()
}

/// Absolutely or fixed positioned and visually styled.
pub fn is_decorative(style: &ResolvedStyle) -> bool {
    style.is_out_of_flow() && is_visually_styled(style)
}

/// An sRGB color with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
    /// Whether the source string carried an alpha component
    pub explicit_alpha: bool,
}

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*([\d.]+)\s*[,\s]\s*([\d.]+)\s*[,\s]\s*([\d.]+)\s*(?:[,/]\s*([\d.]+)(%?)\s*)?\)$")
        .expect("valid color pattern")
});

impl Rgba {
    pub fn parse(value: &str) -> Option<Rgba> {
        let v = value.trim();
        if v == "transparent" {
            return Some(Rgba { r: 0, g: 0, b: 0, a: 0.0, explicit_alpha: true });
        }
        if let Some(hex) = v.strip_prefix('#') {
            if hex.len() == 6 {
                let n = u32::from_str_radix(hex, 16).ok()?;
                return Some(Rgba {
                    r: (n >> 16) as u8,
                    g: (n >> 8) as u8,
                    b: n as u8,
                    a: 1.0,
                    explicit_alpha: false,
                });
            }
            return None;
        }
        let caps = RGB_RE.captures(v)?;
        let channel = |i: usize| -> Option<u8> {
            caps.get(i)?.as_str().parse::<f64>().ok().map(|c| c.round().clamp(0.0, 255.0) as u8)
        };
        let (a, explicit_alpha) = match caps.get(4) {
            Some(m) => {
                let raw = m.as_str().parse::<f64>().ok()?;
                let pct = caps.get(5).map_or(false, |p| p.as_str() == "%");
                ((if pct { raw / 100.0 } else { raw }).clamp(0.0, 1.0), true)
            }
            None => (1.0, false),
        };
        Some(Rgba {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            a,
            explicit_alpha,
        })
    }

    pub fn is_transparent_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.a == 0.0
    }

    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Fallback for unparsable or fully transparent colors.
pub const FALLBACK_COLOR: &str = "FFFFFF";

/// Six-digit upper-case hex for a resolved color.
pub fn color_hex(value: &str) -> String {
    match Rgba::parse(value) {
        Some(c) if !c.is_transparent_black() => c.hex(),
        _ => FALLBACK_COLOR.to_string(),
    }
}

/// Transparency percentage (0 opaque, 100 invisible) when the color carries
/// an explicit alpha channel.
pub fn color_transparency(value: &str) -> Option<u8> {
    let c = Rgba::parse(value)?;
    if !c.explicit_alpha {
        return None;
    }
    Some(((1.0 - c.a) * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Numeric CSS font weight; keywords resolve to their usual values.
pub fn parse_font_weight(value: &str) -> u16 {
    match value.trim() {
        "normal" | "" => 400,
        "bold" | "bolder" => 700,
        "lighter" => 300,
        other => other.parse::<f64>().map(|w| w.clamp(1.0, 1000.0) as u16).unwrap_or(400),
    }
}

/// First family of a font-family list, quotes stripped.
pub fn primary_family(family: &str) -> String {
    family
        .split(',')
        .next()
        .unwrap_or("")
        .replace(['"', '\''], "")
        .trim()
        .to_string()
}

/// Single-weight faces that must never be flagged bold.
const SINGLE_WEIGHT_FONTS: &[&str] = &["impact"];

pub fn is_single_weight(family: &str) -> bool {
    let primary = primary_family(family).to_lowercase();
    SINGLE_WEIGHT_FONTS.contains(&primary.as_str())
}

/// Face the target renderer has for the mapped families.
pub const MAPPED_FONT_BASE: &str = "Apple SD Gothic Neo";

/// A face name plus whether the separate bold flag should be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice {
    pub name: String,
    pub bold: bool,
    /// Weight is encoded in `name`
    pub mapped: bool,
}

/// Map a resolved family and weight to a face the target renderer knows.
///
/// `Noto Sans KR` and generic `sans-serif` become weight-suffixed
/// `Apple SD Gothic Neo` faces and never set bold; other families pass
/// through with bold at weight ≥ 600.
pub fn map_font(family: &str, weight: &str) -> FontChoice {
    let primary = primary_family(family);
    let normalized = primary.to_lowercase();
    let numeric = parse_font_weight(weight);
    if normalized.contains("noto sans kr") || normalized.contains("sans-serif") {
        let suffix = match (numeric / 100) * 100 {
            0..=100 => "Thin",
            101..=200 => "UltraLight",
            201..=300 => "Light",
            301..=400 => "",
            401..=500 => "Medium",
            501..=600 => "SemiBold",
            601..=700 => "Bold",
            701..=800 => "ExtraBold",
            _ => "Heavy",
        };
        let name = if suffix.is_empty() {
            MAPPED_FONT_BASE.to_string()
        } else {
            format!("{} {}", MAPPED_FONT_BASE, suffix)
        };
        return FontChoice { name, bold: false, mapped: true };
    }
    FontChoice {
        name: primary,
        bold: numeric >= 600,
        mapped: false,
    }
}

/// Active `text-transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

static WORD_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w").expect("valid word pattern"));

impl TextTransform {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "uppercase" => TextTransform::Uppercase,
            "lowercase" => TextTransform::Lowercase,
            "capitalize" => TextTransform::Capitalize,
            _ => TextTransform::None,
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => WORD_START_RE
                .replace_all(text, |caps: &regex::Captures| caps[0].to_uppercase())
                .into_owned(),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "center" | "-webkit-center" => Alignment::Center,
            "right" | "end" | "-webkit-right" => Alignment::Right,
            "justify" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// Normalized style attached to a text element or a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    /// Points
    pub font_size: f64,
    pub font_face: String,
    /// Six-digit hex without `#`
    pub color: String,
    /// 0 (opaque) to 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    pub align: Alignment,
    /// Points
    pub line_spacing: f64,
    pub para_space_before: f64,
    pub para_space_after: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Bullet indent in points; only set on the first run of a list item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_indent: Option<f64>,
    /// Degrees clockwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Left margin in points (lists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
}

impl Default for StyleRecord {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            font_face: MAPPED_FONT_BASE.to_string(),
            color: "000000".to_string(),
            transparency: None,
            align: Alignment::Left,
            line_spacing: 14.4,
            para_space_before: 0.0,
            para_space_after: 0.0,
            bold: false,
            italic: false,
            underline: false,
            bullet_indent: None,
            rotation: None,
            margin: None,
        }
    }
}

impl StyleRecord {
    /// Element-level record for a block that owns text.
    pub fn for_element(style: &ResolvedStyle) -> Self {
        let font = map_font(&style.font_family, &style.font_weight);
        Self {
            font_size: style.font_size_pt(),
            font_face: font.name,
            color: color_hex(&style.color),
            transparency: color_transparency(&style.color),
            align: style.alignment(),
            line_spacing: style.line_spacing_pt(),
            para_space_before: 0.0,
            para_space_after: 0.0,
            bold: font.bold && !is_single_weight(&style.font_family),
            italic: style.is_italic(),
            underline: style.is_underlined(),
            bullet_indent: None,
            rotation: style.rotation_degrees(),
            margin: None,
        }
    }

    /// Derive the record for an inline child, overriding only what the child
    /// resolves differently from `self`.
    pub fn inherit(&self, style: &ResolvedStyle) -> Self {
        let mut next = self.clone();
        let font = map_font(&style.font_family, &style.font_weight);
        if font.mapped {
            next.font_face = font.name;
            next.bold = false;
        } else {
            if font.name != next.font_face && !font.name.is_empty() {
                next.font_face = font.name;
            }
            if !style.font_weight.is_empty() {
                next.bold = style.weight() >= 600 && !is_single_weight(&style.font_family);
            }
        }
        if !style.font_style.is_empty() {
            next.italic = style.is_italic();
        }
        // decorations are not inherited, a parent's underline still paints through
        if style.is_underlined() {
            next.underline = true;
        }
        if !style.color.is_empty() {
            let color = color_hex(&style.color);
            let transparency = color_transparency(&style.color);
            if color != next.color || transparency != next.transparency {
                next.color = color;
                next.transparency = transparency;
            }
        }
        if let Some(size) = units::parse_pt(&style.font_size) {
            next.font_size = size;
        }
        next
    }
}
