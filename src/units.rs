//! Fixed conversions between CSS pixels, points, inches and EMU.

/// Points per CSS pixel.
pub const PT_PER_PX: f64 = 0.75;
/// CSS pixels per inch.
pub const PX_PER_IN: f64 = 96.0;
/// Points per inch.
pub const PT_PER_IN: f64 = 72.0;
/// English Metric Units per inch (the presentation document's length unit).
pub const EMU_PER_IN: f64 = 914_400.0;

pub fn px_to_pt(px: f64) -> f64 {
    px * PT_PER_PX
}

pub fn px_to_in(px: f64) -> f64 {
    px / PX_PER_IN
}

pub fn pt_to_in(pt: f64) -> f64 {
    pt / PT_PER_IN
}

pub fn in_to_emu(inches: f64) -> f64 {
    inches * EMU_PER_IN
}

pub fn emu_to_in(emu: f64) -> f64 {
    emu / EMU_PER_IN
}

pub fn px_to_emu(px: f64) -> f64 {
    px * (EMU_PER_IN / PX_PER_IN)
}

/// Parse a resolved CSS length such as `"12.5px"` into pixels.
///
/// Keywords (`normal`, `auto`, ...) and anything non-numeric yield `None`.
/// A bare number is accepted as pixels, matching `parseFloat` on computed
/// values.
pub fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    let numeric = v.strip_suffix("px").unwrap_or(v).trim();
    numeric.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `parse_px` converted to points.
pub fn parse_pt(value: &str) -> Option<f64> {
    parse_px(value).map(px_to_pt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_inch_emu_round_trip() {
        for px in [0.0, 1.0, 13.0, 96.0, 333.3, 960.0, 1280.0, 1919.7] {
            let via_inch = in_to_emu(px_to_in(px));
            let direct = px_to_emu(px);
            assert!((via_inch - direct).abs() <= 1.0, "px={} {} vs {}", px, via_inch, direct);
        }
    }

    #[test]
    fn point_conversion() {
        assert_eq!(px_to_pt(16.0), 12.0);
        assert_eq!(pt_to_in(72.0), 1.0);
        assert_eq!(emu_to_in(9_144_000.0), 10.0);
    }

    #[test]
    fn parses_css_lengths() {
        assert_eq!(parse_px("24px"), Some(24.0));
        assert_eq!(parse_px(" 12.5px "), Some(12.5));
        assert_eq!(parse_px("0"), Some(0.0));
        assert_eq!(parse_px("normal"), None);
        assert_eq!(parse_px(""), None);
        assert_eq!(parse_pt("16px"), Some(12.0));
    }
}
