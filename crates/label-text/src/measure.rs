//! Width estimation and shrink-to-fit font sizing
//!
//! Widths are estimated, not measured: every CJK ideograph counts as one
//! em-ish unit and everything else as half of one. The per-point factor is
//! an empirical constant, so it is carried in [`WidthModel`] instead of
//! being hard-coded.

/// Millimetres of advance per point of font size for a full-width character
pub const DEFAULT_CHAR_WIDTH_FACTOR: f64 = 0.035;

/// Font size decrement per shrink step, in points
pub const DEFAULT_SHRINK_STEP: f64 = 0.5;

/// Parameters of the width estimate and the shrink search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthModel {
    /// mm per pt for a full-width character
    pub char_width_factor: f64,
    /// Shrink step in points
    pub shrink_step: f64,
}

impl Default for WidthModel {
    fn default() -> Self {
        Self {
            char_width_factor: DEFAULT_CHAR_WIDTH_FACTOR,
            shrink_step: DEFAULT_SHRINK_STEP,
        }
    }
}

/// Result of the shrink-to-fit search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    /// Font size to render with, in points
    pub size: f64,
    /// Still too wide at the minimum size
    pub requires_wrap: bool,
}

/// CJK Unified Ideographs block (U+4E00 to U+9FFF)
pub fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Relative advance of a character: 1.0 for CJK, 0.5 otherwise
pub fn char_weight(c: char) -> f64 {
    if is_cjk(c) {
        1.0
    } else {
        0.5
    }
}

/// Estimated width of `text` in millimetres at `font_size` points
pub fn estimate_width_mm(text: &str, font_size: f64, char_width_factor: f64) -> f64 {
    let unit = font_size * char_width_factor;
    text.chars().map(|c| char_weight(c) * unit).sum()
}

/// Find the largest font size in `[min_size, nominal_size]` that fits
///
/// Steps down from the nominal size by `model.shrink_step` until the
/// estimated width fits `max_width_mm`. If even `min_size` is too wide the
/// result is `min_size` with `requires_wrap` set. Empty text never shrinks.
pub fn fit_font_size(
    text: &str,
    max_width_mm: f64,
    nominal_size: f64,
    min_size: f64,
    model: &WidthModel,
) -> FontFit {
    let fits = |size: f64| estimate_width_mm(text, size, model.char_width_factor) <= max_width_mm;

    if text.is_empty() || fits(nominal_size) {
        return FontFit {
            size: nominal_size,
            requires_wrap: false,
        };
    }

    let step = if model.shrink_step > 0.0 {
        model.shrink_step
    } else {
        nominal_size - min_size
    };

    let mut size = nominal_size;
    while size > min_size {
        size = (size - step).max(min_size);
        if fits(size) {
            return FontFit {
                size,
                requires_wrap: false,
            };
        }
    }

    FontFit {
        size: min_size,
        requires_wrap: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_is_cjk() {
        assert!(is_cjk('出'));
        assert!(is_cjk('\u{4E00}'));
        assert!(is_cjk('\u{9FFF}'));
        assert!(!is_cjk('A'));
        assert!(!is_cjk('ก'));
        assert!(!is_cjk('\u{3042}'));
    }

    #[test]
    fn test_estimate_width() {
        // 4 latin chars at 10pt: 4 * 0.5 * 0.35
        let w = estimate_width_mm("ABCD", 10.0, DEFAULT_CHAR_WIDTH_FACTOR);
        assert!((w - 0.7).abs() < 1e-9);

        // 4 CJK chars at 10pt: 4 * 1.0 * 0.35
        let w = estimate_width_mm("客戶料號", 10.0, DEFAULT_CHAR_WIDTH_FACTOR);
        assert!((w - 1.4).abs() < 1e-9);

        // one of each: 0.5 * 0.35 + 1.0 * 0.35
        let w = estimate_width_mm("A客", 10.0, DEFAULT_CHAR_WIDTH_FACTOR);
        assert!((w - 0.525).abs() < 1e-9);

        assert_eq!(estimate_width_mm("", 10.0, DEFAULT_CHAR_WIDTH_FACTOR), 0.0);
    }

    #[test]
    fn test_fit_no_shrink_needed() {
        let fit = fit_font_size("SHORT", 50.0, 11.0, 6.0, &WidthModel::default());
        assert_eq!(
            fit,
            FontFit {
                size: 11.0,
                requires_wrap: false
            }
        );
    }

    #[test]
    fn test_fit_shrinks_in_half_points() {
        // 40 latin chars: width = 40 * 0.5 * size * 0.035 = 0.7 * size
        // 5.7mm box fits at 8pt (5.6mm) but not 8.5pt (5.95mm)
        let text = "A".repeat(40);
        let fit = fit_font_size(&text, 5.7, 11.0, 6.0, &WidthModel::default());
        assert_eq!(fit.size, 8.0);
        assert!(!fit.requires_wrap);
    }

    #[test]
    fn test_fit_falls_back_to_minimum() {
        let text = "A".repeat(400);
        let fit = fit_font_size(&text, 10.0, 11.0, 6.0, &WidthModel::default());
        assert_eq!(
            fit,
            FontFit {
                size: 6.0,
                requires_wrap: true
            }
        );
    }

    #[test]
    fn test_fit_fits_exactly_at_minimum() {
        // 0.7 * 6 = 4.2mm, 0.7 * 6.5 = 4.55mm
        let text = "A".repeat(40);
        let fit = fit_font_size(&text, 4.3, 11.0, 6.0, &WidthModel::default());
        assert_eq!(fit.size, 6.0);
        assert!(!fit.requires_wrap);
    }

    #[test]
    fn test_fit_empty_text_keeps_nominal() {
        let fit = fit_font_size("", 0.0, 11.0, 6.0, &WidthModel::default());
        assert_eq!(fit.size, 11.0);
        assert!(!fit.requires_wrap);
    }

    #[test]
    fn test_fit_minimum_not_on_step_grid() {
        let text = "A".repeat(400);
        let fit = fit_font_size(&text, 10.0, 11.0, 6.2, &WidthModel::default());
        assert_eq!(fit.size, 6.2);
        assert!(fit.requires_wrap);
    }

    #[test]
    fn test_fit_custom_factor() {
        let model = WidthModel {
            char_width_factor: 0.07,
            shrink_step: 1.0,
        };
        // 10 chars: 10 * 0.5 * size * 0.07 = 0.35 * size; 3.6mm fits at 10pt
        let fit = fit_font_size(&"X".repeat(10), 3.6, 12.0, 6.0, &model);
        assert_eq!(fit.size, 10.0);
    }

    proptest! {
        #[test]
        fn prop_fit_stays_in_bounds(
            text in "[A-Za-z0-9出貨標籤 ]{0,80}",
            width in 0.0f64..120.0,
            nominal in 6.0f64..24.0,
        ) {
            let min = 6.0;
            let model = WidthModel::default();
            let fit = fit_font_size(&text, width, nominal, min, &model);

            prop_assert!(fit.size >= min && fit.size <= nominal);

            let fits_at_min = estimate_width_mm(&text, min, model.char_width_factor) <= width;
            let expect_wrap = fit.size == min && !text.is_empty() && !fits_at_min
                && estimate_width_mm(&text, nominal, model.char_width_factor) > width;
            prop_assert_eq!(fit.requires_wrap, expect_wrap);
        }
    }
}
