//! Label Text - text helpers shared by the label renderers
//!
//! This crate provides:
//! - Quantity formatting with invariant thousands separators
//! - ISO date to slash date conversion
//! - CJK-aware width estimation and the shrink-to-fit font search
//! - Line clamping with ellipsis for fixed-size text boxes
//!
//! # Example
//!
//! ```
//! use label_text::{fit_font_size, format_quantity, WidthModel};
//!
//! assert_eq!(format_quantity("6733"), "6,733");
//!
//! let fit = fit_font_size("ACME", 20.0, 11.0, 6.0, &WidthModel::default());
//! assert_eq!(fit.size, 11.0);
//! assert!(!fit.requires_wrap);
//! ```

mod formatter;
mod linebreak;
mod measure;

pub use formatter::{format_quantity, format_slash_date, format_thousands};
pub use linebreak::{clamp_lines, ellipsize, wrap_paragraph};
pub use measure::{
    char_weight, estimate_width_mm, fit_font_size, is_cjk, FontFit, WidthModel,
    DEFAULT_CHAR_WIDTH_FACTOR, DEFAULT_SHRINK_STEP,
};
