//! Unit conversion between millimetres, PDF points, 300 DPI pixels and
//! 96 DPI logical units

pub const MM_PER_INCH: f64 = 25.4;
pub const POINTS_PER_INCH: f64 = 72.0;
/// Resolution of every generated barcode / QR image
pub const PRINT_DPI: f64 = 300.0;
/// Resolution of preview logical units
pub const LOGICAL_DPI: f64 = 96.0;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm / MM_PER_INCH * POINTS_PER_INCH
}

pub fn mm_to_px300(mm: f64) -> f64 {
    mm / MM_PER_INCH * PRINT_DPI
}

/// Pixels at 300 DPI, rounded half away from zero; negative sizes clamp to 0
pub fn mm_to_px300_int(mm: f64) -> u32 {
    mm_to_px300(mm).round().max(0.0) as u32
}

pub fn mm_to_logical(mm: f64) -> f64 {
    mm / MM_PER_INCH * LOGICAL_DPI
}

pub fn pt_to_mm(pt: f64) -> f64 {
    pt / POINTS_PER_INCH * MM_PER_INCH
}

pub fn pt_to_logical(pt: f64) -> f64 {
    pt / POINTS_PER_INCH * LOGICAL_DPI
}
