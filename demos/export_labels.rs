//! Export both built-in shipping labels to PDF and a PNG preview
//! Run with: cargo run --example export_labels [font.ttf]
//!
//! Pass a TrueType font with CJK coverage to embed it; without one the
//! built-in Helvetica is used and CJK text prints as `?`.

use label_template::{
    BarcodeGenerator, FieldKey, LabelRenderer, PdfExporter, PreviewRenderer, Record, TemplateCatalog,
    DEFAULT_OUTPUT_DIR,
};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let catalog = TemplateCatalog::builtin()?;
    let generator = BarcodeGenerator;
    let font = std::env::args().nth(1).map(std::fs::read).transpose()?;

    let mut exporter = PdfExporter::new(&generator);
    if let Some(bytes) = &font {
        exporter = exporter.with_fonts(bytes.clone(), None);
    }

    let shipment = Record::new()
        .with(FieldKey::Ogb19, "SO-20251114")
        .with(FieldKey::NvrCust, "XinshengIntel")
        .with(FieldKey::Ogd09, "6733")
        .with(FieldKey::Obe25, "2025-11-14")
        .with(FieldKey::NvrCustItemNo, "E110-X0")
        .with(FieldKey::NvrCustPn, "CP-7788")
        .with(FieldKey::Pono, "511-251020041")
        .with(FieldKey::Ima902, "FC7800280H")
        .with(FieldKey::NvrRemark10, "00U35NVVR");

    let orders: Vec<Record> = ["PO-1001", "PO-1002", "PO-1003"]
        .iter()
        .map(|po| {
            Record::new()
                .with(FieldKey::Cscustpo, *po)
                .with(FieldKey::Erpmat, "4D010018")
                .with(FieldKey::Ogd09, "1200")
                .with(FieldKey::NvrCustItemNo, "E110-X0")
                .with(FieldKey::NvrRemark10, "FRAGILE")
        })
        .collect();

    let Some(first) = catalog.by_code("QW075551-1") else {
        return Err("QW075551-1 missing from catalog".into());
    };
    let Some(second) = catalog.by_code("QW075551-2") else {
        return Err("QW075551-2 missing from catalog".into());
    };

    let output = Path::new(DEFAULT_OUTPUT_DIR);
    let single = exporter.export_single_to_dir(output, first, &shipment)?;
    log::info!("single label -> {}", single.display());

    let missing = LabelRenderer::new().missing_required_fields(second, &Record::new());
    log::info!("{} requires {:?}", second.code, missing);

    let batch = exporter.export_batch_to_dir(output, second, &orders)?;
    log::info!("{} labels -> {}", orders.len(), batch.display());

    let commands = LabelRenderer::new().render(first, &shipment);
    let canvas = PreviewRenderer::new(&generator).render(first, &commands)?;
    let face = font.as_deref().map(ab_glyph::FontRef::try_from_slice).transpose()?;
    let bitmap = canvas.rasterize(2.0, face.as_ref())?;
    let preview = output.join(format!("{}_preview.png", first.code));
    bitmap.save(&preview)?;
    log::info!("preview {}x{} -> {}", bitmap.width(), bitmap.height(), preview.display());

    Ok(())
}
