//! PDF and preview placement checked against the shared layout
//!
//! Each backend is compared with the millimetre layout on its own, then the
//! two are compared with each other in inches.

use label_template::layout::{fit_image, layout_command, LayoutItem, Rect, SymbolKind};
use label_template::units::{mm_to_logical, mm_to_pt};
use label_template::{
    BarcodeGenerator, BuiltinMetrics, ExportConfig, FieldKey, LabelRenderer, LabelTemplate, PdfExporter,
    PreviewElement, PreviewRenderer, Record, SymbolGenerator, TextMeasure,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

const TEMPLATE: &str = r#"{
    "code": "GEOMETRY",
    "name": "geometry",
    "size": { "width": 50.8, "height": 25.4 },
    "fields": [
        { "type": "text", "name": "Left", "text": "Hello",
          "position": { "x": 2, "y": 2 }, "size": { "width": 30, "height": 5 } },
        { "type": "text", "name": "Right", "bind": "ogd09", "useDisplay": true, "align": "right",
          "font": { "size": 9, "bold": true },
          "position": { "x": 2, "y": 19 }, "size": { "width": 30, "height": 5 } },
        { "type": "barcode", "name": "Part", "bind": "erpmat",
          "position": { "x": 2, "y": 8 }, "size": { "width": 30, "height": 10 } },
        { "type": "qrcode", "name": "QR", "combine": "{pono};{erpmat}",
          "position": { "x": 35, "y": 2 }, "size": { "width": 14, "height": 20 } }
    ]
}"#;

const PAGE_HEIGHT_PT: f64 = 72.0;
const TOLERANCE: f64 = 1e-3;

fn fixture() -> (LabelTemplate, Record) {
    let template = LabelTemplate::from_json(TEMPLATE).unwrap();
    let record = Record::new()
        .with(FieldKey::Ogd09, "1200")
        .with(FieldKey::Erpmat, "4D010018")
        .with(FieldKey::Pono, "PO123");
    (template, record)
}

fn layout(template: &LabelTemplate, record: &Record) -> Vec<LayoutItem> {
    LabelRenderer::new()
        .render(template, record)
        .iter()
        .flat_map(|command| layout_command(command, &ExportConfig::default(), &BuiltinMetrics))
        .collect()
}

/// Placed image rectangle in millimetres
fn placed_symbol(kind: SymbolKind, content: &str, bounds: Rect, size_mm: f64) -> Rect {
    let png = match kind {
        SymbolKind::Linear => BarcodeGenerator.render_linear(content, size_mm),
        SymbolKind::Matrix => BarcodeGenerator.render_matrix(content, size_mm),
    }
    .unwrap();
    let img = image::load_from_memory(&png).unwrap();
    fit_image(bounds, img.width(), img.height())
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {other:?}"),
    }
}

fn pdf_operations(template: &LabelTemplate, record: &Record) -> Vec<Operation> {
    let generator = BarcodeGenerator;
    let bytes = PdfExporter::new(&generator).export_single(template, record).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < TOLERANCE
}

#[test]
fn test_pdf_matches_layout() {
    let (template, record) = fixture();
    let items = layout(&template, &record);
    let ops = pdf_operations(&template, &record);

    let mut td = ops.iter().filter(|op| op.operator == "Td");
    let mut cm = ops.iter().filter(|op| op.operator == "cm");

    for item in &items {
        match item {
            LayoutItem::Text(block) => {
                for line in &block.lines {
                    let op = td.next().expect("missing text operation");
                    let width_pt = mm_to_pt(BuiltinMetrics.width_mm(&line.text, block.font_size, block.bold));
                    let anchor = mm_to_pt(line.anchor_x);
                    let expected_x = match block.align {
                        label_template::Align::Left => anchor,
                        label_template::Align::Center => anchor - width_pt / 2.0,
                        label_template::Align::Right => anchor - width_pt,
                    };
                    assert!(close(number(&op.operands[0]), expected_x), "{line:?}: {op:?}");
                    assert!(
                        close(number(&op.operands[1]), PAGE_HEIGHT_PT - mm_to_pt(line.baseline_y)),
                        "{line:?}: {op:?}"
                    );
                }
            }
            LayoutItem::Symbol(symbol) => {
                let op = cm.next().expect("missing image operation");
                let rect = placed_symbol(symbol.kind, &symbol.content, symbol.bounds, symbol.generator_size_mm());
                let values: Vec<f64> = op.operands.iter().map(number).collect();
                assert!(close(values[0], mm_to_pt(rect.width)), "{symbol:?}: {values:?}");
                assert!(close(values[3], mm_to_pt(rect.height)), "{symbol:?}: {values:?}");
                assert!(close(values[4], mm_to_pt(rect.x)), "{symbol:?}: {values:?}");
                assert!(
                    close(values[5], PAGE_HEIGHT_PT - mm_to_pt(rect.y) - mm_to_pt(rect.height)),
                    "{symbol:?}: {values:?}"
                );
            }
        }
    }

    assert!(td.next().is_none());
    assert!(cm.next().is_none());
}

#[test]
fn test_preview_matches_layout() {
    let (template, record) = fixture();
    let items = layout(&template, &record);
    let commands = LabelRenderer::new().render(&template, &record);
    let generator = BarcodeGenerator;
    let canvas = PreviewRenderer::new(&generator).render(&template, &commands).unwrap();

    assert_eq!(canvas.elements.len(), items.len());
    for (item, element) in items.iter().zip(&canvas.elements) {
        match (item, element) {
            (LayoutItem::Text(block), PreviewElement::Text { lines, font_size, align, .. }) => {
                assert_eq!(*align, block.align);
                assert!(close(*font_size, block.font_size * 96.0 / 72.0));
                for (expected, line) in block.lines.iter().zip(lines) {
                    assert_eq!(line.text, expected.text);
                    assert!(close(line.x, mm_to_logical(expected.anchor_x)));
                    assert!(close(line.baseline, mm_to_logical(expected.baseline_y)));
                }
            }
            (LayoutItem::Symbol(symbol), PreviewElement::Image { rect, .. }) => {
                let placed = placed_symbol(symbol.kind, &symbol.content, symbol.bounds, symbol.generator_size_mm());
                assert!(close(rect.x, mm_to_logical(placed.x)));
                assert!(close(rect.y, mm_to_logical(placed.y)));
                assert!(close(rect.width, mm_to_logical(placed.width)));
                assert!(close(rect.height, mm_to_logical(placed.height)));
            }
            (item, element) => panic!("{item:?} painted as {element:?}"),
        }
    }
}

#[test]
fn test_pdf_and_preview_agree_in_inches() {
    let (template, record) = fixture();
    let ops = pdf_operations(&template, &record);
    let commands = LabelRenderer::new().render(&template, &record);
    let generator = BarcodeGenerator;
    let canvas = PreviewRenderer::new(&generator).render(&template, &commands).unwrap();

    let pdf_images: Vec<(f64, f64)> = ops
        .iter()
        .filter(|op| op.operator == "cm")
        .map(|op| {
            let values: Vec<f64> = op.operands.iter().map(number).collect();
            // top edge measured from the top of the page
            (values[4] / 72.0, (PAGE_HEIGHT_PT - values[5] - values[3]) / 72.0)
        })
        .collect();
    let preview_images: Vec<(f64, f64)> = canvas
        .elements
        .iter()
        .filter_map(|element| match element {
            PreviewElement::Image { rect, .. } => Some((rect.x / 96.0, rect.y / 96.0)),
            _ => None,
        })
        .collect();

    assert_eq!(pdf_images.len(), 2);
    assert_eq!(pdf_images.len(), preview_images.len());
    for (pdf, preview) in pdf_images.iter().zip(&preview_images) {
        assert!(close(pdf.0, preview.0), "{pdf:?} vs {preview:?}");
        assert!(close(pdf.1, preview.1), "{pdf:?} vs {preview:?}");
    }

    // the QR sits 35 mm from the left edge in both
    assert!(close(preview_images[1].0 * 25.4, 35.0));
}
