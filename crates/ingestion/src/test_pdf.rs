//! Builds small PDFs for tests.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};

/// SOI + APP0 marker + EOI. Enough for byte-level checks; never decoded.
pub(crate) const FAKE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9,
];

#[derive(Default)]
struct PageLayout {
    lines: Vec<String>,
    jpeg: bool,
    table: Vec<Vec<Vec<u8>>>,
    table_font: &'static str,
    columns: Vec<(String, String)>,
}

#[derive(Default)]
pub(crate) struct PdfBuilder {
    pages: Vec<PageLayout>,
}

impl PdfBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, lines: &[&str]) -> Self {
        self.pages.push(PageLayout {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            ..PageLayout::default()
        });
        self
    }

    pub(crate) fn page_with_jpeg(mut self, lines: &[&str]) -> Self {
        self.pages.push(PageLayout {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            jpeg: true,
            ..PageLayout::default()
        });
        self
    }

    /// Cells in the Courier font, ruled above, between and below the rows.
    pub(crate) fn page_with_table(mut self, lines: &[&str], rows: &[&[&str]]) -> Self {
        self.pages.push(PageLayout {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            table: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.as_bytes().to_vec()).collect())
                .collect(),
            table_font: "F1",
            ..PageLayout::default()
        });
        self
    }

    /// Ruled cells given as raw bytes in a `/WinAnsiEncoding` Helvetica font.
    pub(crate) fn page_with_win_ansi_table(mut self, rows: &[&[&[u8]]]) -> Self {
        self.pages.push(PageLayout {
            table: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_vec()).collect())
                .collect(),
            table_font: "F2",
            ..PageLayout::default()
        });
        self
    }

    /// Two unruled columns of prose starting at x=72 and x=320.
    pub(crate) fn page_with_columns(mut self, left: &[&str], right: &[&str]) -> Self {
        self.pages.push(PageLayout {
            columns: left
                .iter()
                .zip(right)
                .map(|(l, r)| (l.to_string(), r.to_string()))
                .collect(),
            ..PageLayout::default()
        });
        self
    }

    pub(crate) fn save(self, dir: &Path, name: &str) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let win_ansi_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for layout in &self.pages {
            let mut operations = vec![];

            if !layout.lines.is_empty() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
                for (i, line) in layout.lines.iter().enumerate() {
                    if i > 0 {
                        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
                    }
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(line.as_str())],
                    ));
                }
                operations.push(Operation::new("ET", vec![]));
            }

            for (r, row) in layout.table.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let x = 72 + 150 * c as i64;
                    let y = 500 - 20 * r as i64;
                    operations.extend(positioned_text(layout.table_font, x, y, cell.clone()));
                }
            }
            operations.extend(table_rules(&layout.table));

            for (i, (left, right)) in layout.columns.iter().enumerate() {
                let y = 700 - 14 * i as i64;
                operations.extend(positioned_text("F1", 72, y, left.as_bytes().to_vec()));
                operations.extend(positioned_text("F1", 320, y, right.as_bytes().to_vec()));
            }

            let mut resources = dictionary! {
                "Font" => dictionary! { "F1" => font_id, "F2" => win_ansi_font_id },
            };

            if layout.jpeg {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 1,
                        "Height" => 1,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    FAKE_JPEG.to_vec(),
                ));
                resources.set("XObject", dictionary! { "Im1" => image_id });
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        100.into(),
                        0.into(),
                        0.into(),
                        100.into(),
                        72.into(),
                        300.into(),
                    ],
                ));
                operations.push(Operation::new("Do", vec!["Im1".into()]));
                operations.push(Operation::new("Q", vec![]));
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let resources_id = doc.add_object(resources);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.pages.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join(name);
        doc.save(&path).expect("save test pdf");
        path
    }
}

fn positioned_text(font: &str, x: i64, y: i64, text: Vec<u8>) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), 10.into()]),
        Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
        ),
        Operation::new("Tj", vec![Object::String(text, StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// An outer `re` box plus `m`/`l` lines between rows, stroked once.
fn table_rules(table: &[Vec<Vec<u8>>]) -> Vec<Operation> {
    let columns = table.iter().map(Vec::len).max().unwrap_or(0) as i64;
    if table.is_empty() || columns == 0 {
        return vec![];
    }
    let rows = table.len() as i64;
    let (left, width) = (66, 150 * columns);
    let bottom = 500 - 20 * (rows - 1) - 6;

    let mut operations = vec![Operation::new(
        "re",
        vec![left.into(), bottom.into(), width.into(), (514 - bottom).into()],
    )];
    for r in 0..rows - 1 {
        let y = 500 - 20 * r - 6;
        operations.push(Operation::new("m", vec![left.into(), y.into()]));
        operations.push(Operation::new("l", vec![(left + width).into(), y.into()]));
    }
    operations.push(Operation::new("S", vec![]));
    operations
}
