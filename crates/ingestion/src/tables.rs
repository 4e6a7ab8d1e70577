use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object};
use std::collections::BTreeMap;

const ROW_TOLERANCE: f32 = 2.0;
const COLUMN_TOLERANCE: f32 = 5.0;
const RULE_TOLERANCE: f32 = 1.0;
const MIN_ROW_PITCH: f32 = 8.0;

/// Text encoding of each font resource on a page, keyed by resource name (`F1`).
pub type FontEncodings<'a> = BTreeMap<Vec<u8>, Encoding<'a>>;

/// A run of text drawn at one position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// A stroked or filled horizontal segment, in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalRule {
    pub y: f32,
    pub x_start: f32,
    pub x_end: f32,
}

/// Positioned text and ruling lines of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMarks {
    pub fragments: Vec<TextFragment>,
    pub rules: Vec<HorizontalRule>,
}

pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let mut values = [0.0f32; 6];
        for (i, value) in values.iter_mut().enumerate() {
            *value = number(operands.get(i))?;
        }
        Some(Matrix(values))
    }

    /// `self` applied first, then `outer`.
    fn then(&self, outer: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = outer.0;
        Matrix([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }

    fn translate(&self, tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty]).then(self)
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (x * a + y * c + e, x * b + y * d + f)
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }
}

/// Walks a page's content stream, positioning text-showing operators and
/// collecting horizontal ruling lines. Text is decoded with the encoding of
/// the font selected by `Tf`. Glyph widths are not applied, so consecutive
/// shows without a move join into one fragment.
pub fn page_marks(operations: &[Operation], encodings: &FontEncodings) -> PageMarks {
    let mut marks = PageMarks::default();
    let mut ctm = Matrix::IDENTITY;
    let mut saved: Vec<Matrix> = Vec::new();
    let mut line = Matrix::IDENTITY;
    let mut leading = 0.0f32;
    let mut moved = true;
    let mut encoding: Option<&Encoding> = None;
    let mut path = PathSegments::default();

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => saved.push(ctm),
            "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    ctm = matrix.then(&ctm);
                }
            }
            "BT" => {
                line = Matrix::IDENTITY;
                moved = true;
            }
            "Tf" => {
                encoding = match operands.first() {
                    Some(Object::Name(name)) => encodings.get(name),
                    _ => None,
                };
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands.first()), number(operands.get(1))) {
                    line = line.translate(tx, ty);
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    moved = true;
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    line = matrix;
                    moved = true;
                }
            }
            "TL" => {
                if let Some(value) = number(operands.first()) {
                    leading = value;
                }
            }
            "T*" => {
                line = line.translate(0.0, -leading);
                moved = true;
            }
            "Tj" | "'" | "\"" | "TJ" => {
                if op.operator == "'" || op.operator == "\"" {
                    line = line.translate(0.0, -leading);
                    moved = true;
                }
                let text = shown_text(&op.operator, operands, encoding);
                if text.is_empty() {
                    continue;
                }
                match marks.fragments.last_mut() {
                    Some(last) if !moved => last.text.push_str(&text),
                    _ => {
                        let (x, y) = line.then(&ctm).origin();
                        marks.fragments.push(TextFragment { x, y, text });
                    }
                }
                moved = false;
            }
            "m" => {
                if let (Some(x), Some(y)) = (number(operands.first()), number(operands.get(1))) {
                    path.current = Some(ctm.apply(x, y));
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (number(operands.first()), number(operands.get(1))) {
                    let end = ctm.apply(x, y);
                    if let Some(start) = path.current {
                        path.push_segment(start, end);
                    }
                    path.current = Some(end);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = rect_operands(operands) {
                    let corners = [
                        ctm.apply(x, y),
                        ctm.apply(x + w, y),
                        ctm.apply(x + w, y + h),
                        ctm.apply(x, y + h),
                    ];
                    for (i, corner) in corners.iter().enumerate() {
                        path.push_segment(*corner, corners[(i + 1) % 4]);
                    }
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                marks.rules.append(&mut path.rules);
                path.current = None;
            }
            "n" => path = PathSegments::default(),
            _ => {}
        }
    }

    marks
}

/// Horizontal segments of the path under construction; they become rules once painted.
#[derive(Default)]
struct PathSegments {
    current: Option<(f32, f32)>,
    rules: Vec<HorizontalRule>,
}

impl PathSegments {
    fn push_segment(&mut self, (x0, y0): (f32, f32), (x1, y1): (f32, f32)) {
        if (y0 - y1).abs() <= RULE_TOLERANCE && (x0 - x1).abs() > RULE_TOLERANCE {
            self.rules.push(HorizontalRule {
                y: (y0 + y1) / 2.0,
                x_start: x0.min(x1),
                x_end: x0.max(x1),
            });
        }
    }
}

fn rect_operands(operands: &[Object]) -> Option<[f32; 4]> {
    Some([
        number(operands.first())?,
        number(operands.get(1))?,
        number(operands.get(2))?,
        number(operands.get(3))?,
    ])
}

/// Groups fragments into rows, then keeps runs of two or more rows that share
/// the same column count (at least two) and column positions, and that are
/// ruled: at least two horizontal lines near the rows cross every column.
/// Unruled aligned text, such as two-column prose, is not a table.
pub fn detect_tables(marks: &PageMarks) -> Vec<Table> {
    let rows = group_rows(&marks.fragments);

    let mut tables = Vec::new();
    let mut run: Vec<&Vec<TextFragment>> = Vec::new();

    for row in &rows {
        let continues = match run.first() {
            Some(first) => row.len() >= 2 && columns_align(first, row),
            None => false,
        };

        if continues {
            run.push(row);
            continue;
        }

        flush_run(&mut run, &marks.rules, &mut tables);
        if row.len() >= 2 {
            run.push(row);
        }
    }
    flush_run(&mut run, &marks.rules, &mut tables);

    tables
}

/// Cells joined by `", "`, rows joined by newlines; rows with no cells are skipped.
pub fn table_to_text(table: &Table) -> String {
    table
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| row.join(", "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush_run(run: &mut Vec<&Vec<TextFragment>>, rules: &[HorizontalRule], tables: &mut Vec<Table>) {
    if run.len() >= 2 && is_ruled(run, rules) {
        tables.push(
            run.iter()
                .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
                .collect(),
        );
    }
    run.clear();
}

/// Counts distinct rule heights within one row pitch of the run whose
/// combined extent spans from the first column to past the last one.
fn is_ruled(run: &[&Vec<TextFragment>], rules: &[HorizontalRule]) -> bool {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return false;
    };
    let (Some(left), Some(right)) = (first.first(), first.last()) else {
        return false;
    };

    let top = first[0].y;
    let bottom = last[0].y;
    let pitch = ((top - bottom) / (run.len() - 1) as f32).max(MIN_ROW_PITCH);

    let mut levels: Vec<HorizontalRule> = Vec::new();
    for rule in rules
        .iter()
        .filter(|rule| rule.y >= bottom - pitch && rule.y <= top + pitch)
    {
        match levels
            .iter_mut()
            .find(|level| (level.y - rule.y).abs() <= RULE_TOLERANCE)
        {
            Some(level) => {
                level.x_start = level.x_start.min(rule.x_start);
                level.x_end = level.x_end.max(rule.x_end);
            }
            None => levels.push(*rule),
        }
    }

    levels
        .iter()
        .filter(|level| level.x_start <= left.x + COLUMN_TOLERANCE && level.x_end > right.x)
        .count()
        >= 2
}

fn columns_align(first: &[TextFragment], row: &[TextFragment]) -> bool {
    first.len() == row.len()
        && first
            .iter()
            .zip(row)
            .all(|(a, b)| (a.x - b.x).abs() <= COLUMN_TOLERANCE)
}

fn group_rows(fragments: &[TextFragment]) -> Vec<Vec<TextFragment>> {
    let mut sorted: Vec<TextFragment> = fragments
        .iter()
        .filter(|fragment| !fragment.text.trim().is_empty())
        .map(|fragment| TextFragment {
            text: fragment.text.trim().to_string(),
            ..fragment.clone()
        })
        .collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<TextFragment>> = Vec::new();
    for fragment in sorted {
        match rows.last_mut() {
            Some(row) if (row[0].y - fragment.y).abs() <= ROW_TOLERANCE => row.push(fragment),
            _ => rows.push(vec![fragment]),
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

fn shown_text(operator: &str, operands: &[Object], encoding: Option<&Encoding>) -> String {
    match operator {
        "TJ" => match operands.first() {
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Object::String(bytes, _) => Some(decode_pdf_string(bytes, encoding)),
                    _ => None,
                })
                .collect(),
            _ => String::new(),
        },
        _ => match operands.last() {
            Some(Object::String(bytes, _)) => decode_pdf_string(bytes, encoding),
            _ => String::new(),
        },
    }
}

/// BOM-prefixed strings are UTF-16BE. Otherwise the font's encoding applies,
/// and one byte per character when the font has none that lopdf can decode.
fn decode_pdf_string(bytes: &[u8], encoding: Option<&Encoding>) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(encoding) = encoding {
        match Document::decode_text(encoding, bytes) {
            Ok(text) => return text,
            Err(e) => tracing::debug!("Falling back to byte decoding: {}", e),
        }
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn number(object: Option<&Object>) -> Option<f32> {
    match object? {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}
