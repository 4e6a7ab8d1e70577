use anyhow::{Context, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::tables::{page_marks, FontEncodings, PageMarks};

/// Image bytes as found in (or re-encoded from) an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub data: Vec<u8>,
    pub ext: &'static str,
}

/// Everything pulled from one page before any network work happens.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
    pub images: Vec<PageImage>,
    pub marks: PageMarks,
}

pub struct PdfFile {
    doc: Document,
}

impl PdfFile {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path)
            .with_context(|| format!("Failed to load PDF: {}", path.display()))?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Pages in order, 1-based.
    pub fn pages(&self) -> Vec<PdfPage> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| PdfPage {
                number,
                text: self.page_text(number),
                images: self.page_images(page_id),
                marks: self.page_marks(page_id),
            })
            .collect()
    }

    fn page_text(&self, number: u32) -> String {
        match self.doc.extract_text(&[number]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::debug!("No extractable text on page {}: {}", number, e);
                String::new()
            }
        }
    }

    fn page_marks(&self, page_id: ObjectId) -> PageMarks {
        let operations = self
            .doc
            .get_page_content(page_id)
            .ok()
            .and_then(|bytes| Content::decode(&bytes).ok())
            .map(|content| content.operations)
            .unwrap_or_default();

        page_marks(&operations, &self.font_encodings(page_id))
    }

    /// Fonts whose encoding lopdf cannot resolve are left out; their text
    /// falls back to byte decoding.
    fn font_encodings(&self, page_id: ObjectId) -> FontEncodings<'_> {
        let fonts = match self.doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                tracing::debug!("No fonts for page {:?}: {}", page_id, e);
                return FontEncodings::new();
            }
        };

        fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(&self.doc) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    tracing::debug!(
                        "Unsupported encoding for font {}: {}",
                        String::from_utf8_lossy(&name),
                        e
                    );
                    None
                }
            })
            .collect()
    }

    fn page_images(&self, page_id: ObjectId) -> Vec<PageImage> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for xobjects in self.xobject_dicts(page_id) {
            for (_, object) in xobjects.iter() {
                let Object::Reference(id) = object else {
                    continue;
                };
                if !seen.insert(*id) {
                    continue;
                }
                let Ok(Object::Stream(stream)) = self.doc.get_object(*id) else {
                    continue;
                };
                if !is_image(stream) {
                    continue;
                }
                match image_from_stream(stream) {
                    Ok(Some(image)) => images.push(image),
                    Ok(None) => tracing::debug!("Skipping unsupported image encoding {:?}", id),
                    Err(e) => tracing::warn!("Failed to decode image {:?}: {}", id, e),
                }
            }
        }

        images
    }

    /// XObject dictionaries reachable from the page, following inherited resources.
    fn xobject_dicts(&self, page_id: ObjectId) -> Vec<&Dictionary> {
        let mut dicts = Vec::new();
        let mut node = self.doc.get_dictionary(page_id).ok();
        let mut visited = HashSet::new();

        while let Some(dict) = node {
            if let Some(resources) = dict
                .get(b"Resources")
                .ok()
                .and_then(|obj| self.resolve_dict(obj))
            {
                if let Some(xobjects) = resources
                    .get(b"XObject")
                    .ok()
                    .and_then(|obj| self.resolve_dict(obj))
                {
                    dicts.push(xobjects);
                }
            }

            node = match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) if visited.insert(*parent) => {
                    self.doc.get_dictionary(*parent).ok()
                }
                _ => None,
            };
        }

        dicts
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match object {
            Object::Dictionary(dict) => Some(dict),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
            _ => None,
        }
    }
}

fn is_image(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
}

fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(value)) => u32::try_from(*value).ok(),
        _ => None,
    }
}

/// Encoded images keep their bytes; raw 8-bit samples are re-encoded as PNG.
pub(crate) fn image_from_stream(stream: &Stream) -> Result<Option<PageImage>> {
    let filters = filters(stream);

    match filters.as_slice() {
        [single] if single == b"DCTDecode" => {
            return Ok(Some(PageImage {
                data: stream.content.clone(),
                ext: "jpeg",
            }))
        }
        [single] if single == b"JPXDecode" => {
            return Ok(Some(PageImage {
                data: stream.content.clone(),
                ext: "jpx",
            }))
        }
        _ => {}
    }

    let raw_filters_only = filters
        .iter()
        .all(|f| f == b"FlateDecode" || f == b"LZWDecode");
    if !raw_filters_only {
        return Ok(None);
    }

    if dict_u32(&stream.dict, b"BitsPerComponent") != Some(8) {
        return Ok(None);
    }
    let (Some(width), Some(height)) = (
        dict_u32(&stream.dict, b"Width"),
        dict_u32(&stream.dict, b"Height"),
    ) else {
        return Ok(None);
    };

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .context("Failed to decompress image samples")?
    };

    let pixels = width as usize * height as usize;
    if pixels == 0 {
        return Ok(None);
    }

    let components = match stream.dict.get(b"ColorSpace") {
        Ok(Object::Name(name)) if name == b"DeviceGray" => 1,
        Ok(Object::Name(name)) if name == b"DeviceRGB" => 3,
        Ok(Object::Name(name)) if name == b"DeviceCMYK" => 4,
        _ => samples.len() / pixels,
    };

    encode_png(&samples, width, height, components)
}

fn encode_png(samples: &[u8], width: u32, height: u32, components: usize) -> Result<Option<PageImage>> {
    let needed = width as usize * height as usize * components;
    if samples.len() < needed {
        return Ok(None);
    }
    let samples = &samples[..needed];

    let image = match components {
        1 => image::GrayImage::from_raw(width, height, samples.to_vec())
            .map(image::DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, samples.to_vec())
            .map(image::DynamicImage::ImageRgb8),
        4 => image::RgbImage::from_raw(width, height, cmyk_to_rgb(samples))
            .map(image::DynamicImage::ImageRgb8),
        _ => None,
    };
    let Some(image) = image else {
        return Ok(None);
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .context("Failed to encode image as PNG")?;

    Ok(Some(PageImage {
        data: buffer.into_inner(),
        ext: "png",
    }))
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf::{PdfBuilder, FAKE_JPEG};
    use lopdf::dictionary;
    use tempfile::TempDir;

    #[test]
    fn should_extract_trimmed_text_per_page() {
        let dir = TempDir::new().unwrap();
        let path = PdfBuilder::new()
            .page(&["Hello World!"])
            .page(&[])
            .save(dir.path(), "two_pages.pdf");

        let pdf = PdfFile::open(&path).unwrap();
        let pages = pdf.pages();

        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Hello World!"));
        assert_eq!(pages[0].text, pages[0].text.trim());
        assert_eq!(pages[1].number, 2);
        assert!(pages[1].text.is_empty());
    }

    #[test]
    fn should_return_error_for_invalid_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        assert!(PdfFile::open(&path).is_err());
    }

    #[test]
    fn should_keep_jpeg_bytes_as_is() {
        let dir = TempDir::new().unwrap();
        let path = PdfBuilder::new()
            .page_with_jpeg(&["Figure 1"])
            .save(dir.path(), "figure.pdf");

        let pages = PdfFile::open(&path).unwrap().pages();

        assert_eq!(pages[0].images.len(), 1);
        assert_eq!(pages[0].images[0].ext, "jpeg");
        assert_eq!(pages[0].images[0].data, FAKE_JPEG);
    }

    #[test]
    fn should_reencode_raw_rgb_samples_as_png() {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        );

        let image = image_from_stream(&stream).unwrap().unwrap();

        assert_eq!(image.ext, "png");
        assert_eq!(&image.data[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn should_skip_images_with_unsupported_encoding() {
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "BitsPerComponent" => 1,
                "Filter" => "CCITTFaxDecode",
            },
            vec![0],
        );

        assert_eq!(image_from_stream(&stream).unwrap(), None);
    }

    #[test]
    fn should_convert_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 255, 0]), vec![0, 255, 0]);
    }
}
