//! PDF text and image extraction using lopdf and pdf-extract.

use std::panic;

use image::{imageops::FilterType, DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PdfDocument, PdfProcessor, Result};
use crate::error::PdfError;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// [`PdfProcessor`] backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

impl PdfProcessor for PdfExtractor {
    fn open(&self, data: &[u8]) -> Result<Box<dyn PdfDocument>> {
        Ok(Box::new(LoadedPdf::load(data)?))
    }
}

/// A parsed PDF with its per-page text.
pub struct LoadedPdf {
    document: Document,
    /// Per-page text from pdf-extract, when it could read the whole file.
    page_texts: Option<Vec<String>>,
}

impl LoadedPdf {
    /// Parse a PDF, decrypting documents protected by an empty password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let mut decrypted_data = Vec::new();
        let raw_data: &[u8] = if document.is_encrypted() {
            // Try to decrypt with empty password
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            document
                .save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            &decrypted_data
        } else {
            data
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        // pdf-extract panics on some valid fonts (e.g. StandardEncoding Type1)
        let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(raw_data));
        let page_texts = match extracted {
            Ok(Ok(texts)) if texts.len() == page_count => Some(texts),
            Ok(Ok(texts)) => {
                debug!(
                    "pdf-extract returned {} pages for a {} page document, using lopdf text",
                    texts.len(),
                    page_count
                );
                None
            }
            Ok(Err(e)) => {
                debug!("pdf-extract failed ({}), using lopdf text", e);
                None
            }
            Err(_) => {
                warn!("pdf-extract panicked, using lopdf text");
                None
            }
        };

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            page_texts,
        })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Images referenced from a page's XObject resources.
    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let doc = &self.document;
        let mut images = Vec::new();

        let resources = match inherited_attribute(doc, page_id, b"Resources") {
            Some(Object::Dictionary(resources)) => resources,
            _ => return images,
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                for (_name, obj_ref) in xobj_dict.iter() {
                    if let Ok((_, obj)) = doc.dereference(obj_ref) {
                        if let Some(img) = try_extract_image_from_object(doc, obj) {
                            images.push(img);
                        }
                    }
                }
            }
        }

        images
    }

    /// Page size in points from the (possibly inherited) MediaBox.
    fn page_size(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let media_box = match inherited_attribute(&self.document, page_id, b"MediaBox")? {
            Object::Array(values) => values,
            _ => return None,
        };
        let coords: Vec<f32> = media_box
            .iter()
            .filter_map(|o| match o {
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r as f32),
                _ => None,
            })
            .collect();
        match coords.as_slice() {
            [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => None,
        }
    }
}

impl PdfDocument for LoadedPdf {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;

        if let Some(texts) = &self.page_texts {
            return Ok(texts[(page - 1) as usize].clone());
        }

        self.document
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Scanned pages carry their content as an embedded image; the largest
    /// one is scaled to the page size at `dpi`.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let page_id = self.page_id(page)?;

        let image = self
            .page_images(page_id)
            .into_iter()
            .max_by_key(|img| img.width() as u64 * img.height() as u64)
            .ok_or_else(|| PdfError::Render(format!("page {} has no raster content", page)))?;

        let Some((width_pt, height_pt)) = self.page_size(page_id) else {
            trace!("page {} has no MediaBox, keeping native image size", page);
            return Ok(image);
        };

        let scale = dpi as f32 / POINTS_PER_INCH;
        let width = ((width_pt * scale).round() as u32).max(1);
        let height = ((height_pt * scale).round() as u32).max(1);

        if (width, height) == (image.width(), image.height()) {
            return Ok(image);
        }

        debug!(
            "Rendering page {} at {} dpi: {}x{} -> {}x{}",
            page,
            dpi,
            image.width(),
            image.height(),
            width,
            height
        );
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// Look up a page attribute, walking up the page tree for inherited values.
fn inherited_attribute(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let node = doc.get_object(node_id).ok()?;
    if let Object::Dictionary(dict) = node {
        if let Ok(value) = dict.get(key) {
            if let Ok((_, resolved)) = doc.dereference(value) {
                return Some(resolved.clone());
            }
        }

        // Continue up the tree
        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
            return inherited_attribute(doc, *parent_id, key);
        }
    }
    None
}

fn try_extract_image_from_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    if let Object::Stream(stream) = obj {
        let dict = &stream.dict;

        // Check if it's an image XObject
        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        trace!("Found image object: {}x{}", width, height);

        // Get the decompressed stream content
        let data = match stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => stream.content.clone(),
        };

        // Check for image filters
        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) if !arr.is_empty() => {
                    arr.first().and_then(|o| o.as_name().ok())
                }
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG data - use raw stream content (already compressed)
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                    return None;
                }
                _ => {}
            }
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        return create_image_from_raw(&data, width, height, color_space, bits);
    }
    None
}

fn create_image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let channels: usize = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => return None,
    };

    let expected = width as usize * height as usize * channels;
    if data.len() < expected {
        trace!("Image data too short: {} < {}", data.len(), expected);
        return None;
    }

    let mut rgba_data = Vec::with_capacity(width as usize * height as usize * 4);
    for chunk in data[..expected].chunks(channels) {
        match chunk {
            [gray] => rgba_data.extend_from_slice(&[*gray, *gray, *gray, 255]),
            [r, g, b] => rgba_data.extend_from_slice(&[*r, *g, *b, 255]),
            _ => return None,
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba_data).map(DynamicImage::ImageRgba8)
}
