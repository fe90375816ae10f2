// src/pdf/reader.rs
use crate::pdf::color;
use crate::pdf::models::PageImage;
use crate::pdf::PageSource;
use crate::utils::error::PdfError;
use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// A loaded exam PDF with its page ids cached in reading order.
pub struct PdfReader {
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfReader {
    /// Loads the document at `path`. A missing file is reported before lopdf sees it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PdfError::NotFound(path.display().to_string()));
        }

        let document = Document::load(path)?;
        // get_pages is keyed by 1-based page number, so values come out in order.
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        tracing::info!("Loaded {} ({} pages)", path.display(), page_ids.len());

        Ok(Self { document, page_ids })
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, PdfError> {
        self.page_ids.get(page).copied().ok_or_else(|| PdfError::Page {
            page: page as u32 + 1,
            reason: "page index out of range".to_string(),
        })
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Result<&'a Dictionary, lopdf::Error> {
        match object {
            Object::Reference(id) => self.document.get_object(*id)?.as_dict(),
            other => other.as_dict(),
        }
    }

    /// Looks `key` up on the page, walking /Parent links for inherited attributes.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Result<Option<&'a Object>, lopdf::Error> {
        let mut current = page_id;
        loop {
            let dict = self.document.get_object(current)?.as_dict()?;
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            match dict.get(b"Parent") {
                Ok(parent) => current = parent.as_reference()?,
                Err(_) => return Ok(None),
            }
        }
    }

    /// Image XObject streams of a page, in resource dictionary order. Images
    /// inside Form XObjects are listed where the form appears.
    fn image_streams(&self, page_id: ObjectId) -> Result<Vec<&Stream>, lopdf::Error> {
        let resources = match self.inherited(page_id, b"Resources")? {
            Some(object) => self.resolve_dict(object)?,
            None => return Ok(Vec::new()),
        };

        let mut streams = Vec::new();
        let mut visited_forms = HashSet::new();
        self.collect_images(resources, &mut visited_forms, &mut streams)?;
        Ok(streams)
    }

    fn collect_images<'a>(
        &'a self,
        resources: &'a Dictionary,
        visited_forms: &mut HashSet<ObjectId>,
        streams: &mut Vec<&'a Stream>,
    ) -> Result<(), lopdf::Error> {
        let xobjects = match resources.get(b"XObject") {
            Ok(object) => self.resolve_dict(object)?,
            Err(_) => return Ok(()),
        };

        for (_, value) in xobjects.iter() {
            let object = match value {
                Object::Reference(id) => self.document.get_object(*id)?,
                other => other,
            };
            let Ok(stream) = object.as_stream() else { continue };

            match stream.dict.get(b"Subtype").and_then(|subtype| subtype.as_name()) {
                Ok(b"Image") => streams.push(stream),
                Ok(b"Form") => {
                    if let Object::Reference(id) = value {
                        if !visited_forms.insert(*id) {
                            continue;
                        }
                    }
                    // Forms without their own /Resources draw from the page's.
                    if let Ok(form_resources) = stream.dict.get(b"Resources") {
                        let form_resources = self.resolve_dict(form_resources)?;
                        self.collect_images(form_resources, visited_forms, streams)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl PageSource for PdfReader {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_lines(&self, page: usize) -> Result<Vec<String>, PdfError> {
        let page_number = page as u32 + 1;
        let text = self
            .document
            .extract_text(&[page_number])
            .map_err(|e| PdfError::Page { page: page_number, reason: e.to_string() })?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn page_images(&self, page: usize) -> Result<Vec<PageImage>, PdfError> {
        let page_id = self.page_id(page)?;
        let streams = self
            .image_streams(page_id)
            .map_err(|e| PdfError::Page { page: page as u32 + 1, reason: e.to_string() })?;

        Ok(streams
            .into_iter()
            .enumerate()
            .map(|(index, stream)| to_page_image(&self.document, index, stream))
            .collect())
    }
}

// --- Image conversion ---

fn dimension(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .and_then(|value| value.as_i64())
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

fn stream_filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok())
            .map(|name| name.to_vec())
            .collect(),
        _ => Vec::new(),
    }
}

/// Stream content with its filters undone. Unfiltered streams are returned as is.
pub(super) fn stream_samples(stream: &Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream_filters(&stream.dict).is_empty() {
        Ok(stream.content.clone())
    } else {
        stream.decompressed_content()
    }
}

fn to_page_image(document: &Document, index: usize, stream: &Stream) -> PageImage {
    let width = dimension(&stream.dict, b"Width");
    let height = dimension(&stream.dict, b"Height");
    let filters = stream_filters(&stream.dict);

    let passthrough = match filters.as_slice() {
        [only] if only == b"DCTDecode" => Some("jpeg"),
        [only] if only == b"JPXDecode" => Some("jpx"),
        _ => None,
    };
    if let Some(extension) = passthrough {
        return PageImage { index, width, height, extension: extension.to_string(), data: stream.content.clone() };
    }

    let samples = match stream_samples(stream) {
        Ok(samples) => samples,
        Err(e) => {
            tracing::warn!("Image {} could not be decompressed ({}); keeping raw stream", index, e);
            return PageImage { index, width, height, extension: "bin".to_string(), data: stream.content.clone() };
        }
    };

    match encode_png(document, &stream.dict, width, height, &samples) {
        Some(data) => PageImage { index, width, height, extension: "png".to_string(), data },
        None => {
            tracing::warn!(
                "Image {} ({}x{}, {} bytes) has an unsupported colour space or sample layout; writing decoded bytes",
                index, width, height, samples.len()
            );
            PageImage { index, width, height, extension: "bin".to_string(), data: samples }
        }
    }
}

fn encode_png(document: &Document, dict: &Dictionary, width: u32, height: u32, samples: &[u8]) -> Option<Vec<u8>> {
    let image = color::decode_image(document, dict, width, height, samples)?;

    let mut out = Cursor::new(Vec::new());
    match image.write_to(&mut out, ImageFormat::Png) {
        Ok(()) => Some(out.into_inner()),
        Err(e) => {
            tracing::warn!("PNG encoding failed: {}", e);
            None
        }
    }
}
