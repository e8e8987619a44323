//! Builds small PDFs in memory with lopdf.

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};

/// An image XObject placed on a page under one or more resource names.
pub struct TestImage {
    pub names: Vec<&'static str>,
    pub dict: Dictionary,
    pub data: Vec<u8>,
}

impl TestImage {
    /// A tiny "JPEG" (only the markers; it is never decoded).
    pub fn jpeg(width: i64, height: i64) -> Self {
        Self {
            names: vec!["Im1"],
            dict: dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width),
                "Height" => Object::Integer(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    /// Uncompressed 8-bit grayscale samples.
    pub fn gray(width: i64, height: i64) -> Self {
        Self {
            names: vec!["Im1"],
            dict: dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width),
                "Height" => Object::Integer(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => Object::Integer(8),
            },
            data: (0..width * height).map(|i| (i * 7) as u8).collect(),
        }
    }

    pub fn named(mut self, names: Vec<&'static str>) -> Self {
        self.names = names;
        self
    }
}

/// One page: a content stream and its images.
pub struct TestPage {
    pub content: String,
    pub images: Vec<TestImage>,
}

impl TestPage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: TestImage) -> Self {
        self.images.push(image);
        self
    }
}

/// A text line: font resource (`R` regular, `B` bold), size, top offset
/// from the page top, text.
pub fn line(font: &str, size: f32, top: f32, text: &str) -> String {
    // The interpreter places a run's top at 0.8 * size above its baseline.
    let baseline = 792.0 - top - size * 0.8;
    format!("BT /{font} {size} Tf 72 {baseline} Td ({text}) Tj ET\n")
}

/// Like [`line`] but starting at a given x.
pub fn line_at(font: &str, size: f32, x: f32, top: f32, text: &str) -> String {
    let baseline = 792.0 - top - size * 0.8;
    format!("BT /{font} {size} Tf {x} {baseline} Td ({text}) Tj ET\n")
}

/// The three-line chapter page used across tests.
pub fn chapter_page() -> TestPage {
    let mut content = line("B", 24.0, 50.0, "CHAPTER 1");
    content.push_str(&line("B", 16.0, 90.0, "Intro"));
    content.push_str(&line("R", 10.0, 130.0, "Body text here."));
    TestPage::text(content)
}

/// Build a US Letter PDF with Helvetica (`R`) and Helvetica-Bold (`B`).
pub fn build_pdf(pages: Vec<TestPage>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.into_bytes()));

        let mut xobjects = Dictionary::new();
        for image in page.images {
            let image_id = doc.add_object(Stream::new(image.dict, image.data));
            for name in image.names {
                xobjects.set(name, Object::Reference(image_id));
            }
        }

        let resources = dictionary! {
            "Font" => dictionary! {
                "R" => Object::Reference(regular),
                "B" => Object::Reference(bold),
            },
            "XObject" => xobjects,
        };

        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        }));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_ids.len() as i64),
    });

    for &pid in &page_ids {
        if let Ok(dict) = doc.get_object_mut(pid).and_then(|o| o.as_dict_mut()) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write a built PDF into `dir` and return its path.
pub fn write_pdf(dir: &std::path::Path, name: &str, pages: Vec<TestPage>) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}
