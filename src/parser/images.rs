//! Image extraction.
//!
//! Image XObjects are written to the image directory as
//! `page{N}_img{M}.{ext}`. Encoded formats (JPEG, JPEG 2000, JBIG2, CCITT)
//! are written byte for byte. Flate or unfiltered 8-bit gray and RGB samples
//! are wrapped in a PNG container; anything else is written as the stored
//! stream with a `bin` extension.

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};
use crate::model::ExtractedImage;

use super::backend::{DecodeParams, PageId, PdfBackend, RawImage};
use super::options::ErrorMode;

/// Image bytes ready to be written, with their file extension.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedImage {
    pub ext: &'static str,
    pub bytes: Vec<u8>,
}

/// Extract and write the distinct images of one page.
///
/// The same image object referenced several times is written once.
/// Images that cannot be written are dropped with a warning, unless
/// `mode` is strict.
pub fn extract_page_images<B: PdfBackend + ?Sized>(
    backend: &B,
    page_id: PageId,
    page_number: u32,
    dir: &Path,
    mode: ErrorMode,
) -> Result<Vec<ExtractedImage>> {
    let raw_images = backend
        .page_images(page_id)
        .map_err(|e| Error::page_decode(page_number, e))?;

    let mut seen = HashSet::new();
    let mut images = Vec::new();
    let mut sequence = 0u32;

    for raw in raw_images.iter().filter(|img| seen.insert(img.id)) {
        sequence += 1;
        let encoded = encode_image(raw);
        let path = dir.join(ExtractedImage::file_name(page_number, sequence, encoded.ext));

        if let Err(source) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, &encoded.bytes)) {
            let err = Error::ImageWrite { path, source };
            match mode {
                ErrorMode::Strict => return Err(err),
                ErrorMode::Lenient => {
                    log::warn!("Page {}: dropping image: {}", page_number, err);
                    continue;
                }
            }
        }

        log::debug!(
            "Page {}: wrote {} ({} bytes)",
            page_number,
            path.display(),
            encoded.bytes.len()
        );
        images.push(ExtractedImage {
            page: page_number,
            sequence,
            ext: encoded.ext.to_string(),
            path,
            width: raw.width,
            height: raw.height,
        });
    }

    Ok(images)
}

/// Pick the output format for an image stream.
pub(crate) fn encode_image(raw: &RawImage) -> EncodedImage {
    let stored = || EncodedImage {
        ext: "bin",
        bytes: raw.data.clone(),
    };

    let (outer, last) = match raw.filters.split_last() {
        Some((last, outer)) => (outer, Some(last.as_str())),
        None => (&raw.filters[..], None),
    };

    let passthrough = match last {
        Some("DCTDecode") | Some("DCT") => Some("jpeg"),
        Some("JPXDecode") => Some("jpx"),
        Some("JBIG2Decode") => Some("jb2"),
        Some("CCITTFaxDecode") | Some("CCF") => Some("tiff"),
        _ => None,
    };

    if let Some(ext) = passthrough {
        return match inflate_chain(outer, &raw.data) {
            Some(bytes) => EncodedImage { ext, bytes },
            None => stored(),
        };
    }

    let samples = match inflate_chain(&raw.filters, &raw.data) {
        Some(samples) => samples,
        None => return stored(),
    };
    let samples = match raw.decode_params.as_ref().filter(|p| p.predictor >= 10) {
        Some(params) => match unpredict_png(&samples, params) {
            Some(s) => s,
            None => return stored(),
        },
        None if raw.decode_params.as_ref().is_some_and(|p| p.predictor == 2) => return stored(),
        None => samples,
    };

    match wrap_png(raw, samples) {
        Some(bytes) => EncodedImage { ext: "png", bytes },
        None => stored(),
    }
}

/// Apply a chain of Flate filters. `None` if any other filter is present
/// or the data is corrupt.
fn inflate_chain(filters: &[String], data: &[u8]) -> Option<Vec<u8>> {
    let mut bytes = data.to_vec();
    for filter in filters {
        match filter.as_str() {
            "FlateDecode" | "Fl" => {
                let mut out = Vec::new();
                if let Err(e) = ZlibDecoder::new(&bytes[..]).read_to_end(&mut out) {
                    log::debug!("Flate decoding failed: {}", e);
                    return None;
                }
                bytes = out;
            }
            _ => return None,
        }
    }
    Some(bytes)
}

/// Reverse PNG row predictors. Every row starts with its filter type byte.
fn unpredict_png(data: &[u8], params: &DecodeParams) -> Option<Vec<u8>> {
    let bits_per_pixel = params.colors.checked_mul(params.bits_per_component)?;
    let bpp = usize::try_from(bits_per_pixel).ok()?.div_ceil(8).max(1);
    let row_bits = params.columns.checked_mul(bits_per_pixel)?;
    let row_len = usize::try_from(row_bits).ok()?.div_ceil(8);
    if row_len == 0 || row_len >= data.len() || data.len() % (row_len + 1) != 0 {
        return None;
    }

    let mut out: Vec<u8> = Vec::with_capacity(data.len() / (row_len + 1) * row_len);
    let mut prev = vec![0u8; row_len];
    for chunk in data.chunks(row_len + 1) {
        let (tag, encoded) = (chunk[0], &chunk[1..]);
        let mut row = vec![0u8; row_len];
        for i in 0..row_len {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => return None,
            };
            row[i] = encoded[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&row);
        prev = row;
    }
    Some(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let (pa, pb, pc) = (
        (p - i16::from(a)).abs(),
        (p - i16::from(b)).abs(),
        (p - i16::from(c)).abs(),
    );
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Wrap 8-bit gray or RGB samples in a PNG.
fn wrap_png(raw: &RawImage, mut samples: Vec<u8>) -> Option<Vec<u8>> {
    let (width, height) = (raw.width?, raw.height?);
    if raw.bits_per_component != Some(8) || width == 0 || height == 0 {
        return None;
    }
    let pixels = (width as usize).checked_mul(height as usize)?;

    let components = match raw.color_space.as_deref() {
        Some("DeviceGray") | Some("CalGray") | Some("G") => 1,
        Some("DeviceRGB") | Some("CalRGB") | Some("RGB") => 3,
        // ICC profiles carry the component count in the profile stream;
        // infer it from the sample count instead.
        Some("ICCBased") | None if samples.len() == pixels * 3 => 3,
        Some("ICCBased") | None if samples.len() == pixels => 1,
        _ => return None,
    };
    let expected = pixels * components;
    if samples.len() < expected {
        return None;
    }
    samples.truncate(expected);

    let mut buf = Vec::new();
    let written = if components == 1 {
        image::GrayImage::from_raw(width, height, samples)?
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
    } else {
        image::RgbImage::from_raw(width, height, samples)?
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
    };
    match written {
        Ok(()) => Some(buf),
        Err(e) => {
            log::debug!("PNG encoding failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::backend::{BackendFontInfo, ContentOp, MediaBox};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::collections::BTreeMap;
    use std::io::Write;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    struct ImageBackend {
        images: Vec<RawImage>,
    }

    impl PdfBackend for ImageBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }
        fn media_box(&self, _page: PageId) -> Option<MediaBox> {
            None
        }
        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(Vec::new())
        }
        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(Vec::new())
        }
        fn decode_text(&self, _page: PageId, _font: &[u8], _bytes: &[u8]) -> String {
            String::new()
        }
        fn page_images(&self, _page: PageId) -> Result<Vec<RawImage>> {
            Ok(self.images.clone())
        }
    }

    fn jpeg(id: u32) -> RawImage {
        RawImage {
            id: (id, 0),
            width: Some(640),
            height: Some(480),
            filters: vec!["DCTDecode".to_string()],
            color_space: Some("DeviceRGB".to_string()),
            bits_per_component: Some(8),
            decode_params: None,
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gray_flate(width: u32, height: u32) -> RawImage {
        let samples: Vec<u8> = (0..width * height).map(|i| (i * 10) as u8).collect();
        RawImage {
            id: (20, 0),
            width: Some(width),
            height: Some(height),
            filters: vec!["FlateDecode".to_string()],
            color_space: Some("DeviceGray".to_string()),
            bits_per_component: Some(8),
            decode_params: None,
            data: zlib(&samples),
        }
    }

    #[test]
    fn test_duplicate_references_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("images");
        let backend = ImageBackend {
            images: vec![jpeg(7), jpeg(7), jpeg(9)],
        };

        let images = extract_page_images(&backend, (1, 0), 3, &out, ErrorMode::Lenient).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].path, out.join("page3_img1.jpeg"));
        assert_eq!(images[1].path, out.join("page3_img2.jpeg"));
        assert_eq!(images[0].width, Some(640));
        assert_eq!(fs::read(&images[0].path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_flate_gray_becomes_png() {
        let encoded = encode_image(&gray_flate(4, 3));
        assert_eq!(encoded.ext, "png");
        assert!(encoded.bytes.starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn test_unsupported_layout_written_as_stored_stream() {
        let mut raw = gray_flate(4, 3);
        raw.color_space = Some("DeviceCMYK".to_string());
        let encoded = encode_image(&raw);
        assert_eq!(encoded.ext, "bin");
        assert_eq!(encoded.bytes, raw.data);

        let mut raw = gray_flate(4, 3);
        raw.filters = vec!["LZWDecode".to_string()];
        assert_eq!(encode_image(&raw).ext, "bin");
    }

    #[test]
    fn test_passthrough_extensions() {
        for (filter, ext) in [
            ("JPXDecode", "jpx"),
            ("JBIG2Decode", "jb2"),
            ("CCITTFaxDecode", "tiff"),
        ] {
            let mut raw = jpeg(1);
            raw.filters = vec![filter.to_string()];
            assert_eq!(encode_image(&raw).ext, ext);
        }
    }

    #[test]
    fn test_flate_wrapped_jpeg_is_inflated() {
        let mut raw = jpeg(1);
        raw.filters = vec!["FlateDecode".to_string(), "DCTDecode".to_string()];
        raw.data = zlib(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let encoded = encode_image(&raw);
        assert_eq!(encoded.ext, "jpeg");
        assert_eq!(encoded.bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_png_predictors() {
        let params = DecodeParams {
            predictor: 15,
            colors: 1,
            bits_per_component: 8,
            columns: 3,
        };
        // rows: none, sub, up, average, paeth
        let data = [
            0, 10, 20, 30, //
            1, 5, 5, 5, //
            2, 1, 1, 1, //
            3, 2, 2, 2, //
            4, 0, 0, 0,
        ];
        let out = unpredict_png(&data, &params).unwrap();
        assert_eq!(
            out,
            vec![
                10, 20, 30, // as is
                5, 10, 15, // running sum
                6, 11, 16, // row above + 1
                5, 10, 15, // (left + up) / 2 + 2
                5, 10, 15, // paeth picks up
            ]
        );
        assert!(unpredict_png(&data[..7], &params).is_none());
    }

    #[test]
    fn test_oversized_predictor_params_store_image() {
        let hostile = DecodeParams {
            predictor: 12,
            colors: 1 << 40,
            bits_per_component: 1 << 20,
            columns: 1 << 10,
        };
        assert!(unpredict_png(&[0, 1, 2, 3], &hostile).is_none());

        let huge_rows = DecodeParams {
            predictor: 12,
            colors: 1,
            bits_per_component: 8,
            columns: 1 << 40,
        };
        assert!(unpredict_png(&[0, 1, 2, 3], &huge_rows).is_none());

        let raw = RawImage {
            decode_params: Some(hostile),
            ..gray_flate(2, 2)
        };
        let encoded = encode_image(&raw);
        assert_eq!(encoded.ext, "bin");
        assert_eq!(encoded.bytes, raw.data);
    }

    #[test]
    fn test_write_failure_lenient_and_strict() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the image directory should be.
        let blocked = dir.path().join("images");
        fs::write(&blocked, b"not a directory").unwrap();
        let backend = ImageBackend {
            images: vec![jpeg(1)],
        };

        let images =
            extract_page_images(&backend, (1, 0), 1, &blocked, ErrorMode::Lenient).unwrap();
        assert!(images.is_empty());

        let err = extract_page_images(&backend, (1, 0), 1, &blocked, ErrorMode::Strict).unwrap_err();
        assert!(matches!(err, Error::ImageWrite { .. }));
    }
}
