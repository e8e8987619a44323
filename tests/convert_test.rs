//! Integration tests for PDF to outline conversion.

mod common;

use common::{build_pdf, chapter_page, line, line_at, write_pdf, TestImage, TestPage};
use pdfoutline::render::{from_json, to_json, JsonFormat};
use pdfoutline::{convert, convert_bytes, extract_page, ContentNode, Error, ParseOptions, PdfParser};

#[test]
fn test_chapter_page_outline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "chapter.pdf", vec![chapter_page()]);

    let pages = convert(&pdf, dir.path().join("images")).unwrap();

    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.page_number, 1);
    assert_eq!(
        page.content,
        vec![
            ContentNode::heading("CHAPTER 1", Some("CHAPTER 1".into()), None, 24.0),
            ContentNode::heading("Intro", Some("CHAPTER 1".into()), Some("Intro".into()), 16.0),
            ContentNode::paragraph(
                "Body text here.",
                Some("CHAPTER 1".into()),
                Some("Intro".into())
            ),
        ]
    );
}

#[test]
fn test_body_lines_join_into_one_paragraph() {
    let mut content = line("B", 24.0, 50.0, "Overview");
    content.push_str(&line("R", 10.0, 100.0, "First line of body."));
    content.push_str(&line("R", 10.0, 114.0, "Second line of body."));
    let pdf = build_pdf(vec![TestPage::text(content)]);

    let pages = convert_bytes(&pdf, ParseOptions::new().text_only()).unwrap();

    assert_eq!(pages[0].content.len(), 2);
    assert_eq!(
        pages[0].content[1].text(),
        Some("First line of body.\nSecond line of body.")
    );
    assert_eq!(pages[0].content[1].section(), Some("Overview"));
}

#[test]
fn test_image_only_page() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("images");
    let pdf = write_pdf(
        dir.path(),
        "image.pdf",
        vec![TestPage::text("").with_image(TestImage::jpeg(2, 3).named(vec!["Im1", "Im2"]))],
    );

    let pages = convert(&pdf, &image_dir).unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].content.len(), 1, "duplicate reference written once");
    match &pages[0].content[0] {
        ContentNode::Image {
            path,
            width,
            height,
        } => {
            assert!(path.ends_with("page1_img1.jpeg"), "unexpected path {path}");
            assert_eq!(*width, Some(2));
            assert_eq!(*height, Some(3));
            assert_eq!(std::fs::read(path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
        }
        other => panic!("expected image node, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(&image_dir).unwrap().count(), 1);
}

#[test]
fn test_raw_gray_image_written_as_png() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("images");
    let pdf = write_pdf(
        dir.path(),
        "gray.pdf",
        vec![chapter_page().with_image(TestImage::gray(4, 4))],
    );

    let pages = convert(&pdf, &image_dir).unwrap();

    let node = pages[0].content.last().unwrap();
    assert!(node.is_image());
    let written = std::fs::read(image_dir.join("page1_img1.png")).unwrap();
    assert_eq!(&written[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_text_nodes_precede_images() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(
        dir.path(),
        "mixed.pdf",
        vec![chapter_page().with_image(TestImage::jpeg(1, 1))],
    );

    let pages = convert(&pdf, dir.path().join("images")).unwrap();

    let kinds: Vec<&str> = pages[0].content.iter().map(ContentNode::kind).collect();
    assert_eq!(kinds, vec!["heading", "heading", "paragraph", "image"]);
}

#[test]
fn test_blank_page_omitted_but_extractable() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(
        dir.path(),
        "blank.pdf",
        vec![TestPage::text(""), chapter_page()],
    );
    let options = ParseOptions::new().with_image_dir(dir.path().join("images"));

    let pages = PdfParser::open_with_options(&pdf, options.clone())
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 2);

    let blank = extract_page(&pdf, 1, &options).unwrap();
    assert_eq!(blank.page_number, 1);
    assert!(blank.is_empty());
}

#[test]
fn test_page_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "one.pdf", vec![chapter_page()]);

    let err = extract_page(&pdf, 5, &ParseOptions::new().text_only()).unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(5, 1)));
}

#[test]
fn test_non_pdf_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some text, not a PDF").unwrap();

    let err = convert(&path, dir.path().join("images")).unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
    assert!(err.is_open_error());
    assert!(!dir.path().join("images").exists());
}

#[test]
fn test_table_extracted_after_text() {
    let mut content = line("B", 24.0, 50.0, "RESULTS");
    content.push_str(&line_at("R", 10.0, 72.0, 120.0, "Name"));
    content.push_str(&line_at("R", 10.0, 220.0, 120.0, "Score"));
    content.push_str(&line_at("R", 10.0, 72.0, 140.0, "Alice"));
    content.push_str(&line_at("R", 10.0, 220.0, 140.0, "91"));
    content.push_str(&line_at("R", 10.0, 72.0, 160.0, "Bob"));
    content.push_str(&line_at("R", 10.0, 220.0, 160.0, "78"));
    let pdf = build_pdf(vec![TestPage::text(content)]);

    let pages = convert_bytes(&pdf, ParseOptions::new().with_images(false)).unwrap();

    let table = pages[0]
        .content
        .iter()
        .find(|n| n.is_table())
        .expect("table node");
    match table {
        ContentNode::Table { section, rows } => {
            assert_eq!(section.as_deref(), Some("RESULTS"));
            assert_eq!(
                rows,
                &vec![
                    vec!["Name".to_string(), "Score".to_string()],
                    vec!["Alice".to_string(), "91".to_string()],
                    vec!["Bob".to_string(), "78".to_string()],
                ]
            );
        }
        _ => unreachable!(),
    }
    assert!(pages[0].content.last().unwrap().is_table());
}

#[test]
fn test_json_round_trip_and_idempotence() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(
        dir.path(),
        "doc.pdf",
        vec![chapter_page(), TestPage::text(line("R", 10.0, 300.0, "Closing words."))],
    );
    let image_dir = dir.path().join("images");

    let first = convert(&pdf, &image_dir).unwrap();
    let second = convert(&pdf, &image_dir).unwrap();
    assert_eq!(first, second);

    let json = to_json(&first, JsonFormat::Pretty).unwrap();
    assert!(json.contains("\"page_number\": 2"));
    assert_eq!(from_json(&json).unwrap(), first);
}

#[test]
fn test_page_selection_skips_pages() {
    let pdf = build_pdf(vec![
        chapter_page(),
        TestPage::text(line("R", 10.0, 300.0, "Second page body.")),
    ]);

    let options = ParseOptions::new().only_page(2).text_only();
    let pages = convert_bytes(&pdf, options).unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 2);
    assert_eq!(pages[0].content[0].text(), Some("Second page body."));
}

#[test]
fn test_zero_page_document() {
    let pdf = build_pdf(Vec::new());

    let result = convert_bytes(&pdf, ParseOptions::new().text_only());
    match result {
        Ok(pages) => assert!(pages.is_empty()),
        Err(e) => panic!("empty document reported as failure: {e} (open error: {})", e.is_open_error()),
    }
}

#[test]
fn test_image_dir_created_for_document_without_images() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("images");
    let pdf = write_pdf(dir.path(), "text.pdf", vec![chapter_page()]);

    let pages = convert(&pdf, &image_dir).unwrap();

    assert_eq!(pages.len(), 1);
    assert!(image_dir.is_dir());
    assert_eq!(std::fs::read_dir(&image_dir).unwrap().count(), 0);
}
