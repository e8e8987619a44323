//! Plain text view of converted pages.

use crate::model::{ContentNode, PageContent};

/// Render one page for reading in a terminal.
///
/// Headings are bold (Markdown `**`), paragraphs keep their line breaks,
/// tables become pipe grids and images show their path with a caption.
pub fn render_page(page: &PageContent) -> String {
    let mut output = format!("Page {}\n\n", page.page_number);

    for node in &page.content {
        match node {
            ContentNode::Heading { text, .. } => {
                output.push_str(&format!("**{}**\n\n", text));
            }
            ContentNode::Paragraph { text, .. } => {
                for line in text.lines() {
                    output.push_str(line);
                    output.push('\n');
                }
                output.push('\n');
            }
            ContentNode::Table { rows, .. } => {
                output.push_str(&table_grid(rows));
                output.push('\n');
            }
            ContentNode::Image { path, .. } => {
                output.push_str(&format!(
                    "{}\n{}\n\n",
                    path,
                    image_caption(page.page_number)
                ));
            }
        }
    }

    output.trim_end().to_string() + "\n"
}

/// Caption shown under an image.
pub fn image_caption(page_number: u32) -> String {
    format!("Image (Page {})", page_number)
}

/// Render table rows as a pipe grid; the first row is the header.
pub fn table_grid(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![3usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for (i, row) in rows.iter().enumerate() {
        output.push('|');
        for (col, width) in widths.iter().enumerate() {
            let cell = row.get(col).map(|c| c.replace('\n', " ")).unwrap_or_default();
            let pad = width.saturating_sub(cell.chars().count());
            output.push_str(&format!(" {}{} |", cell, " ".repeat(pad)));
        }
        output.push('\n');

        if i == 0 {
            output.push('|');
            for width in &widths {
                output.push_str(&format!(" {} |", "-".repeat(*width)));
            }
            output.push('\n');
        }
    }
    output
}
