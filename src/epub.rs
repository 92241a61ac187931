//! EPUB 3 writer.
//!
//! Layout of the generated archive:
//!
//! ```text
//! mimetype                      (stored, first entry)
//! META-INF/container.xml
//! OEBPS/content.opf
//! OEBPS/nav.xhtml
//! OEBPS/section-0001.xhtml ...
//! ```
//!
//! Sections come from [`crate::chunk::split_sections`]; each paragraph of a
//! section becomes one `<p>`.

use chrono::Utc;
use quick_xml::escape::escape;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::chunk::{split_sections, Section};
use crate::error::{LibraryError, Result};
use crate::library::Library;

const SECTION_CHARS: usize = 8_000;
const EMPTY_TEXT: &str = "This document contains no extractable text.";

/// Input for [`write_epub`].
#[derive(Debug, Clone)]
pub struct EpubBook {
    pub title: String,
    pub author: Option<String>,
    pub language: String,
    pub text: String,
}

/// `report.pdf` → `report.epub`.
pub fn epub_file_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    format!("{}.epub", stem)
}

/// Render `book` as EPUB bytes.
pub fn write_epub(book: &EpubBook) -> Result<Vec<u8>> {
    let mut sections = split_sections(&book.text, SECTION_CHARS);
    if sections.is_empty() {
        sections.push(Section {
            index: 0,
            text: EMPTY_TEXT.to_string(),
        });
    }

    let identifier = format!("urn:uuid:{}", uuid::Uuid::new_v4());
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buf));

        add_entry(
            &mut zip,
            "mimetype",
            CompressionMethod::Stored,
            b"application/epub+zip",
        )?;
        add_entry(
            &mut zip,
            "META-INF/container.xml",
            CompressionMethod::Deflated,
            CONTAINER_XML.as_bytes(),
        )?;
        add_entry(
            &mut zip,
            "OEBPS/content.opf",
            CompressionMethod::Deflated,
            content_opf(book, &identifier, &sections).as_bytes(),
        )?;
        add_entry(
            &mut zip,
            "OEBPS/nav.xhtml",
            CompressionMethod::Deflated,
            nav_xhtml(book, &sections).as_bytes(),
        )?;
        for section in &sections {
            add_entry(
                &mut zip,
                &format!("OEBPS/{}", section_file(section)),
                CompressionMethod::Deflated,
                section_xhtml(book, section).as_bytes(),
            )?;
        }

        zip.finish().map_err(|e| LibraryError::Epub(e.to_string()))?;
    }
    Ok(buf)
}

fn add_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    method: CompressionMethod,
    bytes: &[u8],
) -> Result<()> {
    let options = SimpleFileOptions::default().compression_method(method);
    zip.start_file(name, options)
        .map_err(|e| LibraryError::Epub(e.to_string()))?;
    zip.write_all(bytes)
        .map_err(|e| LibraryError::Epub(e.to_string()))
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

fn section_file(section: &Section) -> String {
    format!("section-{:04}.xhtml", section.index + 1)
}

fn section_label(section: &Section) -> String {
    let words: Vec<&str> = section.text.split_whitespace().take(8).collect();
    if words.is_empty() {
        format!("Section {}", section.index + 1)
    } else {
        format!("{}. {}", section.index + 1, words.join(" "))
    }
}

fn content_opf(book: &EpubBook, identifier: &str, sections: &[Section]) -> String {
    let modified = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let creator = book
        .author
        .as_deref()
        .map(|a| format!("    <dc:creator>{}</dc:creator>\n", escape(a)))
        .unwrap_or_default();

    let mut manifest = String::from(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    let mut spine = String::new();
    for section in sections {
        let id = format!("s{}", section.index + 1);
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            id,
            section_file(section)
        ));
        spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", id));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="book-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="book-id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
{creator}    <dc:language>{language}</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine>
{spine}  </spine>
</package>
"#,
        identifier = identifier,
        title = escape(book.title.as_str()),
        creator = creator,
        language = escape(book.language.as_str()),
        modified = modified,
        manifest = manifest,
        spine = spine,
    )
}

fn nav_xhtml(book: &EpubBook, sections: &[Section]) -> String {
    let mut items = String::new();
    for section in sections {
        items.push_str(&format!(
            "        <li><a href=\"{}\">{}</a></li>\n",
            section_file(section),
            escape(section_label(section).as_str())
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head><title>{title}</title></head>
  <body>
    <nav epub:type="toc" id="toc">
      <h1>{title}</h1>
      <ol>
{items}      </ol>
    </nav>
  </body>
</html>
"#,
        title = escape(book.title.as_str()),
        items = items,
    )
}

fn section_xhtml(book: &EpubBook, section: &Section) -> String {
    let mut body = String::new();
    for para in section.text.split("\n\n") {
        let collapsed = para.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            continue;
        }
        body.push_str(&format!("    <p>{}</p>\n", escape(collapsed.as_str())));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>{title}</title></head>
  <body>
{body}  </body>
</html>
"#,
        title = escape(book.title.as_str()),
        body = body,
    )
}

/// CLI entry point: convert and write the EPUB to `output` (default
/// `<stem>.epub` in the working directory).
pub async fn run_convert(
    library: &Library,
    name: &str,
    output: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let epub = library.convert_to_epub(name).await?;
    let path = output.unwrap_or_else(|| std::path::PathBuf::from(&epub.name));
    std::fs::write(&path, &epub.bytes)?;
    println!(
        "wrote {} ({} bytes, title: {})",
        path.display(),
        epub.bytes.len(),
        epub.title
    );
    Ok(())
}
