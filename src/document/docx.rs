//! Built-in minimal `.docx` writer.
//!
//! Produces a WordprocessingML package with just the parts Word and
//! LibreOffice need: content types, relationships, styles and the document
//! body. Heading styles match what pandoc emits for `#` and `##`.

use async_trait::async_trait;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{Block, ConverterError, DocumentConverter, Outline};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const TITLE_STYLE: &str = "Heading1";
const HEADING_STYLE: &str = "Heading2";
const LIST_STYLE: &str = "ListBullet";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160"/></w:pPr><w:rPr><w:sz w:val="24"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="36"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="120"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style></w:styles>"#;

/// Writes `.docx` files without external tools
#[derive(Debug, Clone, Default)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    /// The complete package as bytes
    pub fn package(&self, outline: &Outline) -> Result<Vec<u8>, ConverterError> {
        let document = document_xml(outline)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
            ("word/document.xml", document.as_slice()),
        ] {
            zip.start_file(name, options).map_err(package_error)?;
            zip.write_all(contents)?;
        }

        Ok(zip.finish().map_err(package_error)?.into_inner())
    }
}

#[async_trait]
impl DocumentConverter for DocxWriter {
    fn name(&self) -> &str {
        "docx"
    }

    async fn convert(&self, outline: &Outline, output: &Path) -> Result<(), ConverterError> {
        let bytes = self.package(outline)?;
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }
}

fn package_error(err: impl std::fmt::Display) -> ConverterError {
    ConverterError::Package(err.to_string())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ConverterError> {
    writer.write_event(event).map_err(package_error)
}

fn document_xml(outline: &Outline) -> Result<Vec<u8>, ConverterError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("w:body")))?;

    for block in outline.blocks() {
        match block {
            Block::Title(text) => paragraph(&mut writer, Some(TITLE_STYLE), text)?,
            Block::Heading(text) => paragraph(&mut writer, Some(HEADING_STYLE), text)?,
            Block::Paragraph(text) => {
                for chunk in text.split("\n\n").map(str::trim).filter(|c| !c.is_empty()) {
                    paragraph(&mut writer, None, chunk)?;
                }
            }
            Block::ListItem(text) => paragraph(&mut writer, Some(LIST_STYLE), text)?,
        }
    }

    emit(&mut writer, Event::End(BytesEnd::new("w:body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner().into_inner())
}

fn paragraph<W: Write>(
    writer: &mut Writer<W>,
    style: Option<&str>,
    text: &str,
) -> Result<(), ConverterError> {
    emit(writer, Event::Start(BytesStart::new("w:p")))?;
    if let Some(style) = style {
        emit(writer, Event::Start(BytesStart::new("w:pPr")))?;
        emit(
            writer,
            Event::Empty(BytesStart::new("w:pStyle").with_attributes([("w:val", style)])),
        )?;
        emit(writer, Event::End(BytesEnd::new("w:pPr")))?;
    }

    emit(writer, Event::Start(BytesStart::new("w:r")))?;
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            emit(writer, Event::Empty(BytesStart::new("w:br")))?;
        }
        let line = xml_safe(line);
        emit(
            writer,
            Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])),
        )?;
        emit(writer, Event::Text(BytesText::new(&line)))?;
        emit(writer, Event::End(BytesEnd::new("w:t")))?;
    }
    emit(writer, Event::End(BytesEnd::new("w:r")))?;

    emit(writer, Event::End(BytesEnd::new("w:p")))
}

/// Drop control characters XML 1.0 cannot carry
fn xml_safe(text: &str) -> String {
    text.chars().filter(|&c| c == '\t' || !c.is_control()).collect()
}
