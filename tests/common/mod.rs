//! Builders for small but structurally real EPUB, DOCX and PDF files.
#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

pub fn zip_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        let options = if *name == "mimetype" {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
        };
        writer.start_file(*name, options).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// An EPUB 2 book with one XHTML file per chapter.
pub struct EpubFixture {
    pub title: String,
    pub authors: Vec<String>,
    pub chapters: Vec<(String, String)>,
    pub with_ncx: bool,
    pub with_cover: bool,
    pub encryption_algorithm: Option<String>,
    /// NCX entries as `(label, src)`. `None` links each chapter once.
    pub toc: Option<Vec<(String, String)>>,
}

impl Default for EpubFixture {
    fn default() -> Self {
        Self {
            title: "The Test Book".into(),
            authors: vec!["Ada Writer".into(), "Bo Editor".into()],
            chapters: vec![
                (
                    "Chapter One".into(),
                    "It was a bright cold day in April.".into(),
                ),
                (
                    "Chapter Two".into(),
                    "The clocks were striking thirteen and nobody minded.".into(),
                ),
            ],
            with_ncx: true,
            with_cover: true,
            encryption_algorithm: None,
            toc: None,
        }
    }
}

impl EpubFixture {
    pub fn build(&self) -> Vec<u8> {
        let mut files: Vec<(String, Vec<u8>)> = vec![
            ("mimetype".into(), b"application/epub+zip".to_vec()),
            ("META-INF/container.xml".into(), CONTAINER_XML.as_bytes().to_vec()),
            ("OEBPS/content.opf".into(), self.opf().into_bytes()),
        ];
        if self.with_ncx {
            files.push(("OEBPS/toc.ncx".into(), self.ncx().into_bytes()));
        }
        for (index, (title, body)) in self.chapters.iter().enumerate() {
            let xhtml = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{title}</title>
<style>p {{ margin: 0; }}</style></head>
<body><h1>{title}</h1><p>{body}</p></body></html>"#
            );
            files.push((format!("OEBPS/ch{}.xhtml", index + 1), xhtml.into_bytes()));
        }
        if self.with_cover {
            files.push(("OEBPS/images/cover.jpg".into(), JPEG_BYTES.to_vec()));
        }
        if let Some(algorithm) = &self.encryption_algorithm {
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
  <enc:EncryptedData><enc:EncryptionMethod Algorithm="{algorithm}"/>
    <enc:CipherData><enc:CipherReference URI="OEBPS/ch1.xhtml"/></enc:CipherData>
  </enc:EncryptedData>
</encryption>"#
            );
            files.push(("META-INF/encryption.xml".into(), xml.into_bytes()));
        }

        let entries: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_slice()))
            .collect();
        zip_entries(&entries)
    }

    fn opf(&self) -> String {
        let creators: String = self
            .authors
            .iter()
            .map(|a| format!("<dc:creator opf:role=\"aut\">{a}</dc:creator>\n"))
            .collect();
        let mut manifest = String::new();
        let mut spine = String::new();
        if self.with_ncx {
            manifest.push_str(
                r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#,
            );
        }
        for index in 1..=self.chapters.len() {
            manifest.push_str(&format!(
                r#"<item id="ch{index}" href="ch{index}.xhtml" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="ch{index}"/>"#));
        }
        let cover_meta = if self.with_cover {
            manifest.push_str(
                r#"<item id="cover-img" href="images/cover.jpg" media-type="image/jpeg"/>"#,
            );
            r#"<meta name="cover" content="cover-img"/>"#
        } else {
            ""
        };
        let spine_open = if self.with_ncx {
            r#"<spine toc="ncx">"#
        } else {
            "<spine>"
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>{title}</dc:title>
    {creators}
    <dc:language>en</dc:language>
    <dc:identifier id="BookId" opf:scheme="ISBN">978-0-13-468599-1</dc:identifier>
    <dc:subject>Fiction; Dystopia</dc:subject>
    <dc:rights>All rights reserved</dc:rights>
    <dc:date>1949-06-08</dc:date>
    {cover_meta}
  </metadata>
  <manifest>{manifest}</manifest>
  {spine_open}{spine}</spine>
</package>"#,
            title = self.title
        )
    }

    fn ncx(&self) -> String {
        let links: Vec<(String, String)> = self.toc.clone().unwrap_or_else(|| {
            self.chapters
                .iter()
                .enumerate()
                .map(|(index, (title, _))| (title.clone(), format!("ch{}.xhtml", index + 1)))
                .collect()
        });
        let points: String = links
            .iter()
            .enumerate()
            .map(|(index, (label, src))| {
                let n = index + 1;
                format!(
                    r#"<navPoint id="np{n}" playOrder="{n}"><navLabel><text>{label}</text></navLabel><content src="{src}"/></navPoint>"#
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="978-0-13-468599-1"/></head>
  <docTitle><text>{}</text></docTitle>
  <navMap>{points}</navMap>
</ncx>"#,
            self.title
        )
    }
}

/// A paragraph of a fixture DOCX: optional style id and its text.
pub type DocxParagraph<'a> = (Option<&'a str>, &'a str);

pub fn docx_bytes(paragraphs: &[DocxParagraph<'_>]) -> Vec<u8> {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;
    let document_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
    let styles = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
</w:styles>"#;

    let body: String = paragraphs
        .iter()
        .map(|(style, text)| {
            let properties = style
                .map(|id| format!(r#"<w:pPr><w:pStyle w:val="{id}"/></w:pPr>"#))
                .unwrap_or_default();
            format!(r#"<w:p>{properties}<w:r><w:t>{text}</w:t></w:r></w:p>"#)
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>{body}</w:body>
</w:document>"#
    );

    zip_entries(&[
        ("[Content_Types].xml", content_types.as_bytes()),
        ("_rels/.rels", rels.as_bytes()),
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", document_rels.as_bytes()),
        ("word/styles.xml", styles.as_bytes()),
    ])
}

/// A PDF whose pages each draw the given lines in Courier.
pub fn pdf_bytes(pages: &[&[&str]], info: &[(&str, &str)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![72.into(), (720 - 16 * index as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if !info.is_empty() {
        let mut info_dict = lopdf::Dictionary::new();
        for (key, value) in info {
            info_dict.set(*key, Object::string_literal(*value));
        }
        let info_id = doc.add_object(info_dict);
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
