//! Document information dictionary and XMP packet of a PDF.
use crate::epub::{extract_isbn, normalize_subjects};
use crate::types::{DocumentMetadata, PdfInfo};
use chrono::{FixedOffset, NaiveDate, TimeZone};
use lopdf::{Dictionary, Document, Object};
use quick_xml::events::Event;
use quick_xml::Reader;

/// XMP properties worth keeping, by qualified name.
const XMP_PROPERTIES: [&str; 8] = [
    "dc:title",
    "dc:creator",
    "dc:description",
    "dc:subject",
    "dc:language",
    "dc:rights",
    "dc:identifier",
    "xmp:CreateDate",
];

/// Values read from an XMP packet, in packet order. Lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpProperties {
    entries: Vec<(String, String)>,
}

impl XmpProperties {
    pub fn insert(&mut self, name: impl Into<String>, value: &str) {
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if !value.is_empty() {
            self.entries.push((name.into(), value));
        }
    }

    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Strings of the trailer's `/Info` dictionary, decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoDictionary {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

impl InfoDictionary {
    pub fn from_document(doc: &Document) -> Self {
        let Some(info) = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|object| resolve_dictionary(doc, object))
        else {
            tracing::debug!("PDF has no Info dictionary");
            return Self::default();
        };

        let get = |key: &[u8]| -> Option<String> {
            match info.get(key).ok()? {
                Object::String(bytes, _) => {
                    let value = decode_pdf_string(bytes);
                    let value = value.trim();
                    (!value.is_empty()).then(|| value.to_string())
                }
                _ => None,
            }
        };

        Self {
            title: get(b"Title"),
            author: get(b"Author"),
            subject: get(b"Subject"),
            keywords: get(b"Keywords"),
            creator: get(b"Creator"),
            producer: get(b"Producer"),
            creation_date: get(b"CreationDate"),
            mod_date: get(b"ModDate"),
        }
    }
}

fn resolve_dictionary<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        },
        _ => None,
    }
}

/// Raw XMP packet from the catalog's `/Metadata` stream, if any.
pub fn xmp_packet(doc: &Document) -> Option<String> {
    let catalog = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve_dictionary(doc, root))?;
    let id = catalog.get(b"Metadata").ok()?.as_reference().ok()?;
    let Object::Stream(stream) = doc.get_object(id).ok()? else {
        return None;
    };
    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Collect the known XMP properties. Element text (including every
/// `rdf:li` of a list) and attribute shorthand on `rdf:Description` are
/// both accepted. A malformed packet yields what was read before the error.
pub fn parse_xmp(xml: &str) -> XmpProperties {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut bag = XmpProperties::default();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                collect_attributes(&e, &mut bag);
                stack.push(name);
            }
            Ok(Event::Empty(e)) => collect_attributes(&e, &mut bag),
            Ok(Event::Text(t)) => {
                let property = stack
                    .iter()
                    .rev()
                    .find(|name| XMP_PROPERTIES.contains(&name.as_str()));
                if let (Some(property), Ok(text)) = (property, t.unescape()) {
                    bag.insert(property.clone(), &text);
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!("Stopped reading malformed XMP packet: {err}");
                break;
            }
            _ => {}
        }
    }
    bag
}

fn collect_attributes(element: &quick_xml::events::BytesStart<'_>, bag: &mut XmpProperties) {
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if XMP_PROPERTIES.contains(&key.as_str()) {
            if let Ok(value) = attr.unescape_value() {
                bag.insert(key, &value);
            }
        }
    }
}

/// Merge the Info dictionary and XMP. Info wins for title, author and
/// subject (which becomes the description).
pub fn build_metadata(info: &InfoDictionary, xmp: &XmpProperties) -> DocumentMetadata {
    let pick = |primary: &Option<String>, key: &str| -> String {
        primary
            .clone()
            .or_else(|| xmp.first(key).map(str::to_string))
            .unwrap_or_default()
    };

    let author = match &info.author {
        Some(author) => author.clone(),
        None => xmp.all("dc:creator").collect::<Vec<_>>().join(", "),
    };

    let mut subjects = normalize_subjects(xmp.all("dc:subject"));
    if subjects.is_empty() {
        if let Some(keywords) = &info.keywords {
            subjects = normalize_subjects(std::iter::once(keywords.as_str()));
        }
    }

    let publication_date = info
        .creation_date
        .as_deref()
        .and_then(parse_pdf_date)
        .or_else(|| xmp.first("xmp:CreateDate").map(str::to_string))
        .unwrap_or_default();

    DocumentMetadata {
        title: pick(&info.title, "dc:title"),
        author,
        language: xmp.first("dc:language").unwrap_or_default().to_string(),
        description: pick(&info.subject, "dc:description"),
        publisher: String::new(),
        publication_date,
        isbn: xmp
            .all("dc:identifier")
            .find_map(extract_isbn)
            .unwrap_or_default(),
        rights: xmp.first("dc:rights").unwrap_or_default().to_string(),
        identifier: xmp.first("dc:identifier").unwrap_or_default().to_string(),
        subjects,
    }
}

pub fn pdf_info(info: &InfoDictionary) -> PdfInfo {
    let date = |value: &Option<String>| value.as_deref().and_then(parse_pdf_date).unwrap_or_default();
    PdfInfo {
        producer: info.producer.clone().unwrap_or_default(),
        creator_tool: info.creator.clone().unwrap_or_default(),
        creation_date: date(&info.creation_date),
        modification_date: date(&info.mod_date),
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte-order
/// mark, else UTF-8, else PDFDocEncoding read as Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(value) => value.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Convert `D:YYYYMMDDHHmmSSOHH'mm'` (any trailing part optional) to RFC 3339.
/// A missing zone is read as UTC. Out-of-range fields, zone included, give `None`.
pub fn parse_pdf_date(value: &str) -> Option<String> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);
    let digits_len = value.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len < 4 {
        return None;
    }
    let (digits, zone) = value.split_at(digits_len);

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4, 2, 1)?, field(6, 2, 1)?)?;
    let naive = date.and_hms_opt(field(8, 2, 0)?, field(10, 2, 0)?, field(12, 2, 0)?)?;

    let offset = parse_zone(zone)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|datetime| datetime.to_rfc3339())
}

fn parse_zone(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    let sign = match zone.chars().next() {
        None | Some('Z') | Some('z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return FixedOffset::east_opt(0),
    };
    let numbers: Vec<i32> = zone[1..]
        .split('\'')
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();
    let hours = numbers.first().copied().unwrap_or(0);
    let minutes = numbers.get(1).copied().unwrap_or(0);
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
