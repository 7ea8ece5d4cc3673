//! Adapter from rbook's metadata view to [`DocumentMetadata`]. This is the
//! only place EPUB metadata is read by field name.
use crate::text::strip_html_tags;
use crate::types::DocumentMetadata;
use rbook::prelude::*;
use rbook::Epub;
use regex::Regex;
use std::sync::OnceLock;

/// The package metadata fields the pipeline reads, copied out of rbook.
/// Absent fields are `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub title: Option<String>,
    pub creators: Vec<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub rights: Option<String>,
    /// `dc:identifier` values with their scheme, the package's unique identifier first
    pub identifiers: Vec<Identified>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identified {
    pub scheme: Option<String>,
    pub value: String,
}

impl PackageMetadata {
    pub fn from_epub(epub: &Epub) -> Self {
        let metadata = epub.metadata();

        let mut identifiers: Vec<Identified> = metadata
            .identifiers()
            .map(|id| Identified {
                scheme: id.scheme().map(|scheme| scheme.code().to_string()),
                value: clean(id.value()),
            })
            .filter(|id| !id.value.is_empty())
            .collect();
        if let Some(primary) = metadata.identifier().map(|id| clean(id.value())) {
            if let Some(index) = identifiers.iter().position(|id| id.value == primary) {
                let primary = identifiers.remove(index);
                identifiers.insert(0, primary);
            }
        }

        Self {
            title: metadata.title().map(|t| clean(t.value())),
            creators: metadata.creators().map(|c| clean(c.value())).collect(),
            language: metadata.languages().next().map(|l| clean(l.value())),
            description: metadata.descriptions().next().map(|d| d.value().to_string()),
            publisher: metadata.publishers().next().map(|p| clean(p.value())),
            date: metadata.publication_date().map(|d| clean(d.as_str())),
            rights: metadata
                .by_property("dc:rights")
                .next()
                .map(|r| clean(r.value())),
            identifiers,
            subjects: metadata.tags().map(|t| clean(t.value())).collect(),
        }
    }
}

fn clean(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn build_metadata(package: &PackageMetadata) -> DocumentMetadata {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    DocumentMetadata {
        title: text(&package.title),
        author: package
            .creators
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        language: text(&package.language),
        description: strip_html_tags(package.description.as_deref().unwrap_or_default()),
        publisher: text(&package.publisher),
        publication_date: text(&package.date),
        isbn: find_isbn(&package.identifiers),
        rights: text(&package.rights),
        identifier: find_identifier(&package.identifiers),
        subjects: normalize_subjects(package.subjects.iter().map(String::as_str)),
    }
}

/// The unique identifier unless it is an ISBN (that has its own field),
/// then the first with a UUID scheme, then whatever comes first.
fn find_identifier(identifiers: &[Identified]) -> String {
    identifiers
        .first()
        .filter(|id| !is_scheme(id, "ISBN"))
        .or_else(|| identifiers.iter().find(|id| is_scheme(id, "UUID")))
        .or_else(|| identifiers.first())
        .map(|id| id.value.clone())
        .unwrap_or_default()
}

fn is_scheme(id: &Identified, scheme: &str) -> bool {
    id.scheme
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case(scheme))
}

/// Split delimited subject strings and flatten them into one list,
/// dropping blanks and exact duplicates.
pub fn normalize_subjects<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::new();
    for value in values {
        for subject in value.split([',', ';']) {
            let subject = subject.trim();
            if !subject.is_empty() && !subjects.iter().any(|s| s == subject) {
                subjects.push(subject.to_string());
            }
        }
    }
    subjects
}

fn isbn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:97[89][- ]?)?(?:[0-9][- ]?){9}[0-9Xx]\b").expect("valid ISBN regex")
    })
}

/// First ISBN-10/13 among the identifiers, hyphens removed. Identifiers
/// with an ISBN scheme are searched before the rest.
fn find_isbn(identifiers: &[Identified]) -> String {
    let (marked, rest): (Vec<&Identified>, Vec<&Identified>) =
        identifiers.iter().partition(|id| is_scheme(id, "ISBN"));
    marked
        .into_iter()
        .chain(rest)
        .find_map(|id| extract_isbn(&id.value))
        .unwrap_or_default()
}

pub fn extract_isbn(value: &str) -> Option<String> {
    isbn_re().find_iter(value).find_map(|m| {
        let digits: String = m
            .as_str()
            .chars()
            .filter(|c| !matches!(c, '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        matches!(digits.len(), 10 | 13).then_some(digits)
    })
}
