//! ZIP-level checks that run before rbook opens the book: the container
//! document must exist, and `META-INF` must not announce DRM.
use crate::error::{ParseError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const ENCRYPTION_PATH: &str = "META-INF/encryption.xml";
const RIGHTS_PATH: &str = "META-INF/rights.xml";

/// Encryption algorithms that only obfuscate embedded fonts.
const FONT_OBFUSCATION_ALGORITHMS: [&str; 2] = [
    "http://www.idpf.org/2008/embedding",
    "http://ns.adobe.com/pdf/enc#RC",
];

/// Open the archive and report why the book counts as DRM-protected, if it
/// does. A broken ZIP or a missing container document is `CorruptContainer`.
pub fn check_container(data: &[u8]) -> Result<Option<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    if archive.by_name(CONTAINER_PATH).is_err() {
        return Err(ParseError::CorruptContainer(format!(
            "missing {CONTAINER_PATH}"
        )));
    }

    if archive.by_name(RIGHTS_PATH).is_ok() {
        return Ok(Some(format!("{RIGHTS_PATH} present")));
    }
    let Ok(mut entry) = archive.by_name(ENCRYPTION_PATH) else {
        return Ok(None);
    };
    let mut xml = String::new();
    if let Err(err) = entry.read_to_string(&mut xml) {
        return Ok(Some(format!("unreadable {ENCRYPTION_PATH}: {err}")));
    }

    Ok(match encryption_algorithms(&xml) {
        Ok(algorithms) => algorithms
            .into_iter()
            .find(|algorithm| !FONT_OBFUSCATION_ALGORITHMS.contains(&algorithm.as_str()))
            .map(|algorithm| format!("resources encrypted with {algorithm}")),
        Err(err) => Some(format!("unreadable {ENCRYPTION_PATH}: {err}")),
    })
}

/// `Algorithm` attribute of every `EncryptionMethod` in `encryption.xml`.
fn encryption_algorithms(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut algorithms = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"EncryptionMethod" => {
                let algorithm = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"Algorithm")
                    .and_then(|attr| attr.unescape_value().ok());
                if let Some(algorithm) = algorithm {
                    algorithms.push(algorithm.trim().to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(algorithms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn encryption(algorithm: &str) -> String {
        format!(
            r#"<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container" xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
              <enc:EncryptedData><enc:EncryptionMethod Algorithm="{algorithm}"/></enc:EncryptedData>
            </encryption>"#
        )
    }

    #[test]
    fn test_font_obfuscation_is_not_drm() {
        let data = archive(&[
            (CONTAINER_PATH, "<container/>"),
            (ENCRYPTION_PATH, &encryption("http://www.idpf.org/2008/embedding")),
        ]);
        assert_eq!(check_container(&data).unwrap(), None);
    }

    #[test]
    fn test_encrypted_resources_are_drm() {
        let data = archive(&[
            (CONTAINER_PATH, "<container/>"),
            (ENCRYPTION_PATH, &encryption("http://www.w3.org/2001/04/xmlenc#aes256-cbc")),
        ]);
        let marker = check_container(&data).unwrap().unwrap();
        assert!(marker.contains("aes256-cbc"));
    }

    #[test]
    fn test_rights_file_is_drm() {
        let data = archive(&[(CONTAINER_PATH, "<container/>"), (RIGHTS_PATH, "<rights/>")]);
        assert!(check_container(&data).unwrap().is_some());
    }

    #[test]
    fn test_missing_container_is_corrupt() {
        let data = archive(&[("mimetype", "application/epub+zip")]);
        assert!(matches!(
            check_container(&data),
            Err(ParseError::CorruptContainer(_))
        ));
    }
}
