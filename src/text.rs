//! Text normalisation shared by every extractor: HTML stripping, word
//! counting, reading time and content hashing.
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Default reading speed used when no other is configured.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 250;

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&apos;", "'"),
    // last, so "&amp;lt;" decodes to the literal "&lt;" in one pass
    ("&amp;", "&"),
];

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
            .expect("valid script/style regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

/// Remove markup and return collapsed plain text.
///
/// Script and style blocks are dropped with their content, remaining tags
/// are removed, a fixed entity set is decoded and whitespace runs collapse
/// to one space. Decoding can expose new markup (`&lt;b&gt;`), so the pass
/// repeats until the text stops changing, which makes the function
/// idempotent. Use [`strip_tags_once`] where escaped markup is content.
pub fn strip_html_tags(html: &str) -> String {
    let mut current = strip_tags_once(html);
    loop {
        let next = strip_tags_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// A single stripping pass. Entities are decoded after tags are removed, so
/// `&lt;b&gt;` comes back as the literal text `<b>`.
pub fn strip_tags_once(html: &str) -> String {
    let without_blocks = script_style_re().replace_all(html, " ");
    let without_tags = tag_re().replace_all(&without_blocks, " ");

    let mut decoded = without_tags.into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count whitespace-separated words after stripping markup.
pub fn count_words(text: &str) -> usize {
    if text.contains('<') || text.contains('&') {
        strip_html_tags(text).split_whitespace().count()
    } else {
        text.split_whitespace().count()
    }
}

/// Estimated minutes to read `word_count` words at `words_per_minute`,
/// rounded up. Zero when either input is zero.
pub fn calculate_reading_time(word_count: usize, words_per_minute: usize) -> usize {
    if word_count == 0 || words_per_minute == 0 {
        return 0;
    }
    word_count.div_ceil(words_per_minute)
}

/// SHA-256 hex digest used to spot the same content across uploads.
pub fn generate_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_removes_script_and_style_content() {
        let html = "<html><head><style>p { color: red; }</style></head>\
                    <body><script>var x = 1;</script><p>Hello <b>world</b></p></body></html>";
        assert_eq!(strip_html_tags(html), "Hello world");
    }

    #[test]
    fn test_strip_decodes_entities() {
        assert_eq!(
            strip_html_tags("Tom&nbsp;&amp;&nbsp;Jerry &quot;quoted&quot; &#039;a&apos;"),
            "Tom & Jerry \"quoted\" 'a'"
        );
    }

    #[test]
    fn test_strip_collapses_whitespace() {
        assert_eq!(strip_html_tags("  a \n\n\t b  "), "a b");
    }

    #[test]
    fn test_strip_separates_adjacent_blocks() {
        assert_eq!(strip_html_tags("<p>one</p><p>two</p>"), "one two");
    }

    #[test]
    fn test_strip_escaped_markup_is_stable() {
        let once = strip_html_tags("&lt;b&gt;bold&lt;/b&gt;");
        assert_eq!(once, "bold");
        assert_eq!(strip_html_tags(&once), once);
    }

    #[test]
    fn test_single_pass_keeps_escaped_markup() {
        assert_eq!(
            strip_tags_once("<h2>Using &lt;b&gt; tags</h2>"),
            "Using <b> tags"
        );
        assert_eq!(strip_tags_once("<p>a &amp;lt; b</p>"), "a &lt; b");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("one two  three"), 3);
        assert_eq!(count_words("<p>one</p><p>two</p>"), 2);
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(calculate_reading_time(0, 250), 0);
        assert_eq!(calculate_reading_time(100, 0), 0);
        assert_eq!(calculate_reading_time(1, 250), 1);
        assert_eq!(calculate_reading_time(250, 250), 1);
        assert_eq!(calculate_reading_time(251, 250), 2);
        assert_eq!(calculate_reading_time(1000, 250), 4);
        assert_eq!(calculate_reading_time(1000, 500), 2);
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        assert_eq!(
            generate_content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    proptest! {
        #[test]
        fn prop_strip_is_idempotent(input in "[a-zA-Z <>/&;#0-9lgtampbs\n]{0,80}") {
            let once = strip_html_tags(&input);
            prop_assert_eq!(strip_html_tags(&once), once);
        }

        #[test]
        fn prop_hash_is_deterministic(input in ".{0,200}") {
            prop_assert_eq!(generate_content_hash(&input), generate_content_hash(&input));
        }

        #[test]
        fn prop_doubling_wpm_roughly_halves(words in 1usize..100_000, wpm in 1usize..1000) {
            let slow = calculate_reading_time(words, wpm);
            let fast = calculate_reading_time(words, wpm * 2);
            prop_assert!(fast <= slow);
            prop_assert!(slow <= 2 * fast);
        }

        #[test]
        fn prop_zero_words_reads_instantly(wpm in 1usize..10_000) {
            prop_assert_eq!(calculate_reading_time(0, wpm), 0);
        }
    }
}
