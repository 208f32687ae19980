//! Event-driven parsing of product feed XML into raw entry field maps.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;

/// One `<entry>` element of a feed, as a flat map of field name to text.
///
/// Field names are local names: namespace prefixes (`<g:title>` vs
/// `<title>`) are stripped during parsing, so prefixed and unprefixed forms
/// of the same field are identical keys. When an entry repeats a field, the
/// first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    fields: HashMap<String, String>,
}

impl RawEntry {
    /// Returns the text of `name`, if the entry carried that field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the text of the first field in `names` the entry carries,
    /// or the empty string when none is present.
    ///
    /// A present-but-empty field still wins over later fallbacks, matching
    /// how feed producers emit explicit empty tags.
    #[must_use]
    pub fn first_of(&self, names: &[&str]) -> &str {
        names
            .iter()
            .find_map(|name| self.field(name))
            .unwrap_or_default()
    }

    fn insert_first(&mut self, name: String, value: String) {
        self.fields.entry(name).or_insert(value);
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut entry = Self::default();
        for (name, value) in pairs {
            entry.insert_first((*name).to_string(), (*value).to_string());
        }
        entry
    }
}

/// Parses a feed document into its sequence of raw entries.
///
/// The document must contain a `feed` element with `entry` children; a feed
/// with a single entry yields a one-element vector. Per field, text and
/// CDATA content is accumulated across nested inline markup and trimmed.
///
/// # Errors
///
/// Returns [`FeedError::Xml`]/[`FeedError::UnclosedElement`]/
/// [`FeedError::UnexpectedClose`] when the document is not well-formed, and
/// [`FeedError::NoEntries`] when no `feed`/`entry` path exists.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut entry: Option<RawEntry> = None;
    // Depth of the open <entry> element; its direct children are fields.
    let mut entry_depth = 0usize;
    let mut field_name = String::new();
    let mut field_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                let parent_is_feed = stack.last().is_some_and(|n| n == "feed");
                stack.push(name.clone());
                let depth = stack.len();

                if entry.is_none() {
                    if name == "entry" && parent_is_feed {
                        entry = Some(RawEntry::default());
                        entry_depth = depth;
                        field_name.clear();
                        field_text.clear();
                    }
                } else if depth == entry_depth + 1 {
                    field_name = name;
                    field_text.clear();
                }
                // Deeper elements are inline markup inside the current
                // field; their text keeps accumulating below.
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(e.name().as_ref());
                if let Some(current) = entry.as_mut() {
                    if stack.len() == entry_depth {
                        current.insert_first(name, String::new());
                    }
                } else if name == "entry" && stack.last().is_some_and(|n| n == "feed") {
                    // A self-closed <entry/> still counts as one entry; it
                    // will be skipped downstream for its empty name.
                    entries.push(RawEntry::default());
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref());
                if stack.pop().is_none() {
                    return Err(FeedError::UnexpectedClose { element: name });
                }
                if let Some(current) = entry.as_mut() {
                    if stack.len() == entry_depth {
                        // A field element closed directly under the entry.
                        current.insert_first(
                            std::mem::take(&mut field_name),
                            std::mem::take(&mut field_text).trim().to_string(),
                        );
                    } else if stack.len() + 1 == entry_depth {
                        // The entry itself closed.
                        if let Some(done) = entry.take() {
                            entries.push(done);
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if entry.is_some() && stack.len() > entry_depth {
                    let text = e.unescape().unwrap_or_default();
                    append_text(&mut field_text, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if entry.is_some() && stack.len() > entry_depth {
                    let text = String::from_utf8_lossy(e.as_ref());
                    append_text(&mut field_text, &text);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if entry.is_some() && stack.len() > entry_depth {
                    if let Some(ch) = resolve_entity(e.as_ref()) {
                        append_text(&mut field_text, ch.encode_utf8(&mut [0u8; 4]));
                    }
                }
            }
            Ok(Event::Eof) => {
                if let Some(element) = stack.pop() {
                    return Err(FeedError::UnclosedElement { element });
                }
                break;
            }
            Err(e) => return Err(FeedError::Xml(e)),
            _ => {}
        }
    }

    if entries.is_empty() {
        return Err(FeedError::NoEntries);
    }
    Ok(entries)
}

/// Element name with any namespace prefix stripped: `g:title` → `title`.
fn local_name(raw: &[u8]) -> String {
    let start = raw
        .iter()
        .position(|&b| b == b':')
        .map_or(0, |colon| colon + 1);
    String::from_utf8_lossy(&raw[start..]).into_owned()
}

/// Resolves predefined entities and character references (`&amp;`,
/// `&#38;`, `&#x26;`). Unknown entities are dropped.
fn resolve_entity(raw: &[u8]) -> Option<char> {
    match raw {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"apos" => Some('\''),
        b"quot" => Some('"'),
        _ => {
            let num = std::str::from_utf8(raw.strip_prefix(b"#")?).ok()?;
            let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

fn append_text(buffer: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_entries() {
        let xml = "<feed>\
            <entry><title>First</title><price>10.00</price></entry>\
            <entry><title>Second</title><price>20.00</price></entry>\
        </feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field("title"), Some("First"));
        assert_eq!(entries[1].field("price"), Some("20.00"));
    }

    #[test]
    fn single_entry_yields_one_element_sequence() {
        let xml = "<feed><entry><title>Only</title></entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("title"), Some("Only"));
    }

    #[test]
    fn strips_namespace_prefixes_from_field_names() {
        let xml = r#"<rss xmlns:g="http://base.google.com/ns/1.0">
            <feed>
              <entry>
                <g:title>Prefixed</g:title>
                <g:price>15.00 RON</g:price>
              </entry>
            </feed>
        </rss>"#;
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("title"), Some("Prefixed"));
        assert_eq!(entries[0].field("price"), Some("15.00 RON"));
    }

    #[test]
    fn accumulates_cdata_content() {
        let xml = "<feed><entry>\
            <title><![CDATA[Trail Runner]]></title>\
            <description><![CDATA[Fast & light]]></description>\
        </entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("title"), Some("Trail Runner"));
        assert_eq!(entries[0].field("description"), Some("Fast & light"));
    }

    #[test]
    fn accumulates_text_around_nested_inline_markup() {
        let xml = "<feed><entry>\
            <description>Soft <b>leather</b> upper</description>\
            <title>Boot</title>\
        </entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("description"), Some("Soft leather upper"));
    }

    #[test]
    fn first_occurrence_of_repeated_field_wins() {
        let xml = "<feed><entry>\
            <title>Kept</title>\
            <title>Dropped</title>\
        </entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("title"), Some("Kept"));
    }

    #[test]
    fn unescapes_xml_entities() {
        let xml = "<feed><entry><title>Foo &amp; Bar</title></entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("title"), Some("Foo & Bar"));
    }

    #[test]
    fn self_closed_entry_counts_but_has_no_fields() {
        let xml = "<feed><entry/></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("title"), None);
    }

    #[test]
    fn self_closed_field_is_present_and_empty() {
        let xml = "<feed><entry><title/><price>9.99</price></entry></feed>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries[0].field("title"), Some(""));
    }

    #[test]
    fn truncated_document_is_rejected() {
        let xml = "<feed><entry><title>Cut off</title>";
        let err = parse_feed(xml).expect_err("expected parse failure");
        assert!(matches!(err, FeedError::UnclosedElement { .. }), "got: {err:?}");
    }

    #[test]
    fn mismatched_close_is_rejected() {
        let xml = "<feed><entry><title>x</wrong></entry></feed>";
        let err = parse_feed(xml).expect_err("expected parse failure");
        assert!(matches!(err, FeedError::Xml(_)), "got: {err:?}");
    }

    #[test]
    fn document_without_entries_is_no_entries() {
        let err = parse_feed("<feed></feed>").expect_err("expected failure");
        assert!(matches!(err, FeedError::NoEntries));
    }

    #[test]
    fn document_without_feed_is_no_entries() {
        let err = parse_feed("<catalog><entry><title>x</title></entry></catalog>")
            .expect_err("expected failure");
        assert!(matches!(err, FeedError::NoEntries));
    }

    #[test]
    fn plain_text_input_is_no_entries() {
        let err = parse_feed("this is not a feed").expect_err("expected failure");
        assert!(matches!(err, FeedError::NoEntries));
    }

    #[test]
    fn entry_outside_feed_is_ignored() {
        let xml = "<root><entry><title>stray</title></entry><feed><entry><title>real</title></entry></feed></root>";
        let entries = parse_feed(xml).expect("parse failed");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("title"), Some("real"));
    }

    #[test]
    fn first_of_prefers_earlier_present_field() {
        let entry = RawEntry::from_pairs(&[("g_title", "fallback")]);
        assert_eq!(entry.first_of(&["title", "g_title"]), "fallback");

        let entry = RawEntry::from_pairs(&[("title", ""), ("g_title", "fallback")]);
        // Present-but-empty title still wins over the fallback.
        assert_eq!(entry.first_of(&["title", "g_title"]), "");
    }
}
