//! Hint rule XML.
//!
//! ```xml
//! <hints version="1">
//!   <hint>
//!     <given>
//!       <evidence type="product" source="jar" name="name" value="foo" />
//!       <fileName contains="foo-.*\.jar" regex="true" caseSensitive="false" />
//!     </given>
//!     <add>
//!       <evidence type="vendor" source="hint analyzer" name="vendor" value="baz" confidence="HIGHEST" />
//!     </add>
//!     <remove>
//!       <evidence type="vendor" source="jar" name="vendor" value="bar" />
//!     </remove>
//!   </hint>
//!   <vendorDuplicatingHint value="apache software foundation" duplicate="apache" />
//! </hints>
//! ```
//!
//! `confidence` is required inside `<add>` and defaults to `MEDIUM` elsewhere,
//! where it does not take part in matching. Namespaces are ignored.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{FilenamePattern, HintRule, HintRuleSet, VendorDuplicatingHintRule};
use crate::error::HintParseError;
use crate::evidence::{Confidence, Evidence, EvidenceType};

/// Schema versions this parser understands.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Given,
    Add,
    Remove,
}

/// Parse hint rules from the file at `path`.
pub fn parse_file(path: &Path) -> Result<HintRuleSet, HintParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| HintParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content)
}

/// Parse hint rules from an XML document.
pub fn parse_str(xml: &str) -> Result<HintRuleSet, HintParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = RuleBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| HintParseError::Xml(e.to_string()))?
        {
            Event::Start(ref e) => builder.open(e, false)?,
            Event::Empty(ref e) => builder.open(e, true)?,
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                builder.close(&tag);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

/// Accumulates rules while walking the event stream.
#[derive(Default)]
struct RuleBuilder {
    rules: HintRuleSet,
    seen_root: bool,
    depth: u32,
    current: Option<HintRule>,
    section: Option<Section>,
}

impl RuleBuilder {
    fn open(&mut self, e: &BytesStart, is_empty: bool) -> Result<(), HintParseError> {
        let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();

        if !self.seen_root {
            if tag != "hints" {
                return Err(HintParseError::Invalid(format!(
                    "expected <hints> root element, found <{}>",
                    tag
                )));
            }
            check_version(&attributes(e)?)?;
            self.seen_root = true;
            if !is_empty {
                self.depth += 1;
            }
            return Ok(());
        }

        match (tag.as_str(), self.current.as_mut(), self.section) {
            ("hint", None, None) => self.current = Some(HintRule::default()),
            ("given", Some(_), None) => self.section = Some(Section::Given),
            ("add", Some(_), None) => self.section = Some(Section::Add),
            ("remove", Some(_), None) => self.section = Some(Section::Remove),
            ("evidence", Some(rule), Some(section)) => {
                let (kind, evidence) = parse_evidence(&attributes(e)?, section)?;
                match section {
                    Section::Given => rule.given.push(kind, evidence),
                    Section::Add => rule.add.push(kind, evidence),
                    Section::Remove => rule.remove.push(kind, evidence),
                }
            }
            ("fileName", Some(rule), Some(Section::Given)) => {
                rule.filename_patterns.push(parse_filename(&attributes(e)?)?);
            }
            ("vendorDuplicatingHint", None, None) => {
                let attrs = attributes(e)?;
                self.rules
                    .vendor_duplicating_rules
                    .push(VendorDuplicatingHintRule::new(
                        required(&attrs, "value", &tag)?,
                        required(&attrs, "duplicate", &tag)?,
                    ));
            }
            _ => {
                return Err(HintParseError::Invalid(format!(
                    "unexpected element <{}>",
                    tag
                )))
            }
        }

        if is_empty {
            self.close_construct(&tag);
        } else {
            self.depth += 1;
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) {
        self.close_construct(tag);
        self.depth = self.depth.saturating_sub(1);
    }

    /// Finish whichever construct `tag` ends.
    fn close_construct(&mut self, tag: &str) {
        match tag {
            "given" | "add" | "remove" => self.section = None,
            "hint" => {
                if let Some(rule) = self.current.take() {
                    self.rules.hint_rules.push(rule);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<HintRuleSet, HintParseError> {
        if !self.seen_root {
            return Err(HintParseError::Invalid("missing <hints> root element".into()));
        }
        if self.depth != 0 || self.current.is_some() {
            return Err(HintParseError::Xml("unexpected end of document".into()));
        }
        Ok(self.rules)
    }
}

fn attributes(e: &BytesStart) -> Result<HashMap<String, String>, HintParseError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| HintParseError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| HintParseError::Xml(err.to_string()))?;
        map.insert(key, value.into_owned());
    }
    Ok(map)
}

fn required(
    attrs: &HashMap<String, String>,
    key: &str,
    element: &str,
) -> Result<String, HintParseError> {
    attrs.get(key).cloned().ok_or_else(|| {
        HintParseError::Invalid(format!("<{}> is missing the '{}' attribute", element, key))
    })
}

fn flag(attrs: &HashMap<String, String>, key: &str) -> Result<bool, HintParseError> {
    match attrs.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" => Ok(true),
        Some(v) if v == "false" => Ok(false),
        Some(v) => Err(HintParseError::Invalid(format!(
            "'{}' must be true or false, found '{}'",
            key, v
        ))),
    }
}

fn check_version(attrs: &HashMap<String, String>) -> Result<(), HintParseError> {
    match attrs.get("version") {
        Some(v) if !SUPPORTED_VERSIONS.contains(&v.trim()) => {
            Err(HintParseError::UnsupportedVersion(v.clone()))
        }
        _ => Ok(()),
    }
}

fn parse_evidence(
    attrs: &HashMap<String, String>,
    section: Section,
) -> Result<(EvidenceType, Evidence), HintParseError> {
    let kind: EvidenceType = required(attrs, "type", "evidence")?
        .parse()
        .map_err(HintParseError::Invalid)?;
    let confidence = match attrs.get("confidence") {
        Some(c) => c.parse::<Confidence>().map_err(HintParseError::Invalid)?,
        None if section == Section::Add => {
            return Err(HintParseError::Invalid(
                "<evidence> inside <add> requires a confidence".into(),
            ))
        }
        None => Confidence::Medium,
    };
    let evidence = Evidence::new(
        required(attrs, "source", "evidence")?,
        required(attrs, "name", "evidence")?,
        required(attrs, "value", "evidence")?,
        confidence,
    );
    Ok((kind, evidence))
}

fn parse_filename(attrs: &HashMap<String, String>) -> Result<FilenamePattern, HintParseError> {
    let value = required(attrs, "contains", "fileName")?;
    let case_sensitive = flag(attrs, "caseSensitive")?;
    if flag(attrs, "regex")? {
        FilenamePattern::regex(value, case_sensitive)
    } else {
        Ok(FilenamePattern::literal(value, case_sensitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hints xmlns="urn:evidence-engine:hints" version="1">
  <hint>
    <given>
      <evidence type="product" source="jar" name="name" value="foo"/>
      <fileName contains="foo-.*\.jar" regex="true"/>
    </given>
    <add>
      <evidence type="vendor" source="hint analyzer" name="vendor" value="baz" confidence="HIGHEST"/>
    </add>
    <remove>
      <evidence type="vendor" source="jar" name="vendor" value="bar"/>
    </remove>
  </hint>
  <vendorDuplicatingHint value="apache software foundation" duplicate="apache"/>
</hints>"#;

    #[test]
    fn test_parse_sample() {
        let rules = parse_str(SAMPLE).unwrap();
        assert_eq!(rules.hint_rules.len(), 1);
        let rule = &rules.hint_rules[0];
        assert_eq!(rule.given.product.len(), 1);
        assert_eq!(rule.filename_patterns.len(), 1);
        assert!(rule.filename_patterns[0].matches("FOO-1.2.jar"));
        assert_eq!(rule.add.vendor[0].value(), "baz");
        assert_eq!(rule.add.vendor[0].confidence(), Confidence::Highest);
        assert_eq!(rule.remove.vendor[0].value(), "bar");
        assert_eq!(
            rules.vendor_duplicating_rules,
            vec![VendorDuplicatingHintRule::new("apache software foundation", "apache")]
        );
    }

    #[test]
    fn test_parse_file() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", SAMPLE).unwrap();
        let rules = parse_file(f.path()).unwrap();
        assert_eq!(rules.hint_rules.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_file(Path::new("/definitely/not/here.xml")).unwrap_err();
        assert!(matches!(err, HintParseError::Io { .. }));
    }

    #[test]
    fn test_empty_hints_document() {
        let rules = parse_str("<hints/>").unwrap();
        assert!(rules.hint_rules.is_empty());
        assert!(rules.vendor_duplicating_rules.is_empty());
    }

    #[test]
    fn test_add_requires_confidence() {
        let xml = r#"<hints><hint><add>
            <evidence type="vendor" source="s" name="n" value="v"/>
        </add></hint></hints>"#;
        assert!(matches!(parse_str(xml), Err(HintParseError::Invalid(_))));
    }

    #[test]
    fn test_unknown_evidence_type() {
        let xml = r#"<hints><hint><given>
            <evidence type="license" source="s" name="n" value="v"/>
        </given></hint></hints>"#;
        assert!(matches!(parse_str(xml), Err(HintParseError::Invalid(_))));
    }

    #[test]
    fn test_filename_outside_given_is_rejected() {
        let xml = r#"<hints><hint><add><fileName contains="x"/></add></hint></hints>"#;
        assert!(parse_str(xml).is_err());
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            parse_str("<suppressions/>"),
            Err(HintParseError::Invalid(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(
            parse_str(r#"<hints version="2"/>"#),
            Err(HintParseError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let xml = "<hints><hint><given></hint></hints>";
        assert!(parse_str(xml).is_err());
        assert!(parse_str("<hints><hint>").is_err());
        assert!(parse_str("").is_err());
    }
}
