use std::io::Write;
use std::path::Path;

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{parser, HintRuleSet};
use crate::config::Settings;
use crate::error::HintParseError;
use crate::fetch::{Downloader, FetchMode};
use crate::resources;

const URL_PATTERN: &str = r"(?i)^(https?|file):.*";

/// Load the built-in rules from `base`, then extend them with the file named
/// by `settings.hints.file`, if any.
///
/// Both sources are fatal on parse failure: a partial rule set would silently
/// under- or over-correct evidence.
pub fn load_rules(base: &str, settings: &Settings) -> Result<HintRuleSet, HintParseError> {
    let mut rules = parser::parse_str(base)?;

    if let Some(location) = settings.hints.file.as_deref() {
        let extra = load_external(location, settings).map_err(|e| {
            warn!("Unable to load hint rules from '{}': {}", location, e);
            e
        })?;
        rules.extend(extra);
    }

    debug!("{} hint rules were loaded.", rules.hint_rules.len());
    debug!(
        "{} duplicating hint rules were loaded.",
        rules.vendor_duplicating_rules.len()
    );
    Ok(rules)
}

/// Resolve `location` as a URL, a local path or an embedded resource, in
/// that order, and parse it.
fn load_external(location: &str, settings: &Settings) -> Result<HintRuleSet, HintParseError> {
    let url_rx = Regex::new(URL_PATTERN).map_err(|source| HintParseError::Pattern {
        pattern: URL_PATTERN.to_string(),
        source,
    })?;
    if url_rx.is_match(location) {
        let temp = temp_file(settings)?;
        download(location, temp.path(), settings)?;
        return parse_and_release(temp);
    }

    let path = Path::new(location);
    if path.exists() {
        return parser::parse_file(path);
    }

    if let Some(content) = resources::embedded(location) {
        let mut temp = temp_file(settings)?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(HintParseError::TempFile)?;
        return parse_and_release(temp);
    }

    // Neither a URL, a file nor a resource; report it as unreadable.
    parser::parse_file(path)
}

/// One direct attempt, then one relaxed retry.
fn download(url: &str, dest: &Path, settings: &Settings) -> Result<(), HintParseError> {
    let downloader = Downloader::new(settings);
    if let Err(first) = downloader.fetch_file(url, dest, FetchMode::Direct) {
        debug!("Direct fetch of {} failed ({}); retrying relaxed", url, first);
        downloader.fetch_file(url, dest, FetchMode::Relaxed)?;
    }
    Ok(())
}

fn temp_file(settings: &Settings) -> Result<NamedTempFile, HintParseError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("hint").suffix(".xml");
    match settings.temp_directory.as_deref() {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(HintParseError::TempFile)
}

/// Parse the temp file, then delete it. Deletion failures are only logged.
fn parse_and_release(temp: NamedTempFile) -> Result<HintRuleSet, HintParseError> {
    let parsed = parser::parse_file(temp.path());
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        warn!("Unable to delete temp file {}: {}", path.display(), e);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;
    use tempfile::TempDir;

    const EXTRA: &str = r#"<hints>
  <hint>
    <given><fileName contains="acme-widget.jar"/></given>
    <add><evidence type="vendor" source="hint analyzer" name="vendor" value="acme" confidence="HIGH"/></add>
  </hint>
  <vendorDuplicatingHint value="acme corp" duplicate="acme"/>
</hints>"#;

    fn settings_with(file: Option<String>, temp: &Path) -> Settings {
        let mut s = Settings::default();
        s.hints.file = file;
        s.temp_directory = Some(temp.to_path_buf());
        s
    }

    fn temp_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_builtin_rules_parse() {
        let rules = load_rules(resources::BASE_HINTS, &Settings::default()).unwrap();
        assert_eq!(rules.hint_rules.len(), 6);
        assert_eq!(rules.vendor_duplicating_rules.len(), 5);
    }

    #[test]
    fn test_local_file_extends_builtin() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("extra.xml");
        std::fs::write(&file, EXTRA).unwrap();
        let tmp = TempDir::new().unwrap();

        let settings = settings_with(Some(file.display().to_string()), tmp.path());
        let rules = load_rules(resources::BASE_HINTS, &settings).unwrap();
        assert_eq!(rules.hint_rules.len(), 7);
        assert_eq!(rules.vendor_duplicating_rules.len(), 6);
    }

    #[test]
    fn test_file_url_uses_and_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("extra.xml");
        std::fs::write(&file, EXTRA).unwrap();
        let tmp = TempDir::new().unwrap();

        let url = Url::from_file_path(&file).unwrap().to_string();
        let settings = settings_with(Some(url), tmp.path());
        let rules = load_rules("<hints/>", &settings).unwrap();
        assert_eq!(rules.hint_rules.len(), 1);
        assert_eq!(temp_entries(tmp.path()), 0);
    }

    #[test]
    fn test_embedded_resource_by_name() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_with(Some(resources::BASE_HINTS_NAME.to_string()), tmp.path());
        let rules = load_rules("<hints/>", &settings).unwrap();
        assert_eq!(rules.hint_rules.len(), 6);
        assert_eq!(temp_entries(tmp.path()), 0);
    }

    #[test]
    fn test_malformed_external_file_is_fatal_and_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.xml");
        std::fs::write(&file, "<hints><hint>").unwrap();
        let tmp = TempDir::new().unwrap();

        let url = Url::from_file_path(&file).unwrap().to_string();
        let settings = settings_with(Some(url), tmp.path());
        assert!(load_rules(resources::BASE_HINTS, &settings).is_err());
        assert_eq!(temp_entries(tmp.path()), 0);
    }

    #[test]
    fn test_unreachable_url_fails_after_retry() {
        let dir = TempDir::new().unwrap();
        let tmp = TempDir::new().unwrap();
        let url = Url::from_file_path(dir.path().join("missing.xml"))
            .unwrap()
            .to_string();
        let settings = settings_with(Some(url), tmp.path());
        let err = load_rules(resources::BASE_HINTS, &settings).unwrap_err();
        assert!(matches!(err, HintParseError::Download(_)));
        assert_eq!(temp_entries(tmp.path()), 0);
    }

    /// Answers one HTTP request with `body`, as a forward proxy would.
    fn serve_once(body: &'static str) -> std::net::SocketAddr {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
        });
        addr
    }

    #[test]
    fn test_failed_direct_fetch_retries_through_proxy() {
        let addr = serve_once(EXTRA);
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_with(
            Some("http://unreachable.invalid/hints.xml".into()),
            tmp.path(),
        );
        settings.proxy.url = Some(format!("http://{}", addr));

        let rules = load_rules("<hints/>", &settings).unwrap();
        assert_eq!(rules.hint_rules.len(), 1);
        assert_eq!(rules.vendor_duplicating_rules.len(), 1);
        assert_eq!(temp_entries(tmp.path()), 0);
    }

    #[test]
    fn test_unknown_location() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_with(Some("/no/such/hints.xml".into()), tmp.path());
        assert!(matches!(
            load_rules(resources::BASE_HINTS, &settings),
            Err(HintParseError::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_builtin_is_fatal() {
        assert!(load_rules("<hints>", &Settings::default()).is_err());
    }
}
