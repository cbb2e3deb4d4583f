//! Caption track discovery and timed-text parsing.

use crate::error::{Result, SkrivError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A caption track advertised in a watch page's player response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// One caption line with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Extract the caption tracks embedded in a watch page.
///
/// Returns an empty list when the page has no captions.
pub fn extract_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>> {
    const MARKER: &str = "\"captionTracks\":";

    let Some(pos) = html.find(MARKER) else {
        return Ok(Vec::new());
    };

    let rest = &html[pos + MARKER.len()..];
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Vec<CaptionTrack>>();

    match stream.next() {
        Some(Ok(tracks)) => Ok(tracks),
        Some(Err(e)) => Err(SkrivError::YouTubeApi(format!(
            "Failed to parse caption tracks: {}",
            e
        ))),
        None => Ok(Vec::new()),
    }
}

/// Pick the track for `language`, preferring manually created captions.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Result<&'a CaptionTrack> {
    let matching = || {
        tracks
            .iter()
            .filter(move |t| t.language_code.eq_ignore_ascii_case(language))
    };

    matching()
        .find(|t| !t.is_generated())
        .or_else(|| matching().next())
        .ok_or_else(|| {
            let available: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
            if available.is_empty() {
                SkrivError::TranscriptUnavailable("video has no captions".to_string())
            } else {
                SkrivError::TranscriptUnavailable(format!(
                    "no captions in language '{}' (available: {})",
                    language,
                    available.join(", ")
                ))
            }
        })
}

fn element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(text|p)\b([^>]*?)(?:/>|>(.*?)</(?:text|p)>)").expect("element regex is valid")
    })
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([a-zA-Z]+)="([^"]*)""#).expect("attribute regex is valid"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

/// Parse a timed-text document into segments.
///
/// Handles both the legacy format (`<text start dur>` in seconds) and format 3
/// (`<p t d>` in milliseconds). Empty lines are dropped.
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    let mut segments = Vec::new();

    for caps in element_regex().captures_iter(xml) {
        let element = &caps[1];
        let attrs = &caps[2];
        let body = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        let (start_key, dur_key, scale) = if element == "text" {
            ("start", "dur", 1.0)
        } else {
            ("t", "d", 1000.0)
        };

        let mut start = None;
        let mut duration = 0.0;
        for attr in attr_regex().captures_iter(attrs) {
            let value = attr[2].parse::<f64>().ok();
            match &attr[1] {
                key if key == start_key => start = value.map(|v| v / scale),
                key if key == dur_key => duration = value.map(|v| v / scale).unwrap_or(0.0),
                _ => {}
            }
        }

        let Some(start) = start else {
            continue;
        };

        let text = clean_text(body);
        if text.is_empty() {
            continue;
        }

        segments.push(TranscriptSegment::new(text, start, duration));
    }

    segments
}

/// Strip markup and entities from a caption line, collapsing whitespace.
fn clean_text(raw: &str) -> String {
    // The XML layer carries styling tags such as `&lt;font&gt;`. Entities left after
    // that layer belong to the caption text and must not be read as markup.
    let xml_decoded = unescape_entities(raw);
    let stripped = tag_regex().replace_all(&xml_decoded, "");
    let text = unescape_entities(&stripped);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex is valid"))
}

/// Decode named and numeric character references. Unknown entities are kept as-is.
pub fn unescape_entities(input: &str) -> String {
    entity_regex()
        .replace_all(input, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{}", lang),
            language_code: lang.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_extract_caption_tracks() {
        let html = r#"<script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","name":{"simpleText":"English"},"vssId":".en","languageCode":"en","isTranslatable":true},{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en&kind=asr","vssId":"a.en","languageCode":"en","kind":"asr"}],"audioTracks":[]}}};</script>"#;

        let tracks = extract_caption_tracks(html).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].base_url, "https://www.youtube.com/api/timedtext?v=abc&lang=en");
        assert!(!tracks[0].is_generated());
        assert!(tracks[1].is_generated());
    }

    #[test]
    fn test_extract_caption_tracks_without_captions() {
        let tracks = extract_caption_tracks("<html><body>no player</body></html>").unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![track("en", Some("asr")), track("de", None), track("en", None)];
        let selected = select_track(&tracks, "en").unwrap();
        assert!(!selected.is_generated());
        assert_eq!(selected.language_code, "en");
    }

    #[test]
    fn test_select_track_falls_back_to_generated() {
        let tracks = vec![track("en", Some("asr"))];
        assert!(select_track(&tracks, "EN").unwrap().is_generated());
    }

    #[test]
    fn test_select_track_missing_language() {
        let tracks = vec![track("de", None), track("fr", None)];
        let err = select_track(&tracks, "en").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'en'"));
        assert!(message.contains("de, fr"));

        let err = select_track(&[], "en").unwrap_err();
        assert!(err.to_string().contains("no captions"));
    }

    #[test]
    fn test_parse_legacy_timed_text() {
        let xml = r##"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.08" dur="4.2">Hey there, it&amp;#39;s   me</text><text start="4.28" dur="2.5">Tom &amp;amp; Jerry</text><text start="6.78" dur="1.0"></text><text start="7.5" dur="2.0">&lt;font color=&quot;#E5E5E5&quot;&gt;colored&lt;/font&gt;</text></transcript>"##;

        let segments = parse_timed_text(xml);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "Hey there, it's me");
        assert!((segments[0].start - 0.08).abs() < 1e-9);
        assert!((segments[0].duration - 4.2).abs() < 1e-9);
        assert_eq!(segments[1].text, "Tom & Jerry");
        assert_eq!(segments[2].text, "colored");
    }

    #[test]
    fn test_escaped_angle_brackets_are_kept() {
        let xml = r#"<text start="0" dur="1">if x &amp;lt; y and y &amp;gt; z</text><text start="1" dur="1">Vec&amp;lt;String&amp;gt;</text>"#;

        let segments = parse_timed_text(xml);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "if x < y and y > z");
        assert_eq!(segments[1].text, "Vec<String>");
    }

    #[test]
    fn test_parse_format3_timed_text() {
        let xml = r#"<timedtext format="3"><body><p t="1200" d="2500">first line</p><p t="3700" d="1000">second
line</p></body></timedtext>"#;

        let segments = parse_timed_text(xml);
        assert_eq!(segments.len(), 2);
        assert!((segments[0].start - 1.2).abs() < 1e-9);
        assert!((segments[0].duration - 2.5).abs() < 1e-9);
        assert_eq!(segments[1].text, "second line");
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("a &lt;b&gt; &quot;c&quot;"), "a <b> \"c\"");
        assert_eq!(unescape_entities("&#39;&#x41;&#X42;"), "'AB");
        assert_eq!(unescape_entities("&unknown; stays"), "&unknown; stays");
    }
}
