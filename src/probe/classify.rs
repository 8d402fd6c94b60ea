//! Classifier for ffmpeg `silencedetect` log lines.
//!
//! Stateless: each diagnostic line is classified independently and
//! unparseable tool output is never an error, only [`SilenceEvent::Unknown`].
//! Timestamps embedded in the line are not parsed here; a consumer that
//! needs silence durations extracts them itself.

use std::sync::OnceLock;

use regex::Regex;

// Example: [silencedetect @ 0x7fc1f3625880]
fn prefix_rx() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(r"^\[silencedetect\s@\s0x[0-9a-f]+\]\s+").expect("valid regex"))
}

// Example: silence_start: 0
fn start_rx() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(r"^silence_start:\s(-?[0-9]+(\.[0-9]+)?)$").expect("valid regex"))
}

// Example: silence_end: 2.21243 | silence_duration: 2.21243
fn end_rx() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(r"^silence_end:\s(-?[0-9]+(\.[0-9]+)?)").expect("valid regex"))
}

/// Classification of one decode-tool diagnostic line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SilenceEvent {
    /// Line is not a silence marker (or not from the detector at all).
    Unknown,
    /// Audio silence started.
    Start,
    /// Audio silence ended.
    End,
}

/// Classifies one diagnostic line.
///
/// A line must match the detector's tag prefix (tool name plus an opaque
/// instance address) before the remainder is checked against the start/end
/// patterns.
pub fn classify(line: &str) -> SilenceEvent {
    let Some(prefix) = prefix_rx().find(line) else {
        return SilenceEvent::Unknown;
    };
    let rest = &line[prefix.end()..];

    if start_rx().is_match(rest) {
        SilenceEvent::Start
    } else if end_rx().is_match(rest) {
        SilenceEvent::End
    } else {
        SilenceEvent::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_silence_start() {
        assert_eq!(
            classify("[silencedetect @ 0x7fc1f3625880] silence_start: 0"),
            SilenceEvent::Start
        );
        assert_eq!(
            classify("[silencedetect @ 0x55d1a3c0] silence_start: -1.5"),
            SilenceEvent::Start
        );
    }

    #[test]
    fn classifies_silence_end_with_and_without_duration() {
        assert_eq!(
            classify("[silencedetect @ 0x7fc1f3625880] silence_end: 2.21243 | silence_duration: 2.21243"),
            SilenceEvent::End
        );
        assert_eq!(
            classify("[silencedetect @ 0x7fc1f3625880] silence_end: 17"),
            SilenceEvent::End
        );
    }

    #[test]
    fn missing_prefix_is_unknown() {
        assert_eq!(classify("silence_start: 0"), SilenceEvent::Unknown);
        assert_eq!(classify(""), SilenceEvent::Unknown);
        assert_eq!(
            classify("frame=  100 fps= 25 q=-1.0 size=     256kB"),
            SilenceEvent::Unknown
        );
    }

    #[test]
    fn prefix_without_marker_is_unknown() {
        assert_eq!(
            classify("[silencedetect @ 0x7fc1f3625880] something else"),
            SilenceEvent::Unknown
        );
        // Trailing garbage after a start marker breaks the anchored match.
        assert_eq!(
            classify("[silencedetect @ 0x7fc1f3625880] silence_start: 0 extra"),
            SilenceEvent::Unknown
        );
    }

    #[test]
    fn classification_is_order_independent() {
        let lines = [
            "[silencedetect @ 0xdeadbeef] silence_end: 1.0",
            "[silencedetect @ 0xdeadbeef] silence_start: 1.0",
            "[silencedetect @ 0xdeadbeef] silence_end: 1.0",
        ];
        let first: Vec<_> = lines.iter().map(|l| classify(l)).collect();
        let second: Vec<_> = lines.iter().map(|l| classify(l)).collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![SilenceEvent::End, SilenceEvent::Start, SilenceEvent::End]
        );
    }
}
