//! Scan burst decoder.
//!
//! Labels on the shelves carry two fields, a reference and a designation,
//! which the scanner types out separated by Enter. The decoder accumulates
//! keystrokes of one burst and extracts the text between the two field labels.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use stockscan_core::Sku;

use crate::key::{Key, KeyEvent};

/// Inter-keystroke gap after which a partial burst is discarded.
pub const DEFAULT_DEBOUNCE_MS: i64 = 2000;

/// `Référence:<sku> Désignation`, tolerant of case and of mangled accents.
///
/// A mangled accent is at most a few non-blank characters in place of each
/// `é`, so a `D` inside the SKU cannot pass for the designation label.
static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)R[^\s:]{0,3}f[^\s:]{0,3}rence:(.*?)D[^\s:]{0,3}signation")
        .expect("reference regex should compile")
});

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum gap between two keystrokes of the same burst.
    pub debounce: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::milliseconds(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl DecoderConfig {
    pub fn with_debounce_ms(mut self, millis: i64) -> Self {
        self.debounce = Duration::milliseconds(millis);
        self
    }
}

/// Extract the SKU from an accumulated buffer, if the marker pair is present.
///
/// A blank capture counts as no match.
pub fn extract_sku(buffer: &str) -> Option<Sku> {
    let captures = REFERENCE_PATTERN.captures(buffer)?;
    let sku = captures.get(1)?.as_str().trim();
    if sku.is_empty() {
        None
    } else {
        Some(Sku::new(sku))
    }
}

/// Stateful keystroke → SKU parser.
///
/// Purely event driven: the debounce window is checked against the timestamp of
/// the incoming event, no timer runs in between.
#[derive(Debug, Clone, Default)]
pub struct ScanDecoder {
    config: DecoderConfig,
    buffer: String,
    last_event_at: Option<DateTime<Utc>>,
}

impl ScanDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            last_event_at: None,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Characters accumulated for the current burst.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Drop any partial burst.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_event_at = None;
    }

    /// Process one key event; returns the SKU when this key completes a label.
    pub fn feed(&mut self, event: &KeyEvent) -> Option<Sku> {
        if let Some(last) = self.last_event_at {
            if event.at - last > self.config.debounce && !self.buffer.is_empty() {
                trace!(discarded = %self.buffer, "scan burst timed out");
                self.buffer.clear();
            }
        }
        self.last_event_at = Some(event.at);

        match &event.key {
            Key::Enter => self.buffer.push(' '),
            Key::Char(c) if !c.is_control() => self.buffer.push(*c),
            _ => return None,
        }

        let sku = extract_sku(&self.buffer)?;
        debug!(sku = %sku, "scan decoded");
        self.buffer.clear();
        Some(sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    /// Feed `text` one character every 10 ms starting at `start`, `\n` as Enter.
    /// Returns every decoded SKU and the time of the last key.
    fn type_burst(
        decoder: &mut ScanDecoder,
        text: &str,
        start: DateTime<Utc>,
    ) -> (Vec<Sku>, DateTime<Utc>) {
        let mut at = start;
        let mut decoded = Vec::new();
        for c in text.chars() {
            let key = if c == '\n' { Key::Enter } else { Key::Char(c) };
            if let Some(sku) = decoder.feed(&KeyEvent::new(key, at)) {
                decoded.push(sku);
            }
            at += Duration::milliseconds(10);
        }
        (decoded, at)
    }

    #[test]
    fn full_label_decodes_once_and_clears_buffer() {
        let mut decoder = ScanDecoder::default();
        let (decoded, _) = type_burst(&mut decoder, "Reference:ABC-123\nDesignation", t0());
        assert_eq!(decoded, vec![Sku::new("ABC-123")]);
        assert_eq!(decoder.buffer(), "");
    }

    #[test]
    fn garbled_accents_still_decode() {
        let mut decoder = ScanDecoder::default();
        let (decoded, _) =
            type_burst(&mut decoder, "RÃ©fÃ©rence:1.1/2 GALVA\nDÃ©signation:Tube", t0());
        assert_eq!(decoded, vec![Sku::new("1.1/2 GALVA")]);
    }

    #[test]
    fn labels_match_case_insensitively() {
        assert_eq!(extract_sku("REFERENCE: x1 DESIGNATION"), Some(Sku::new("x1")));
        assert_eq!(extract_sku("référence:X1 désignation"), Some(Sku::new("X1")));
    }

    #[test]
    fn skus_containing_d_decode_whole() {
        for sku in ["ROND 20", "AD-5", "DX-1", "1.1/2 DN15"] {
            let mut decoder = ScanDecoder::default();
            let label = format!("R\u{e9}f\u{e9}rence:{sku}\nD\u{e9}signation");
            let (decoded, _) = type_burst(&mut decoder, &label, t0());
            assert_eq!(decoded, vec![Sku::new(sku)], "{sku:?}");
        }
    }

    #[test]
    fn blank_capture_is_not_a_scan() {
        assert_eq!(extract_sku("Reference:   Designation"), None);
    }

    #[test]
    fn partial_label_is_retained() {
        let mut decoder = ScanDecoder::default();
        let (decoded, _) = type_burst(&mut decoder, "Reference:AB", t0());
        assert!(decoded.is_empty());
        assert_eq!(decoder.buffer(), "Reference:AB");
    }

    #[test]
    fn idle_gap_discards_partial_burst() {
        let mut decoder = ScanDecoder::default();
        let (_, end) = type_burst(&mut decoder, "Reference:OLD", t0());

        let resume = end + Duration::milliseconds(2500);
        let (decoded, _) = type_burst(&mut decoder, "Reference:NEW\nDesignation", resume);
        assert_eq!(decoded, vec![Sku::new("NEW")]);
    }

    #[test]
    fn gap_at_threshold_keeps_burst() {
        let mut decoder = ScanDecoder::default();
        let (_, end) = type_burst(&mut decoder, "Reference:AB", t0());
        // type_burst already stepped 10 ms past the last key.
        let at = end + Duration::milliseconds(DEFAULT_DEBOUNCE_MS - 10);
        decoder.feed(&KeyEvent::new(Key::Char('C'), at));
        assert_eq!(decoder.buffer(), "Reference:ABC");
    }

    #[test]
    fn non_printable_keys_are_ignored() {
        let mut decoder = ScanDecoder::default();
        decoder.feed(&KeyEvent::new(Key::Named("Shift".to_string()), t0()));
        decoder.feed(&KeyEvent::new(Key::ArrowDown, t0()));
        decoder.feed(&KeyEvent::new(Key::Char('\u{8}'), t0()));
        assert_eq!(decoder.buffer(), "");
    }

    #[test]
    fn reset_drops_partial_burst() {
        let mut decoder = ScanDecoder::default();
        type_burst(&mut decoder, "Reference:A", t0());
        decoder.reset();
        assert_eq!(decoder.buffer(), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: without the `:` of the reference label nothing decodes and
        /// every printable key stays in the buffer.
        #[test]
        fn streams_without_marker_never_decode(text in "[A-Za-z0-9 ./-]{0,80}") {
            let mut decoder = ScanDecoder::default();
            let (decoded, _) = type_burst(&mut decoder, &text, t0());
            prop_assert!(decoded.is_empty());
            prop_assert_eq!(decoder.buffer(), text.as_str());
        }

        /// Property: any non-blank SKU without a colon round-trips, whatever
        /// letters it holds.
        #[test]
        fn any_plain_sku_is_recovered(sku in "[0-9A-Za-z./ -]{0,12}[0-9A-Za-z]") {
            let mut decoder = ScanDecoder::default();
            let label = format!("Reference:{sku}\nDesignation");
            let (decoded, _) = type_burst(&mut decoder, &label, t0());
            prop_assert_eq!(decoded, vec![Sku::new(sku.as_str())]);
        }
    }
}
