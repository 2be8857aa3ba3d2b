//! Share-link codec: the persistable part of [`PlaygroundState`] <-> URL
//! fragment.
//!
//! Fragment layout: `<base64(zlib("{F}{O}{input}"))>[?s=L#C#-L#C#]` where `F`
//! is `1` for scss / `0` for indented and `O` is `1` for expanded / `0` for
//! compressed. Links shared before compression existed are
//! `base64(percent-encode("{F}{O}{input}"))` and still decode.
//!
//! Decoding never fails outward: anything unreadable yields an empty
//! [`PersistedState`] and the session falls back to defaults.

use std::io::{self, Read, Write};
use std::string::FromUtf8Error;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::states::{InputFormat, OutputFormat, PlaygroundState, Selection};

/// Standard alphabet, padded on encode, padding optional on decode.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const SELECTION_PARAM: &str = "s";

static FORMAT_FLAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}").expect("format flags regex"));

static SELECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^L([0-9]+)C([0-9]+)-L([0-9]+)C([0-9]+)$").expect("selection regex")
});

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("deflate stream: {0}")]
    Deflate(#[from] io::Error),
    #[error("decoded text is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("malformed percent escape at byte {0}")]
    BadEscape(usize),
}

/// Whatever a fragment managed to restore; missing fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub input_format: Option<InputFormat>,
    pub output_format: Option<OutputFormat>,
    pub input_value: Option<String>,
    pub selection: Option<Selection>,
}

impl PersistedState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Initial session state: decoded fields over `scss` / `expanded` / empty.
    pub fn into_state(self) -> PlaygroundState {
        PlaygroundState {
            input_format: self.input_format.unwrap_or_default(),
            output_format: self.output_format.unwrap_or_default(),
            input_value: self.input_value.unwrap_or_default(),
            selection: self.selection,
            ..PlaygroundState::default()
        }
    }
}

// ─── Serialization ────────────────────────────────────────────────────────────

pub fn serialize_state(state: &PlaygroundState) -> Result<String, CodecError> {
    let contents = serialize_contents(state)?;
    Ok(match serialize_params(state) {
        Some(params) => format!("{contents}?{params}"),
        None => contents,
    })
}

fn serialize_contents(state: &PlaygroundState) -> Result<String, CodecError> {
    let persisted = format!(
        "{}{}{}",
        state.input_format.flag(),
        state.output_format.flag(),
        state.input_value
    );
    deflate_to_base64(persisted.as_bytes())
}

fn serialize_params(state: &PlaygroundState) -> Option<String> {
    let selection = state.selection?;
    let params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(SELECTION_PARAM, &selection.to_string())
        .finish();
    Some(params)
}

fn deflate_to_base64(input: &[u8]) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    let deflated = encoder.finish()?;
    Ok(BASE64.encode(deflated))
}

// ─── Deserialization ──────────────────────────────────────────────────────────

/// Decodes a fragment (with or without its leading `#`).
pub fn deserialize_state(input: &str) -> PersistedState {
    let input = input.strip_prefix('#').unwrap_or(input);
    let mut state = PersistedState::default();
    let mut parts = input.split('?');
    if let Some(contents) = parts.next().filter(|c| !c.is_empty()) {
        deserialize_contents(&mut state, contents);
    }
    if let Some(query) = parts.next().filter(|q| !q.is_empty()) {
        deserialize_params(&mut state, query);
    }
    state
}

fn deserialize_contents(state: &mut PersistedState, input: &str) {
    let decoded = match inflate_from_base64(input) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::debug!(%err, "fragment is not deflated, trying legacy encoding");
            match decode_legacy(input) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::debug!(%err, "discarding undecodable fragment");
                    return;
                }
            }
        }
    };

    if !FORMAT_FLAGS.is_match(&decoded) {
        tracing::debug!("decoded fragment has no format flags");
        return;
    }
    let mut flags = decoded.chars();
    state.input_format = flags.next().map(InputFormat::from_flag);
    state.output_format = flags.next().map(OutputFormat::from_flag);
    // both flags are ASCII digits, so byte 2 is a char boundary
    state.input_value = Some(decoded[2..].to_string());
}

fn deserialize_params(state: &mut PersistedState, query: &str) {
    let Some((_, value)) =
        url::form_urlencoded::parse(query.as_bytes()).find(|(key, _)| key == SELECTION_PARAM)
    else {
        return;
    };
    let Some(caps) = SELECTION.captures(&value) else {
        tracing::debug!(%value, "ignoring malformed selection parameter");
        return;
    };
    let coords: Option<Vec<usize>> = (1..=4).map(|i| caps[i].parse().ok()).collect();
    if let Some([from_line, from_column, to_line, to_column]) = coords.as_deref() {
        state.selection = Selection::new(*from_line, *from_column, *to_line, *to_column);
    }
}

fn inflate_from_base64(input: &str) -> Result<String, CodecError> {
    let deflated = BASE64.decode(input)?;
    let mut inflated = Vec::new();
    ZlibDecoder::new(deflated.as_slice()).read_to_end(&mut inflated)?;
    Ok(String::from_utf8(inflated)?)
}

fn decode_legacy(input: &str) -> Result<String, CodecError> {
    let bytes = BASE64.decode(input)?;
    let escaped = String::from_utf8(bytes)?;
    check_escapes(&escaped)?;
    Ok(urlencoding::decode(&escaped)?.into_owned())
}

/// Every `%` must start a two-hex-digit escape; `urlencoding` would pass
/// broken ones through instead of failing.
fn check_escapes(escaped: &str) -> Result<(), CodecError> {
    let bytes = escaped.as_bytes();
    for (at, _) in escaped.match_indices('%') {
        let valid = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(CodecError::BadEscape(at));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(
        input_format: InputFormat,
        output_format: OutputFormat,
        input_value: &str,
        selection: Option<Selection>,
    ) -> PlaygroundState {
        PlaygroundState {
            input_format,
            output_format,
            input_value: input_value.to_string(),
            selection,
            ..PlaygroundState::default()
        }
    }

    fn persisted_subset(state: &PlaygroundState) -> PersistedState {
        PersistedState {
            input_format: Some(state.input_format),
            output_format: Some(state.output_format),
            input_value: Some(state.input_value.clone()),
            selection: state.selection,
        }
    }

    #[test]
    fn roundtrips_multiline_input_and_selection() {
        let original = state(
            InputFormat::Indented,
            OutputFormat::Compressed,
            "$c: blue\na\n  color: $c\n",
            Selection::new(2, 1, 3, 11),
        );
        let fragment = serialize_state(&original).expect("serialize");
        assert!(fragment.ends_with("?s=L2C1-L3C11"));
        assert_eq!(deserialize_state(&fragment), persisted_subset(&original));
        assert_eq!(deserialize_state(&format!("#{fragment}")), persisted_subset(&original));
    }

    #[test]
    fn empty_input_without_selection_has_no_query() {
        let original = state(InputFormat::Scss, OutputFormat::Expanded, "", None);
        let fragment = serialize_state(&original).expect("serialize");
        assert!(!fragment.contains('?'));
        assert_eq!(deserialize_state(&fragment), persisted_subset(&original));
    }

    #[test]
    fn decodes_zlib_stream_from_another_encoder() {
        // produced with Python's zlib.compress + base64
        let decoded = deserialize_state("eJwzNFBJtlJIyilN5UrkUlBIzs/JL7JSUEnmAgBWUwaq");
        assert_eq!(decoded.input_format, Some(InputFormat::Scss));
        assert_eq!(decoded.output_format, Some(OutputFormat::Compressed));
        assert_eq!(decoded.input_value.as_deref(), Some("$c: blue\na\n  color: $c\n"));

        // same encoder, padding stripped
        let unpadded = deserialize_state("eJwzNExUqE7Oz8kvslIoSk2pBQAr4gWQ");
        assert_eq!(unpadded.input_value.as_deref(), Some("a {color: red}"));
    }

    #[test]
    fn legacy_links_still_decode() {
        let legacy = BASE64.encode(urlencoding::encode("01a\n  color: red").as_bytes());
        let decoded = deserialize_state(&legacy);
        assert_eq!(decoded.input_format, Some(InputFormat::Indented));
        assert_eq!(decoded.output_format, Some(OutputFormat::Expanded));
        assert_eq!(decoded.input_value.as_deref(), Some("a\n  color: red"));
    }

    #[test]
    fn legacy_links_with_broken_escapes_are_discarded() {
        for escaped in ["11a%zz", "11a%2", "11a%"] {
            let legacy = BASE64.encode(escaped.as_bytes());
            assert!(deserialize_state(&legacy).is_empty(), "{escaped:?}");
        }
        let ok = BASE64.encode("11a%20b".as_bytes());
        assert_eq!(deserialize_state(&ok).input_value.as_deref(), Some("a b"));
    }

    #[test]
    fn malformed_fragments_decode_to_nothing() {
        for input in ["", "#", "!!!not base64!!!", "AAAA", "bm8gZmxhZ3M=", "%%%?s=garbage"] {
            assert!(deserialize_state(input).is_empty(), "{input:?}");
        }
    }

    #[test]
    fn selection_parses_without_contents_and_ignores_collapsed_ranges() {
        let only_selection = deserialize_state("?s=l4c2-L5C1");
        assert_eq!(only_selection.selection, Selection::new(4, 2, 5, 1));
        assert_eq!(only_selection.input_value, None);

        assert_eq!(deserialize_state("?s=L1C1-L1C1").selection, None);
        assert_eq!(deserialize_state("?s=L1C1-L1").selection, None);
        assert_eq!(deserialize_state("?s=L99999999999999999999999C1-L1C2").selection, None);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let state = PersistedState::default().into_state();
        assert_eq!(state.input_format, InputFormat::Scss);
        assert_eq!(state.output_format, OutputFormat::Expanded);
        assert!(state.input_value.is_empty());
        assert_eq!(state.selection, None);
    }

    fn selection_strategy() -> impl Strategy<Value = Option<Selection>> {
        prop::option::of((1usize..500, 1usize..200, 1usize..500, 1usize..200))
            .prop_map(|coords| coords.and_then(|(a, b, c, d)| Selection::new(a, b, c, d)))
    }

    proptest! {
        #[test]
        fn roundtrip_any_state(
            scss in any::<bool>(),
            expanded in any::<bool>(),
            input in "(?s).{0,400}",
            selection in selection_strategy(),
        ) {
            let original = state(
                if scss { InputFormat::Scss } else { InputFormat::Indented },
                if expanded { OutputFormat::Expanded } else { OutputFormat::Compressed },
                &input,
                selection,
            );
            let fragment = serialize_state(&original).expect("serialize");
            prop_assert_eq!(deserialize_state(&fragment), persisted_subset(&original));
        }

        #[test]
        fn arbitrary_fragments_never_panic(fragment in "\\PC{0,200}") {
            let _ = deserialize_state(&fragment);
        }
    }
}
