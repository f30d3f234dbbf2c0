//! Streaming extraction of the registry dataset.
//!
//! Decompresses a gzip stream and parses the decompressed content as a
//! JSON array of register units, emitting one tab-separated line per unit.
//! Units are materialized one at a time, so memory use is bounded by the
//! output buffer rather than the input size.

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde::de::{Deserializer, SeqAccess, Visitor};
use snafu::prelude::*;
use std::fmt;
use std::io::{BufReader, Read};
use std::time::Instant;
use tracing::debug;

use crate::error::{DecodeError, JsonSnafu};

/// One unit as read from the registry. Everything except the two exported
/// fields is skipped by the deserializer; a unit missing either field is a
/// fatal decode error.
#[derive(Debug, Deserialize)]
struct RegisterUnit {
    organisasjonsnummer: String,
    navn: String,
}

/// Result of one extraction pass.
#[derive(Debug)]
pub struct Extraction {
    /// TSV output, one line per unit in input order.
    pub buffer: Vec<u8>,
    /// Number of units extracted.
    pub records: usize,
}

/// Extract `organisasjonsnummer<TAB>navn` lines from a gzip-compressed
/// JSON array of register units.
///
/// `progress_every` controls the cadence of debug-level progress
/// observations (0 disables them); it never affects the output.
pub fn extract_tsv<R: Read>(input: R, progress_every: usize) -> Result<Extraction, DecodeError> {
    let reader = BufReader::new(GzDecoder::new(input));
    let mut de = serde_json::Deserializer::from_reader(reader);

    let mut buffer = Vec::new();
    let records = de
        .deserialize_seq(TsvVisitor {
            out: &mut buffer,
            progress_every,
        })
        .context(JsonSnafu)?;
    de.end().context(JsonSnafu)?;

    Ok(Extraction { buffer, records })
}

struct TsvVisitor<'a> {
    out: &'a mut Vec<u8>,
    progress_every: usize,
}

impl<'de> Visitor<'de> for TsvVisitor<'_> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of register units")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let start = Instant::now();
        let mut count = 0usize;

        while let Some(unit) = seq.next_element::<RegisterUnit>()? {
            self.out
                .extend_from_slice(unit.organisasjonsnummer.as_bytes());
            self.out.push(b'\t');
            self.out.extend_from_slice(unit.navn.as_bytes());
            self.out.push(b'\n');
            count += 1;

            if self.progress_every > 0 && count % self.progress_every == 0 {
                let rate = count as f64 / start.elapsed().as_secs_f64();
                debug!("Extracted {} units ({:.0} units/sec)", count, rate);
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_extracts_tab_separated_lines() {
        let json = br#"[
            {"organisasjonsnummer":"123456789","navn":"ACME AS"},
            {"organisasjonsnummer":"987654321","navn":"FOO BAR"}
        ]"#;
        let result = extract_tsv(&make_gzip(json)[..], 0).unwrap();

        assert_eq!(result.records, 2);
        assert_eq!(result.buffer, b"123456789\tACME AS\n987654321\tFOO BAR\n");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let json = br#"[{
            "organisasjonsnummer": "915501680",
            "navn": "KAFFEHUSET AS",
            "organisasjonsform": {"kode": "AS", "beskrivelse": "Aksjeselskap"},
            "registreringsdatoEnhetsregisteret": "2015-05-22",
            "antallAnsatte": 12
        }]"#;
        let result = extract_tsv(&make_gzip(json)[..], 0).unwrap();

        assert_eq!(result.records, 1);
        assert_eq!(result.buffer, b"915501680\tKAFFEHUSET AS\n");
    }

    #[test]
    fn test_preserves_input_order() {
        let json = br#"[
            {"organisasjonsnummer":"3","navn":"C"},
            {"organisasjonsnummer":"1","navn":"A"},
            {"organisasjonsnummer":"2","navn":"B"}
        ]"#;
        let result = extract_tsv(&make_gzip(json)[..], 0).unwrap();

        assert_eq!(result.buffer, b"3\tC\n1\tA\n2\tB\n");
    }

    #[test]
    fn test_no_escaping_or_trimming() {
        let json = br#"[{"organisasjonsnummer":" 99 ","navn":"A \"B\" & C"}]"#;
        let result = extract_tsv(&make_gzip(json)[..], 0).unwrap();

        assert_eq!(result.buffer, " 99 \tA \"B\" & C\n".as_bytes());
    }

    #[test]
    fn test_empty_array_yields_empty_output() {
        let result = extract_tsv(&make_gzip(b"[]")[..], 0).unwrap();

        assert_eq!(result.records, 0);
        assert!(result.buffer.is_empty());
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let json = br#"[{"organisasjonsnummer":"123456789"}]"#;
        let err = extract_tsv(&make_gzip(json)[..], 0).unwrap_err();

        let DecodeError::Json { source } = err;
        assert!(source.to_string().contains("navn"), "{source}");
    }

    #[test]
    fn test_missing_identifier_is_fatal() {
        let json = br#"[{"navn":"ACME AS"}]"#;
        assert!(extract_tsv(&make_gzip(json)[..], 0).is_err());
    }

    #[test]
    fn test_invalid_gzip_is_fatal() {
        let err = extract_tsv(&b"not gzip at all"[..], 0);
        assert!(err.is_err());
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let json = br#"{"organisasjonsnummer":"1","navn":"A"}"#;
        assert!(extract_tsv(&make_gzip(json)[..], 0).is_err());
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let json = br#"[{"organisasjonsnummer":"1","navn":"A"}] trailing"#;
        assert!(extract_tsv(&make_gzip(json)[..], 0).is_err());
    }

    #[test]
    fn test_progress_cadence_does_not_change_output() {
        let json = br#"[
            {"organisasjonsnummer":"1","navn":"A"},
            {"organisasjonsnummer":"2","navn":"B"},
            {"organisasjonsnummer":"3","navn":"C"}
        ]"#;
        let silent = extract_tsv(&make_gzip(json)[..], 0).unwrap();
        let chatty = extract_tsv(&make_gzip(json)[..], 1).unwrap();

        assert_eq!(silent.buffer, chatty.buffer);
        assert_eq!(silent.records, chatty.records);
    }
}
