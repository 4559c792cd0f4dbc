//! DAF container layout: the file record, segment summaries and segment directories.
//!
//! A DAF file is a sequence of 1024-byte records. Record 1 describes the summary layout
//! (`nd` doubles and `ni` integers per summary) and points at the first summary record.
//! Every summary record starts with three doubles (next record, previous record, summary
//! count) followed by the packed summaries.
//!
//! Addresses inside the file count 8-byte words from 1. Only little-endian (`LTL-IEEE`)
//! files are read.
use nom::{
    bytes::complete::take,
    number::complete::{le_f64, le_i32},
    IResult,
};

use crate::almanac_errors::{AlmanacError, Result};

/// Size of one DAF record in bytes.
pub const RECORD_BYTES: usize = 1024;

/// Number format of the only files this reader accepts.
pub const LITTLE_ENDIAN_FORMAT: &str = "LTL-IEEE";

/// Byte offset of a 1-based word address.
pub(crate) fn word_offset(address: usize) -> usize {
    address.saturating_sub(1) * 8
}

pub(crate) fn malformed(
    what: &'static str,
) -> impl FnOnce(nom::Err<nom::error::Error<&[u8]>>) -> AlmanacError {
    move |err| AlmanacError::Ephemeris(format!("malformed {what}: {err:?}"))
}

/// The first record of a DAF file.
#[derive(Debug, Clone, PartialEq)]
pub struct DafHeader {
    /// Format identifier, `DAF/SPK` for a position kernel.
    pub idword: String,
    pub internal_name: String,
    pub nd: usize,
    pub ni: usize,
    /// Record number of the first summary record.
    pub fward: usize,
    /// Record number of the last summary record.
    pub bward: usize,
    pub locfmt: String,
}

impl DafHeader {
    fn parse_fields(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, idword) = take(8usize)(input)?;
        let (input, nd) = le_i32(input)?;
        let (input, ni) = le_i32(input)?;
        let (input, ifname) = take(60usize)(input)?;
        let (input, fward) = le_i32(input)?;
        let (input, bward) = le_i32(input)?;
        let (input, _free) = le_i32(input)?;
        let (input, locfmt) = take(8usize)(input)?;
        let ascii = |b: &[u8]| {
            String::from_utf8_lossy(b)
                .trim_end_matches(['\0', ' '])
                .to_string()
        };
        Ok((
            input,
            DafHeader {
                idword: ascii(idword),
                internal_name: ascii(ifname),
                nd: nd.max(0) as usize,
                ni: ni.max(0) as usize,
                fward: fward.max(0) as usize,
                bward: bward.max(0) as usize,
                locfmt: ascii(locfmt),
            },
        ))
    }

    /// Decode the file record.
    ///
    /// Arguments
    /// -----------------
    /// * `input`: the file bytes, starting at the first record.
    ///
    /// Return
    /// ----------
    /// * The header, or [`AlmanacError::Ephemeris`] for a truncated record, a file that is not
    ///   an SPK kernel, or a big-endian file.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let (_, header) = Self::parse_fields(input).map_err(malformed("DAF file record"))?;
        if header.idword != "DAF/SPK" && header.idword != "NAIF/DAF" {
            return Err(AlmanacError::Ephemeris(format!(
                "'{}' is not an SPK identification word",
                header.idword
            )));
        }
        // pre-1995 files carry no format tag and are little-endian only on little-endian hosts
        if !header.locfmt.is_empty() && header.locfmt != LITTLE_ENDIAN_FORMAT {
            return Err(AlmanacError::Ephemeris(format!(
                "unsupported number format '{}', expected {LITTLE_ENDIAN_FORMAT}",
                header.locfmt
            )));
        }
        if header.nd != 2 || header.ni != 6 {
            return Err(AlmanacError::Ephemeris(format!(
                "summary layout ND={} NI={} is not the SPK layout ND=2 NI=6",
                header.nd, header.ni
            )));
        }
        Ok(header)
    }

    /// Summary size in words: `ND + ceil(NI / 2)`.
    pub fn summary_words(&self) -> usize {
        self.nd + self.ni.div_ceil(2)
    }
}

/// Descriptor of one SPK segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// First covered instant, TDB seconds past J2000.
    pub start_et: f64,
    /// Last covered instant, TDB seconds past J2000.
    pub end_et: f64,
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub data_type: i32,
    pub initial_addr: usize,
    pub final_addr: usize,
}

impl Summary {
    fn parse_fields(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, start_et) = le_f64(input)?;
        let (input, end_et) = le_f64(input)?;
        let (input, target) = le_i32(input)?;
        let (input, center) = le_i32(input)?;
        let (input, frame) = le_i32(input)?;
        let (input, data_type) = le_i32(input)?;
        let (input, initial_addr) = le_i32(input)?;
        let (input, final_addr) = le_i32(input)?;
        Ok((
            input,
            Summary {
                start_et,
                end_et,
                target,
                center,
                frame,
                data_type,
                initial_addr: initial_addr.max(0) as usize,
                final_addr: final_addr.max(0) as usize,
            },
        ))
    }

    pub fn covers(&self, et: f64) -> bool {
        (self.start_et..=self.end_et).contains(&et)
    }
}

/// Read every segment summary, following the chain of summary records.
pub fn read_summaries(data: &[u8], header: &DafHeader) -> Result<Vec<Summary>> {
    let summary_bytes = header.summary_words() * 8;
    let mut summaries = Vec::new();
    let mut record = header.fward;
    // a corrupt chain could loop; a file cannot hold more summary records than records
    let mut remaining = data.len() / RECORD_BYTES;

    while record != 0 {
        if remaining == 0 {
            return Err(AlmanacError::Ephemeris(
                "summary record chain does not terminate".into(),
            ));
        }
        remaining -= 1;

        let start = (record - 1) * RECORD_BYTES;
        let bytes = data.get(start..start + RECORD_BYTES).ok_or_else(|| {
            AlmanacError::Ephemeris(format!(
                "summary record {record} is past the end of the file"
            ))
        })?;
        let (input, next) = le_f64(bytes).map_err(malformed("summary record"))?;
        let (input, _prev) = le_f64(input).map_err(malformed("summary record"))?;
        let (mut input, count) = le_f64(input).map_err(malformed("summary record"))?;

        for _ in 0..count.max(0.0) as usize {
            let (rest, packed) = take::<_, _, nom::error::Error<&[u8]>>(summary_bytes)(input)
                .map_err(malformed("segment summary"))?;
            let (_, summary) =
                Summary::parse_fields(packed).map_err(malformed("segment summary"))?;
            summaries.push(summary);
            input = rest;
        }
        record = next.max(0.0) as usize;
    }
    Ok(summaries)
}

/// Footer of a Chebyshev segment: the last four words of its data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directory {
    /// Start of the first record interval, TDB seconds past J2000.
    pub init: f64,
    /// Length of every record interval in seconds.
    pub intlen: f64,
    /// Words per record.
    pub rsize: usize,
    pub n_records: usize,
}

impl Directory {
    pub fn parse(data: &[u8], final_addr: usize) -> Result<Self> {
        let offset = word_offset(final_addr.saturating_sub(3));
        let bytes = data.get(offset..offset + 32).ok_or_else(|| {
            AlmanacError::Ephemeris(format!(
                "segment directory at word {final_addr} is past the end of the file"
            ))
        })?;
        let (input, init) = le_f64(bytes).map_err(malformed("segment directory"))?;
        let (input, intlen) = le_f64(input).map_err(malformed("segment directory"))?;
        let (input, rsize) = le_f64(input).map_err(malformed("segment directory"))?;
        let (_, n_records) = le_f64(input).map_err(malformed("segment directory"))?;
        if !intlen.is_finite() || intlen <= 0.0 || rsize < 5.0 || n_records < 1.0 {
            return Err(AlmanacError::Ephemeris(format!(
                "invalid segment directory: intlen {intlen}, rsize {rsize}, {n_records} record(s)"
            )));
        }
        Ok(Directory {
            init,
            intlen,
            rsize: rsize as usize,
            n_records: n_records as usize,
        })
    }
}
