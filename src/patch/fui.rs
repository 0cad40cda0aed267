/*
Tracker Instrument Files (.fui)
===============================

Little-endian throughout.

    "FINS"          magic
    u16             format version
    u8              instrument type, 1 = FM
    u8              reserved
    features...     2-byte tag, u16 length, `length` bytes of payload
    "EN"            terminator, no length field

Features we understand:

    NA   instrument name, UTF-8, NUL-terminated
    FM   operator data

Anything else is skipped by its declared length.


The FM Feature
--------------

Two layouts exist, chosen by format version.

Plain (version < 127), one byte per field:

    alg fb fms ams fms2 ams2 ops opllPreset
    then per operator (21 bytes):
    am ar dr mult rr sl tl dt2 rs dt d2r ssgEnv dam dvb egt ksl sus vib ws ksr kvs

Packed (version >= 127):

    byte 0   enable[7:4] (one bit per record) | record count[3:0]
    byte 1   alg[6:4] | fb[2:0]
    byte 2   fms2[7:5] | ams[4:3] | fms[2:0]
    byte 3   ams2[7:6] | four-op[5] | opllPreset[4:0]
    byte 4   block[3:0]                      (version >= 224 only)
    then per operator (8 bytes):
      ksr[7] | dt[6:4] | mult[3:0]
      sus[7] | tl[6:0]
      rs[7:6] | vib[5] | ar[4:0]
      am[7] | ksl[6:5] | dr[4:0]
      egt[7] | kvs[6:5] | d2r[4:0]
      sl[7:4] | rr[3:0]
      dvb[7:4] | ssgEnv[3:0]
      dam[7:5] | dt2[4:3] | ws[2:0]

Operator records are stored in hardware order (1, 3, 2, 4). Fields that a
short feature cuts off read as zero.
*/

use std::fs;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

use super::{FmOperator, Instrument};
use crate::chip::{NUM_OPERATORS, OPERATOR_SLOT};

pub const MAGIC: &[u8; 4] = b"FINS";
pub const TYPE_FM: u8 = 1;

/// First version using the packed FM layout.
pub const PACKED_VERSION: u16 = 127;
/// First version with a block byte in the FM header.
pub const BLOCK_VERSION: u16 = 224;

const TAG_NAME: [u8; 2] = *b"NA";
const TAG_FM: [u8; 2] = *b"FM";
const TAG_END: [u8; 2] = *b"EN";

const HEADER_LEN: usize = 8;
const PLAIN_HEADER_LEN: usize = 8;
const PLAIN_RECORD_LEN: usize = 21;
const PACKED_RECORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FuiError {
    #[error("not an instrument file (bad magic)")]
    BadMagic,
    #[error("instrument is not an FM instrument")]
    WrongType,
    #[error("instrument file is truncated")]
    Truncated,
    #[error("instrument file has no FM data block")]
    NoDataBlock,
}

#[derive(Debug, Error)]
pub enum FuiFileError {
    #[error("instrument file i/o")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FuiError),
}

/// Bounds-checked little-endian reader. Reads past the end yield zero and
/// set `overrun`.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    overrun: bool,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            overrun: false,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn u8(&mut self) -> u8 {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b
            }
            None => {
                self.overrun = true;
                0
            }
        }
    }

    fn u16(&mut self) -> u16 {
        let lo = self.u8() as u16;
        let hi = self.u8() as u16;
        lo | (hi << 8)
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let end = (self.pos + len).min(self.data.len());
        let slice = &self.data[self.pos..end];
        self.pos = end;
        slice
    }
}

/// Parse a complete `.fui` file image.
pub fn decode(bytes: &[u8]) -> Result<Instrument, FuiError> {
    if bytes.len() < MAGIC.len() {
        return Err(FuiError::Truncated);
    }
    if &bytes[..4] != MAGIC {
        return Err(FuiError::BadMagic);
    }
    if bytes.len() < HEADER_LEN {
        return Err(FuiError::Truncated);
    }

    let mut reader = Reader::new(bytes);
    reader.take(4);
    let version = reader.u16();
    let kind = reader.u8();
    let _reserved = reader.u8();
    if kind != TYPE_FM {
        return Err(FuiError::WrongType);
    }

    let mut instrument = Instrument {
        version,
        ..Instrument::default()
    };
    let mut found_fm = false;

    while reader.remaining() > 0 {
        if reader.remaining() < 2 {
            return Err(FuiError::Truncated);
        }
        let tag = [reader.u8(), reader.u8()];
        if tag == TAG_END {
            break;
        }
        if reader.remaining() < 2 {
            return Err(FuiError::Truncated);
        }
        let len = reader.u16() as usize;
        if len > reader.remaining() {
            warn!(
                "feature {:?} claims {len} bytes, {} available",
                String::from_utf8_lossy(&tag),
                reader.remaining()
            );
        }
        let payload = reader.take(len);

        match tag {
            TAG_NAME => {
                let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
                instrument.name = String::from_utf8_lossy(&payload[..end]).into_owned();
            }
            TAG_FM => {
                decode_fm(payload, version, &mut instrument)?;
                found_fm = true;
            }
            other => warn!(
                "skipping unknown feature {:?} ({len} bytes)",
                String::from_utf8_lossy(&other)
            ),
        }
    }

    if !found_fm {
        return Err(FuiError::NoDataBlock);
    }

    debug!(
        "decoded instrument {:?}: version {version}, algorithm {}, feedback {}, {} operators",
        instrument.name, instrument.algorithm, instrument.feedback, instrument.operator_count
    );
    Ok(instrument)
}

fn decode_fm(payload: &[u8], version: u16, instrument: &mut Instrument) -> Result<(), FuiError> {
    let packed = version >= PACKED_VERSION;
    let header_len = if !packed {
        PLAIN_HEADER_LEN
    } else if version >= BLOCK_VERSION {
        5
    } else {
        4
    };
    if payload.len() < header_len {
        return Err(FuiError::Truncated);
    }

    let mut r = Reader::new(payload);
    let mut enabled = [true; NUM_OPERATORS];

    if packed {
        let flags = r.u8();
        instrument.operator_count = flags & 0x0F;
        for (record, enable) in enabled.iter_mut().enumerate() {
            *enable = flags & (0x10 << record) != 0;
        }
        let alg_fb = r.u8();
        instrument.algorithm = (alg_fb >> 4) & 7;
        instrument.feedback = alg_fb & 7;
        let sens = r.u8();
        instrument.fms2 = sens >> 5;
        instrument.ams = (sens >> 3) & 3;
        instrument.fms = sens & 7;
        let misc = r.u8();
        instrument.ams2 = misc >> 6;
        instrument.opll_preset = misc & 0x1F;
        if version >= BLOCK_VERSION {
            instrument.block = r.u8() & 0x0F;
        }
    } else {
        instrument.algorithm = r.u8();
        instrument.feedback = r.u8();
        instrument.fms = r.u8();
        instrument.ams = r.u8();
        instrument.fms2 = r.u8();
        instrument.ams2 = r.u8();
        instrument.operator_count = r.u8();
        instrument.opll_preset = r.u8();
    }

    let records = (instrument.operator_count as usize).min(NUM_OPERATORS);
    let record_len = if packed {
        PACKED_RECORD_LEN
    } else {
        PLAIN_RECORD_LEN
    };
    if r.remaining() < records * record_len {
        warn!(
            "FM block holds {} of {} operator bytes, zero-filling the rest",
            r.remaining(),
            records * record_len
        );
    }

    for record in 0..records {
        let mut op = if packed {
            read_packed_operator(&mut r)
        } else {
            read_plain_operator(&mut r)
        };
        op.enabled = enabled[record];
        instrument.operators[OPERATOR_SLOT[record]] = op;
    }
    Ok(())
}

fn read_plain_operator(r: &mut Reader) -> FmOperator {
    FmOperator {
        enabled: true,
        am: r.u8(),
        ar: r.u8(),
        dr: r.u8(),
        mult: r.u8(),
        rr: r.u8(),
        sl: r.u8(),
        tl: r.u8(),
        dt2: r.u8(),
        rs: r.u8(),
        dt: r.u8(),
        d2r: r.u8(),
        ssg_env: r.u8(),
        dam: r.u8(),
        dvb: r.u8(),
        egt: r.u8(),
        ksl: r.u8(),
        sus: r.u8(),
        vib: r.u8(),
        ws: r.u8(),
        ksr: r.u8(),
        kvs: r.u8(),
    }
}

fn read_packed_operator(r: &mut Reader) -> FmOperator {
    let b: [u8; PACKED_RECORD_LEN] = std::array::from_fn(|_| r.u8());
    FmOperator {
        enabled: true,
        ksr: b[0] >> 7,
        dt: (b[0] >> 4) & 7,
        mult: b[0] & 0x0F,
        sus: b[1] >> 7,
        tl: b[1] & 0x7F,
        rs: b[2] >> 6,
        vib: (b[2] >> 5) & 1,
        ar: b[2] & 0x1F,
        am: b[3] >> 7,
        ksl: (b[3] >> 5) & 3,
        dr: b[3] & 0x1F,
        egt: b[4] >> 7,
        kvs: (b[4] >> 5) & 3,
        d2r: b[4] & 0x1F,
        sl: b[5] >> 4,
        rr: b[5] & 0x0F,
        dvb: b[6] >> 4,
        ssg_env: b[6] & 0x0F,
        dam: b[7] >> 5,
        dt2: (b[7] >> 3) & 3,
        ws: b[7] & 7,
    }
}

/// Serialise an instrument using its own format version.
pub fn encode(instrument: &Instrument) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&instrument.version.to_le_bytes());
    out.push(TYPE_FM);
    out.push(0);

    if !instrument.name.is_empty() {
        let name = instrument.name.as_bytes();
        let name = &name[..name.len().min(u16::MAX as usize - 1)];
        write_feature(&mut out, TAG_NAME, |buf| {
            buf.extend_from_slice(name);
            buf.push(0);
        });
    }

    write_feature(&mut out, TAG_FM, |buf| encode_fm(instrument, buf));
    out.extend_from_slice(&TAG_END);

    debug!(
        "encoded instrument {:?}: version {}, {} bytes",
        instrument.name,
        instrument.version,
        out.len()
    );
    out
}

fn write_feature<F>(out: &mut Vec<u8>, tag: [u8; 2], body: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    out.extend_from_slice(&tag);
    let len_at = out.len();
    out.extend_from_slice(&[0, 0]);
    body(out);
    let len = (out.len() - len_at - 2).min(u16::MAX as usize) as u16;
    out[len_at..len_at + 2].copy_from_slice(&len.to_le_bytes());
}

fn encode_fm(ins: &Instrument, out: &mut Vec<u8>) {
    let records = (ins.operator_count as usize).min(NUM_OPERATORS);

    if ins.version >= PACKED_VERSION {
        let mut flags = ins.operator_count & 0x0F;
        for record in 0..NUM_OPERATORS {
            if ins.operators[OPERATOR_SLOT[record]].enabled {
                flags |= 0x10 << record;
            }
        }
        out.push(flags);
        out.push(((ins.algorithm & 7) << 4) | (ins.feedback & 7));
        out.push(((ins.fms2 & 7) << 5) | ((ins.ams & 3) << 3) | (ins.fms & 7));
        let four_op = if ins.operator_count == 4 { 0x20 } else { 0 };
        out.push(((ins.ams2 & 3) << 6) | four_op | (ins.opll_preset & 0x1F));
        if ins.version >= BLOCK_VERSION {
            out.push(ins.block & 0x0F);
        }
        for record in 0..records {
            let op = &ins.operators[OPERATOR_SLOT[record]];
            out.extend_from_slice(&[
                ((op.ksr & 1) << 7) | ((op.dt & 7) << 4) | (op.mult & 0x0F),
                ((op.sus & 1) << 7) | (op.tl & 0x7F),
                ((op.rs & 3) << 6) | ((op.vib & 1) << 5) | (op.ar & 0x1F),
                ((op.am & 1) << 7) | ((op.ksl & 3) << 5) | (op.dr & 0x1F),
                ((op.egt & 1) << 7) | ((op.kvs & 3) << 5) | (op.d2r & 0x1F),
                ((op.sl & 0x0F) << 4) | (op.rr & 0x0F),
                ((op.dvb & 0x0F) << 4) | (op.ssg_env & 0x0F),
                ((op.dam & 7) << 5) | ((op.dt2 & 3) << 3) | (op.ws & 7),
            ]);
        }
    } else {
        out.extend_from_slice(&[
            ins.algorithm,
            ins.feedback,
            ins.fms,
            ins.ams,
            ins.fms2,
            ins.ams2,
            ins.operator_count,
            ins.opll_preset,
        ]);
        for record in 0..records {
            let op = &ins.operators[OPERATOR_SLOT[record]];
            out.extend_from_slice(&[
                op.am, op.ar, op.dr, op.mult, op.rr, op.sl, op.tl, op.dt2, op.rs, op.dt, op.d2r,
                op.ssg_env, op.dam, op.dvb, op.egt, op.ksl, op.sus, op.vib, op.ws, op.ksr, op.kvs,
            ]);
        }
    }
}

/// Load an instrument file. Files without a name take the file stem.
pub fn read_fui(path: impl AsRef<Path>) -> Result<Instrument, FuiFileError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let mut instrument = decode(&bytes)?;
    if instrument.name.is_empty() {
        if let Some(stem) = path.file_stem() {
            instrument.name = stem.to_string_lossy().into_owned();
        }
    }
    Ok(instrument)
}

pub fn write_fui(path: impl AsRef<Path>, instrument: &Instrument) -> Result<(), FuiFileError> {
    fs::write(path, encode(instrument))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(version: u16, kind: u8) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.push(kind);
        bytes.push(0);
        bytes
    }

    fn sample_instrument(version: u16) -> Instrument {
        let mut ins = Instrument {
            name: "Bell".into(),
            version,
            algorithm: 5,
            feedback: 6,
            fms: 3,
            ams: 2,
            operator_count: 4,
            ..Instrument::default()
        };
        for (n, op) in ins.operators.iter_mut().enumerate() {
            let n = n as u8;
            op.ar = 31 - n;
            op.dr = 10 + n;
            op.d2r = n;
            op.mult = n + 1;
            op.rr = 5 + n;
            op.sl = 2 + n;
            op.tl = 20 * n;
            op.dt = n + 2;
            op.rs = n % 4;
            op.am = n & 1;
            op.ssg_env = if n == 3 { 0x0B } else { 0 };
        }
        ins
    }

    #[test]
    fn header_errors() {
        assert_eq!(decode(b"FIN"), Err(FuiError::Truncated));
        assert_eq!(decode(b"RIFF\x00\x00\x01\x00EN"), Err(FuiError::BadMagic));
        assert_eq!(decode(b"FINS\xe0\x00"), Err(FuiError::Truncated));

        let mut wrong = header(224, 2);
        wrong.extend_from_slice(b"EN");
        assert_eq!(decode(&wrong), Err(FuiError::WrongType));
    }

    #[test]
    fn missing_fm_block() {
        let mut bytes = header(224, TYPE_FM);
        bytes.extend_from_slice(b"NA\x03\x00ab\x00EN");
        assert_eq!(decode(&bytes), Err(FuiError::NoDataBlock));
    }

    #[test]
    fn dangling_tag_is_truncated() {
        let mut bytes = header(224, TYPE_FM);
        bytes.extend_from_slice(b"FM\x05");
        assert_eq!(decode(&bytes), Err(FuiError::Truncated));
    }

    #[test]
    fn unknown_features_are_skipped() {
        let ins = sample_instrument(BLOCK_VERSION);
        let encoded = encode(&ins);
        // Splice an unknown feature in before FM
        let mut bytes = header(BLOCK_VERSION, TYPE_FM);
        bytes.extend_from_slice(b"ZZ\x03\x00\x01\x02\x03");
        bytes.extend_from_slice(&encoded[HEADER_LEN..]);
        assert_eq!(decode(&bytes), Ok(ins));
    }

    #[test]
    fn round_trips_each_layout() {
        for version in [100, 150, BLOCK_VERSION] {
            let mut ins = sample_instrument(version);
            if version >= BLOCK_VERSION {
                ins.block = 3;
            }
            if version >= PACKED_VERSION {
                ins.operators[2].enabled = false;
            }
            let bytes = encode(&ins);
            let decoded = decode(&bytes).expect("decodes");
            assert_eq!(decoded, ins, "version {version}");
            assert_eq!(encode(&decoded), bytes, "version {version}");
        }
    }

    #[test]
    fn short_fm_block_zero_fills() {
        let mut bytes = header(100, TYPE_FM);
        // Header says 1 operator but only 3 of its 21 bytes follow
        bytes.extend_from_slice(b"FM\x0b\x00");
        bytes.extend_from_slice(&[2, 1, 0, 0, 0, 0, 1, 0]);
        bytes.extend_from_slice(&[1, 31, 7]);
        bytes.extend_from_slice(b"EN");

        let ins = decode(&bytes).expect("decodes");
        assert_eq!(ins.algorithm, 2);
        let op1 = ins.operators[0];
        assert_eq!((op1.am, op1.ar, op1.dr), (1, 31, 7));
        assert_eq!((op1.mult, op1.tl, op1.kvs), (0, 0, 0));
    }

    #[test]
    fn truncated_fm_header_fails() {
        let mut bytes = header(224, TYPE_FM);
        bytes.extend_from_slice(b"FM\x03\x00\x04\x32\x00EN");
        assert_eq!(decode(&bytes), Err(FuiError::Truncated));
    }

    #[test]
    fn name_reads_to_first_nul() {
        let mut ins = sample_instrument(BLOCK_VERSION);
        ins.name = "Slap Bass".into();
        let bytes = encode(&ins);
        assert_eq!(&bytes[8..10], b"NA");
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), 10);
        assert_eq!(decode(&bytes).map(|i| i.name), Ok("Slap Bass".to_string()));
    }

    #[test]
    fn file_helpers_fall_back_to_stem() {
        let dir = std::env::temp_dir().join(format!("opn2_fm_fui_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("Unnamed Lead.fui");

        let mut ins = sample_instrument(BLOCK_VERSION);
        ins.name.clear();
        write_fui(&path, &ins).expect("write");
        let loaded = read_fui(&path).expect("read");
        assert_eq!(loaded.name, "Unnamed Lead");
        assert_eq!(loaded.operators, ins.operators);

        assert!(matches!(
            read_fui(dir.join("missing.fui")),
            Err(FuiFileError::Io(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
