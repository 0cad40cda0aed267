use opn2_fm::{
    patch::{fui, fui::FuiError, Instrument},
    synth::GlobalParams,
};

fn container(version: u16, fm: &[u8]) -> Vec<u8> {
    let mut bytes = b"FINS".to_vec();
    bytes.extend_from_slice(&version.to_le_bytes());
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(b"FM");
    bytes.extend_from_slice(&(fm.len() as u16).to_le_bytes());
    bytes.extend_from_slice(fm);
    bytes.extend_from_slice(b"EN");
    bytes
}

/// Packed FM block: alg 3, fb 2, ams 1, fms 2, four operators, block 4.
/// Records are in file order, which is operators 1, 3, 2, 4.
fn packed_block() -> Vec<u8> {
    let mut fm = vec![0xF4, 0x32, 0x0A, 0x20, 0x04];
    fm.extend_from_slice(&[0x91, 0x25, 0x5F, 0x8A, 0x03, 0x4C, 0x00, 0x00]);
    fm.extend_from_slice(&[0x02, 0x7F, 0x1F, 0x05, 0x00, 0x2F, 0x0B, 0x00]);
    fm.extend_from_slice(&[0x72, 0x10, 0x1C, 0x07, 0x02, 0x1A, 0x00, 0x00]);
    fm.extend_from_slice(&[0x31, 0x00, 0xDF, 0x06, 0x01, 0x0F, 0x00, 0x00]);
    fm
}

#[test]
fn crafted_packed_instrument_decodes_exactly() {
    let bytes = container(224, &packed_block());
    let ins = fui::decode(&bytes).expect("valid instrument");

    assert_eq!(ins.version, 224);
    assert_eq!(ins.name, "");
    assert_eq!((ins.algorithm, ins.feedback), (3, 2));
    assert_eq!((ins.ams, ins.fms), (1, 2));
    assert_eq!((ins.operator_count, ins.block), (4, 4));
    assert!(ins.operators.iter().all(|op| op.enabled));

    let op1 = ins.operators[0];
    assert_eq!((op1.ksr, op1.dt, op1.mult), (1, 1, 1));
    assert_eq!((op1.tl, op1.rs, op1.ar), (37, 1, 31));
    assert_eq!((op1.am, op1.dr, op1.d2r), (1, 10, 3));
    assert_eq!((op1.sl, op1.rr), (4, 12));

    let op2 = ins.operators[1];
    assert_eq!((op2.dt, op2.mult, op2.tl, op2.ar), (7, 2, 16, 28));
    assert_eq!((op2.dr, op2.d2r, op2.sl, op2.rr), (7, 2, 1, 10));

    let op3 = ins.operators[2];
    assert_eq!((op3.mult, op3.tl, op3.ar, op3.dr), (2, 127, 31, 5));
    assert_eq!((op3.sl, op3.rr, op3.ssg_env), (2, 15, 0x0B));

    let op4 = ins.operators[3];
    assert_eq!((op4.dt, op4.mult, op4.tl, op4.rs), (3, 1, 0, 3));
    assert_eq!((op4.ar, op4.dr, op4.d2r, op4.sl, op4.rr), (31, 6, 1, 0, 15));

    assert_eq!(fui::encode(&ins), bytes);
}

#[test]
fn crafted_instrument_plays_as_expected_patch() {
    let ins = fui::decode(&container(224, &packed_block())).expect("valid instrument");
    let params = ins.to_patch_params(&GlobalParams::default());

    assert_eq!(params.global.algorithm, 3);
    assert_eq!(params.global.feedback, 2);
    assert_eq!(params.global.feedback_algorithm_register(), 0x13);
    // Tracker detune 1 is two steps below centre
    assert_eq!(params.operators[0].detune, 6);
    assert_eq!(params.operators[3].detune, 0);
    assert!(params.operators[2].ssg_enabled);
    assert_eq!(params.operators[2].ssg_mode, 3);
    assert_eq!(params.operators[2].total_level, 127);
}

#[test]
fn plain_layout_uses_one_byte_per_field() {
    let mut fm = vec![3, 2, 0, 1, 0, 0, 2, 0];
    // Record 1 is operator 1, record 2 is operator 3
    fm.extend((0..21).map(|i| i as u8));
    fm.extend((0..21).map(|i| 21 - i as u8));
    let bytes = container(100, &fm);

    let ins = fui::decode(&bytes).expect("valid instrument");
    assert_eq!(ins.operator_count, 2);
    assert_eq!((ins.operators[0].am, ins.operators[0].ar), (0, 1));
    assert_eq!(ins.operators[0].kvs, 20);
    assert_eq!((ins.operators[2].am, ins.operators[2].tl), (21, 15));
    assert_eq!(ins.operators[1], Instrument::default().operators[1]);

    assert_eq!(fui::encode(&ins), bytes);
}

#[test]
fn malformed_buffers_are_typed_errors() {
    assert_eq!(fui::decode(b""), Err(FuiError::Truncated));
    assert_eq!(fui::decode(b"FINT\xe0\x00\x01\x00EN"), Err(FuiError::BadMagic));

    let mut wrong_type = container(224, &packed_block());
    wrong_type[6] = 3;
    assert_eq!(fui::decode(&wrong_type), Err(FuiError::WrongType));

    let no_fm = b"FINS\xe0\x00\x01\x00EN";
    assert_eq!(fui::decode(no_fm), Err(FuiError::NoDataBlock));
}

#[test]
fn truncated_operator_block_zero_fills() {
    let full = packed_block();
    // Header plus one and a half records
    let bytes = container(224, &full[..5 + 12]);
    let ins = fui::decode(&bytes).expect("short block still decodes");

    assert_eq!(ins.operators[0].tl, 37);
    assert_eq!(ins.operators[2].mult, 2);
    assert_eq!(ins.operators[2].tl, 127);
    // Fields past the cut read as zero
    assert_eq!(ins.operators[2].sl, 0);
    assert_eq!(ins.operators[1].tl, 0);
    assert_eq!(ins.operators[3].ar, 0);
}
