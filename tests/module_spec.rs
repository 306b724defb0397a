//! End-to-end module tests: DDR parsing, sequential reads, typed value
//! access, header reuse, cloning and error recovery.

mod common;

use common::{
    bin_content, build_record, coor_content, descriptor, descriptor_compiler, name_content,
    standard_ddr, write_transfer,
};
use iso8211::{DataType, DdfError, DdfModule, FIELD_TERMINATOR};

fn open(file: &tempfile::NamedTempFile) -> DdfModule {
    DdfModule::open(file.path(), &descriptor_compiler).expect("open transfer")
}

fn standard_record(leader_id: u8, text: &str, num: i32, x: i32) -> Vec<u8> {
    build_record(
        leader_id,
        &[
            ("NAME", name_content(text, num, 3.5)),
            ("COOR", coor_content(&[(x, x + 1), (x + 2, x + 3)])),
            ("BIN", bin_content(258, -2, 2.5)),
        ],
    )
}

#[test]
fn open_parses_ddr_definitions() {
    let file = write_transfer(&[standard_ddr()]);
    let module = open(&file);

    assert_eq!(module.field_defn_count(), 3);
    assert_eq!(module.leader().leader_identifier, b'L');

    // Tag lookup is case-insensitive.
    let name = module.find_field_defn("name").expect("NAME defn");
    assert_eq!(name.tag(), "NAME");
    assert_eq!(name.name(), "Feature name");
    assert!(!name.is_repeating());
    assert_eq!(name.subfield_count(), 3);
    assert_eq!(name.find_subfield("TEXT").unwrap().data_type(), DataType::Text);
    assert_eq!(name.find_subfield("NUM").unwrap().data_type(), DataType::Int);
    assert_eq!(name.find_subfield("VAL").unwrap().data_type(), DataType::Float);

    let coor = module.find_field_defn("COOR").expect("COOR defn");
    assert!(coor.is_repeating());

    let bin = module.find_field_defn("BIN").expect("BIN defn");
    let s16 = bin.find_subfield("S16").unwrap();
    assert!(!s16.is_variable());
    assert_eq!(s16.width(), 2);
}

#[test]
fn reads_records_sequentially_with_typed_values() {
    let file = write_transfer(&[
        standard_ddr(),
        standard_record(b'D', "alpha", 42, 10),
        standard_record(b'D', "beta", -7, 100),
    ]);
    let mut module = open(&file);

    let record = module.read_record().expect("read").expect("first record");
    assert_eq!(record.field_count(), 3);
    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("alpha".to_string())
    );
    assert_eq!(record.get_int_subfield("NAME", 0, "NUM", 0).unwrap(), Some(42));
    assert_eq!(
        record.get_float_subfield("NAME", 0, "VAL", 0).unwrap(),
        Some(3.5)
    );
    // Repeating group: second instance.
    assert_eq!(record.get_int_subfield("COOR", 0, "X", 1).unwrap(), Some(12));
    assert_eq!(record.get_int_subfield("COOR", 0, "Y", 1).unwrap(), Some(13));
    // Binary subfields.
    assert_eq!(record.get_int_subfield("BIN", 0, "U16", 0).unwrap(), Some(258));
    assert_eq!(record.get_int_subfield("BIN", 0, "S16", 0).unwrap(), Some(-2));
    assert_eq!(
        record.get_float_subfield("BIN", 0, "F32", 0).unwrap(),
        Some(2.5)
    );
    // Absent names are None, not errors.
    assert_eq!(record.get_int_subfield("GONE", 0, "X", 0).unwrap(), None);
    assert_eq!(record.get_int_subfield("NAME", 0, "GONE", 0).unwrap(), None);
    assert_eq!(record.get_int_subfield("NAME", 1, "NUM", 0).unwrap(), None);

    let record = module.read_record().expect("read").expect("second record");
    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("beta".to_string())
    );
    assert_eq!(record.get_int_subfield("COOR", 0, "X", 0).unwrap(), Some(100));

    // Clean end-of-file, repeatedly.
    assert!(module.read_record().expect("eof").is_none());
    assert!(module.read_record().expect("eof again").is_none());
}

#[test]
fn truncated_record_is_an_error_not_eof() {
    let mut truncated = standard_record(b'D', "gamma", 1, 1);
    truncated.truncate(truncated.len() - 5);
    let file = write_transfer(&[standard_ddr(), truncated]);
    let mut module = open(&file);

    match module.read_record() {
        Err(DdfError::ShortRead { context, .. }) => assert_eq!(context, "data record"),
        other => panic!("expected short read, got {:?}", other.map(|r| r.is_some())),
    }
}

#[test]
fn corrupt_leader_is_rejected() {
    let mut bad = standard_record(b'D', "delta", 1, 1);
    bad[0..5].copy_from_slice(b"abcde");
    let file = write_transfer(&[standard_ddr(), bad]);
    let mut module = open(&file);

    assert!(matches!(
        module.read_record(),
        Err(DdfError::CorruptRecord { .. })
    ));

    // The DDR itself gets the same check.
    let mut bad_ddr = standard_ddr();
    bad_ddr[12..17].copy_from_slice(b"00005");
    let file = write_transfer(&[bad_ddr]);
    assert!(matches!(
        DdfModule::open(file.path(), &descriptor_compiler),
        Err(DdfError::CorruptRecord { .. })
    ));
}

#[test]
fn reused_header_carries_directory_forward() {
    // A leader identifier of 'R' announces that following physical
    // records consist of field-area bytes only.
    let full = standard_record(b'R', "first", 1, 10);

    // Continuation: identical layout, different values, no leader and no
    // directory of its own.
    let mut continuation = Vec::new();
    for content in [
        name_content("secnd", 2, 3.5),
        coor_content(&[(50, 51), (52, 53)]),
        bin_content(258, -2, 2.5),
    ] {
        continuation.extend_from_slice(&content);
        continuation.push(FIELD_TERMINATOR);
    }

    let file = write_transfer(&[standard_ddr(), full, continuation]);
    let mut module = open(&file);

    let record = module.read_record().expect("read").expect("full record");
    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("first".to_string())
    );

    let record = module.read_record().expect("read").expect("continuation");
    assert_eq!(record.field_count(), 3);
    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("secnd".to_string())
    );
    assert_eq!(record.get_int_subfield("COOR", 0, "X", 0).unwrap(), Some(50));

    assert!(module.read_record().expect("eof").is_none());
}

#[test]
fn cloned_record_survives_subsequent_reads() {
    let file = write_transfer(&[
        standard_ddr(),
        standard_record(b'D', "keep", 11, 1),
        standard_record(b'D', "next", 22, 2),
    ]);
    let mut module = open(&file);

    let kept = module
        .read_record()
        .expect("read")
        .expect("first record")
        .clone();
    let record = module.read_record().expect("read").expect("second record");

    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("next".to_string())
    );
    assert_eq!(
        kept.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("keep".to_string())
    );
    assert_eq!(kept.get_int_subfield("NAME", 0, "NUM", 0).unwrap(), Some(11));
}

#[test]
fn clone_on_rebinds_to_matching_definitions() {
    let file = write_transfer(&[standard_ddr(), standard_record(b'D', "move", 5, 7)]);
    let mut module = open(&file);
    let record = module.read_record().expect("read").expect("record").clone();

    // Identical DDR: every tag resolves.
    let target_file = write_transfer(&[standard_ddr()]);
    let target = open(&target_file);
    let moved = record.clone_on(&target).expect("rebind");
    assert_eq!(
        moved.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("move".to_string())
    );

    // A module missing one of the record's tags: all-or-nothing failure.
    let partial_ddr = build_record(
        b'L',
        &[(
            "NAME",
            descriptor(
                "Feature name",
                false,
                &[("TEXT", "A"), ("NUM", "I"), ("VAL", "R")],
            ),
        )],
    );
    let partial_file = write_transfer(&[partial_ddr]);
    let partial = open(&partial_file);
    assert!(record.clone_on(&partial).is_none());
}

#[test]
fn undefined_tag_fails_but_leaves_module_usable() {
    let unknown = build_record(b'D', &[("XXXX", b"mystery".to_vec())]);
    let file = write_transfer(&[
        standard_ddr(),
        unknown,
        standard_record(b'D', "after", 9, 3),
    ]);
    let mut module = open(&file);

    match module.read_record() {
        Err(DdfError::UndefinedField(tag)) => assert_eq!(tag, "XXXX"),
        other => panic!("expected undefined field, got {:?}", other.map(|r| r.is_some())),
    }

    // The bad record was consumed whole; the stream stands at the next one.
    let record = module.read_record().expect("read").expect("next record");
    assert_eq!(
        record.get_string_subfield("NAME", 0, "TEXT", 0).unwrap(),
        Some("after".to_string())
    );
}
