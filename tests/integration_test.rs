use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;
use zxtape::block::{ArchiveInfoKind, Block, GroupStart, LoopStart, PauseTapeCommand};
use zxtape::{BlockKind, DecodeOptions, HeaderKind, Tape, TapeError, TapFile, TzxFile};

const TZX_HEADER: &[u8] = b"ZXTape!\x1A\x01\x14";

// SAVE "ROM" CODE 0,2
const ROM_HEADER_UNIT: &[u8] = &[
    0x13, 0x00, 0x00, 0x03, 0x52, 0x4f, 0x4d, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x02, 0x00, 0x00, 0x00, 0x00, 0x80, 0xf1,
];
const ROM_DATA_UNIT: &[u8] = &[0x04, 0x00, 0xff, 0xf3, 0xaf, 0xa3];

fn sample_tzx() -> Vec<u8> {
    let mut bytes = TZX_HEADER.to_vec();
    bytes.extend_from_slice(b"\x32\x11\x00\x02\x00\x07Example\x02\x05Alice");
    bytes.extend_from_slice(b"\x21\x04Load");
    bytes.extend_from_slice(&[0x10, 0xE8, 0x03]);
    bytes.extend_from_slice(ROM_HEADER_UNIT);
    bytes.extend_from_slice(&[0x10, 0xD0, 0x07]);
    bytes.extend_from_slice(ROM_DATA_UNIT);
    bytes.extend_from_slice(&[0x22]);
    bytes.extend_from_slice(&[0x24, 0x02, 0x00, 0x12, 0x78, 0x08, 0x10, 0x00, 0x25]);
    bytes.extend_from_slice(&[0x20, 0x00, 0x00]);
    bytes
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(bytes).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_open_tzx_from_disk() {
    let temp_file = write_temp(&sample_tzx());
    let tzx = TzxFile::open(temp_file.path()).unwrap();

    assert_eq!(tzx.header().major(), 1);
    assert_eq!(tzx.header().minor(), 20);
    let kinds: Vec<BlockKind> = tzx.blocks().iter().map(Block::kind).collect();
    assert_eq!(kinds, [
        BlockKind::ArchiveInfo,
        BlockKind::GroupStart,
        BlockKind::StandardSpeedData,
        BlockKind::StandardSpeedData,
        BlockKind::GroupEnd,
        BlockKind::LoopStart,
        BlockKind::PureTone,
        BlockKind::LoopEnd,
        BlockKind::PauseTapeCommand,
    ]);
    assert_eq!(tzx.blocks()[1], Block::GroupStart(GroupStart { name: "Load".into() }));
    assert_eq!(tzx.blocks()[5], Block::LoopStart(LoopStart { repetitions: 2 }));
    assert_eq!(tzx.blocks()[8], Block::PauseTapeCommand(PauseTapeCommand { pause: 0 }));
}

#[test]
fn test_embedded_tape_units() {
    let tzx = TzxFile::from_bytes(&sample_tzx()).unwrap();

    let header = tzx.blocks()[2].tape_data().and_then(|unit| unit.header()).unwrap();
    assert_eq!(header.kind, HeaderKind::Byte);
    assert_eq!(header.name_str(), "ROM");
    assert_eq!(tzx.blocks()[2].pause(), Some(1000));

    let data = tzx.blocks()[3].tape_data().and_then(|unit| unit.data()).unwrap();
    assert_eq!(data.payload(), &[0xf3, 0xaf]);
    assert_eq!(tzx.blocks()[3].pause(), Some(2000));
    assert!(tzx.blocks()[4].tape_data().is_none());
}

#[test]
fn test_archive_info() {
    let tzx = TzxFile::from_bytes(&sample_tzx()).unwrap();
    let info = tzx.archive_info().unwrap();
    assert_eq!(info.entries.len(), 2);
    assert_eq!(info.entries[0].kind, ArchiveInfoKind::Title);
    assert_eq!(info.entries[0].text, "Example");
    assert_eq!(info.entries[1].kind, ArchiveInfoKind::Authors);
    assert_eq!(info.entries[1].text, "Alice");
}

#[test]
fn test_reader_matches_bytes() {
    let bytes = sample_tzx();
    let temp_file = write_temp(&bytes);
    let from_reader = TzxFile::from_reader(File::open(temp_file.path()).unwrap()).unwrap();
    assert_eq!(from_reader, TzxFile::from_bytes(&bytes).unwrap());
}

#[test]
fn test_checksum_verification() {
    let mut bytes = sample_tzx();
    let options = DecodeOptions::default().with_verify_checksums(true);
    assert!(Tape::from_bytes(&bytes, &options).is_ok());

    // Corrupt the data unit's checksum byte.
    let pos = bytes.windows(ROM_DATA_UNIT.len()).position(|w| w == ROM_DATA_UNIT).unwrap();
    bytes[pos + ROM_DATA_UNIT.len() - 1] ^= 0xFF;
    assert!(TzxFile::from_bytes(&bytes).is_ok());
    match Tape::from_bytes(&bytes, &options) {
        Err(TapeError::ChecksumMismatch { block: 3, computed: 0xFF }) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_withdrawn_block_in_file() {
    let mut bytes = TZX_HEADER.to_vec();
    bytes.extend_from_slice(&[0x34, 0x00, 0x00]);
    let temp_file = write_temp(&bytes);
    match TzxFile::open(temp_file.path()) {
        Err(TapeError::DeprecatedBlockKind { kind, offset: 10 }) => {
            assert_eq!(kind.tag(), 0x34);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_tap_file_from_disk() {
    let mut bytes = ROM_HEADER_UNIT.to_vec();
    bytes.extend_from_slice(ROM_DATA_UNIT);
    let temp_file = write_temp(&bytes);

    let tape = Tape::open(temp_file.path(), &DecodeOptions::default()).unwrap();
    let tap = match tape {
        Tape::Tap(tap) => tap,
        Tape::Tzx(_) => panic!("detected as TZX"),
    };
    assert_eq!(tap.blocks().len(), 2);
    assert!(tap.blocks()[0].is_header());
    assert_eq!(tap.blocks()[0].to_string(), "Bytes: \"ROM\" CODE 0,2");
    assert_eq!(tap, TapFile::from_reader(File::open(temp_file.path()).unwrap()).unwrap());
}

#[test]
fn test_json_output() {
    let tzx = TzxFile::from_bytes(&sample_tzx()).unwrap();
    let json: serde_json::Value = serde_json::to_value(&tzx).unwrap();
    assert_eq!(json["header"]["major"], 1);
    assert_eq!(json["blocks"].as_array().unwrap().len(), 9);
    assert_eq!(json["blocks"][1]["GroupStart"]["name"], "Load");
    assert_eq!(json["blocks"][2]["StandardSpeedData"]["tape_data"]["Header"]["name"], "ROM       ");
}
