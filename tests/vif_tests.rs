//! Integration tests for the VIF/VIFE chain parser (C7) and its lookup
//! tables, exercised through the crate's public surface rather than its
//! internal unit tests.

use mbus_codec::byte_source::SliceByteSource;
use mbus_codec::direction::Direction;
use mbus_codec::vif;
use mbus_codec::vif_tables::{self, Table};

#[test]
fn primary_table_resolves_energy_wh() {
    let entry = vif_tables::lookup(Table::Primary, 0x03).unwrap();
    assert_eq!(entry.description, Some("Energy"));
    assert_eq!(entry.unit, Some("Wh"));
}

#[test]
fn primary_table_resolves_date_time() {
    let entry = vif_tables::lookup(Table::Primary, 0x6D).unwrap();
    assert_eq!(entry.description, Some("DateTime"));
}

#[tokio::test]
async fn single_byte_vif_chain_parses_energy() {
    let mut src = SliceByteSource::new(&[0x03]);
    let vib = vif::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
    assert_eq!(vib.description, Some("Energy"));
    assert_eq!(vib.field_count, 1);
}

#[tokio::test]
async fn plain_text_vif_flags_ascii_unit_sub_protocol() {
    let mut src = SliceByteSource::new(&[0x7C]);
    let vib = vif::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
    assert!(vib.is_plain_text);
    assert_eq!(vib.unit, None);
}

#[tokio::test]
async fn second_extension_error_flags_chain_resolves() {
    let mut src = SliceByteSource::new(&[0xFD, 0x17]);
    let vib = vif::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
    assert!(vib.error_record);
    assert_eq!(vib.field_count, 2);
}

#[tokio::test]
async fn unknown_vif_code_surfaces_as_unknown_vif_code() {
    // 0xFB escapes into the First Extension table, which only populates
    // 0x00-0x07 and 0x10-0x17; 0x08 there has no descriptor.
    let mut src = SliceByteSource::new(&[0xFB, 0x08]);
    let err = vif::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap_err();
    assert!(matches!(
        err,
        mbus_codec::CodecError::UnknownVifCode { code: 0x08, .. }
    ));
}

#[tokio::test]
async fn vib_to_bytes_replays_the_exact_wire_chain() {
    for bytes in [&[0x03u8][..], &[0x7C], &[0xFD, 0x17]] {
        let mut src = SliceByteSource::new(bytes);
        let vib = vif::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
        assert_eq!(vib.to_bytes(), bytes);
    }
}
