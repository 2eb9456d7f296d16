//! Property-based round-trip and accumulation checks for the DIF/DIFE
//! chain parser (C5), run over randomly generated legal chains rather
//! than the fixed cases in `golden_frames.rs`.

use mbus_codec::byte_source::SliceByteSource;
use mbus_codec::dif::{self, DifChain};
use mbus_codec::direction::Direction;
use proptest::prelude::*;
use tokio::runtime::Builder;

const DATA_FIELD_CODES: [u8; 14] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
];

fn run<F: std::future::Future>(fut: F) -> F::Output {
    Builder::new_current_thread().build().unwrap().block_on(fut)
}

proptest! {
    /// Any legal DIF byte (no DIFEs) round-trips through `DifChain::to_bytes`.
    #[test]
    fn dif_only_chain_round_trips(
        data_field_idx in 0..DATA_FIELD_CODES.len(),
        storage_bit0 in any::<bool>(),
        function_bits in 0u8..4,
    ) {
        let data_field = DATA_FIELD_CODES[data_field_idx];
        let byte = data_field | (function_bits << 4) | if storage_bit0 { 0x40 } else { 0 };
        let bytes = [byte];
        let result = run(async {
            let mut src = SliceByteSource::new(&bytes);
            dif::parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await
        });
        let chain = result.unwrap();
        prop_assert_eq!(chain.to_bytes(), bytes.to_vec());
    }

    /// A chain of 1..8 DataDIFEs terminated by a FinalDIFE round-trips,
    /// and its accumulated storage number matches the closed-form sum.
    #[test]
    fn dife_chain_round_trips_and_accumulates(
        data_field_idx in 0..DATA_FIELD_CODES.len(),
        storage_bit0 in any::<bool>(),
        nibbles in prop::collection::vec(0u8..16, 1..8),
    ) {
        let data_field = DATA_FIELD_CODES[data_field_idx];
        let dif_byte = data_field | if storage_bit0 { 0x40 } else { 0 } | 0x80;
        let mut bytes = vec![dif_byte];
        for &n in &nibbles {
            bytes.push(n | 0x80); // ext set, DataDIFE
        }
        bytes.push(0x00); // FinalDIFE terminates the chain

        let DifChain { dif, difes } = run(async {
            let mut src = SliceByteSource::new(&bytes);
            dif::parse_chain(Direction::SLAVE_TO_MASTER, &mut src).await
        })
        .unwrap();

        let acc = dif::accumulate(&dif, &difes);
        let mut expected: u64 = if storage_bit0 { 1 } else { 0 };
        for (i, &n) in nibbles.iter().enumerate() {
            expected += (n as u64) << (4 * i as u32 + 1);
        }
        prop_assert_eq!(acc.storage_number, expected);
        prop_assert!(acc.register_number);

        let chain = DifChain { dif, difes };
        prop_assert_eq!(chain.to_bytes(), bytes);
    }
}
