use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mbus_codec::byte_source::SliceByteSource;
use mbus_codec::direction::Direction;
use mbus_codec::record;
use std::time::Duration;
use tokio::runtime::Builder;

// Performance target for a single variable-data record, scoped down
// from a whole-telegram parse budget.
const TARGET_RECORD_PARSE_US: f64 = 100.0;

fn benchmark_record_parsing(c: &mut Criterion) {
    let rt = Builder::new_current_thread().build().unwrap();
    let mut group = c.benchmark_group("record_parsing");
    group.measurement_time(Duration::from_secs(10));
    group.warm_up_time(Duration::from_secs(3));

    let records: &[(&str, &[u8])] = &[
        ("energy_wh_instantaneous", &[0x04, 0x03, 0x39, 0x30, 0x00, 0x00]),
        ("error_flags", &[0x02, 0xFD, 0x17, 0x00, 0x00]),
        ("idle_filler", &[0x2F]),
        ("manufacturer_header", &[0x0F]),
        (
            "plain_text_unit_with_storage_chain",
            &[0x84, 0x01, 0x7C, 0x03, b'h', b'W', b'k', 0x00, 0x10, 0x00, 0x00],
        ),
    ];

    for (name, bytes) in records {
        group.bench_with_input(BenchmarkId::new("parse", *name), bytes, |b, bytes| {
            b.iter(|| {
                rt.block_on(async {
                    let mut src = SliceByteSource::new(black_box(bytes));
                    record::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap()
                })
            });
        });
    }

    group.finish();
    let _ = TARGET_RECORD_PARSE_US;
}

fn benchmark_dif_chain_parsing(c: &mut Criterion) {
    let rt = Builder::new_current_thread().build().unwrap();
    let mut group = c.benchmark_group("dif_chain_parsing");

    let chains: &[(&str, &[u8])] = &[
        ("no_difes", &[0x04]),
        ("one_dife", &[0x84, 0x01]),
        ("final_dife", &[0x84, 0x81, 0x00]),
    ];
    for (name, bytes) in chains {
        group.bench_with_input(BenchmarkId::new("parse_chain", *name), bytes, |b, bytes| {
            b.iter(|| {
                rt.block_on(async {
                    let mut src = SliceByteSource::new(black_box(bytes));
                    mbus_codec::dif::parse_chain(Direction::SLAVE_TO_MASTER, &mut src)
                        .await
                        .unwrap()
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_record_parsing, benchmark_dif_chain_parsing);
criterion_main!(benches);
