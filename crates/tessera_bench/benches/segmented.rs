//! Plain vs segmented file I/O benchmarks.
//!
//! Measures the cost of the virtual-file indirection against reading
//! and seeking the same content as one monolithic file.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::io::SeekFrom;
use std::path::PathBuf;
use tempfile::TempDir;
use tessera_core::{open, slice, FixedLayout, OpenMode};

const HEADER_LEN: u64 = 28;
const ARCHIVES: usize = 4;

/// Create patterned data of given size.
fn patterned(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Creates a monolithic file with `ARCHIVES` archive regions of
/// `archive_len` bytes behind a fixed header, optionally sliced into
/// segments.
fn fixture(archive_len: u64, sliced: bool) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.wsp");
    let total = HEADER_LEN + archive_len * ARCHIVES as u64;
    fs::write(&path, patterned(total as usize)).unwrap();

    if sliced {
        slice(&path, &FixedLayout::new(HEADER_LEN, vec![archive_len; ARCHIVES])).unwrap();
    }

    (dir, path)
}

/// Benchmark open + full sequential read, segment-aligned.
fn bench_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_read");

    for archive_len in [4 * 1024u64, 64 * 1024] {
        let total = HEADER_LEN + archive_len * ARCHIVES as u64;
        group.throughput(Throughput::Bytes(total));

        for (label, sliced) in [("plain", false), ("segmented", true)] {
            let (_dir, path) = fixture(archive_len, sliced);

            group.bench_with_input(
                BenchmarkId::new(label, archive_len),
                &archive_len,
                |b, &archive_len| {
                    b.iter(|| {
                        let mut file = open(&path, OpenMode::read_only()).unwrap();
                        let mut read = file.read(HEADER_LEN as usize).unwrap().len();
                        for _ in 0..ARCHIVES {
                            read += file.read(archive_len as usize).unwrap().len();
                        }
                        black_box(read);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark seeking between archive starts and reading a point slice.
fn bench_seek_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek_read");
    let archive_len = 16 * 1024u64;

    for (label, sliced) in [("plain", false), ("segmented", true)] {
        let (_dir, path) = fixture(archive_len, sliced);

        group.bench_function(BenchmarkId::new(label, ARCHIVES), |b| {
            let mut file = open(&path, OpenMode::read_only()).unwrap();
            let mut next = 0usize;
            b.iter(|| {
                let offset = HEADER_LEN + next as u64 * archive_len;
                next = (next + 1) % ARCHIVES;
                file.seek(SeekFrom::Start(offset)).unwrap();
                black_box(file.read(512).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sequential_read, bench_seek_read);
criterion_main!(benches);
