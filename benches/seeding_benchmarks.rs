use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferrous_ert::seeding::{ReadContext, seed_read};
use ferrous_ert::{ErtBuilder, ErtIndex, SeedOpt};

const GENOME_LEN: usize = 20_000;
const READ_LEN: usize = 150;
const NUM_READS: usize = 200;

fn random_bases(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

/// Reads sampled from the genome with roughly one substitution per 50 bp
fn sample_reads(rng: &mut StdRng, genome: &[u8]) -> Vec<Vec<u8>> {
    (0..NUM_READS)
        .map(|_| {
            let start = rng.gen_range(0..genome.len() - READ_LEN);
            let mut read = genome[start..start + READ_LEN].to_vec();
            for base in read.iter_mut() {
                if rng.gen_ratio(1, 50) {
                    *base = b"ACGT"[rng.gen_range(0..4)];
                }
            }
            read
        })
        .collect()
}

fn seed_all(index: &ErtIndex, reads: &[Vec<u8>], opt: &SeedOpt) -> usize {
    reads
        .iter()
        .map(|seq| match ReadContext::new(index, "bench", seq, opt) {
            Ok(mut read) => seed_read(index, &mut read, opt).mems.len(),
            Err(_) => 0,
        })
        .sum()
}

fn bench_seeding(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut genome = random_bases(&mut rng, GENOME_LEN);
    // A repeated block gives multi-hit seeds and reseeding work
    let repeat = genome[1000..1300].to_vec();
    for copy in 0..8 {
        let at = 5000 + copy * 1500;
        genome[at..at + repeat.len()].copy_from_slice(&repeat);
    }
    let index = ErtBuilder::new(8).build_from_ascii(&genome).expect("index build");
    let reads = sample_reads(&mut rng, &genome);

    let mut group = c.benchmark_group("seed_read");
    group.throughput(Throughput::Elements(NUM_READS as u64));
    for use_prefix in [true, false] {
        let opt = SeedOpt {
            use_prefix,
            ..Default::default()
        };
        let label = if use_prefix { "kmer_prefix" } else { "root_walk" };
        group.bench_with_input(BenchmarkId::new("walk", label), &opt, |b, opt| {
            b.iter(|| seed_all(black_box(&index), black_box(&reads), opt))
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let mut group = c.benchmark_group("ert_build");
    group.sample_size(10);
    for len in [2_000usize, 8_000] {
        let genome = random_bases(&mut rng, len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &genome, |b, genome| {
            b.iter(|| ErtBuilder::new(8).build_from_ascii(black_box(genome)).expect("index build"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seeding, bench_build);
criterion_main!(benches);
