#[macro_use]
extern crate criterion;

use avl_index::{Avl, Duplicates};
use criterion::{BenchmarkId, Criterion};

// Spread keys over the index without sorting them.
fn keys(num: i64) -> impl Iterator<Item = i64> {
    (0..num).map(move |i| (i * 7919) % num)
}

pub fn insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let nums: Vec<i64> = vec![1_000, 10_000, 100_000];
    for num in nums {
        group.bench_with_input(BenchmarkId::new("Counted", num), &num, |b, &num| {
            b.iter(|| Avl::load_from("bench", keys(num)))
        });
        group.bench_with_input(BenchmarkId::new("Replicated", num), &num, |b, &num| {
            b.iter(|| {
                let mut avl = Avl::with_duplicates("bench", Duplicates::Replicated);
                for key in keys(num) {
                    avl.insert(key % 64);
                }
                avl
            })
        });
    }
}

pub fn read_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let nums: Vec<i64> = vec![1_000, 10_000, 100_000];
    for num in nums {
        let avl = Avl::load_from("bench", keys(num));
        group.bench_with_input(BenchmarkId::new("find", num), &num, |b, &num| {
            b.iter(|| keys(num).filter(|key| avl.find(*key).is_some()).count())
        });
        group.bench_with_input(BenchmarkId::new("iter", num), &num, |b, _| {
            b.iter(|| avl.iter().count())
        });
    }
}

pub fn delete_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    let nums: Vec<i64> = vec![1_000, 10_000];
    for num in nums {
        let avl = Avl::load_from("bench", keys(num));
        group.bench_with_input(BenchmarkId::new("all", num), &num, |b, &num| {
            b.iter(|| {
                let mut avl = avl.clone();
                for key in keys(num) {
                    assert!(avl.delete(key).is_ok());
                }
                avl
            })
        });
    }
}

criterion_group!(benches, insert_benchmark, read_benchmark, delete_benchmark);
criterion_main!(benches);
