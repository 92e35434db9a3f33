use criterion::Criterion;
use gymkhana::{
    constants::{GYMKHANA_EPSILON_MAX, GYMKHANA_EPSILON_MIN},
    random::{default_rng, gaussian, happens},
};
use rand::RngCore;
use std::hint::black_box;

fn bench_wyhash(bench: &mut Criterion) {
    let mut rng = default_rng();

    bench.bench_function("random-wyhash-u64", |b| b.iter(|| rng.next_u64()));
}

fn bench_happens(bench: &mut Criterion) {
    let mut rng = default_rng();

    for rate in [GYMKHANA_EPSILON_MAX, GYMKHANA_EPSILON_MIN] {
        bench.bench_function(&format!("random-happens-{rate}"), |b| {
            b.iter(|| happens(&mut rng, black_box(rate)))
        });
    }
}

fn bench_gaussian(bench: &mut Criterion) {
    let mut rng = default_rng();

    bench.bench_function("random-gaussian", |b| b.iter(|| gaussian(&mut rng)));
}

// one scalar's worth of mutation: the coin flip, then a nudge when it lands
fn bench_nudge(bench: &mut Criterion) {
    let mut rng = default_rng();
    let mut value = 0.;

    bench.bench_function("random-nudge", |b| {
        b.iter(|| {
            if happens(&mut rng, GYMKHANA_EPSILON_MAX) {
                value += gaussian(&mut rng);
            }
            value
        })
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_wyhash(&mut criterion);
    bench_happens(&mut criterion);
    bench_gaussian(&mut criterion);
    bench_nudge(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
