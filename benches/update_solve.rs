use std::hint::black_box;
use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use markowitz_rs::linalg::cholesky;
use markowitz_rs::linalg::rand_cov;
use markowitz_rs::BoundName;
use markowitz_rs::DataKey;
use markowitz_rs::MinVar;
use markowitz_rs::Portfolio;
use markowitz_rs::SolverSettings;
use markowitz_rs::UpdateData;
use ndarray::Array1;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn data(n: usize, rng: &mut StdRng) -> anyhow::Result<UpdateData> {
  let cov = rand_cov(n, rng) + Array2::<f64>::eye(n) * 0.1;
  Ok(
    UpdateData::new()
      .with(DataKey::Cholesky, cholesky(cov.view())?)
      .with(DataKey::Lower(BoundName::Assets), Array1::<f64>::zeros(n))
      .with(DataKey::Upper(BoundName::Assets), Array1::<f64>::ones(n))
      .with(DataKey::VolaUncertainty, Array1::<f64>::from_elem(n, 0.01)),
  )
}

fn bench_update_solve(c: &mut Criterion) {
  let mut group = c.benchmark_group("MinVar");
  group.measurement_time(Duration::from_secs(3));
  group.warm_up_time(Duration::from_millis(500));
  let settings = SolverSettings::default();

  for &n in &[10usize, 50, 100] {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let data = data(n, &mut rng).unwrap();

    group.bench_with_input(BenchmarkId::new("build", n), &n, |b, &n| {
      b.iter(|| black_box(MinVar::new(n, None).build().unwrap()));
    });

    group.bench_with_input(BenchmarkId::new("update+solve", n), &n, |b, &n| {
      let mut problem = MinVar::new(n, None).build().unwrap();
      b.iter(|| {
        let value = problem.update(&data).unwrap().solve(&settings).unwrap();
        black_box(value)
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_update_solve);
criterion_main!(benches);
