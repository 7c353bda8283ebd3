//! Warmup plus timed kernel runs

use std::hint::black_box;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::BenchmarkConfig;
use crate::error::{HarnessError, Result};
use crate::kernel::{self, Workload};
use crate::record::{ResultTable, SampleRecord};
use crate::sampler::{cpu_percent, ProcessSampler, ResourceSampler, ResourceSnapshot};
use crate::workload;

/// Side of the leading corner used for the untimed warmup
pub const WARMUP_SIZE: usize = 8;

/// Build the operands a config describes
pub fn prepare(config: &BenchmarkConfig) -> Result<Workload> {
    if let Some(path) = config.matrix_file() {
        let (a, b) = workload::load_sparse(path, config.seed())?;
        return Ok(Workload::Sparse { a, b });
    }
    match config.density() {
        Some(density) if config.algorithm().is_sparse() => {
            let (a, b) = workload::generate_sparse(config.n(), density, config.seed())?;
            Ok(Workload::Sparse { a, b })
        }
        _ => {
            let (a, b) = workload::generate(config.n(), config.seed())?;
            Ok(Workload::Dense { a, b })
        }
    }
}

pub struct Runner<S> {
    sampler: S,
}

impl Runner<ProcessSampler> {
    pub fn with_process_sampler() -> Self {
        Runner::new(ProcessSampler)
    }
}

impl<S: ResourceSampler> Runner<S> {
    pub fn new(sampler: S) -> Self {
        Runner { sampler }
    }

    /// Generate the workload from `config` and time it
    pub fn run(&mut self, config: &BenchmarkConfig) -> Result<ResultTable> {
        let workload = prepare(config)?;
        self.run_workload(config, &workload)
    }

    /// Time `config.runs()` kernel invocations over a prepared workload.
    ///
    /// Any kernel error aborts the whole run; no partial table is returned.
    pub fn run_workload(
        &mut self,
        config: &BenchmarkConfig,
        workload: &Workload,
    ) -> Result<ResultTable> {
        let algorithm = config.algorithm();
        let n = workload.n();
        let density = match workload {
            Workload::Sparse { a, .. } if config.matrix_file().is_some() => Some(a.density()),
            Workload::Sparse { .. } => config.density(),
            Workload::Dense { .. } => None,
        };

        let warmup = workload.leading(WARMUP_SIZE.min(n));
        black_box(kernel::multiply(algorithm, &warmup, config.block())?);
        debug!(%config, "warmup done");

        let mut table = ResultTable::with_capacity(config.runs());
        for run in 1..=config.runs() {
            let before = self.sample();
            let start = Instant::now();
            let product = kernel::multiply(algorithm, workload, config.block())?;
            let seconds = start.elapsed().as_secs_f64();
            black_box(product);
            let after = self.sample();

            let (memory_mb, cpu, skipped) = resource_fields(&before, &after, seconds);
            if let Some(error) = skipped {
                warn!(run, %error, "resource sample skipped");
            }
            debug!(run, seconds, ?memory_mb, cpu_percent = ?cpu, "timed run");
            table.push(SampleRecord {
                algorithm,
                n,
                run,
                seconds,
                memory_mb,
                cpu_percent: cpu,
                density,
            });
        }

        info!(%config, runs = table.len(), "benchmark finished");
        Ok(table)
    }

    fn sample(&mut self) -> Result<ResourceSnapshot> {
        self.sampler.snapshot()
    }
}

/// Memory and CPU fields for one run, plus the first sampling error if any
fn resource_fields<'a>(
    before: &'a Result<ResourceSnapshot>,
    after: &'a Result<ResourceSnapshot>,
    seconds: f64,
) -> (Option<f64>, Option<f64>, Option<&'a HarnessError>) {
    match (before, after) {
        (Ok(before), Ok(after)) => (
            Some(after.resident_mb),
            Some(cpu_percent(before, after, seconds)),
            None,
        ),
        (Err(e), Ok(after)) => (Some(after.resident_mb), None, Some(e)),
        (Ok(_), Err(e)) | (Err(e), Err(_)) => (None, None, Some(e)),
    }
}

/// Run `config` with the platform's process sampler
pub fn run(config: &BenchmarkConfig) -> Result<ResultTable> {
    Runner::with_process_sampler().run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Algorithm;
    use crate::matrix::Matrix;
    use crate::sampler::UnavailableSampler;

    /// Fixed counters so memory/CPU values are predictable
    struct FakeSampler {
        calls: usize,
    }

    impl ResourceSampler for FakeSampler {
        fn snapshot(&mut self) -> Result<ResourceSnapshot> {
            self.calls += 1;
            Ok(ResourceSnapshot {
                resident_mb: 100.0 + self.calls as f64,
                cpu_seconds: 0.0,
            })
        }
    }

    fn config(n: i64, runs: i64, algorithm: Algorithm) -> BenchmarkConfig {
        BenchmarkConfig::new(n, runs, 42, algorithm, None).unwrap()
    }

    #[test]
    fn test_run_indices() {
        let mut runner = Runner::new(FakeSampler { calls: 0 });
        let table = runner.run(&config(16, 5, Algorithm::DenseNaive)).unwrap();
        let runs: Vec<usize> = table.iter().map(|r| r.run).collect();
        assert_eq!(runs, vec![1, 2, 3, 4, 5]);
        // one snapshot before and after each timed run, none for warmup
        assert_eq!(runner.sampler.calls, 10);
        assert_eq!(table.records()[0].memory_mb, Some(102.0));
        assert_eq!(table.records()[0].cpu_percent.map(|c| c >= 0.0), Some(true));
        assert!(table.iter().all(|r| r.n == 16 && r.seconds >= 0.0 && r.density.is_none()));
    }

    #[test]
    fn test_every_algorithm_runs() {
        for algorithm in Algorithm::ALL {
            let table = Runner::new(UnavailableSampler)
                .run(&config(12, 2, algorithm))
                .unwrap();
            assert_eq!(table.len(), 2);
            assert!(table.iter().all(|r| r.algorithm == algorithm));
            assert_eq!(table.has_density(), algorithm.is_sparse());
        }
    }

    #[test]
    fn test_sampling_unavailable_keeps_timing() {
        let table = Runner::new(UnavailableSampler)
            .run(&config(8, 3, Algorithm::DenseUnrolled))
            .unwrap();
        assert_eq!(table.len(), 3);
        for record in &table {
            assert_eq!(record.memory_mb, None);
            assert_eq!(record.cpu_percent, None);
            assert!(record.seconds >= 0.0);
        }
    }

    #[test]
    fn test_zero_n_runs() {
        let table = Runner::new(UnavailableSampler)
            .run(&config(0, 3, Algorithm::DenseNaive))
            .unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.iter().all(|r| r.n == 0 && r.seconds >= 0.0));
    }

    #[test]
    fn test_kernel_failure_aborts() {
        let workload = Workload::Dense {
            a: Matrix::new((4, 3)),
            b: Matrix::new((4, 4)),
        };
        let mut runner = Runner::new(FakeSampler { calls: 0 });
        let err = runner
            .run_workload(&config(4, 2, Algorithm::DenseNaive), &workload)
            .unwrap_err();
        assert!(matches!(err, HarnessError::DimensionMismatch { .. }));
        assert_eq!(runner.sampler.calls, 0);
    }

    #[test]
    fn test_kernel_failure_after_warmup_aborts() {
        // the 8x8 warmup corners agree, the full operands do not
        let workload = Workload::Dense {
            a: Matrix::new((10, 10)),
            b: Matrix::new((9, 10)),
        };
        let mut runner = Runner::new(FakeSampler { calls: 0 });
        let err = runner
            .run_workload(&config(10, 3, Algorithm::DenseBlocked), &workload)
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::DimensionMismatch {
                left: (10, 10),
                right: (9, 10)
            }
        ));
        // only the first run's opening snapshot was taken
        assert_eq!(runner.sampler.calls, 1);
    }

    #[test]
    fn test_resource_fields_one_error_per_run() {
        let ok = Ok(ResourceSnapshot {
            resident_mb: 8.0,
            cpu_seconds: 1.0,
        });
        let unavailable = || UnavailableSampler.snapshot();

        let (memory, cpu, skipped) = resource_fields(&ok, &ok, 0.5);
        assert_eq!((memory, cpu), (Some(8.0), Some(0.0)));
        assert!(skipped.is_none());

        let (before, after) = (unavailable(), unavailable());
        let (memory, cpu, skipped) = resource_fields(&before, &after, 0.5);
        assert_eq!((memory, cpu), (None, None));
        assert!(matches!(
            skipped,
            Some(HarnessError::ResourceSamplingUnavailable(_))
        ));

        let before = unavailable();
        let (memory, cpu, skipped) = resource_fields(&before, &ok, 0.5);
        assert_eq!((memory, cpu), (Some(8.0), None));
        assert!(skipped.is_some());
    }

    #[test]
    fn test_prepare_matches_generator() {
        let config = config(4, 2, Algorithm::DenseNaive);
        let (a, b) = workload::generate(4, 42).unwrap();
        assert_eq!(prepare(&config).unwrap(), Workload::Dense { a, b });
    }

    #[test]
    fn test_process_sampler_run() {
        let table = run(&config(8, 2, Algorithm::DenseBlocked)).unwrap();
        assert_eq!(table.len(), 2);
    }
}
