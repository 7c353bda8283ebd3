//! Matrix multiplication benchmark harness
//!
//! Generates seeded dense or CSR workloads, times one of several
//! multiplication kernels over repeated runs and writes one CSV row per
//! run. Flow: [`workload`] -> [`kernel`] -> [`runner`] -> [`sink`], with
//! [`summary`] aggregating finished tables for downstream charting.

pub mod config;
pub mod error;
pub mod kernel;
pub mod matrix;
pub mod record;
pub mod runner;
pub mod sampler;
pub mod sink;
pub mod sparse;
pub mod summary;
pub mod workload;

pub use config::BenchmarkConfig;
pub use error::{HarnessError, Result};
pub use kernel::{multiply, Algorithm, Workload};
pub use matrix::Matrix;
pub use record::{ResultTable, SampleRecord};
pub use runner::{run, Runner};
pub use sampler::{ProcessSampler, ResourceSampler, ResourceSnapshot, UnavailableSampler};
pub use sink::{write, WriteMode};
pub use sparse::CsrMatrix;
pub use workload::{generate, generate_sparse};
