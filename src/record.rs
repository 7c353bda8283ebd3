use crate::kernel::Algorithm;

/// One timed kernel invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub algorithm: Algorithm,
    pub n: usize,
    /// 1-based
    pub run: usize,
    pub seconds: f64,
    /// `None` when resource sampling was unavailable
    pub memory_mb: Option<f64>,
    /// `None` when resource sampling was unavailable
    pub cpu_percent: Option<f64>,
    pub density: Option<f64>,
}

/// Samples of one benchmark run, in run order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<SampleRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        ResultTable::default()
    }

    pub fn with_capacity(runs: usize) -> Self {
        ResultTable {
            records: Vec::with_capacity(runs),
        }
    }

    pub fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any row carries a density, which adds the `density` column
    pub fn has_density(&self) -> bool {
        self.records.iter().any(|r| r.density.is_some())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampleRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a SampleRecord;
    type IntoIter = std::slice::Iter<'a, SampleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
