pub mod determinant;
pub mod error;
pub mod geometry;
pub mod kmeans;

pub use determinant::determinant;
pub use error::{KMeansError, Result};
pub use geometry::{centroid, distance};
pub use kmeans::{cluster, cluster_with_rng, cost, Clustering, EmptyClusterPolicy, KMeans, KMeansResult};

use anyhow::{anyhow, Context};
use csv::ReaderBuilder;
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How to parse a delimited numeric file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
        }
    }
}

/// Represents a numerical dataset loaded from a delimited text file
#[derive(Debug, Clone)]
pub struct DataSet {
    pub data: Array2<f64>,
    pub headers: Option<Vec<String>>,
}

impl DataSet {
    /// Read a delimited file into a DataSet
    pub fn from_path<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> anyhow::Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open {:?}", path.as_ref()))?;
        Self::from_reader(file, opts)
            .with_context(|| format!("Failed to load {:?}", path.as_ref()))
    }

    /// Parse delimited rows from any reader. Every field must be a number and
    /// every row must have the same width.
    pub fn from_reader<R: Read>(reader: R, opts: &LoadOptions) -> anyhow::Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(opts.delimiter)
            .has_headers(opts.has_headers)
            .from_reader(reader);

        let headers = if opts.has_headers {
            let h = rdr.headers().context("Error reading header")?;
            Some(h.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        } else {
            None
        };

        let mut records: Vec<Vec<f64>> = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("Error reading record {}", i))?;
            let row = record
                .iter()
                .enumerate()
                .map(|(j, x)| {
                    x.trim().parse::<f64>().map_err(|e| {
                        anyhow!("Record {}, field {}: cannot parse {:?}: {}", i, j, x, e)
                    })
                })
                .collect::<anyhow::Result<Vec<f64>>>()?;
            records.push(row);
        }

        if records.is_empty() {
            return Err(anyhow!("No data lines found"));
        }

        let nrows = records.len();
        let ncols = records[0].len();
        let flat: Vec<f64> = records.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((nrows, ncols), flat)?;

        Ok(Self { data, headers })
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Run k-means over all rows
    pub fn kmeans(&self, params: &KMeans) -> Result<KMeansResult> {
        params.fit(self.data.view())
    }

    /// Treat the loaded rows as a square matrix
    pub fn determinant(&self) -> Result<f64> {
        determinant(self.data.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_from_reader_csv() {
        let input = "0,0\n0,1\n10,0\n10,1\n";
        let ds = DataSet::from_reader(input.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.data, array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]);
        assert!(ds.headers.is_none());
    }

    #[test]
    fn test_from_reader_tsv_with_headers() {
        let input = "x\ty\n1.5\t-2\n3\t4e1\n";
        let opts = LoadOptions {
            delimiter: b'\t',
            has_headers: true,
        };
        let ds = DataSet::from_reader(input.as_bytes(), &opts).unwrap();
        assert_eq!(ds.headers, Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(ds.data, array![[1.5, -2.0], [3.0, 40.0]]);
    }

    #[test]
    fn test_from_reader_rejects_bad_field() {
        let input = "1,2\n3,abc\n";
        assert!(DataSet::from_reader(input.as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_from_reader_rejects_ragged_rows() {
        let input = "1,2\n3,4,5\n";
        assert!(DataSet::from_reader(input.as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_from_reader_rejects_empty() {
        assert!(DataSet::from_reader("".as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_kmeans_basic() {
        // Make some fake clusters
        let data = array![
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [9.0, 9.0, 9.0],
            [9.1, 9.1, 9.1],
        ];
        let ds = DataSet {
            data,
            headers: None,
        };
        let result = ds.kmeans(&KMeans::new(2).with_seed(5)).unwrap();
        assert_eq!(result.assignments.len(), 4);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);
        assert!(result.clustering.cost() < 1.0);
    }

    #[test]
    fn test_dataset_determinant() {
        let ds = DataSet::from_reader("2,0\n1,3\n".as_bytes(), &LoadOptions::default()).unwrap();
        assert_abs_diff_eq!(ds.determinant().unwrap(), 6.0, epsilon = 1e-12);
    }
}
