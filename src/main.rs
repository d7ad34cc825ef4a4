//main.rs
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::info;
use lloyd_kmeans::{DataSet, EmptyClusterPolicy, KMeans, LoadOptions};

#[derive(Parser)]
#[clap(version, about = "Lloyd's k-means and cofactor determinants over delimited numeric files")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cluster the rows of a file into k groups
    Cluster {
        #[clap(flatten)]
        input: Input,

        #[clap(short, long)]
        k: usize,

        /// Write one cluster label per input row
        #[clap(short, long)]
        outfile: Option<String>,

        /// Seed for picking the initial centers
        #[clap(short, long)]
        seed: Option<u64>,

        /// Stop after this many iterations even if not converged
        #[clap(short, long)]
        max_iter: Option<usize>,

        /// Abort when a cluster ends up empty instead of keeping its center
        #[clap(long)]
        fail_on_empty: bool,
    },
    /// Print the determinant of a square matrix
    Det {
        #[clap(flatten)]
        input: Input,
    },
}

#[derive(Args)]
struct Input {
    #[clap(short, long)]
    file: String,

    /// Field delimiter (single byte)
    #[clap(short, long, default_value = ",")]
    delimiter: char,

    /// First line is a header
    #[clap(long)]
    header: bool,
}

impl Input {
    fn load(&self) -> anyhow::Result<DataSet> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        let opts = LoadOptions {
            delimiter: self.delimiter as u8,
            has_headers: self.header,
        };
        let ds = DataSet::from_path(&self.file, &opts)?;
        info!("Loaded {} rows × {} columns", ds.nrows(), ds.ncols());
        Ok(ds)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    match opts.command {
        Command::Cluster {
            input,
            k,
            outfile,
            seed,
            max_iter,
            fail_on_empty,
        } => {
            let ds = input.load()?;

            let mut params = KMeans::new(k).with_max_iter(max_iter);
            if let Some(seed) = seed {
                params = params.with_seed(seed);
            }
            if fail_on_empty {
                params = params.with_empty_cluster_policy(EmptyClusterPolicy::Fail);
            }

            let result = ds.kmeans(&params)?;
            println!(
                "Assigned {} points into {} clusters in {} iterations{}",
                result.assignments.len(),
                result.clustering.len(),
                result.iterations,
                if result.converged { "" } else { " (not converged)" }
            );
            for (label, size) in result.clustering.sizes() {
                println!("cluster {}: {} points", label, size);
            }
            println!("cost: {}", result.clustering.cost());

            if let Some(outfile) = outfile {
                std::fs::write(
                    &outfile,
                    result
                        .assignments
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
                .with_context(|| format!("Failed to write {}", outfile))?;
            }
        }
        Command::Det { input } => {
            let ds = input.load()?;
            println!("{}", ds.determinant()?);
        }
    }

    Ok(())
}
