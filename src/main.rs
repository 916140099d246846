use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use bgp_asrel::config::{parse_ratio, parse_threshold, parse_top_k};
use bgp_asrel::io::{
    read_paths_file, read_relationships_file, write_paths, write_ranking, write_relationships,
    write_tiers,
};
use bgp_asrel::{classify, InferenceConfig, InferenceRunner, NeighborIndex, PathSet, RunSummary};

#[derive(Parser, Debug)]
#[command(author, version, about)] // get author/version information from Cargo.toml
struct Cli {
    /// JSON file with `threshold`, `degree-size-ratio` and `top-k`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Draw a progress bar while inferring
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate raw AS paths and write one cleaned path per line
    Preprocess {
        #[command(flatten)]
        input: PathInput,
        #[arg(long)]
        output: PathBuf,
        /// Also write AS and path counts as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Write the ASes with the most distinct neighbors
    Rank {
        #[command(flatten)]
        input: PathInput,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Infer pairwise relationships from AS paths
    Annotate {
        #[command(flatten)]
        input: PathInput,
        #[arg(long)]
        output: PathBuf,
        /// Also write a JSON run summary
        #[arg(long)]
        summary: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Assign hierarchy tiers from a relationship file
    Classify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Relationships, tiers, ranking and summary in one pass
    Run {
        #[command(flatten)]
        input: PathInput,
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args, Debug)]
struct PathInput {
    /// AS path file, optionally bzip2 compressed
    #[arg(long)]
    input: PathBuf,

    /// Lines start with the `ASPATH:` attribute token
    #[arg(long)]
    attribute_prefix: bool,
}

impl PathInput {
    fn load(&self) -> Result<PathSet, Box<dyn std::error::Error>> {
        Ok(read_paths_file(&self.input, self.attribute_prefix)?)
    }
}

#[derive(Args, Debug)]
struct Tuning {
    #[arg(long, env = "BGP_TRANSIT_COUNT_THRESHOLD", value_parser = parse_threshold)]
    threshold: Option<u32>,

    #[arg(long, env = "BGP_DEGREE_SIZE_RATIO", value_parser = parse_ratio)]
    degree_size_ratio: Option<f64>,

    #[arg(long, env = "BGP_TOP_K", value_parser = parse_top_k)]
    top_k: Option<usize>,
}

impl Tuning {
    /// Environment and flags override whatever the config file set.
    fn apply(&self, mut config: InferenceConfig) -> InferenceConfig {
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        if let Some(ratio) = self.degree_size_ratio {
            config = config.with_degree_size_ratio(ratio);
        }
        if let Some(top_k) = self.top_k {
            config = config.with_top_k(top_k);
        }
        config
    }
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
    } else {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn load_config(
    path: Option<&Path>,
    tuning: &Tuning,
) -> Result<InferenceConfig, Box<dyn std::error::Error>> {
    let base = match path {
        Some(path) => InferenceConfig::from_json_file(path)?,
        None => InferenceConfig::default(),
    };
    let config = tuning.apply(base);
    config.validate()?;
    log::debug!("using {:?}", config);
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let start_time = Instant::now();

    match &cli.command {
        Command::Preprocess {
            input,
            output,
            summary,
        } => {
            let paths = input.load()?;
            write_paths(output, &paths)?;
            log::info!("Number of ASes: {}", paths.asns().len());
            log::info!("Number of AS paths: {}", paths.len());

            if let Some(summary_path) = summary {
                let mut report = RunSummary::new(InferenceConfig::default());
                report.record_paths(&paths);
                report.save_to_file(summary_path)?;
            }
        }
        Command::Rank {
            input,
            output,
            tuning,
        } => {
            let config = load_config(cli.config.as_deref(), tuning)?;
            let paths = input.load()?;
            let ranking = NeighborIndex::from_paths(&paths).top(config.top_k);
            write_ranking(output, &ranking)?;
        }
        Command::Annotate {
            input,
            output,
            summary,
            tuning,
        } => {
            let config = load_config(cli.config.as_deref(), tuning)?;
            let paths = input.load()?;
            let runner = InferenceRunner::new(config.clone()).with_progress(cli.progress);
            let inference = runner.infer_relationships(&paths)?;
            write_relationships(output, &inference.relationships)?;

            if let Some(summary_path) = summary {
                let mut report = RunSummary::new(config);
                report.record_paths(&paths);
                report.num_non_peer_pairs = inference.non_peers.len();
                report.record_graph(&inference.relationships);
                report.save_to_file(summary_path)?;
            }
        }
        Command::Classify { input, output } => {
            let graph = read_relationships_file(input)?;
            let tiers = classify(&graph);
            write_tiers(output, &tiers)?;
        }
        Command::Run {
            input,
            out_dir,
            tuning,
        } => {
            let config = load_config(cli.config.as_deref(), tuning)?;
            let paths = input.load()?;
            let runner = InferenceRunner::new(config.clone()).with_progress(cli.progress);
            let output = runner.run(&paths)?;

            write_relationships(&out_dir.join("relationships.txt"), &output.inference.relationships)?;
            write_tiers(&out_dir.join("tiers.txt"), &output.tiers)?;
            write_ranking(&out_dir.join("ranking.txt"), &output.ranking)?;
            output
                .summary(&config, &paths)
                .save_to_file(&out_dir.join("summary.json"))?;
        }
    }

    log::info!("finished in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
