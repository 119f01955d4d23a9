use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use toponym_core::{
    ClusterSet, ClusteringError, ConfigError, GeoError, GeoEvaluator, NGramKind, NGramModel,
    RecordSource, SelectionStrategy, SignificanceWeights, SubsumedCounts, SuffixClustering,
    SuffixClusteringBuilder, SuffixTrie, TrieError, TrieSummary,
};
use toponym_providers_cities::{CityLayout, CitySource, CitySourceError};
use tracing::{info, instrument, warn};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "toponym", about = "Cluster place names by their shared endings.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Select suffix clusters and export them with their geographic spread.
    Cluster(ClusterCommand),
    /// Print a letter, bigram or trigram frequency table.
    Distribution(DistributionCommand),
    /// Print properties of the suffix trie.
    Summary(SummaryCommand),
    /// Write the kept cities as an `id,city,latitude,longitude` file.
    Extract(ExtractCommand),
}

/// City file arguments shared by every command.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Path to a comma-separated city file.
    pub path: PathBuf,

    /// Column layout of the file.
    #[arg(long, value_enum, default_value_t = LayoutArg::World)]
    pub layout: LayoutArg,

    /// Keep only rows with this country code (world layout only).
    #[arg(long)]
    pub country: Option<String>,

    /// Override name for the data source (defaults to the file name).
    #[arg(long)]
    pub name: Option<String>,
}

/// Supported city file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// `country,city,accent_city,region,population,latitude,longitude`
    World,
    /// `id,city,latitude,longitude`
    Extracted,
}

impl From<LayoutArg> for CityLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::World => Self::World,
            LayoutArg::Extracted => Self::Extracted,
        }
    }
}

/// Options accepted by the `cluster` command.
#[derive(Debug, Args, Clone)]
pub struct ClusterCommand {
    /// City file to read.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Selection parameters.
    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Export format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Selection parameters; unset values keep the library defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct TuningArgs {
    /// Selection strategy.
    #[arg(long, value_enum, default_value_t = StrategyArg::Proportion)]
    pub strategy: StrategyArg,

    /// Share of its parent a child must hold [default: 0.8].
    #[arg(long)]
    pub proportion: Option<f64>,

    /// Fraction of a tree's records below which no cluster is formed
    /// [default: 0.05].
    #[arg(long = "min-percent")]
    pub min_percent: Option<f64>,

    /// Fraction of a tree's records a cluster must leave out [default: 0.05].
    #[arg(long = "max-percent")]
    pub max_percent: Option<f64>,

    /// Significance threshold on actual over expected probability
    /// [default: 1.5].
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Weight of the letter context [default: 0.2].
    #[arg(long = "letter-weight")]
    pub letter_weight: Option<f64>,

    /// Weight of the bigram context [default: 0.3].
    #[arg(long = "bigram-weight")]
    pub bigram_weight: Option<f64>,

    /// Weight of the trigram context [default: 0.5].
    #[arg(long = "trigram-weight")]
    pub trigram_weight: Option<f64>,
}

impl TuningArgs {
    /// Validates the parameters into a [`SuffixClustering`].
    ///
    /// # Errors
    /// Returns [`ConfigError`] for out-of-range values.
    pub fn build(&self) -> Result<SuffixClustering, ConfigError> {
        let defaults = SignificanceWeights::default();
        let weights = SignificanceWeights::new(
            self.letter_weight.unwrap_or(defaults.letter),
            self.bigram_weight.unwrap_or(defaults.bigram),
            self.trigram_weight.unwrap_or(defaults.trigram),
        );
        let mut builder = SuffixClusteringBuilder::new()
            .with_strategy(self.strategy.into())
            .with_weights(weights);
        if let Some(proportion) = self.proportion {
            builder = builder.with_proportion(proportion);
        }
        if let Some(min_percent) = self.min_percent {
            builder = builder.with_min_percent(min_percent);
        }
        if let Some(max_percent) = self.max_percent {
            builder = builder.with_max_percent(max_percent);
        }
        if let Some(alpha) = self.alpha {
            builder = builder.with_alpha(alpha);
        }
        builder.build()
    }
}

/// Supported selection strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Size and proportion thresholds only.
    #[default]
    Proportion,
    /// Compare child shares against the n-gram model.
    Significance,
}

impl From<StrategyArg> for SelectionStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Proportion => Self::Proportion,
            StrategyArg::Significance => Self::Significance,
        }
    }
}

/// Export formats for the `cluster` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One pretty-printed JSON array.
    Json,
    /// One JSON object per line.
    Ndjson,
    /// A tab-separated table.
    Text,
}

/// Options accepted by the `distribution` command.
#[derive(Debug, Args, Clone)]
pub struct DistributionCommand {
    /// City file to read.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Table to print.
    #[arg(long, value_enum, default_value_t = NGramArg::Letter)]
    pub ngram: NGramArg,
}

/// n-gram tables selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NGramArg {
    /// Single letters.
    Letter,
    /// Letter pairs.
    Bigram,
    /// Letter triples.
    Trigram,
}

impl From<NGramArg> for NGramKind {
    fn from(value: NGramArg) -> Self {
        match value {
            NGramArg::Letter => Self::Letter,
            NGramArg::Bigram => Self::Bigram,
            NGramArg::Trigram => Self::Trigram,
        }
    }
}

/// Options accepted by the `summary` command.
#[derive(Debug, Args, Clone)]
pub struct SummaryCommand {
    /// City file to read.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Options accepted by the `extract` command.
#[derive(Debug, Args, Clone)]
pub struct ExtractCommand {
    /// City file to read.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Destination of the extracted file; read it back with
    /// `--layout extracted`.
    #[arg(long, short)]
    pub output: PathBuf,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be opened or created.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The city file was malformed.
    #[error(transparent)]
    Cities(#[from] CitySourceError),
    /// Selection parameters were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The suffix trie could not be built.
    #[error(transparent)]
    Trie(#[from] TrieError),
    /// Cluster selection failed.
    #[error(transparent)]
    Clustering(#[from] ClusteringError),
    /// Geographic evaluation failed for a reason other than too few records.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl CliError {
    /// Returns the stable code of the wrapped library error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => None,
            Self::Cities(err) => Some(err.code().as_str()),
            Self::Config(err) => Some(err.code().as_str()),
            Self::Trie(err) => Some(err.code().as_str()),
            Self::Clustering(err) => Some(err.code().as_str()),
            Self::Geo(err) => Some(err.code().as_str()),
        }
    }
}

/// One exported cluster.
///
/// Statistic fields are `None` when the cluster holds fewer than two
/// records and serialize as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    /// The cluster's suffix.
    pub suffix: String,
    /// Records whose name ends with the suffix.
    pub subsumed_cities: u64,
    /// Smallest pairwise distance.
    pub min: Option<f64>,
    /// Largest pairwise distance.
    pub max: Option<f64>,
    /// Mean pairwise distance.
    pub mean: Option<f64>,
    /// Sample standard deviation of the pairwise distances.
    pub stddev: Option<f64>,
}

/// Output of the `cluster` command.
#[derive(Debug, Clone)]
pub struct ClusterReport {
    /// Name of the data source.
    pub data_source: String,
    /// Strategy that selected the clusters.
    pub strategy: SelectionStrategy,
    /// Requested export format.
    pub format: OutputFormat,
    /// Clusters ordered by suffix.
    pub clusters: Vec<ClusterRecord>,
}

/// Output of the `distribution` command.
#[derive(Debug, Clone)]
pub struct DistributionReport {
    /// Name of the data source.
    pub data_source: String,
    /// Table the entries were taken from.
    pub kind: NGramKind,
    /// Token total of the table.
    pub tokens: u64,
    /// Entries by descending count, then ascending key.
    pub entries: Vec<(String, u64)>,
}

/// Output of the `summary` command.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    /// Name of the data source.
    pub data_source: String,
    /// Trie counts.
    pub summary: TrieSummary,
    /// Root suffixes in ascending order.
    pub roots: Vec<String>,
}

/// Output of the `extract` command.
#[derive(Debug, Clone)]
pub struct ExtractReport {
    /// Name of the data source.
    pub data_source: String,
    /// File the rows were written to.
    pub output: PathBuf,
    /// Rows written, excluding the header.
    pub rows: usize,
    /// Rows dropped by the country filter.
    pub skipped: usize,
}

/// Outcome of a CLI command, ready to render.
#[derive(Debug, Clone)]
pub enum Report {
    /// Exported clusters.
    Clusters(ClusterReport),
    /// A frequency table.
    Distribution(DistributionReport),
    /// Trie properties.
    Summary(SummaryReport),
    /// Where the extracted file went.
    Extract(ExtractReport),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, building, selection or writing fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use toponym_cli::cli::{Cli, Command, Report, SourceArgs, LayoutArg, SummaryCommand, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "de,leipzig,Leipzig,13,,51.3,12.4\nde,pelzig,Pelzig,13,,51.1,12.0\n")?;
/// let cli = Cli {
///     command: Command::Summary(SummaryCommand {
///         source: SourceArgs {
///             path: file.path().to_path_buf(),
///             layout: LayoutArg::World,
///             country: None,
///             name: None,
///         },
///     }),
/// };
/// let Report::Summary(report) = run_cli(cli)? else { unreachable!() };
/// assert_eq!(report.summary.records, 2);
/// # Ok(())
/// # }
/// ```
pub fn run_cli(cli: Cli) -> Result<Report, CliError> {
    match cli.command {
        Command::Cluster(command) => run_cluster(&command).map(Report::Clusters),
        Command::Distribution(command) => run_distribution(&command).map(Report::Distribution),
        Command::Summary(command) => run_summary(&command).map(Report::Summary),
        Command::Extract(command) => run_extract(&command).map(Report::Extract),
    }
}

pub(super) fn run_cluster(command: &ClusterCommand) -> Result<ClusterReport, CliError> {
    let clustering = command.tuning.build()?;
    let source = load_source(&command.source)?;
    let trie = SuffixTrie::try_from_source(&source)?;
    let counts = count(&trie);
    let model = NGramModel::from_trie(&trie);
    let selected = clustering.select(&trie, &counts, &model)?;
    info!(
        clusters = selected.len(),
        strategy = %clustering.strategy(),
        "clusters selected"
    );
    Ok(ClusterReport {
        data_source: source.name().to_owned(),
        strategy: clustering.strategy(),
        format: command.format,
        clusters: export_clusters(&trie, &counts, &selected)?,
    })
}

fn run_distribution(command: &DistributionCommand) -> Result<DistributionReport, CliError> {
    let source = load_source(&command.source)?;
    let trie = SuffixTrie::try_from_source(&source)?;
    let model = NGramModel::from_trie(&trie);
    let kind = NGramKind::from(command.ngram);
    info!(
        kind = %kind,
        tokens = model.tokens(kind),
        types = model.types(kind),
        "distribution computed"
    );
    Ok(DistributionReport {
        data_source: source.name().to_owned(),
        kind,
        tokens: model.tokens(kind),
        entries: model.sorted(kind),
    })
}

fn run_summary(command: &SummaryCommand) -> Result<SummaryReport, CliError> {
    let source = load_source(&command.source)?;
    let trie = SuffixTrie::try_from_source(&source)?;
    let mut roots: Vec<String> = trie
        .roots()
        .iter()
        .map(|&root| trie.value(root).to_owned())
        .collect();
    roots.sort_unstable();
    Ok(SummaryReport {
        data_source: source.name().to_owned(),
        summary: trie.summary(),
        roots,
    })
}

#[instrument(name = "cli.extract", err, skip_all, fields(output = %command.output.display()))]
pub(super) fn run_extract(command: &ExtractCommand) -> Result<ExtractReport, CliError> {
    let source = load_source(&command.source)?;
    let file = File::create(&command.output).map_err(|err| CliError::Io {
        path: command.output.clone(),
        source: err,
    })?;
    let rows = source.write_extracted(BufWriter::new(file))?;
    info!(rows, skipped = source.skipped(), "cities extracted");
    Ok(ExtractReport {
        data_source: source.name().to_owned(),
        output: command.output.clone(),
        rows,
        skipped: source.skipped(),
    })
}

fn count(trie: &SuffixTrie) -> SubsumedCounts {
    let mut counts = SubsumedCounts::new(trie);
    let report = counts.aggregate_parallel(trie);
    info!(
        rounds = report.rounds,
        counted = report.counted,
        "subsumed records counted"
    );
    counts
}

/// Attaches counts and distance statistics to every selected suffix.
///
/// # Errors
/// Returns [`CliError::Clustering`] when a count is missing and
/// [`CliError::Geo`] for geo failures other than too few records.
#[instrument(name = "cli.export", err, skip_all, fields(clusters = selected.len()))]
pub fn export_clusters(
    trie: &SuffixTrie,
    counts: &SubsumedCounts,
    selected: &ClusterSet,
) -> Result<Vec<ClusterRecord>, CliError> {
    let geo = GeoEvaluator::new(trie);
    let mut clusters = Vec::with_capacity(selected.len());
    for id in selected.iter() {
        let suffix = trie.value(id).to_owned();
        let subsumed_cities = counts.require(trie, id, "export")?;
        let stats = match geo.distance_stats(id) {
            Ok(stats) => Some(stats),
            Err(err @ GeoError::InsufficientData { .. }) => {
                warn!(suffix = %suffix, code = %err.code(), "cluster has no distance statistic");
                None
            }
            Err(err) => return Err(err.into()),
        };
        clusters.push(ClusterRecord {
            suffix,
            subsumed_cities,
            min: stats.map(|stats| stats.min),
            max: stats.map(|stats| stats.max),
            mean: stats.map(|stats| stats.mean),
            stddev: stats.map(|stats| stats.stddev),
        });
    }
    clusters.sort_by(|left, right| left.suffix.cmp(&right.suffix));
    Ok(clusters)
}

fn load_source(args: &SourceArgs) -> Result<CitySource, CliError> {
    let name = derive_data_source_name(&args.path, args.name.as_deref());
    let reader = open_city_reader(&args.path)?;
    let source = CitySource::try_from_reader_with_layout(
        name,
        reader,
        args.layout.into(),
        args.country.as_deref(),
    )?;
    Ok(source)
}

fn open_city_reader(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "cities".to_owned(), ToOwned::to_owned)
}
