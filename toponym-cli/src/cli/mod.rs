//! Command-line interface for toponym suffix clustering.
//!
//! Every command reads a city file and renders one report. `cluster`,
//! `distribution` and `summary` build the suffix trie first; `extract` writes
//! the kept rows in the four-column layout that `--layout extracted` reads.

mod commands;
mod render;

pub use commands::{
    Cli, CliError, ClusterCommand, ClusterRecord, ClusterReport, Command, DistributionCommand,
    DistributionReport, ExtractCommand, ExtractReport, LayoutArg, NGramArg, OutputFormat, Report,
    SourceArgs, StrategyArg, SummaryCommand, SummaryReport, TuningArgs, export_clusters, run_cli,
};
pub use render::{
    distribution_line, render_clusters, render_distribution, render_extract, render_report,
    render_summary,
};

#[cfg(test)]
mod tests;
