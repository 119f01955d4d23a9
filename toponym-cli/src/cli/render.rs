//! Writers for command reports.
//!
//! Everything here writes to a caller-supplied [`Write`] so the binary can
//! target stdout and tests can target a buffer.

use std::io::{self, Write};

use super::commands::{
    ClusterRecord, ClusterReport, DistributionReport, ExtractReport, OutputFormat, Report,
    SummaryReport,
};

/// Renders `report` to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing or JSON encoding fails.
pub fn render_report(report: &Report, writer: impl Write) -> io::Result<()> {
    match report {
        Report::Clusters(clusters) => render_clusters(clusters, writer),
        Report::Distribution(distribution) => render_distribution(distribution, writer),
        Report::Summary(summary) => render_summary(summary, writer),
        Report::Extract(extract) => render_extract(extract, writer),
    }
}

/// Writes the clusters in the report's format.
///
/// # Errors
/// Returns [`io::Error`] if writing or JSON encoding fails.
///
/// # Examples
/// ```
/// # use toponym_cli::cli::{ClusterRecord, ClusterReport, OutputFormat, render_clusters};
/// # use toponym_core::SelectionStrategy;
/// let report = ClusterReport {
///     data_source: "demo".into(),
///     strategy: SelectionStrategy::Proportion,
///     format: OutputFormat::Ndjson,
///     clusters: vec![ClusterRecord {
///         suffix: "dorf".into(),
///         subsumed_cities: 1,
///         min: None,
///         max: None,
///         mean: None,
///         stddev: None,
///     }],
/// };
/// let mut buffer = Vec::new();
/// render_clusters(&report, &mut buffer)?;
/// assert_eq!(
///     String::from_utf8_lossy(&buffer),
///     "{\"suffix\":\"dorf\",\"subsumedCities\":1,\"min\":null,\"max\":null,\"mean\":null,\"stddev\":null}\n"
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_clusters(report: &ClusterReport, mut writer: impl Write) -> io::Result<()> {
    match report.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &report.clusters)?;
            writeln!(writer)
        }
        OutputFormat::Ndjson => {
            for cluster in &report.clusters {
                serde_json::to_writer(&mut writer, cluster)?;
                writeln!(writer)?;
            }
            Ok(())
        }
        OutputFormat::Text => render_cluster_table(report, writer),
    }
}

fn render_cluster_table(report: &ClusterReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "data source: {}", report.data_source)?;
    writeln!(writer, "strategy: {}", report.strategy)?;
    writeln!(writer, "clusters: {}", report.clusters.len())?;
    writeln!(writer, "suffix\tcities\tmin\tmax\tmean\tstddev")?;
    for cluster in &report.clusters {
        let ClusterRecord {
            suffix,
            subsumed_cities,
            min,
            max,
            mean,
            stddev,
        } = cluster;
        writeln!(
            writer,
            "{suffix}\t{subsumed_cities}\t{}\t{}\t{}\t{}",
            statistic(*min),
            statistic(*max),
            statistic(*mean),
            statistic(*stddev),
        )?;
    }
    Ok(())
}

fn statistic(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{value:.4}"))
}

/// Writes one [`distribution_line`] per entry after a header line.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_distribution(report: &DistributionReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "{} distribution of {} ({} tokens, {} types)",
        report.kind,
        report.data_source,
        report.tokens,
        report.entries.len()
    )?;
    for (key, count) in &report.entries {
        writeln!(writer, "{}", distribution_line(key, *count, report.tokens))?;
    }
    Ok(())
}

/// Formats one frequency-table row: the key, the count right-aligned to ten
/// columns, the percentage of `total` with two decimals and a bar of
/// `max(1, round(percentage))` equals signs.
///
/// # Examples
/// ```
/// use toponym_cli::cli::distribution_line;
///
/// assert_eq!(distribution_line("e", 3, 12), "e\t         3\t25.00%\t=========================");
/// assert_eq!(distribution_line("q", 1, 1000), "q\t         1\t0.10%\t=");
/// ```
#[must_use]
pub fn distribution_line(key: &str, count: u64, total: u64) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    };
    let width = (percent.round() as usize).max(1);
    format!("{key}\t{count:>10}\t{percent:.2}%\t{}", "=".repeat(width))
}

/// Writes the trie properties, one `label: value` pair per line.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_summary(report: &SummaryReport, mut writer: impl Write) -> io::Result<()> {
    let summary = &report.summary;
    let branching = &summary.branching;
    writeln!(writer, "data source: {}", report.data_source)?;
    writeln!(writer, "records: {}", summary.records)?;
    writeln!(writer, "name nodes: {}", summary.name_nodes)?;
    writeln!(writer, "suffix nodes: {}", summary.nodes)?;
    writeln!(writer, "leaves: {}", branching.leaves)?;
    writeln!(writer, "lonely suffixes: {}", branching.lonely)?;
    writeln!(writer, "normal suffixes: {}", branching.normal)?;
    writeln!(writer, "frequent suffixes: {}", branching.frequent)?;
    writeln!(writer, "very frequent suffixes: {}", branching.very_frequent)?;
    writeln!(writer, "roots: {}", summary.roots)?;
    writeln!(writer, "root suffixes: {}", report.roots.join(","))
}

/// Writes one line naming the extracted file and its row counts.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_extract(report: &ExtractReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "extracted {} cities from {} to {} ({} skipped)",
        report.rows,
        report.data_source,
        report.output.display(),
        report.skipped
    )
}
