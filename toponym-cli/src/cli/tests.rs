use super::commands::{derive_data_source_name, run_cluster, run_extract};
use super::*;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use toponym_core::{ConfigError, NGramKind, SelectionStrategy};
use toponym_providers_cities::CitySourceError;
use toponym_test_support::corpus;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[fixture]
fn workspace() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn create_city_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

fn source_args(path: PathBuf) -> SourceArgs {
    SourceArgs {
        path,
        layout: LayoutArg::World,
        country: Some("de".to_owned()),
        name: None,
    }
}

fn dorf_tuning() -> TuningArgs {
    TuningArgs {
        proportion: Some(0.5),
        min_percent: Some(0.0),
        max_percent: Some(0.0),
        ..TuningArgs::default()
    }
}

fn cluster_command(path: PathBuf, tuning: TuningArgs) -> ClusterCommand {
    ClusterCommand {
        source: source_args(path),
        tuning,
        format: OutputFormat::Json,
    }
}

fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{}", panic_msg),
        Err(err) => err,
    }
}

#[rstest]
#[case::override_name("/tmp/cities.csv", Some("override"), "override")]
#[case::stem_with_extension("/tmp/worldcities.csv", None, "worldcities")]
#[case::stem_without_extension("/tmp/worldcities", None, "worldcities")]
#[case::missing_stem("", None, "cities")]
fn derive_data_source_name_selects_expected_name(
    #[case] raw_path: &str,
    #[case] override_name: Option<&'static str>,
    #[case] expected: &str,
) {
    let name = derive_data_source_name(Path::new(raw_path), override_name);
    assert_eq!(name, expected);
}

#[rstest]
fn cluster_exports_dorf_with_its_spread(workspace: TempDir) -> TestResult {
    let rows = corpus::world_rows("de", corpus::DORF_CORPUS);
    let path = create_city_file(&workspace, "dorf.csv", &rows)?;
    let report = run_cluster(&cluster_command(path, dorf_tuning()))?;

    assert_eq!(report.data_source, "dorf");
    assert_eq!(report.strategy, SelectionStrategy::Proportion);
    let [dorf] = report.clusters.as_slice() else {
        panic!("expected one cluster, got {:?}", report.clusters);
    };
    assert_eq!(dorf.suffix, "dorf");
    assert_eq!(dorf.subsumed_cities, 8);
    let min = dorf.min.ok_or("dorf has eight records")?;
    let max = dorf.max.ok_or("dorf has eight records")?;
    assert!((min - 0.1).abs() < 1e-9);
    assert!((max - 0.7).abs() < 1e-9);
    Ok(())
}

#[rstest]
fn cluster_skips_rows_from_other_countries(workspace: TempDir) -> TestResult {
    let mut rows = corpus::world_rows("de", corpus::DORF_CORPUS);
    rows.push_str(&corpus::world_rows("at", &["xdorf", "ydorf"]));
    let path = create_city_file(&workspace, "mixed.csv", &rows)?;
    let report = run_cluster(&cluster_command(path, dorf_tuning()))?;
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].subsumed_cities, 8);
    Ok(())
}

#[rstest]
fn significance_strategy_is_reported(workspace: TempDir) -> TestResult {
    let rows = corpus::world_rows("de", corpus::DORF_CORPUS);
    let path = create_city_file(&workspace, "dorf.csv", &rows)?;
    let tuning = TuningArgs {
        strategy: StrategyArg::Significance,
        ..dorf_tuning()
    };
    let report = run_cluster(&cluster_command(path, tuning))?;
    assert_eq!(report.strategy, SelectionStrategy::Significance);
    assert!(report.clusters.iter().all(|cluster| cluster.subsumed_cities >= 5));
    Ok(())
}

#[rstest]
#[case::proportion(TuningArgs { proportion: Some(2.0), ..TuningArgs::default() }, "CONFIG_OUT_OF_RANGE")]
#[case::alpha(TuningArgs { alpha: Some(0.0), ..TuningArgs::default() }, "CONFIG_INVALID_ALPHA")]
#[case::weights(TuningArgs { letter_weight: Some(0.5), ..TuningArgs::default() }, "CONFIG_WEIGHT_SUM")]
fn invalid_tuning_is_rejected_before_reading(
    workspace: TempDir,
    #[case] tuning: TuningArgs,
    #[case] code: &str,
) {
    let cli = Cli {
        command: Command::Cluster(cluster_command(
            workspace.path().join("never-read.csv"),
            tuning,
        )),
    };
    let err = run_cli_expecting_error(cli, "configuration must be rejected");
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.code(), Some(code));
}

#[rstest]
fn config_errors_keep_their_parameter() {
    let tuning = TuningArgs {
        min_percent: Some(-0.1),
        ..TuningArgs::default()
    };
    let err = tuning.build().expect_err("negative fractions are rejected");
    assert!(matches!(
        err,
        ConfigError::OutOfRange {
            parameter: "min_percent",
            ..
        }
    ));
}

#[rstest]
fn missing_files_are_io_errors(workspace: TempDir) {
    let cli = Cli {
        command: Command::Summary(SummaryCommand {
            source: source_args(workspace.path().join("absent.csv")),
        }),
    };
    let err = run_cli_expecting_error(cli, "missing file must fail");
    assert!(matches!(err, CliError::Io { .. }));
    assert_eq!(err.code(), None);
}

#[rstest]
fn malformed_rows_are_fatal(workspace: TempDir) -> TestResult {
    let path = create_city_file(&workspace, "bad.csv", "de,hof,Hof,02,50.3,11.9\n")?;
    let cli = Cli {
        command: Command::Summary(SummaryCommand {
            source: source_args(path),
        }),
    };
    let err = run_cli_expecting_error(cli, "six fields must fail");
    assert!(matches!(
        err,
        CliError::Cities(CitySourceError::FieldCount { line: 1, found: 6, .. })
    ));
    assert_eq!(err.code(), Some("CITY_SOURCE_FIELD_COUNT"));
    Ok(())
}

#[rstest]
fn distribution_counts_letters(workspace: TempDir) -> TestResult {
    let rows = corpus::world_rows("de", corpus::ZIG_PAIR);
    let path = create_city_file(&workspace, "zig.csv", &rows)?;
    let cli = Cli {
        command: Command::Distribution(DistributionCommand {
            source: source_args(path),
            ngram: NGramArg::Letter,
        }),
    };
    let Report::Distribution(report) = run_cli(cli)? else {
        panic!("distribution command must yield a distribution");
    };
    assert_eq!(report.kind, NGramKind::Letter);
    assert_eq!(report.tokens, 13);
    assert_eq!(report.entries.first(), Some(&("i".to_owned(), 3)));

    let mut buffer = Vec::new();
    render_distribution(&report, &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("letter distribution of zig (13 tokens, 6 types)"));
    assert_eq!(
        lines.next(),
        Some("i\t         3\t23.08%\t=======================")
    );
    assert_eq!(lines.count(), 5);
    Ok(())
}

#[rstest]
#[case(50, 100, 50)]
#[case(1, 3, 33)]
#[case(0, 10, 1)]
#[case(7, 0, 1)]
fn distribution_bars_scale_with_percentage(
    #[case] count: u64,
    #[case] total: u64,
    #[case] bar: usize,
) {
    let line = distribution_line("k", count, total);
    let drawn = line.rsplit('\t').next().map_or(0, str::len);
    assert_eq!(drawn, bar);
}

#[rstest]
fn summary_reports_trie_properties(workspace: TempDir) -> TestResult {
    let rows = corpus::world_rows("de", corpus::ZIG_PAIR);
    let path = create_city_file(&workspace, "zig.csv", &rows)?;
    let cli = Cli {
        command: Command::Summary(SummaryCommand {
            source: source_args(path),
        }),
    };
    let report = run_cli(cli)?;
    let mut buffer = Vec::new();
    render_report(&report, &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert!(text.contains("data source: zig"));
    assert!(text.contains("records: 2"));
    assert!(text.contains("name nodes: 2"));
    assert!(text.contains("suffix nodes: 10"));
    assert!(text.contains("root suffixes: g"));
    Ok(())
}

fn single_cluster(format: OutputFormat, min: Option<f64>) -> ClusterReport {
    ClusterReport {
        data_source: "demo".into(),
        strategy: SelectionStrategy::Proportion,
        format,
        clusters: vec![ClusterRecord {
            suffix: "dorf".into(),
            subsumed_cities: 8,
            min,
            max: min,
            mean: min,
            stddev: min.map(|_| 0.0),
        }],
    }
}

#[rstest]
fn json_export_uses_camel_case_and_nulls() -> TestResult {
    let mut buffer = Vec::new();
    render_clusters(&single_cluster(OutputFormat::Json, None), &mut buffer)?;
    let value: serde_json::Value = serde_json::from_slice(&buffer)?;
    let record = &value[0];
    assert_eq!(record["suffix"], "dorf");
    assert_eq!(record["subsumedCities"], 8);
    assert!(record["mean"].is_null());
    assert!(record["stddev"].is_null());
    Ok(())
}

#[rstest]
fn ndjson_export_writes_one_object_per_line() -> TestResult {
    let mut report = single_cluster(OutputFormat::Ndjson, Some(1.5));
    report.clusters.push(ClusterRecord {
        suffix: "hof".into(),
        ..report.clusters[0].clone()
    });
    let mut buffer = Vec::new();
    render_clusters(&report, &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: serde_json::Value = serde_json::from_str(lines[1])?;
    assert_eq!(second["suffix"], "hof");
    assert_eq!(second["min"], 1.5);
    Ok(())
}

#[rstest]
fn text_export_marks_missing_statistics() -> TestResult {
    let mut buffer = Vec::new();
    render_clusters(&single_cluster(OutputFormat::Text, None), &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert!(text.contains("clusters: 1"));
    assert!(text.contains("dorf\t8\t-\t-\t-\t-"));
    Ok(())
}

#[rstest]
#[case(&["toponym", "cluster", "cities.csv", "--strategy", "fuzzy"])]
#[case(&["toponym", "distribution", "cities.csv", "--ngram", "quadgram"])]
#[case(&["toponym", "cluster", "cities.csv", "--format", "xml"])]
fn clap_rejects_unknown_values(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
fn clap_parses_cluster_flags() {
    let cli = Cli::try_parse_from([
        "toponym",
        "cluster",
        "cities.csv",
        "--country",
        "de",
        "--strategy",
        "significance",
        "--alpha",
        "2.5",
        "--format",
        "ndjson",
    ]);
    let command = match cli {
        Ok(Cli {
            command: Command::Cluster(command),
        }) => command,
        other => panic!("cluster flags must parse: {other:?}"),
    };
    assert_eq!(command.source.country.as_deref(), Some("de"));
    assert_eq!(command.source.layout, LayoutArg::World);
    assert_eq!(command.tuning.strategy, StrategyArg::Significance);
    assert_eq!(command.tuning.alpha, Some(2.5));
    assert_eq!(command.tuning.proportion, None);
    assert_eq!(command.format, OutputFormat::Ndjson);
}

#[rstest]
fn extracted_files_cluster_like_their_source(workspace: TempDir) -> TestResult {
    let mut rows = corpus::world_rows("de", corpus::DORF_CORPUS);
    rows.push_str(&corpus::world_rows("at", &["xdorf", "ydorf"]));
    let world = create_city_file(&workspace, "world.csv", &rows)?;
    let output = workspace.path().join("dorf.csv");

    let extract = run_extract(&ExtractCommand {
        source: source_args(world),
        output: output.clone(),
    })?;
    assert_eq!(extract.rows, 8);
    assert_eq!(extract.skipped, 2);
    assert_eq!(extract.data_source, "world");

    let written = std::fs::read_to_string(&output)?;
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("id,city,latitude,longitude"));
    assert_eq!(lines.next(), Some("1,altdorf,50,10"));
    assert_eq!(written.lines().count(), 9);

    let command = ClusterCommand {
        source: SourceArgs {
            path: output,
            layout: LayoutArg::Extracted,
            country: None,
            name: None,
        },
        tuning: dorf_tuning(),
        format: OutputFormat::Json,
    };
    let report = run_cluster(&command)?;
    assert_eq!(report.data_source, "dorf");
    let [dorf] = report.clusters.as_slice() else {
        panic!("expected one cluster, got {:?}", report.clusters);
    };
    assert_eq!(dorf.suffix, "dorf");
    assert_eq!(dorf.subsumed_cities, 8);
    let max = dorf.max.ok_or("dorf has eight records")?;
    assert!((max - 0.7).abs() < 1e-9);
    Ok(())
}

#[rstest]
fn extract_reports_unwritable_destinations(workspace: TempDir) -> TestResult {
    let rows = corpus::world_rows("de", corpus::ZIG_PAIR);
    let world = create_city_file(&workspace, "world.csv", &rows)?;
    let output = workspace.path().join("missing").join("out.csv");
    let cli = Cli {
        command: Command::Extract(ExtractCommand {
            source: source_args(world),
            output: output.clone(),
        }),
    };
    let err = run_cli_expecting_error(cli, "parent directory does not exist");
    assert!(matches!(err, CliError::Io { ref path, .. } if *path == output));
    assert_eq!(err.code(), None);
    Ok(())
}

#[rstest]
fn extract_report_names_the_destination() -> TestResult {
    let report = ExtractReport {
        data_source: "world".to_owned(),
        output: PathBuf::from("out/dorf.csv"),
        rows: 8,
        skipped: 2,
    };
    let mut buffer = Vec::new();
    render_report(&Report::Extract(report), &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        "extracted 8 cities from world to out/dorf.csv (2 skipped)\n"
    );
    Ok(())
}

#[rstest]
fn clap_parses_extract_flags() {
    let cli = Cli::try_parse_from(["toponym", "extract", "world.csv", "--country", "de", "-o", "de.csv"]);
    let command = match cli {
        Ok(Cli {
            command: Command::Extract(command),
        }) => command,
        other => panic!("extract flags must parse: {other:?}"),
    };
    assert_eq!(command.source.country.as_deref(), Some("de"));
    assert_eq!(command.output, PathBuf::from("de.csv"));
    assert!(Cli::try_parse_from(["toponym", "extract", "world.csv"]).is_err());
}
