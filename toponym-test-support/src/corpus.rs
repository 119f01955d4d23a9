//! Small place-name corpora with known cluster structure.
//!
//! The corpora are plain name lists so every crate can wrap them in its own
//! record type.

/// Eight names ending in `dorf` with distinct preceding letters, plus two
/// names ending in `lf`. With `proportion = 0.5` and both size fractions at
/// zero the proportion strategy selects exactly `dorf`.
pub const DORF_CORPUS: &[&str] = &[
    "altdorf",
    "bischofsdorf",
    "eckdorf",
    "kirchdorf",
    "langendorf",
    "neudorf",
    "oberdorf",
    "waldorf",
    "elf",
    "golf",
];

/// Two names sharing the tail `zig`; too small for any cluster.
pub const ZIG_PAIR: &[&str] = &["leipzig", "pelzig"];

/// Rows in the seven-column world-cities layout. Two rows are outside
/// Germany and one is a duplicate name at another position.
pub const WORLD_CITIES_CSV: &str = "\
Country,City,AccentCity,Region,Population,Latitude,Longitude
de,altdorf,Altdorf,02,,48.56,12.11
de,neudorf,Neudorf,01,,49.26,8.52
at,altdorf,Altdorf,06,,47.98,13.42
de,waldorf,Waldorf,08,,50.26,7.33
de,neudorf,Neudorf,13,,51.38,13.05
ch,oberdorf,Oberdorf,,,47.23,8.58
";

/// Formats `names` as rows of the seven-column layout for `country`,
/// placing row `i` at latitude `50 + i / 10` and longitude `10`.
#[must_use]
pub fn world_rows(country: &str, names: &[&str]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let latitude = 50.0 + index as f64 / 10.0;
            format!("{country},{name},{name},01,,{latitude},10.0\n")
        })
        .collect()
}
