use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the temperature time series.
pub fn parse_cli() -> Vec<PathBuf> {
    let arg_csvfiles = Arg::with_name("filenames")
        .help("input CSV data file(s)")
        .value_name("FILES")
        .required(true)
        .multiple(true);
    let cli_args = App::new("templot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the temperature time series")
        .arg(arg_csvfiles)
        .get_matches();
    let csvfiles: Vec<PathBuf> = cli_args
        .values_of("filenames")
        .unwrap()
        .map(PathBuf::from)
        .collect();
    return csvfiles;
}
