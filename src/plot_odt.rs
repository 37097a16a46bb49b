use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments for plotting flagged indoor series together with
/// the outdoor temperature files.
pub fn parse_cli() -> (Vec<PathBuf>, Vec<PathBuf>) {
    let arg_csvfiles = Arg::with_name("filenames")
        .help("input CSV data file(s) with a flag column")
        .value_name("FILES")
        .required(true)
        .multiple(true);
    let arg_odtfiles = Arg::with_name("odtfnames")
        .help("input CSV file(s) with outdoor temperature data")
        .short("o")
        .long("odtfnames")
        .value_name("ODTFILES")
        .takes_value(true)
        .multiple(true)
        .required(true);
    let cli_args = App::new("templot_odt")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the temperature time series with outdoor reference data")
        .arg(arg_csvfiles)
        .arg(arg_odtfiles)
        .get_matches();
    let csvfiles: Vec<PathBuf> = cli_args
        .values_of("filenames")
        .unwrap()
        .map(PathBuf::from)
        .collect();
    let odtfiles: Vec<PathBuf> = cli_args
        .values_of("odtfnames")
        .unwrap()
        .map(PathBuf::from)
        .collect();
    return (csvfiles, odtfiles);
}
