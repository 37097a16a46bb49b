use std::path::PathBuf;
use templot::plot_odt::parse_cli;
use templot::{plot_temperatures, TimeTemp, PNG_NAME};

fn main() {
    let (csvfiles, odtfiles) = parse_cli();
    println!(
        "read data from {} indoor and {} outdoor file(s) and plot to {}",
        csvfiles.len(),
        odtfiles.len(),
        PNG_NAME
    );
    let series: Vec<TimeTemp> = csvfiles.into_iter().map(TimeTemp::from_csv).collect();
    let odt_series: Vec<TimeTemp> = odtfiles.into_iter().map(TimeTemp::from_csv).collect();
    plot_temperatures(&series, &odt_series, PathBuf::from(PNG_NAME)).unwrap();
}
