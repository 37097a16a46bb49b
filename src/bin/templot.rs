use std::path::PathBuf;
use templot::plot::parse_cli;
use templot::{plot_temperatures, TimeTemp, PNG_NAME};

fn main() {
    let csvfiles = parse_cli();
    println!(
        "read data from {} file(s) and plot to {}",
        csvfiles.len(),
        PNG_NAME
    );
    let series: Vec<TimeTemp> = csvfiles.into_iter().map(TimeTemp::from_csv).collect();
    plot_temperatures(&series, &[], PathBuf::from(PNG_NAME)).unwrap();
}
