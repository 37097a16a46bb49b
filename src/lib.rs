use chrono::prelude::*;
use plotters::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
pub mod plot;
pub mod plot_odt;

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

pub const PNG_NAME: &str = "temperatures.png";
/// 16x9 figure at 160 dpi
pub const PNG_WIDTH: u32 = 2560;
pub const PNG_HEIGHT: u32 = 1440;

pub const TEMP_PAD: f64 = 0.5;
pub const XMARGIN_MINUTES: i64 = 50;
pub const XMAJOR_HOURS: i64 = 4;
pub const COMFORT_MIN: f64 = 15.;
pub const COMFORT_MAX: f64 = 18.;

/// Categorical marker for how a reading was taken,
/// from the optional last csv column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    None,
    PhotoLogged,
    HeightTwoMeters,
}

impl Flag {
    /// "d" marks photo-logged readings, "t" readings from the sensor at 2 m height;
    /// any other token carries no special meaning
    pub fn from_token(token: &str) -> Flag {
        match token.trim() {
            "d" => Flag::PhotoLogged,
            "t" => Flag::HeightTwoMeters,
            _ => Flag::None,
        }
    }

    pub fn to_token(self) -> &'static str {
        match self {
            Flag::None => "",
            Flag::PhotoLogged => "d",
            Flag::HeightTwoMeters => "t",
        }
    }
}

/// The main struct for the temperature time series
#[derive(Debug, Clone)]
pub struct TimeTemp {
    pub time: Vec<NaiveDateTime>,
    pub temp: Vec<f64>,
    pub flag: Vec<Flag>,
}

impl TimeTemp {
    pub fn new(capacity: usize) -> TimeTemp {
        let time: Vec<NaiveDateTime> = Vec::with_capacity(capacity);
        let temp: Vec<f64> = Vec::with_capacity(capacity);
        let flag: Vec<Flag> = Vec::with_capacity(capacity);
        let timetemp: TimeTemp = TimeTemp { time, temp, flag };
        timetemp
    }

    /// Init a TimeTemp from csv, keeping the file order of the rows.
    /// The header line is discarded; each row has separate date and time columns
    /// that are joined before parsing, then the temperature and an optional flag.
    /// Any row that does not parse is fatal, the tool is for supervised batch use
    /// and a rerun on a fixed file beats plotting partial data.
    pub fn from_csv(fin: PathBuf) -> TimeTemp {
        let file = match File::open(&fin) {
            Ok(f) => f,
            Err(e) => panic!("could not open csv file {}: {}", fin.display(), e),
        };
        let buf = BufReader::new(file);
        let mut timetemp = TimeTemp::new(10000 as usize);
        for l in buf.lines().skip(1) {
            let l_unwrap = match l {
                Ok(l_ok) => l_ok,
                Err(l_err) => panic!("could not read line from {}: {}", fin.display(), l_err),
            };
            let mut l_split = l_unwrap.split(',');
            let l_split_date = l_split.next().unwrap();
            let l_split_time = match l_split.next() {
                Some(s) => s,
                None => panic!("missing time column in {}: {}", fin.display(), l_unwrap),
            };
            let l_split_temp = match l_split.next() {
                Some(s) => s,
                None => panic!("missing temperature column in {}: {}", fin.display(), l_unwrap),
            };
            let l_split_flag = l_split.next();
            let datetime_str = format!("{} {}", l_split_date.trim(), l_split_time.trim());
            let datetime = match NaiveDateTime::parse_from_str(&datetime_str, DT_FORMAT) {
                Ok(dt) => dt,
                Err(e) => panic!("could not parse datetime '{}': {}", datetime_str, e),
            };
            let temp: f64 = match l_split_temp.trim().parse() {
                Ok(t) => t,
                Err(e) => panic!("could not parse temperature '{}': {}", l_split_temp, e),
            };
            timetemp.time.push(datetime);
            timetemp.temp.push(temp);
            timetemp.flag.push(match l_split_flag {
                Some(token) => Flag::from_token(token),
                None => Flag::None,
            });
        }
        timetemp
    }

    /// iterates the readings as (datetime, temperature) pairs
    pub fn points(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.time
            .iter()
            .zip(self.temp.iter())
            .map(|(t, y)| (*t, *y))
    }

    /// iterates only the readings carrying the given flag
    pub fn flagged(&self, flag: Flag) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.time
            .iter()
            .zip(self.temp.iter())
            .zip(self.flag.iter())
            .filter(move |(_, f)| **f == flag)
            .map(|((t, y), _)| (*t, *y))
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flag.iter().any(|f| *f == flag)
    }
}

impl std::fmt::Display for TimeTemp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "datetime, temperature [°C], flag\n")?;
        for ((t, y), fl) in self.time.iter().zip(self.temp.iter()).zip(self.flag.iter()) {
            write!(f, "{},{},{}\n", t.format(DT_FORMAT), y, fl.to_token())?
        }
        Ok(())
    }
}

/// Shared axis extremes over all the series of a run.
/// Fold first over every loaded file, pad after the fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub tmin: NaiveDateTime,
    pub tmax: NaiveDateTime,
    pub ymin: f64,
    pub ymax: f64,
}

impl AxisBounds {
    pub fn from_series(series: &[TimeTemp]) -> AxisBounds {
        let mut series_iter = series.iter();
        let first = match series_iter.next() {
            Some(s) => s,
            None => panic!("no input series to plot"),
        };
        let (mut tmin, mut tmax) = min_and_max(&first.time[..]);
        let (mut ymin, mut ymax) = min_and_max(&first.temp[..]);
        for s in series_iter {
            let (t0, t1) = min_and_max(&s.time[..]);
            let (y0, y1) = min_and_max(&s.temp[..]);
            if t0 < tmin {
                tmin = t0
            }
            if t1 > tmax {
                tmax = t1
            }
            if y0 < ymin {
                ymin = y0
            }
            if y1 > ymax {
                ymax = y1
            }
        }
        AxisBounds {
            tmin,
            tmax,
            ymin,
            ymax,
        }
    }

    pub fn merge(&self, other: &AxisBounds) -> AxisBounds {
        AxisBounds {
            tmin: if other.tmin < self.tmin {
                other.tmin
            } else {
                self.tmin
            },
            tmax: if other.tmax > self.tmax {
                other.tmax
            } else {
                self.tmax
            },
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// cosmetic margins around the data extremes
    pub fn padded(&self, xmargin: chrono::Duration, ypad: f64) -> AxisBounds {
        AxisBounds {
            tmin: self.tmin - xmargin,
            tmax: self.tmax + xmargin,
            ymin: self.ymin - ypad,
            ymax: self.ymax + ypad,
        }
    }
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> (T, T) {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => panic!("could not iterate over slice"),
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    return (min, max);
}

/// midnights separating the calendar days of the series,
/// from the floor of tmin stepping one day while within tmax
pub fn day_boundaries(tmin: NaiveDateTime, tmax: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut days: Vec<NaiveDateTime> = Vec::new();
    let mut day = tmin.date().and_hms(0, 0, 0);
    while day <= tmax {
        days.push(day);
        day += chrono::Duration::days(1);
    }
    days
}

pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    let xfmt = if d > chrono::Duration::weeks(1) {
        "%y-%m-%d"
    } else if d > chrono::Duration::days(1) {
        "%m-%d %H"
    } else {
        "%d %H:%M"
    };
    return xfmt;
}

/// plots all the temperature series to png on shared time and
/// temperature axes spanning the whole input set
pub fn plot_temperatures(
    series: &[TimeTemp],
    odt_series: &[TimeTemp],
    fout: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bounds = AxisBounds::from_series(series);
    if !odt_series.is_empty() {
        bounds = bounds.merge(&AxisBounds::from_series(odt_series));
    }
    let padded = bounds.padded(chrono::Duration::minutes(XMARGIN_MINUTES), TEMP_PAD);
    let xspan: chrono::Duration = padded.tmax - padded.tmin;
    let xfmt = suitable_xfmt(xspan);
    let xlabels = ((xspan.num_hours() / XMAJOR_HOURS) + 1).max(2).min(14) as usize;
    let xminlocal = TimeZone::from_utc_datetime(&Utc, &padded.tmin);
    let xmaxlocal = TimeZone::from_utc_datetime(&Utc, &padded.tmax);
    let root = BitMapBackend::new(&fout, (PNG_WIDTH, PNG_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("room temperature monitoring", ("sans-serif", 48))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(xminlocal..xmaxlocal, padded.ymin..padded.ymax)?;
    chart
        .configure_mesh()
        .light_line_style(&RGBColor(220, 220, 220))
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 24))
        .y_desc("temperature [°C]")
        .x_labels(xlabels)
        .x_label_formatter(&|x: &DateTime<Utc>| x.format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:.1}", y))
        .x_desc(format!("datetime [{}]", xfmt.replace("%", "")))
        .draw()?;

    // day separators and comfort band go in first, the data overlays them
    for day in day_boundaries(bounds.tmin, bounds.tmax) {
        let x = TimeZone::from_utc_datetime(&Utc, &day);
        chart.draw_series(LineSeries::new(
            vec![(x, padded.ymin), (x, padded.ymax)],
            BLACK.stroke_width(2),
        ))?;
    }
    for &level in [COMFORT_MIN, COMFORT_MAX].iter() {
        chart.draw_series(LineSeries::new(
            vec![(xminlocal, level), (xmaxlocal, level)],
            RGBColor(255, 140, 0).stroke_width(2),
        ))?;
    }

    for (i, s) in series.iter().enumerate() {
        let line = chart.draw_series(LineSeries::new(
            s.points()
                .map(|(t, y)| (TimeZone::from_utc_datetime(&Utc, &t), y)),
            BLUE.stroke_width(1),
        ))?;
        if i == 0 {
            line.label("USB sensor temperature").legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2))
            });
        }
        chart.draw_series(s.points().map(|(t, y)| {
            Circle::new((TimeZone::from_utc_datetime(&Utc, &t), y), 3, BLUE.filled())
        }))?;
        let photo = chart.draw_series(s.flagged(Flag::PhotoLogged).map(|(t, y)| {
            Circle::new((TimeZone::from_utc_datetime(&Utc, &t), y), 5, GREEN.filled())
        }))?;
        if i == 0 && s.has_flag(Flag::PhotoLogged) {
            photo
                .label("photo-logged reading")
                .legend(|(x, y)| Circle::new((x + 10, y), 5, GREEN.filled()));
        }
        let high = chart.draw_series(s.flagged(Flag::HeightTwoMeters).map(|(t, y)| {
            Circle::new((TimeZone::from_utc_datetime(&Utc, &t), y), 5, RED.filled())
        }))?;
        if i == 0 && s.has_flag(Flag::HeightTwoMeters) {
            high.label("sensor at 2 m height")
                .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.filled()));
        }
    }

    for (i, s) in odt_series.iter().enumerate() {
        let line = chart.draw_series(LineSeries::new(
            s.points()
                .map(|(t, y)| (TimeZone::from_utc_datetime(&Utc, &t), y)),
            MAGENTA.stroke_width(1),
        ))?;
        if i == 0 {
            line.label("outdoor temperature").legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA.stroke_width(2))
            });
        }
        chart.draw_series(s.points().map(|(t, y)| {
            Circle::new((TimeZone::from_utc_datetime(&Utc, &t), y), 3, MAGENTA.filled())
        }))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 24))
        .draw()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DT_FORMAT).unwrap()
    }

    fn series(rows: &[(&str, f64, Flag)]) -> TimeTemp {
        let mut tt = TimeTemp::new(rows.len());
        for (t, y, f) in rows {
            tt.time.push(dt(t));
            tt.temp.push(*y);
            tt.flag.push(*f);
        }
        tt
    }

    fn write_csv(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn min_and_max_finds_extremes() {
        let v = vec![21.5, 19.8, 23.1, 20.0];
        assert_eq!(min_and_max(&v[..]), (19.8, 23.1));
    }

    #[test]
    fn flag_tokens_map_to_markers() {
        assert_eq!(Flag::from_token("d"), Flag::PhotoLogged);
        assert_eq!(Flag::from_token("t"), Flag::HeightTwoMeters);
        assert_eq!(Flag::from_token(""), Flag::None);
        assert_eq!(Flag::from_token("x"), Flag::None);
        assert_eq!(Flag::from_token(" d "), Flag::PhotoLogged);
    }

    #[test]
    fn bounds_fold_over_all_series() {
        let a = series(&[
            ("01.01.2024 00:00:00", 20.0, Flag::None),
            ("01.01.2024 12:00:00", 22.0, Flag::None),
        ]);
        let b = series(&[
            ("03.01.2024 06:00:00", 18.5, Flag::None),
            ("03.01.2024 18:00:00", 24.5, Flag::None),
        ]);
        let bounds = AxisBounds::from_series(&[a, b]);
        assert_eq!(bounds.tmin, dt("01.01.2024 00:00:00"));
        assert_eq!(bounds.tmax, dt("03.01.2024 18:00:00"));
        assert_eq!(bounds.ymin, 18.5);
        assert_eq!(bounds.ymax, 24.5);
    }

    #[test]
    fn bounds_merge_spans_the_union() {
        let a = AxisBounds::from_series(&[series(&[
            ("01.01.2024 00:00:00", 20.0, Flag::None),
            ("01.01.2024 12:00:00", 22.0, Flag::None),
        ])]);
        let b = AxisBounds::from_series(&[series(&[
            ("05.01.2024 00:00:00", 10.0, Flag::None),
            ("05.01.2024 12:00:00", 12.0, Flag::None),
        ])]);
        let m = a.merge(&b);
        assert_eq!(m.tmin, dt("01.01.2024 00:00:00"));
        assert_eq!(m.tmax, dt("05.01.2024 12:00:00"));
        assert_eq!(m.ymin, 10.0);
        assert_eq!(m.ymax, 22.0);
    }

    #[test]
    fn padding_is_applied_after_the_fold() {
        let bounds = AxisBounds::from_series(&[series(&[
            ("01.01.2024 00:00:00", 20.0, Flag::None),
            ("01.01.2024 12:00:00", 22.0, Flag::None),
        ])]);
        let padded = bounds.padded(chrono::Duration::minutes(XMARGIN_MINUTES), TEMP_PAD);
        assert_eq!(padded.ymin, bounds.ymin - TEMP_PAD);
        assert_eq!(padded.ymax, bounds.ymax + TEMP_PAD);
        assert_eq!(padded.tmin, dt("31.12.2023 23:10:00"));
        assert_eq!(padded.tmax, dt("01.01.2024 12:50:00"));
    }

    #[test]
    fn day_boundaries_single_day() {
        let days = day_boundaries(dt("01.01.2024 00:00:00"), dt("01.01.2024 12:00:00"));
        assert_eq!(days, vec![dt("01.01.2024 00:00:00")]);
    }

    #[test]
    fn day_boundaries_count_spanned_days() {
        let days = day_boundaries(dt("01.01.2024 08:00:00"), dt("04.01.2024 01:00:00"));
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], dt("01.01.2024 00:00:00"));
        assert_eq!(days[3], dt("04.01.2024 00:00:00"));
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], chrono::Duration::days(1));
        }
    }

    #[test]
    fn flag_subsets_partition_the_series() {
        let s = series(&[
            ("01.01.2024 00:00:00", 20.0, Flag::None),
            ("01.01.2024 06:00:00", 20.5, Flag::PhotoLogged),
            ("01.01.2024 12:00:00", 21.0, Flag::HeightTwoMeters),
            ("01.01.2024 18:00:00", 21.5, Flag::PhotoLogged),
        ]);
        let none: Vec<_> = s.flagged(Flag::None).collect();
        let photo: Vec<_> = s.flagged(Flag::PhotoLogged).collect();
        let high: Vec<_> = s.flagged(Flag::HeightTwoMeters).collect();
        assert_eq!(none.len() + photo.len() + high.len(), s.time.len());
        assert_eq!(photo.len(), 2);
        assert_eq!(high.len(), 1);
        for p in photo.iter() {
            assert!(!none.contains(p));
            assert!(!high.contains(p));
        }
    }

    #[test]
    fn from_csv_joins_date_and_time_columns() {
        let path = write_csv(
            "templot_test_join.csv",
            "date,time,temp,flag\n\
             01.01.2024 ,00:00:00,20.0,\n\
             01.01.2024,12:00:00,22.5,d\n\
             02.01.2024,07:30:00,19.25,t\n",
        );
        let tt = TimeTemp::from_csv(path);
        assert_eq!(tt.time.len(), 3);
        assert_eq!(tt.time[0], dt("01.01.2024 00:00:00"));
        assert_eq!(tt.time[2], dt("02.01.2024 07:30:00"));
        assert_eq!(tt.temp, vec![20.0, 22.5, 19.25]);
        assert_eq!(
            tt.flag,
            vec![Flag::None, Flag::PhotoLogged, Flag::HeightTwoMeters]
        );
    }

    #[test]
    fn from_csv_accepts_three_columns() {
        let path = write_csv(
            "templot_test_odt.csv",
            "date,time,temp\n01.01.2024,00:00:00,-3.5\n01.01.2024,12:00:00,1.0\n",
        );
        let tt = TimeTemp::from_csv(path);
        assert_eq!(tt.temp, vec![-3.5, 1.0]);
        assert_eq!(tt.flag, vec![Flag::None, Flag::None]);
    }

    #[test]
    #[should_panic(expected = "could not parse temperature")]
    fn from_csv_rejects_malformed_temperature() {
        let path = write_csv(
            "templot_test_bad_temp.csv",
            "date,time,temp\n01.01.2024,00:00:00,warm\n",
        );
        TimeTemp::from_csv(path);
    }

    #[test]
    #[should_panic(expected = "could not parse datetime")]
    fn from_csv_rejects_malformed_datetime() {
        let path = write_csv(
            "templot_test_bad_dt.csv",
            "date,time,temp\n2024-01-01,00:00:00,20.0\n",
        );
        TimeTemp::from_csv(path);
    }

    #[test]
    #[should_panic(expected = "could not open csv file")]
    fn from_csv_rejects_missing_file() {
        TimeTemp::from_csv(PathBuf::from("no_such_templot_file.csv"));
    }

    #[test]
    fn display_prints_csv_rows() {
        let s = series(&[("01.01.2024 06:00:00", 20.5, Flag::PhotoLogged)]);
        let out = format!("{}", s);
        assert!(out.contains("01.01.2024 06:00:00,20.5,d"));
    }

    #[test]
    fn suitable_xfmt_follows_the_span() {
        assert_eq!(suitable_xfmt(chrono::Duration::hours(12)), "%d %H:%M");
        assert_eq!(suitable_xfmt(chrono::Duration::days(3)), "%m-%d %H");
        assert_eq!(suitable_xfmt(chrono::Duration::weeks(2)), "%y-%m-%d");
    }

    #[test]
    fn plot_writes_a_png_file() {
        let s = series(&[
            ("01.01.2024 00:00:00", 20.0, Flag::None),
            ("01.01.2024 06:00:00", 20.5, Flag::PhotoLogged),
            ("01.01.2024 12:00:00", 22.0, Flag::HeightTwoMeters),
        ]);
        let odt = series(&[
            ("01.01.2024 00:00:00", -2.0, Flag::None),
            ("01.01.2024 12:00:00", 3.0, Flag::None),
        ]);
        let fout = std::env::temp_dir().join("templot_test_plot.png");
        plot_temperatures(&[s], &[odt], fout.clone()).unwrap();
        let meta = std::fs::metadata(&fout).unwrap();
        assert!(meta.len() > 0);
    }
}
