use chrono::{DateTime, Local, NaiveDate, TimeZone};
use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};

pub struct Cli {
    /// arguments passed by user
    pub matches: ArgMatches,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("magvar")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("Annotates Position records with magnetic variation and rotation = 0")
                    .arg_required_else_help(true)
                    .color(ColorChoice::Always)
                    .next_help_heading("Input/Output")
                    .arg(
                        Arg::new("filepath")
                            .short('f')
                            .long("fp")
                            .required(true)
                            .help("Input positions XML file, rewritten in place"),
                    )
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .action(ArgAction::Set)
                            .help("Write the annotated document here instead of rewriting the input"),
                    )
                    .next_help_heading("Model")
                    .arg(
                        Arg::new("date")
                            .short('d')
                            .long("date")
                            .help("Evaluate the field model at this date, expects %Y-%m-%d. Defaults to today."),
                    )
                    .get_matches()
            },
        }
    }
    pub fn input_path(&self) -> &str {
        self.matches.get_one::<String>("filepath").unwrap()
    }
    pub fn output_path(&self) -> Option<&String> {
        self.matches.get_one::<String>("output")
    }
    pub fn date(&self) -> Option<DateTime<Local>> {
        let s = self.matches.get_one::<String>("date")?;
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Local
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .earliest(),
            Err(_) => {
                println!("failed to parse \"yyyy-mm-dd\", using today");
                None
            },
        }
    }
}
