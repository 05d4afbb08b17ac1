//! Command line tool to annotate Position records with magnetic variation
use magvar::epoch;
use magvar::prelude::*;

mod cli;
use cli::Cli;

use chrono::Local;
use log::debug;
use std::fs;

fn main() -> Result<(), Error> {
    env_logger::init();
    let cli = Cli::new();

    let input_path = cli.input_path();
    let reference = cli.date().unwrap_or_else(Local::now);
    let decimal_year = epoch::decimal_year(&reference);
    debug!("field model evaluated at decimal year {:.4}", decimal_year);

    let text = fs::read_to_string(input_path)?;
    let mut document = Document::parse(&text)?;

    let model = Wmm::new();
    let annotator = Annotator::new(&model, decimal_year);
    let updated = annotator.annotate_document(&mut document)?;

    // everything annotated: commit in a single write
    let output_path = cli.output_path().map(|s| s.as_str()).unwrap_or(input_path);
    fs::write(output_path, document.to_xml_string()?)?;

    println!(
        "Successfully updated {} positions in {} with magnetic variation calculated and rotation = 0",
        updated, output_path,
    );
    Ok(())
}
