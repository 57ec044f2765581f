use std::io::{self, Write};

use serde::Serialize;

use crate::domain::RecordingSet;
use crate::mirror::MirrorSummary;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &MirrorSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_catalog(sets: &[RecordingSet]) -> io::Result<()> {
        Self::print_json(&sets)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
