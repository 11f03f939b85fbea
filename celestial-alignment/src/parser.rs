//! Plain-text sync-point datasets.
//!
//! ```text
//! # comment
//! site <latitude_deg> <longitude_deg>
//! alignment <zenith|ncp|scp>
//! sync <jd> <ra_hours> <dec_deg> <x> <y> <z> [payload_hex]
//! ```
//!
//! `sync` lines keep their file order, which is the entry order the model sees.

use crate::entry::{CalibrationEntry, MountAlignment, ReferencePosition};
use crate::error::{Error, Result};
use crate::vector::DirectionVector;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub position: Option<ReferencePosition>,
    pub alignment: MountAlignment,
    pub entries: Vec<CalibrationEntry>,
}

pub fn parse_dataset(content: &str) -> Result<Dataset> {
    let mut dataset = Dataset::default();

    for (n, line) in content.lines().enumerate() {
        let trimmed = strip_comment(line).trim();
        if trimmed.is_empty() {
            continue;
        }
        parse_line(trimmed, &mut dataset)
            .map_err(|e| Error::Parse(format!("line {}: {}", n + 1, strip_prefix(e))))?;
    }
    Ok(dataset)
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)?;
    parse_dataset(&content)
}

pub fn write_dataset(dataset: &Dataset) -> String {
    let mut out = String::new();
    if let Some(p) = &dataset.position {
        let _ = writeln!(out, "site {} {}", p.latitude, p.longitude);
    }
    let _ = writeln!(out, "alignment {}", dataset.alignment.as_str());
    for e in &dataset.entries {
        let v = &e.apparent_direction;
        let _ = write!(
            out,
            "sync {} {} {} {} {} {}",
            e.observation_julian_date, e.right_ascension, e.declination, v.x, v.y, v.z
        );
        if !e.private_data.is_empty() {
            let _ = write!(out, " {}", encode_hex(&e.private_data));
        }
        out.push('\n');
    }
    out
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

fn strip_prefix(e: Error) -> String {
    match e {
        Error::Parse(msg) => msg,
        other => other.to_string(),
    }
}

fn parse_line(line: &str, dataset: &mut Dataset) -> Result<()> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts[0].to_ascii_lowercase().as_str() {
        "site" => {
            expect_fields(&parts, 3, 3)?;
            dataset.position = Some(ReferencePosition::new(
                parse_f64(parts[1], "latitude")?,
                parse_f64(parts[2], "longitude")?,
            ));
        }
        "alignment" => {
            expect_fields(&parts, 2, 2)?;
            dataset.alignment = parts[1].parse()?;
        }
        "sync" => {
            expect_fields(&parts, 7, 8)?;
            dataset.entries.push(parse_sync(&parts)?);
        }
        other => return Err(Error::Parse(format!("unknown record: {}", other))),
    }
    Ok(())
}

fn expect_fields(parts: &[&str], min: usize, max: usize) -> Result<()> {
    if parts.len() < min || parts.len() > max {
        return Err(Error::Parse(format!(
            "{} needs {} fields, got {}",
            parts[0],
            if min == max { min.to_string() } else { format!("{}-{}", min, max) },
            parts.len()
        )));
    }
    Ok(())
}

fn parse_sync(parts: &[&str]) -> Result<CalibrationEntry> {
    let jd = parse_f64(parts[1], "jd")?;
    let ra = parse_f64(parts[2], "ra")?;
    let dec = parse_f64(parts[3], "dec")?;
    if !(0.0..24.0).contains(&ra) {
        return Err(Error::Parse(format!("ra out of range [0, 24): {}", ra)));
    }
    if !(-90.0..=90.0).contains(&dec) {
        return Err(Error::Parse(format!("dec out of range [-90, 90]: {}", dec)));
    }
    let v = DirectionVector::new(
        parse_f64(parts[4], "x")?,
        parse_f64(parts[5], "y")?,
        parse_f64(parts[6], "z")?,
    );
    if v.length() == 0.0 {
        return Err(Error::Parse("zero-length mount direction".into()));
    }
    let payload = match parts.get(7) {
        Some(hex) => decode_hex(hex)?,
        None => Vec::new(),
    };
    Ok(CalibrationEntry::new(jd, ra, dec, v.normalize()).with_private_data(payload))
}

fn parse_f64(s: &str, field: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|e| Error::Parse(format!("{}: {}", field, e)))
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::Parse(format!("payload has odd length: {}", s)));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::Parse(format!("payload is not hex: {}", s)))
        })
        .collect()
}
