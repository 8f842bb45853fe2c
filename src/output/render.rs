use anyhow::{anyhow, Result};
use std::io::Write;

use super::{CurveRow, SummaryRow};

const SUMMARY_HEADER: &str = "Groups\tnumSampled\tphyloDiversity\n";

/// Write per-group summary rows as tab-separated text.
pub fn write_summary<W: Write>(writer: &mut W, rows: &[SummaryRow]) -> Result<()> {
    writer.write_all(SUMMARY_HEADER.as_bytes())?;
    for row in rows {
        writeln!(writer, "{}\t{}\t{:.4}", row.group, row.num_sampled, row.diversity)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a curve as tab-separated text, one column per group.
///
/// Depths beyond a group's total are written as `NA`.
pub fn write_curve<W: Write>(writer: &mut W, groups: &[String], rows: &[CurveRow]) -> Result<()> {
    write!(writer, "numSampled")?;
    for group in groups {
        write!(writer, "\t{group}")?;
    }
    writeln!(writer)?;

    for row in rows {
        write!(writer, "{}", row.num_sampled)?;
        for value in &row.values {
            match value {
                Some(value) => write!(writer, "\t{value:.4}")?,
                None => write!(writer, "\tNA")?,
            }
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Render summary rows into a string.
pub fn render_summary(rows: &[SummaryRow]) -> Result<String> {
    let mut buffer = Vec::new();
    write_summary(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered summary is not valid UTF-8"))
}

/// Render a curve into a string.
pub fn render_curve(groups: &[String], rows: &[CurveRow]) -> Result<String> {
    let mut buffer = Vec::new();
    write_curve(&mut buffer, groups, rows)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered curve is not valid UTF-8"))
}
