//! Tabular import/export of agent time series and run results.
//!
//! The optimizer itself only ever sees [`TimeSeries`] / [`BatteryParams`];
//! CSV is the storage format of the simulation harness, not of the core.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Agent, TimeSeries, TimeStep};

/// Input row: one horizon step of prices, generation and demand.
#[derive(Debug, Deserialize)]
struct SeriesRow {
    mp: f64,
    fp: f64,
    pv: f64,
    dem: f64,
}

/// Read a time series from `time,mp,fp,pv,dem` CSV. The `time` column of
/// the first row sets the horizon start; step length is supplied by the
/// caller since rows carry clock times, not durations.
pub fn import_series(reader: impl Read, step_minutes: u32) -> Result<TimeSeries> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut start: Option<NaiveTime> = None;
    let mut steps = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading series row {line}"))?;
        if start.is_none() {
            let raw = record
                .get(0)
                .context("series row missing time column")?;
            start = Some(
                NaiveTime::parse_from_str(raw, "%H:%M")
                    .with_context(|| format!("invalid clock time {raw:?}"))?,
            );
        }
        let row: SeriesRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("parsing series row {line}"))?;
        steps.push(TimeStep::new(row.mp, row.fp, row.pv, row.dem));
    }

    let start = start.context("series file contains no data rows")?;
    Ok(TimeSeries::new(start, step_minutes, steps))
}

/// Write one agent's resolved schedule, one row per step.
pub fn write_schedule(agent: &Agent, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([
        "time",
        "mp",
        "fp",
        "pv",
        "dem",
        "buy",
        "sell",
        "cap",
        "char",
        "dis",
        "buy_switch",
        "sell_switch",
        "char_switch",
        "dis_switch",
    ])?;
    for (t, step) in agent.series.steps.iter().enumerate() {
        wtr.write_record(&[
            agent.series.clock_at(t).format("%H:%M").to_string(),
            format!("{:.4}", step.mp),
            format!("{:.4}", step.fp),
            format!("{:.4}", step.pv),
            format!("{:.4}", step.dem),
            format!("{:.4}", step.buy),
            format!("{:.4}", step.sell),
            format!("{:.4}", step.cap),
            format!("{:.4}", step.char),
            format!("{:.4}", step.dis),
            step.buy_switch.to_string(),
            step.sell_switch.to_string(),
            step.char_switch.to_string(),
            step.dis_switch.to_string(),
        ])?;
    }
    wtr.flush()
}

/// Export one agent's schedule to a file.
pub fn export_schedule(agent: &Agent, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_schedule(agent, io::BufWriter::new(file))
}

/// Run metadata for one agent, serialized alongside the schedules.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub agent: &'a str,
    pub cost: f64,
    pub status: String,
}

/// Write the per-agent run summary (cost, status) as CSV.
pub fn write_summary(agents: &[Agent], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["agent", "cost", "status"])?;
    for agent in agents {
        wtr.write_record(&[
            agent.name.clone(),
            format!("{:.4}", agent.accumulated_cost),
            agent.last_status.to_string(),
        ])?;
    }
    wtr.flush()
}

/// Write the same run metadata as JSON, for downstream tooling.
pub fn write_summary_json(agents: &[Agent], writer: impl Write) -> Result<()> {
    let summaries: Vec<RunSummary> = agents
        .iter()
        .map(|agent| RunSummary {
            agent: &agent.name,
            cost: agent.accumulated_cost,
            status: agent.last_status.to_string(),
        })
        .collect();
    serde_json::to_writer_pretty(writer, &summaries).context("serializing run summary")
}
