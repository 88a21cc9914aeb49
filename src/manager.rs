use crate::config::Config;
use crate::despike::despike;
use crate::output::{write_profile, write_record, write_spikes};
use crate::plot::plot_tke_profile;
use crate::position::ProbePosition;
use crate::profile::{ProfileEntry, assemble};
use crate::spike::SpikeReport;
use crate::stats::{TurbulenceStats, compute_stats, reynolds_stress_series};
use crate::vna::read_record;
use anyhow::{Context, Result};
use glob::glob;
use rmp_serde::encode;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Results of one probe position.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionReport {
    pub id: String,
    pub position: ProbePosition,
    pub raw: TurbulenceStats,
    pub despiked: TurbulenceStats,
    pub spikes: SpikeReport,
}

pub struct Manager {
    exp_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(exp_dir: P) -> Result<Self> {
        let exp_dir = exp_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(exp_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { exp_dir, cfg })
    }

    pub fn process_experiment(&self) -> Result<()> {
        let files = self.probe_files().context("failed to find probe files")?;
        log::info!("found {} probe files", files.len());

        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {output_dir:?}"))?;

        let mut reports = Vec::with_capacity(files.len());
        for file in &files {
            match self.process_position(file) {
                Ok(report) => reports.push(report),
                Err(error) => log::warn!("skipping {file:?}: {error:#}"),
            }
        }
        log::info!("processed {} of {} positions", reports.len(), files.len());

        let orientation = self.cfg.probe.orientation;
        let flow = &self.cfg.flow;
        let missing_value = self.cfg.output.missing_value;

        let raw_entries: Vec<_> = reports
            .iter()
            .map(|report| ProfileEntry {
                id: report.id.clone(),
                position: report.position,
                stats: report.raw,
            })
            .collect();
        let raw_table = assemble(&raw_entries, orientation, flow.bulk_velocity, flow.char_length)
            .context("failed to assemble raw profile")?;
        write_profile(output_dir.join("profile-raw.csv"), &raw_table, missing_value)
            .context("failed to write raw profile")?;

        let despiked_entries: Vec<_> = reports
            .iter()
            .map(|report| ProfileEntry {
                id: report.id.clone(),
                position: report.position,
                stats: report.despiked,
            })
            .collect();
        let despiked_table =
            assemble(&despiked_entries, orientation, flow.bulk_velocity, flow.char_length)
                .context("failed to assemble despiked profile")?;
        write_profile(output_dir.join("profile-despiked.csv"), &despiked_table, missing_value)
            .context("failed to write despiked profile")?;

        let plot_file = output_dir.join("norm-TKE-x.png");
        match plot_tke_profile(&plot_file, &despiked_table) {
            Ok(0) => log::warn!("no valid points to plot in {plot_file:?}"),
            Ok(n_points) => log::info!("plotted {n_points} points to {plot_file:?}"),
            Err(error) => log::warn!("failed to plot {plot_file:?}: {error:#}"),
        }

        self.save_results(&reports).context("failed to save results")?;

        Ok(())
    }

    pub fn clean_experiment(&self) -> Result<()> {
        let output_dir = self.output_dir();
        if output_dir.exists() {
            fs::remove_dir_all(&output_dir)
                .with_context(|| format!("failed to remove {output_dir:?}"))?;
            log::info!("removed {output_dir:?}");
        }
        Ok(())
    }

    fn process_position(&self, file: &Path) -> Result<PositionReport> {
        let id = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .context("file name is not valid UTF-8")?
            .to_string();

        let (position, malformed) = ProbePosition::from_file_stem(&id);
        for token in malformed {
            log::warn!("could not convert {token:?} to a coordinate of {id}");
        }

        let orientation = self.cfg.probe.orientation;
        let record = read_record(file, orientation).context("failed to read record")?;

        let raw = compute_stats(&record, orientation).context("failed to compute raw stats")?;

        let (despiked_record, spikes) =
            despike(&record, orientation, self.cfg.method(), &self.cfg.thresholds())
                .context("failed to despike record")?;
        let despiked = compute_stats(&despiked_record, orientation)
            .context("failed to compute despiked stats")?;

        let missing_value = self.cfg.output.missing_value;
        let raw_record = record
            .for_orientation(orientation)
            .context("failed to select raw channels")?;
        write_record(self.output_file(&id, "raw"), &raw_record, &[], missing_value)
            .context("failed to write raw record")?;
        let stress_series = reynolds_stress_series(&despiked_record);
        let despiked_file = self.output_file(&id, "despiked");
        write_record(despiked_file, &despiked_record, &stress_series, missing_value)
            .context("failed to write despiked record")?;
        write_spikes(self.output_file(&id, "spikes"), &spikes)
            .context("failed to write spike counts")?;

        log::info!("processed {id} ({:?})", spikes.counts(self.cfg.method()));

        Ok(PositionReport {
            id,
            position,
            raw,
            despiked,
            spikes,
        })
    }

    fn save_results(&self, reports: &[PositionReport]) -> Result<()> {
        let file = self.output_dir().join("results.msgpack");
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, reports).context("failed to serialize reports")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    fn probe_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for ext in ["vna", "dat"] {
            let pattern = self.exp_dir.join("data").join(format!("*.{ext}"));
            let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
            files.extend(
                glob(pattern)
                    .context("failed to glob probe files")?
                    .filter_map(Result::ok)
                    .filter(|p| p.is_file()),
            );
        }
        files.sort();
        Ok(files)
    }

    fn output_dir(&self) -> PathBuf {
        self.exp_dir.join("output")
    }

    fn output_file(&self, id: &str, kind: &str) -> PathBuf {
        self.output_dir().join(format!("{id}-{kind}.csv"))
    }
}
