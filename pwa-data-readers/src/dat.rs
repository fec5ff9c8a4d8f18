//! Four-momentum text files
//!
//! Each file holds whitespace-separated numbers, four per row. A file stores
//! one or more particles; the rows of all events are interleaved
//! ([`DatLayout::EventMajor`]) or stored particle after particle
//! ([`DatLayout::ParticleMajor`]). Text after `#` on a line is ignored.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use ndarray::{s, Array2, ArrayD};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pwa_data_core::{Element, Key, Tree};

use crate::error::{Error, Result};

/// Components per momentum row: E, px, py, pz
const MOMENTUM_WIDTH: usize = 4;

/// Element types momentum files can be parsed into
pub trait DatElement: Element + FromStr {}

impl<T: Element + FromStr> DatElement for T {}

/// Row ordering inside a momentum file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatLayout {
    /// One row per particle, event after event
    #[default]
    EventMajor,
    /// All events of one particle, then the next particle
    ParticleMajor,
}

/// Options for momentum file loading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatReaderOptions {
    /// Number of particles stored in each file, inferred when absent
    pub split: Option<Vec<usize>>,

    /// Row ordering within each file
    pub layout: DatLayout,
}

impl DatReaderOptions {
    /// Parse options from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the number of particles per file
    pub fn with_split(mut self, split: Vec<usize>) -> Self {
        self.split = Some(split);
        self
    }

    /// Set the row ordering
    pub fn with_layout(mut self, layout: DatLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Load particle momenta from one or more files
///
/// Particles are assigned to files in order: the first `split[0]` names go
/// to the first file and so on. Without an explicit split every file is
/// assumed to hold whole events, so the total row count must be a multiple
/// of the number of particles. The result maps each particle to an
/// `[n_events, 4]` array.
pub fn load_dat_file<T, P, K>(paths: &[P], particles: &[K], options: &DatReaderOptions) -> Result<Tree<ArrayD<T>>>
where
    T: DatElement,
    P: AsRef<Path>,
    K: Clone + Into<Key>,
{
    if paths.is_empty() {
        return Err(Error::InvalidArgument("no momentum files given".into()));
    }
    if particles.is_empty() {
        return Err(Error::InvalidArgument("no particles given".into()));
    }

    let files = paths
        .iter()
        .map(|path| read_momenta::<T>(path.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let split = match &options.split {
        Some(split) => split.clone(),
        None => infer_split(&files, particles.len())?,
    };
    if split.len() != files.len() {
        return Err(Error::InvalidArgument(format!(
            "split has {} entries for {} files",
            split.len(),
            files.len()
        )));
    }
    let assigned: usize = split.iter().sum();
    if assigned != particles.len() {
        return Err(Error::InvalidArgument(format!(
            "split assigns {assigned} particles, {} given",
            particles.len()
        )));
    }

    let mut names = particles.iter().cloned().map(Into::into);
    let mut entries: Vec<(Key, Tree<ArrayD<T>>)> = Vec::with_capacity(particles.len());
    let mut n_events = None;

    for ((path, rows), &count) in paths.iter().zip(&files).zip(&split) {
        let parts = separate(rows, count, options.layout, path.as_ref())?;
        if let Some(first) = parts.first() {
            let events = first.nrows();
            match n_events {
                Some(expected) if expected != events => {
                    return Err(Error::Format(format!(
                        "{}: holds {events} events, earlier files hold {expected}",
                        path.as_ref().display()
                    )));
                }
                _ => n_events = Some(events),
            }
        }
        for (momenta, name) in parts.into_iter().zip(names.by_ref()) {
            entries.push((name, Tree::leaf(momenta.into_dyn())));
        }
    }

    Ok(Tree::mapping(entries))
}

fn read_momenta<T: DatElement>(path: &Path) -> Result<Array2<T>> {
    let text = fs::read_to_string(path)?;
    let values = text
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(data, _)| data))
        .flat_map(str::split_whitespace)
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| Error::Format(format!("{}: cannot parse '{token}'", path.display())))
        })
        .collect::<Result<Vec<T>>>()?;

    if values.len() % MOMENTUM_WIDTH != 0 {
        return Err(Error::Format(format!(
            "{}: {} values do not form rows of {MOMENTUM_WIDTH}",
            path.display(),
            values.len()
        )));
    }
    let rows = values.len() / MOMENTUM_WIDTH;
    debug!(path = %path.display(), rows, "loaded momentum file");

    Array2::from_shape_vec((rows, MOMENTUM_WIDTH), values).map_err(|e| Error::Format(e.to_string()))
}

fn infer_split<T>(files: &[Array2<T>], n_particles: usize) -> Result<Vec<usize>> {
    let total: usize = files.iter().map(Array2::nrows).sum();
    if total % n_particles != 0 {
        return Err(Error::InvalidArgument(format!(
            "{total} rows cannot be shared by {n_particles} particles"
        )));
    }
    let events = total / n_particles;
    if events == 0 {
        return Err(Error::InvalidArgument("momentum files hold no events".into()));
    }
    Ok(files.iter().map(|rows| rows.nrows() / events).collect())
}

fn separate<T: Clone>(rows: &Array2<T>, count: usize, layout: DatLayout, path: &Path) -> Result<Vec<Array2<T>>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if rows.nrows() % count != 0 {
        return Err(Error::Format(format!(
            "{}: {} rows cannot hold {count} particles per event",
            path.display(),
            rows.nrows()
        )));
    }
    let events = rows.nrows() / count;

    let parts = (0..count)
        .map(|j| match layout {
            DatLayout::EventMajor => rows.slice(s![j..;count, ..]).to_owned(),
            DatLayout::ParticleMajor => rows.slice(s![j * events..(j + 1) * events, ..]).to_owned(),
        })
        .collect();
    Ok(parts)
}
