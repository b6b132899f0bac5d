//! Class label resolution for model output channels.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

static NAMES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)'names': \{(.*?)\}").expect("names block pattern"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("quoted name pattern"));

/// Number of placeholder names used when a model ships without labels.
pub const PLACEHOLDER_CLASSES: usize = 1000;

/// Ordered class names, indexed by score channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse names out of exported model metadata, e.g.
    /// `{'stride': 32, 'names': {0: 'person', 1: 'bicycle'}}`.
    ///
    /// Returns `None` when no non-empty names block is present.
    pub fn from_metadata(metadata: &str) -> Option<Self> {
        let block = NAMES_BLOCK.captures(metadata)?.get(1)?.as_str();
        let names: Vec<String> = QUOTED
            .captures_iter(block)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .collect();

        if names.is_empty() { None } else { Some(Self { names }) }
    }

    /// Read one name per line, stopping at the first empty line.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut names = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.trim_end_matches('\r');
            if name.is_empty() {
                break;
            }
            names.push(name.to_string());
        }
        Ok(Self { names })
    }

    pub fn from_label_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        Self::from_reader(BufReader::new(file)).map_err(io_err)
    }

    /// `class1` .. `class{count}`.
    pub fn placeholder(count: usize) -> Self {
        Self {
            names: (1..=count).map(|i| format!("class{i}")).collect(),
        }
    }

    /// Metadata first, then the label file, then placeholders.
    pub fn resolve(metadata: Option<&str>, label_file: Option<&Path>) -> Self {
        if let Some(labels) = metadata.and_then(Self::from_metadata) {
            debug!(count = labels.len(), "labels read from model metadata");
            return labels;
        }

        match label_file {
            Some(path) => match Self::from_label_file(path) {
                Ok(labels) if !labels.is_empty() => return labels,
                Ok(_) => warn!(path = %path.display(), "label file is empty"),
                Err(e) => warn!(error = %e, "failed to read label file"),
            },
            None => warn!("model has no metadata and no label file was given"),
        }

        Self::placeholder(PLACEHOLDER_CLASSES)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
