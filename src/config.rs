//! Run configuration
//!
//! Options can be set through the `with_*` builder methods or parsed from
//! `key=value` pairs. All configuration errors surface before any trial runs.

use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;

use crate::groups::GroupSelection;

/// Default number of randomized trials when rarefaction is enabled.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Default spacing between recorded sampling depths.
pub const DEFAULT_INCREMENT: usize = 100;

/// Problems with user-supplied options.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Value of a boolean option is not recognised.
    #[error("{option}: '{value}' is not a valid boolean (use T or F)")]
    InvalidBoolean {
        /// Option name.
        option: String,
        /// Supplied value.
        value: String,
    },

    /// Value of a numeric option does not parse.
    #[error("{option} must be numeric, got '{value}'")]
    InvalidNumber {
        /// Option name.
        option: String,
        /// Supplied value.
        value: String,
    },

    /// Option name is not known.
    #[error("'{0}' is not a valid option")]
    UnknownOption(String),

    /// Group list is contradictory.
    #[error("conflicting group selection: {0}")]
    ConflictingGroups(String),

    /// Summary, rarefaction and collector output are all disabled.
    #[error("no outputs selected; enable at least one of summary, rarefy or collect")]
    NoOutputs,

    /// Worker count is zero.
    #[error("processors must be at least 1")]
    ZeroWorkers,

    /// Iteration count is zero.
    #[error("iters must be at least 1")]
    ZeroIterations,

    /// Sampling increment is not positive.
    #[error("invalid sampling increment: {0}")]
    InvalidIncrement(String),

    /// None of the requested groups exists in the tree.
    #[error("no valid groups selected")]
    NoValidGroups,
}

/// Spacing of recorded sampling depths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingIncrement {
    /// Record every `n`th depth.
    Every(usize),
    /// Record every `fraction × largest group` depths.
    Fraction(f64),
}

impl SamplingIncrement {
    /// Concrete increment for a largest group (or cutoff) of `largest` sequences.
    pub fn resolve(self, largest: usize) -> usize {
        match self {
            SamplingIncrement::Every(n) => n.max(1),
            SamplingIncrement::Fraction(fraction) => ((largest as f64 * fraction) as usize).max(1),
        }
    }

    fn validate(self) -> Result<(), ConfigError> {
        match self {
            SamplingIncrement::Every(0) => {
                Err(ConfigError::InvalidIncrement("increment must be > 0".to_string()))
            }
            SamplingIncrement::Fraction(f) if !(f > 0.0 && f < 1.0) => Err(
                ConfigError::InvalidIncrement(format!("fraction {f} must be in (0, 1)")),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for SamplingIncrement {
    fn default() -> Self {
        SamplingIncrement::Every(DEFAULT_INCREMENT)
    }
}

impl FromStr for SamplingIncrement {
    type Err = ConfigError;

    /// Values below 1 are fractions of the largest group, others absolute counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            option: "freq".to_string(),
            value: s.to_string(),
        })?;
        let increment = if value < 1.0 {
            SamplingIncrement::Fraction(value)
        } else {
            SamplingIncrement::Every(value as usize)
        };
        increment.validate()?;
        Ok(increment)
    }
}

/// Configuration parameters for a diversity run
#[derive(Debug, Clone, PartialEq)]
pub struct DiversityConfig {
    /// Randomized trials when rarefaction is enabled.
    pub iterations: usize,

    /// Spacing of recorded depths.
    pub sampling_increment: SamplingIncrement,

    /// Fixed subsample depth; forces rarefaction on.
    pub subsample_depth: Option<usize>,

    /// Produce a rarefaction curve.
    pub rarefy: bool,

    /// Produce the per-group summary.
    pub summary: bool,

    /// Produce the single-trial collector curve.
    pub collect: bool,

    /// Divide reported values by the sampling depth.
    pub scale: bool,

    /// Parallel workers.
    pub workers: usize,

    /// Base seed; `None` draws one at random.
    pub seed: Option<u64>,

    /// Groups to analyse.
    pub groups: GroupSelection,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            sampling_increment: SamplingIncrement::default(),
            subsample_depth: None,
            rarefy: false,
            summary: true,
            collect: false,
            scale: false,
            workers: 1,
            seed: None,
            groups: GroupSelection::All,
        }
    }
}

impl DiversityConfig {
    /// Set the trial count.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the recorded-depth spacing.
    pub fn with_sampling_increment(mut self, increment: SamplingIncrement) -> Self {
        self.sampling_increment = increment;
        self
    }

    /// Set the subsample depth; 0 disables subsampling.
    pub fn with_subsample_depth(mut self, depth: usize) -> Self {
        self.subsample_depth = (depth > 0).then_some(depth);
        self
    }

    /// Enable or disable the rarefaction curve.
    pub fn with_rarefaction(mut self, enabled: bool) -> Self {
        self.rarefy = enabled;
        self
    }

    /// Enable or disable the summary.
    pub fn with_summary(mut self, enabled: bool) -> Self {
        self.summary = enabled;
        self
    }

    /// Enable or disable the collector curve.
    pub fn with_collector_curve(mut self, enabled: bool) -> Self {
        self.collect = enabled;
        self
    }

    /// Enable or disable scaling by depth.
    pub fn with_scaling(mut self, enabled: bool) -> Self {
        self.scale = enabled;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Fix the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the group selection.
    pub fn with_groups(mut self, groups: GroupSelection) -> Self {
        self.groups = groups;
        self
    }

    /// Rarefaction runs when requested or implied by subsampling.
    pub fn rarefaction_enabled(&self) -> bool {
        self.rarefy || self.subsample_depth.is_some()
    }

    /// Trials actually run: a single ordering suffices without rarefaction.
    pub fn effective_iterations(&self) -> usize {
        if self.rarefaction_enabled() {
            self.iterations
        } else {
            1
        }
    }

    /// Check option consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        self.sampling_increment.validate()?;
        if !self.summary && !self.collect && !self.rarefaction_enabled() {
            return Err(ConfigError::NoOutputs);
        }
        if let GroupSelection::Named(names) = &self.groups {
            check_group_names(names)?;
        }
        Ok(())
    }

    /// Parse `key=value` options on top of the defaults and validate the result.
    ///
    /// Recognised keys: `iters`, `freq`, `sampledepth`, `rarefy`, `summary`,
    /// `collect`, `scale`, `processors`, `seed`, `groups` (dash-separated, or `all`).
    pub fn from_options<I, K, V>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in options {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            match key {
                "iters" => config.iterations = parse_number(key, value)?,
                "freq" => config.sampling_increment = value.parse()?,
                "sampledepth" => {
                    config = config.with_subsample_depth(parse_number(key, value)?);
                }
                "rarefy" => config.rarefy = parse_bool(key, value)?,
                "summary" => config.summary = parse_bool(key, value)?,
                "collect" => config.collect = parse_bool(key, value)?,
                "scale" => config.scale = parse_bool(key, value)?,
                "processors" => config.workers = parse_number(key, value)?,
                "seed" => config.seed = Some(parse_number(key, value)?),
                "groups" => config.groups = parse_groups(value)?,
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "t" | "true" => Ok(true),
        "f" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            option: option.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(option: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        option: option.to_string(),
        value: value.to_string(),
    })
}

fn parse_groups(value: &str) -> Result<GroupSelection, ConfigError> {
    let names: Vec<String> = value
        .split('-')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() || names == ["all"] {
        return Ok(GroupSelection::All);
    }
    check_group_names(&names)?;
    Ok(GroupSelection::Named(names))
}

fn check_group_names(names: &[String]) -> Result<(), ConfigError> {
    if names.iter().any(|name| name == "all") {
        return Err(ConfigError::ConflictingGroups(
            "'all' cannot be combined with named groups".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::ConflictingGroups(format!(
                "group '{name}' is listed more than once"
            )));
        }
    }
    Ok(())
}
