//! Reasoner configuration.
//!
//! A single struct collects every tunable named across the kernel so that
//! `Memory`, the dispatcher, and the stream reasoner can share one source
//! of truth instead of hard-coded constants scattered through the rule
//! catalog.

/// Boolean weights over the scheduler's sampling objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingObjectives {
    pub priority: bool,
    pub recency: bool,
    pub punctuation: bool,
    pub novelty: bool,
}

impl Default for SamplingObjectives {
    fn default() -> Self {
        SamplingObjectives {
            priority: true,
            recency: true,
            punctuation: false,
            novelty: true,
        }
    }
}

/// Top-level configuration for a reasoner instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Personality constant `k` used throughout the truth functions
    /// (`c = w / (w + k)`). Pinned at 1.0 per the spec's open question.
    pub evidential_horizon: f64,

    /// Maximum number of base evidence ids kept in a stamp before the
    /// oldest are truncated.
    pub max_stamp_length: usize,

    /// Longest evidence chain a derived task may have.
    pub max_derivation_depth: u32,

    /// Capacity of the focus (hot) concept bag.
    pub focus_capacity: usize,
    /// Capacity of the long-term (cold) concept bag.
    pub long_term_capacity: usize,
    /// Capacity of a concept's belief table.
    pub belief_table_capacity: usize,
    /// Capacity of a concept's goal table.
    pub goal_table_capacity: usize,
    /// Capacity of a concept's open-question set.
    pub question_capacity: usize,

    /// Priority floor below which a focus concept demotes to long-term on
    /// decay (spec.md §4.7's "on decay, focus concepts demote").
    pub demote_threshold: f32,

    /// Minimum sleep between scheduler iterations, to bound CPU use.
    pub cpu_throttle_interval: std::time::Duration,
    /// Downstream queue depth at which the scheduler starts sleeping.
    pub backpressure_threshold: usize,
    /// Sleep duration applied while backpressured.
    pub backpressure_interval: std::time::Duration,
    /// Capacity of the bounded channel between scheduler and consumers.
    pub emission_channel_capacity: usize,

    /// Weights over what the scheduler samples for.
    pub sampling_objectives: SamplingObjectives,

    /// RNG seed. `None` means time-seeded (the default).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            evidential_horizon: 1.0,
            max_stamp_length: 20,
            max_derivation_depth: 8,
            focus_capacity: 64,
            long_term_capacity: 4096,
            belief_table_capacity: 8,
            goal_table_capacity: 8,
            question_capacity: 8,
            demote_threshold: 0.15,
            cpu_throttle_interval: std::time::Duration::from_millis(1),
            backpressure_threshold: 256,
            backpressure_interval: std::time::Duration::from_millis(5),
            emission_channel_capacity: 1024,
            sampling_objectives: SamplingObjectives::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: OptionalConfig,
}

#[derive(Debug, Clone, Default)]
struct OptionalConfig {
    max_derivation_depth: Option<u32>,
    focus_capacity: Option<usize>,
    long_term_capacity: Option<usize>,
    backpressure_threshold: Option<usize>,
    backpressure_interval: Option<std::time::Duration>,
    cpu_throttle_interval: Option<std::time::Duration>,
    sampling_objectives: Option<SamplingObjectives>,
    seed: Option<u64>,
}

impl ConfigBuilder {
    pub fn max_derivation_depth(mut self, depth: u32) -> Self {
        self.config.max_derivation_depth = Some(depth);
        self
    }

    pub fn focus_capacity(mut self, capacity: usize) -> Self {
        self.config.focus_capacity = Some(capacity);
        self
    }

    pub fn long_term_capacity(mut self, capacity: usize) -> Self {
        self.config.long_term_capacity = Some(capacity);
        self
    }

    pub fn backpressure_threshold(mut self, threshold: usize) -> Self {
        self.config.backpressure_threshold = Some(threshold);
        self
    }

    pub fn backpressure_interval(mut self, interval: std::time::Duration) -> Self {
        self.config.backpressure_interval = Some(interval);
        self
    }

    pub fn cpu_throttle_interval(mut self, interval: std::time::Duration) -> Self {
        self.config.cpu_throttle_interval = Some(interval);
        self
    }

    pub fn sampling_objectives(mut self, objectives: SamplingObjectives) -> Self {
        self.config.sampling_objectives = Some(objectives);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            max_derivation_depth: self.config.max_derivation_depth.unwrap_or(defaults.max_derivation_depth),
            focus_capacity: self.config.focus_capacity.unwrap_or(defaults.focus_capacity),
            long_term_capacity: self.config.long_term_capacity.unwrap_or(defaults.long_term_capacity),
            backpressure_threshold: self
                .config
                .backpressure_threshold
                .unwrap_or(defaults.backpressure_threshold),
            backpressure_interval: self
                .config
                .backpressure_interval
                .unwrap_or(defaults.backpressure_interval),
            cpu_throttle_interval: self
                .config
                .cpu_throttle_interval
                .unwrap_or(defaults.cpu_throttle_interval),
            sampling_objectives: self.config.sampling_objectives.unwrap_or(defaults.sampling_objectives),
            seed: self.config.seed,
            ..defaults
        }
    }
}
