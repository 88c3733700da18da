// src/search/mod.rs

//! The staged search controller.
//!
//! A run has one stage per key bit. Stage `s` tests the predicate on the
//! first `s` mirror bits, amplifies from the state modelled after stage
//! `s - 1`, executes on the backend and models the result for stage `s + 1`:
//!
//! ```text
//! Initial -> Running { stage: 1 } -> ... -> Running { stage: n - 1 } -> Done
//! ```
//!
//! Stages are never skipped or reordered, and any error aborts the run.

pub mod config;
pub mod report;

use crate::backend::ExecutionBackend;
use crate::circuits::CircuitBuilder;
use crate::core::{ModelledState, QuasiDistribution, Register, Result, SearchError, PI};
use crate::estimator::{build_rotation_operator, entropy, lambda_for_stage, modelled_state};
use crate::groverlong::build_search_operator;
use crate::oracle::Predicate;
use crate::operations::OperatorSpec;
use crate::validation::{check_modelled_state, clamp_lambda};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use config::SearchConfig;
pub use report::{CsvReport, ReportSink, RunReport};

/// Number of `(index, mirror)` pairs listed per stage at debug level.
const TALLY_LOG_LIMIT: usize = 32;

/// Progress of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No stage executed yet.
    Initial,
    /// `stage` (1-based) is the last completed stage.
    Running { stage: usize },
    /// Every stage completed.
    Done,
}

/// Bookkeeping for one completed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStatistics {
    /// 1-based stage number.
    pub stage: usize,
    /// Target weight after clamping.
    pub lambda: f64,
    /// Grover-Long iteration count `g`.
    pub iterations: usize,
    /// Phase angle α in radians.
    pub phase: f64,
    /// Iteration counts summed over this and every earlier stage.
    pub sum_iterations: usize,
    /// Entropy of the state modelled from this stage's distribution.
    pub entropy: f64,
}

impl fmt::Display for StageStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {}: lambda = {:.6}, g_l = {}, phase = {:.6} pi, entropy = {:.4}, sum_gl = {}",
            self.stage,
            self.lambda,
            self.iterations,
            self.phase / PI,
            self.entropy,
            self.sum_iterations
        )
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    register: Register,
    shots: u64,
    stages: Vec<StageStatistics>,
    final_distribution: QuasiDistribution,
    final_state: ModelledState,
}

impl SearchOutcome {
    pub fn stages(&self) -> &[StageStatistics] {
        &self.stages
    }

    /// The distribution returned for the last stage.
    pub fn final_distribution(&self) -> &QuasiDistribution {
        &self.final_distribution
    }

    /// The state modelled from the last stage.
    pub fn final_state(&self) -> &ModelledState {
        &self.final_state
    }

    pub fn final_entropy(&self) -> f64 {
        self.stages.last().map_or(0.0, |s| s.entropy)
    }

    /// Iteration counts summed over every stage (`SUM_GL`).
    pub fn sum_iterations(&self) -> usize {
        self.stages.last().map_or(0, |s| s.sum_iterations)
    }

    /// Fraction of final-stage shots that read `key` with a clean mirror.
    pub fn success_probability(&self, key: u64) -> f64 {
        self.final_distribution.success_probability(&self.register, self.shots, key)
    }

    /// The report row for this run, scored against `key`.
    pub fn report(&self, key: u64) -> RunReport {
        RunReport {
            n_index: self.register.index_width(),
            n_shots: self.shots,
            sum_gl: self.sum_iterations(),
            probability: self.success_probability(key),
        }
    }
}

/// Drives staged Grover-Long search runs against one backend.
pub struct StagedSearch<B: ExecutionBackend> {
    config: SearchConfig,
    register: Register,
    backend: B,
    state: ControllerState,
    modelled: Option<ModelledState>,
    prior_entropy: f64,
    stages: Vec<StageStatistics>,
    last_distribution: Option<QuasiDistribution>,
}

impl<B: ExecutionBackend> StagedSearch<B> {
    /// Creates a controller in the `Initial` state.
    ///
    /// # Errors
    /// `SearchError::Config` if `config` does not validate.
    pub fn new(config: SearchConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let register = Register::new(config.index_width)?;
        Ok(Self {
            prior_entropy: register.index_width() as f64,
            config,
            register,
            backend,
            state: ControllerState::Initial,
            modelled: None,
            stages: Vec::new(),
            last_distribution: None,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Statistics of the stages completed so far in the current run.
    pub fn stages(&self) -> &[StageStatistics] {
        &self.stages
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Discards all progress and returns to `Initial`.
    pub fn reset(&mut self) {
        self.state = ControllerState::Initial;
        self.modelled = None;
        self.prior_entropy = self.register.index_width() as f64;
        self.stages.clear();
        self.last_distribution = None;
    }

    /// Runs the next stage and returns the new state.
    ///
    /// # Errors
    /// `SearchError::Domain` if the run is already `Done` or the predicate
    /// was built for another key width; otherwise whatever the stage raised.
    /// A failed stage leaves the state unchanged.
    pub fn step(&mut self, predicate: &Predicate) -> Result<ControllerState> {
        let n = self.register.index_width();
        let stage = match self.state {
            ControllerState::Initial => 1,
            ControllerState::Running { stage } => stage + 1,
            ControllerState::Done => {
                return Err(SearchError::domain("search run already done; reset before stepping"));
            }
        };
        if predicate.index_width() != n {
            return Err(SearchError::domain(format!(
                "predicate built for {} key bits, controller configured for {}",
                predicate.index_width(),
                n
            )));
        }

        let rotate = build_rotation_operator(n, self.modelled.as_ref())?;
        let lambda = clamp_lambda(lambda_for_stage(n, stage, self.prior_entropy)?)?;
        let flag_bits: Vec<usize> = (0..stage).collect();
        let inverse_rotate = rotate.clone().adjoint();
        let search = build_search_operator(
            n,
            lambda,
            &flag_bits,
            predicate.forward(),
            predicate.inverse(),
            &rotate,
            &inverse_rotate,
        )?;
        let operator = self.stage_operator(rotate, search.operator)?;

        let shots = self.config.shots;
        let distribution = self
            .backend
            .execute(&operator, self.register.width(), shots)
            .map_err(SearchError::Backend)?;
        debug!(
            "stage {} most common (index, mirror): {:?}",
            stage,
            distribution.most_common(&self.register, shots, TALLY_LOG_LIMIT)
        );

        let modelled = modelled_state(n, shots, &distribution)?;
        check_modelled_state(&modelled, n)?;
        let stage_entropy = entropy(&modelled);
        let sum_iterations = self.stages.last().map_or(0, |s| s.sum_iterations) + search.iterations;
        let stats = StageStatistics {
            stage,
            lambda,
            iterations: search.iterations,
            phase: search.phase,
            sum_iterations,
            entropy: stage_entropy,
        };
        info!("{}", stats);

        self.stages.push(stats);
        self.modelled = Some(modelled);
        self.prior_entropy = stage_entropy;
        self.last_distribution = Some(distribution);
        self.state = if stage == n { ControllerState::Done } else { ControllerState::Running { stage } };
        Ok(self.state)
    }

    /// Full operator of one stage: prepare the modelled state on the index
    /// bits, then amplify.
    fn stage_operator(&self, rotate: OperatorSpec, search: OperatorSpec) -> Result<OperatorSpec> {
        Ok(CircuitBuilder::new()
            .embed(self.register.index_bits(), rotate)?
            .add_op(search)
            .build())
    }

    /// Runs every stage from scratch.
    pub fn run(&mut self, predicate: &Predicate) -> Result<SearchOutcome> {
        self.reset();
        info!(
            "staged search: {} stages, {} shots per stage, register of {} bits",
            self.register.index_width(),
            self.config.shots,
            self.register.width()
        );
        while self.state != ControllerState::Done {
            self.step(predicate)?;
        }
        let final_distribution = self.last_distribution.clone().unwrap_or_default();
        let final_state = self.modelled.clone().unwrap_or_else(|| ModelledState::uniform(0));
        Ok(SearchOutcome {
            register: self.register,
            shots: self.config.shots,
            stages: self.stages.clone(),
            final_distribution,
            final_state,
        })
    }

    /// Performs `config.repeats` independent runs, recording each one
    /// scored against `key`.
    pub fn run_repeated<S: ReportSink>(
        &mut self,
        predicate: &Predicate,
        key: u64,
        sink: &mut S,
    ) -> Result<Vec<SearchOutcome>> {
        let mut outcomes = Vec::with_capacity(self.config.repeats);
        for repeat in 0..self.config.repeats {
            let outcome = self.run(predicate)?;
            let report = outcome.report(key);
            info!(
                "run {}/{}: sum_gl = {}, probability = {:.4}",
                repeat + 1,
                self.config.repeats,
                report.sum_gl,
                report.probability
            );
            sink.record(&report)?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
