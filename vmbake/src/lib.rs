//! vmbake - QEMU launch step for image build pipelines.
//!
//! The interesting part is argument synthesis: computed default flags are
//! merged with user-supplied `qemuargs` rows that may repeat switches, add new
//! ones, or carry Go-template placeholders resolved against runtime facts.
//!
//! ```text
//! QemuConfig + RuntimeFacts ──→ defaults ─┐
//!                                         ├──→ merge ──→ tokens ──→ ProcessSupervisor
//! qemuargs ──→ template expansion ────────┘
//! ```
//!
//! The launch itself runs as a [`step::RunStep`] inside a [`step::Pipeline`],
//! which guarantees the process is stopped on cleanup.

pub mod args;
pub mod config;
pub mod constants;
pub mod driver;
pub mod errors;
pub mod facts;
pub mod step;
pub mod ui;
pub mod util;

pub use args::{DefaultArgs, FlagRow, MultiValueMap, synthesize};
pub use config::QemuConfig;
pub use driver::{ProcessSupervisor, QemuDriver};
pub use errors::{VmbakeError, VmbakeResult};
pub use facts::RuntimeFacts;
pub use step::{BuildState, Pipeline, PipelineOutcome, RunStep, Step, StepAction, WaitStep};
pub use ui::{TracingUi, Ui};
