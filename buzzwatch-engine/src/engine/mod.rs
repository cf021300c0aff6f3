mod pipeline;
mod runtime;

pub use self::{
    pipeline::{PipelineState, RecordOutcome, Tally},
    runtime::{ConsumerRuntime, RunState, RunSummary, ShutdownSignal},
};
