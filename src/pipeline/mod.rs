pub mod assembler;
pub mod classifier;
pub mod job_runner;
pub mod orchestrator;
pub mod output;
pub mod progress;
