pub mod counter;
pub mod inspect_job;
pub mod job_runner;
pub mod orchestrator;
pub mod overlay_job;
pub mod page_scan;
pub mod ticket_job;
