use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ticket_overlay::config::job::{JobFile, JobMode};
use ticket_overlay::config::merged::MergedConfig;
use ticket_overlay::config::{self};
use ticket_overlay::pipeline::job_runner::{JobConfig, JobResult};
use ticket_overlay::pipeline::orchestrator::run_all_jobs;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: ticket_overlay <jobs.yaml>...");
        eprintln!("  Overlay designs onto PDF tickets, keeping QR codes visible.");
        eprintln!("  Modes per job: overlay (default), tickets, inspect.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("ticket_overlay {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging();

    let mut job_configs: Vec<JobConfig> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Relative paths in a job file are relative to the job file.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            if let Err(e) = job.check_required_fields() {
                eprintln!("ERROR: {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }

            let merged = MergedConfig::new(&settings, job);
            if let Err(e) = merged.validate() {
                eprintln!("ERROR: {}: {e}", job.input);
                return ExitCode::FAILURE;
            }

            job_configs.push(JobConfig {
                mode: job.mode,
                input_path: resolve_path(&job_dir, &job.input),
                design_path: job.design.as_deref().map(|p| resolve_path(&job_dir, p)),
                output_path: job.output.as_deref().map(|p| resolve_path(&job_dir, p)),
                report_path: job.report.as_deref().map(|p| resolve_path(&job_dir, p)),
                params: merged,
            });
        }
    }

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                if let Err(e) = print_summary(&job_configs[i], job_result) {
                    eprintln!("ERROR: {}: {e}", job_result.input_path.display());
                    has_error = true;
                }
            }
            Err(e) => {
                eprintln!("ERROR: {}: {e}", job_configs[i].input_path.display());
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// `RUST_LOG` controls verbosity; warnings and errors only by default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(config: &JobConfig, result: &JobResult) -> ticket_overlay::error::Result<()> {
    let output = result
        .output_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    match result.mode {
        JobMode::Overlay => eprintln!(
            "OK: {} -> {} ({} pages, {} QR regions kept)",
            result.input_path.display(),
            output,
            result.pages_processed,
            result.regions_found
        ),
        JobMode::Tickets => {
            eprintln!(
                "OK: {} -> {} ({} tickets, QR at {})",
                result.input_path.display(),
                output,
                result.tickets_written,
                config.params.qr_position.describe()
            );
            if let Some((first, last)) = result.numbers {
                eprintln!("  Ticket numbers: {first:03} to {last:03}");
            }
        }
        JobMode::Inspect => {
            // レポートパス未指定ならJSONを標準出力へ
            if config.report_path.is_none()
                && let Some(report) = &result.report
            {
                println!("{}", report.to_json()?);
            }
            eprintln!(
                "OK: {} ({} pages, {} QR codes)",
                result.input_path.display(),
                result.pages_processed,
                result.regions_found
            );
        }
    }
    Ok(())
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
