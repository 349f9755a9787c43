// ジョブ単位: 入力検証 -> PDF読込 -> ページ走査 -> モード別処理 -> 出力の確定

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::compose::font::{StampFace, default_sources, resolve_face};
use crate::config::job::JobMode;
use crate::config::merged::MergedConfig;
use crate::error::TicketOverlayError;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::{commit_outputs, document_to_bytes};
use crate::pipeline::inspect_job::build_report;
use crate::pipeline::overlay_job::apply_overlays;
use crate::pipeline::page_scan::{detector_for, scan_pages};
use crate::pipeline::ticket_job::{collect_complete_boxes, prepare_fragments, render_ticket_pages};
use crate::render::PageRasterizer;
use crate::report::DetectionReport;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub mode: JobMode,
    pub input_path: PathBuf,
    pub design_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub params: MergedConfig,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub mode: JobMode,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub pages_processed: usize,
    pub regions_found: usize,
    /// Pages written in tickets mode.
    pub tickets_written: usize,
    /// First and last stamped ticket number.
    pub numbers: Option<(i64, i64)>,
    /// The detection record, built in inspect mode or when a report path is set.
    pub report: Option<DetectionReport>,
}

/// Checks everything that can be checked before a page is touched.
fn validate(config: &JobConfig) -> crate::error::Result<()> {
    config.params.validate()?;

    if !config.input_path.is_file() {
        return Err(TicketOverlayError::input(format!(
            "input PDF not found: {}",
            config.input_path.display()
        )));
    }

    if config.mode != JobMode::Inspect {
        let design = config
            .design_path
            .as_ref()
            .ok_or_else(|| TicketOverlayError::input("design image path is required"))?;
        if !design.is_file() {
            return Err(TicketOverlayError::input(format!(
                "design image not found: {}",
                design.display()
            )));
        }
        if config.output_path.is_none() {
            return Err(TicketOverlayError::input("output path is required"));
        }
    }
    Ok(())
}

fn load_design(path: &Path) -> crate::error::Result<RgbaImage> {
    let design = image::open(path)
        .map_err(|e| TicketOverlayError::image(format!("{}: {e}", path.display())))?;
    Ok(design.to_rgba8())
}

fn ensure_parent_dir(path: &Path) -> crate::error::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Run a single job with the pdfium rasterizer.
#[cfg(feature = "pdfium")]
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    validate(config)?;
    let rasterizer = crate::render::pdfium::PdfiumRasterizer::open(&config.input_path)?;
    run_job_with(config, &rasterizer)
}

#[cfg(not(feature = "pdfium"))]
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    validate(config)?;
    Err(TicketOverlayError::render(
        "built without the pdfium feature, no rasterizer available",
    ))
}

/// Run a single job with the given rasterizer.
///
/// Nothing is written unless every page was processed.
pub fn run_job_with(
    config: &JobConfig,
    rasterizer: &dyn PageRasterizer,
) -> crate::error::Result<JobResult> {
    validate(config)?;
    let params = &config.params;

    let design = match config.mode {
        JobMode::Inspect => None,
        JobMode::Overlay | JobMode::Tickets => config
            .design_path
            .as_deref()
            .map(load_design)
            .transpose()?,
    };

    let reader = PdfReader::open(&config.input_path)?;
    tracing::info!(
        input = %config.input_path.display(),
        mode = ?config.mode,
        pages = reader.page_count(),
        "job started"
    );

    let detector = detector_for(params.threshold);
    let pages = scan_pages(
        &reader,
        rasterizer,
        &detector,
        params.zoom,
        params.parallel_workers,
    )?;
    let regions_found = pages.iter().map(|p| p.regions.len()).sum();

    let report = if config.mode == JobMode::Inspect || config.report_path.is_some() {
        Some(build_report(&reader, &pages, params.zoom)?)
    } else {
        None
    };

    let mut result = JobResult {
        mode: config.mode,
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        pages_processed: pages.len(),
        regions_found,
        tickets_written: 0,
        numbers: None,
        report: None,
    };

    let output = match (config.mode, &design, &config.output_path) {
        (JobMode::Overlay, Some(design), Some(output_path)) => {
            let mut doc = reader.into_document();
            apply_overlays(&mut doc, &pages, design, params)?;
            Some((output_path, document_to_bytes(&mut doc)?))
        }
        (JobMode::Tickets, Some(design), Some(output_path)) => {
            let boxes = collect_complete_boxes(&pages, params);
            // システムフォントの走査は番号を描くときだけ
            let face = if params.start_number.is_some() {
                resolve_face(&default_sources(&params.fonts))
            } else {
                StampFace::Builtin
            };
            let fragments = prepare_fragments(&boxes, params, &face);
            let batch = render_ticket_pages(&fragments, design, params)?;
            result.tickets_written = batch.tickets;
            result.numbers = batch.numbers;
            Some((output_path, batch.pdf_bytes))
        }
        _ => None,
    };

    // 出力の確定は全ての失敗しうる処理の後、PDFとレポートをまとめて行う
    let report_json = match (&report, &config.report_path) {
        (Some(report), Some(report_path)) => Some((report_path, report.to_json()?)),
        _ => None,
    };

    let mut files: Vec<(&Path, &[u8])> = Vec::new();
    if let Some((report_path, json)) = &report_json {
        files.push((report_path.as_path(), json.as_bytes()));
    }
    if let Some((output_path, pdf_bytes)) = &output {
        files.push((output_path.as_path(), pdf_bytes.as_slice()));
    }
    for (path, _) in &files {
        ensure_parent_dir(path)?;
    }
    commit_outputs(&files)?;

    if let Some((output_path, _)) = &output {
        tracing::info!(output = %output_path.display(), "output written");
    }
    result.report = report;

    Ok(result)
}
