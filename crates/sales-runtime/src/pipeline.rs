//! End-to-end report run: load, summarise, render, email.
//!
//! Every fallible step that depends on the input happens before anything is
//! written, so a bad record never leaves a partial report behind.

use std::path::PathBuf;

use sales_core::error::{ReportError, Result};
use sales_core::formatting::{render_summary_with, to_table};
use sales_core::models::SummaryFacts;
use sales_core::money::NumberFormat;
use sales_data::aggregator::summarize;
use sales_data::reader::load_batch;
use tracing::{info, warn};

use crate::mail::{EmailMessage, MailDispatcher};
use crate::report::ReportRenderer;

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything one report run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct ReportJob {
    /// JSON document holding the sales records.
    pub input: PathBuf,
    /// Where the report document is written.
    pub output: PathBuf,
    /// Report title.
    pub title: String,
    /// How prices are written in the input.
    pub number_format: NumberFormat,
    /// Email sender address.
    pub sender: String,
    /// Email recipient; required only when a mailer is supplied.
    pub recipient: Option<String>,
    /// Email subject.
    pub subject: String,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub facts: SummaryFacts,
    /// The three summary lines, in report order.
    pub summary: [String; 3],
    pub report_path: PathBuf,
    /// Whether the report was handed to a mailer.
    pub mailed: bool,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full report pipeline.
///
/// 1. Load and validate the batch from `job.input`.
/// 2. Summarise it and render the three summary lines.
/// 3. Build the email (when `mailer` is given) so address problems surface
///    before any output exists.
/// 4. Render the report document to `job.output`.
/// 5. Hand the message, with the report attached, to `mailer`.
pub fn run(
    job: &ReportJob,
    renderer: &dyn ReportRenderer,
    mailer: Option<&dyn MailDispatcher>,
) -> Result<PipelineOutcome> {
    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let batch = load_batch(&job.input)?;

    // ── Step 2: Summarise ─────────────────────────────────────────────────────
    let facts = summarize(&batch, &job.number_format)?;
    let summary = render_summary_with(&facts, &job.number_format);
    let body = summary.join("\n");

    // ── Step 3: Message ───────────────────────────────────────────────────────
    let message = match mailer {
        Some(_) => {
            let recipient = job.recipient.as_deref().ok_or_else(|| {
                ReportError::Config("no email recipient configured".to_string())
            })?;
            Some(EmailMessage::generate(
                &job.sender,
                recipient,
                &job.subject,
                &body,
                Some(&job.output),
            )?)
        }
        None => None,
    };

    // ── Step 4: Report ────────────────────────────────────────────────────────
    let table = to_table(&batch);
    let report_path = renderer.render(&job.output, &job.title, &body, &table)?;

    // ── Step 5: Email ─────────────────────────────────────────────────────────
    let mailed = match (mailer, &message) {
        (Some(mailer), Some(message)) => {
            mailer.send(message)?;
            true
        }
        _ => {
            warn!(
                "Email delivery disabled; report left at {}",
                report_path.display()
            );
            false
        }
    };

    info!(
        records = batch.len(),
        mailed,
        "Report run finished"
    );

    Ok(PipelineOutcome {
        facts,
        summary,
        report_path,
        mailed,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{HtmlReport, PdfReport, TextReport};
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    const SALES: &str = r#"[
        {"id": 1, "car": {"car_make": "Honda", "car_model": "Civic", "car_year": 2020},
         "price": "$20000.00", "total_sales": 10},
        {"id": 2, "car": {"car_make": "Toyota", "car_model": "Corolla", "car_year": 2020},
         "price": "$18000.00", "total_sales": 15}
    ]"#;

    /// Keeps every message instead of delivering it.
    #[derive(Default)]
    struct RecordingMailer {
        sent: RefCell<Vec<EmailMessage>>,
    }

    impl MailDispatcher for RecordingMailer {
        fn send(&self, message: &EmailMessage) -> Result<()> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn job_in(dir: &Path, json: &str, extension: &str) -> ReportJob {
        let input = dir.join("car_sales.json");
        std::fs::write(&input, json).expect("write input");
        ReportJob {
            input,
            output: dir.join(format!("cars.{extension}")),
            title: "Sales Data".to_string(),
            number_format: NumberFormat::default(),
            sender: "automation@example.com".to_string(),
            recipient: Some("alice@example.com".to_string()),
            subject: "Sales summary for last month".to_string(),
        }
    }

    #[test]
    fn test_run_writes_report_and_sends_mail() {
        let tmp = TempDir::new().expect("tempdir");
        let job = job_in(tmp.path(), SALES, "html");
        let mailer = RecordingMailer::default();

        let outcome = run(&job, &HtmlReport, Some(&mailer)).expect("run");

        assert!(outcome.mailed);
        assert_eq!(outcome.report_path, job.output);
        assert_eq!(
            outcome.facts.revenue_leader.as_ref().unwrap().revenue,
            dec!(270000.00)
        );
        assert_eq!(
            outcome.summary[0],
            "The Toyota Corolla (2020) generated the most revenue: $270,000.00"
        );

        let html = std::fs::read_to_string(&job.output).unwrap();
        assert!(html.contains("<h1>Sales Data</h1>"));
        assert!(html.contains("<td>Toyota Corolla (2020)</td>"));
        assert!(html.contains("<td>$18000.00</td>"));

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "alice@example.com");
        assert_eq!(sent[0].body, outcome.summary.join("\n"));
        assert_eq!(sent[0].attachment.as_deref(), Some(job.output.as_path()));
    }

    #[test]
    fn test_run_attaches_pdf_report() {
        let tmp = TempDir::new().expect("tempdir");
        let job = job_in(tmp.path(), SALES, "pdf");
        let mailer = RecordingMailer::default();

        let outcome = run(&job, &PdfReport, Some(&mailer)).expect("run");

        let bytes = std::fs::read(&outcome.report_path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let sent = mailer.sent.borrow();
        let mime = sent[0]
            .to_mime()
            .expect("pdf attachment must encode");
        assert!(mime.contains("Content-Type: application/pdf"));
        assert!(mime.contains("filename=\"cars.pdf\""));
    }

    #[test]
    fn test_run_without_mailer() {
        let tmp = TempDir::new().expect("tempdir");
        let mut job = job_in(tmp.path(), SALES, "txt");
        job.recipient = None;

        let outcome = run(&job, &TextReport, None).expect("run");

        assert!(!outcome.mailed);
        let text = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(text.contains("The most popular year was 2020 with 25 sales."));
    }

    #[test]
    fn test_run_empty_batch_reports_no_data() {
        let tmp = TempDir::new().expect("tempdir");
        let job = job_in(tmp.path(), "[]", "txt");

        let outcome = run(&job, &TextReport, None).expect("run");

        assert_eq!(outcome.facts, SummaryFacts::default());
        assert!(outcome.summary[0].starts_with("No revenue data"));
        assert!(job.output.exists());
    }

    #[test]
    fn test_malformed_price_aborts_without_output() {
        let tmp = TempDir::new().expect("tempdir");
        let bad = SALES.replace("\"$18000.00\"", "\"18000.00\"");
        let job = job_in(tmp.path(), &bad, "html");
        let mailer = RecordingMailer::default();

        let err = run(&job, &HtmlReport, Some(&mailer)).unwrap_err();

        assert!(matches!(err, ReportError::Parse { id: 2, .. }));
        assert!(!job.output.exists(), "no partial report may be written");
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn test_negative_sales_aborts_without_output() {
        let tmp = TempDir::new().expect("tempdir");
        let bad = SALES.replace("\"total_sales\": 15", "\"total_sales\": -15");
        let job = job_in(tmp.path(), &bad, "html");

        let err = run(&job, &HtmlReport, None).unwrap_err();

        assert!(err.to_string().contains("record 2"));
        assert!(!job.output.exists());
    }

    #[test]
    fn test_missing_recipient_aborts_before_report() {
        let tmp = TempDir::new().expect("tempdir");
        let mut job = job_in(tmp.path(), SALES, "html");
        job.recipient = None;
        let mailer = RecordingMailer::default();

        let err = run(&job, &HtmlReport, Some(&mailer)).unwrap_err();

        assert!(matches!(err, ReportError::Config(_)));
        assert!(!job.output.exists());
    }

    #[test]
    fn test_missing_input_file() {
        let tmp = TempDir::new().expect("tempdir");
        let mut job = job_in(tmp.path(), SALES, "html");
        job.input = tmp.path().join("absent.json");

        let err = run(&job, &HtmlReport, None).unwrap_err();
        assert!(matches!(err, ReportError::FileRead { .. }));
    }
}
