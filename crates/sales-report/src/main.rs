mod bootstrap;

use anyhow::{bail, Context, Result};
use sales_core::settings::Settings;
use sales_runtime::mail::{MailDispatcher, OutboxDispatcher, SendmailDispatcher};
use sales_runtime::pipeline::{self, ReportJob};
use sales_runtime::report::ReportFormat;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Sales report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Format: {}, Mailer: {}, Title: {}",
        settings.format,
        settings.mailer,
        settings.title
    );

    let format: ReportFormat = settings.format.parse()?;

    let Some(input) = settings.input.clone().or_else(bootstrap::discover_input) else {
        bail!(
            "no sales data found; pass --input or place {} in the current directory",
            bootstrap::DEFAULT_INPUT_NAME
        );
    };

    let job = ReportJob {
        input,
        output: settings
            .output
            .clone()
            .unwrap_or_else(|| bootstrap::default_output(format)),
        title: settings.title.clone(),
        number_format: settings.number_format()?,
        sender: settings.sender.clone(),
        recipient: settings.recipient.clone(),
        subject: settings.subject.clone(),
    };

    let mailer: Option<Box<dyn MailDispatcher>> = match settings.mailer.as_str() {
        "outbox" => Some(Box::new(OutboxDispatcher::new(
            settings
                .outbox_dir
                .clone()
                .unwrap_or_else(bootstrap::default_outbox_dir),
        ))),
        "sendmail" => Some(Box::new(SendmailDispatcher::new(
            settings.sendmail_path.clone(),
        ))),
        "none" => None,
        unknown => bail!("Unknown mailer: {}", unknown),
    };

    let renderer = format.renderer();
    let outcome = pipeline::run(&job, renderer.as_ref(), mailer.as_deref())
        .with_context(|| format!("could not build report from {}", job.input.display()))?;

    for line in &outcome.summary {
        println!("{line}");
    }
    println!("Report written to {}", outcome.report_path.display());

    Ok(())
}
