//! mdcopy - Copy chat messages as Markdown

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use url::Url;

use mdcopy::dom::parse_html;
use mdcopy::inject::{Activation, MemoryClipboard};
use mdcopy::telemetry::LogTelemetry;
use mdcopy::{Bootstrap, Phase, Platform, Settings};

#[derive(Parser)]
#[command(name = "mdcopy")]
#[command(version, about = "Copy chat messages as Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    mdcopy chat.html --host chatgpt.com       Print every message as Markdown
    mdcopy chat.html --platform gemini        Same, naming the platform directly
    mdcopy chat.html --host chatgpt.com -x    Print the page with controls injected")]
struct Cli {
    /// Saved chat page (HTML)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Platform id (chatgpt, gemini)
    #[arg(short, long, conflicts_with = "host")]
    platform: Option<Platform>,

    /// Host name the page was saved from
    #[arg(long)]
    host: Option<String>,

    /// Settings JSON file
    #[arg(short, long, value_name = "FILE")]
    settings: Option<String>,

    /// Print the page HTML with controls injected instead of Markdown
    #[arg(short = 'x', long)]
    inject: bool,

    /// Suppress status messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let platform = match (cli.platform, cli.host.as_deref()) {
        (Some(platform), _) => platform,
        (None, Some(host)) => {
            Platform::detect(host).ok_or_else(|| format!("unsupported host: {host}"))?
        }
        (None, None) => return Err("pass --platform or --host".to_string()),
    };

    let settings = cli
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();

    let html = std::fs::read_to_string(&cli.input).map_err(|e| format!("{}: {e}", cli.input))?;
    let mut doc = parse_html(&html);
    if let Some(host) = cli.host.as_deref() {
        let base = Url::parse(&format!("https://{host}/")).map_err(|e| format!("{host}: {e}"))?;
        doc.set_base_url(base);
    }

    let mut boot = Bootstrap::for_platform(
        Some(platform),
        &settings,
        MemoryClipboard::new(),
        Box::new(LogTelemetry),
    );

    // One tick far enough out covers every startup wait and the first scan.
    let timing = settings.timing;
    let mut now = timing.ready_timeout() + timing.settle() + timing.debounce();
    boot.tick(&mut doc, Duration::ZERO);
    boot.tick(&mut doc, now);
    if boot.phase() != Phase::Running {
        return Err("page never became ready".to_string());
    }

    let buttons = boot
        .controller()
        .map(|c| c.controls(&doc))
        .unwrap_or_default();

    if cli.inject {
        println!("{}", doc.outer_html(doc.root()));
        if !cli.quiet {
            eprintln!("Injected {} controls ({platform})", buttons.len());
        }
        return Ok(());
    }

    if buttons.is_empty() {
        return Err(format!("no {platform} messages found in {}", cli.input));
    }

    let mut messages = Vec::new();
    for button in buttons {
        now += timing.feedback();
        match boot.activate(&mut doc, button, now) {
            Activation::Copied { .. } => {
                if let Some(markdown) = boot.controller().and_then(|c| c.clipboard().contents()) {
                    messages.push(markdown.to_string());
                }
            }
            other => log::warn!("control {button:?}: {other:?}"),
        }
        boot.tick(&mut doc, now);
    }

    println!("{}", messages.join("\n\n---\n\n"));
    if !cli.quiet {
        eprintln!("Converted {} messages ({platform})", messages.len());
    }
    Ok(())
}
