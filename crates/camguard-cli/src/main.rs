//! Thin entry point: parses targets off the command line, builds the
//! validated config from the environment, and drives one assessment
//! session through to its report.

use camguard_config::AssessmentConfig;
use camguard_core::TargetSpec;
use camguard_discovery::SubprocessScanner;
use camguard_workflow::{MarkdownReportGenerator, NoopExploitationRunner, WorkflowEngine};
use std::process::ExitCode;

fn usage() -> ! {
    eprintln!("usage: camguard <target> [target ...]");
    eprintln!("  target: an IP address (203.0.113.10) or a CIDR range (203.0.113.0/24)");
    eprintln!("  tuning is read from CAMGUARD_* environment variables, see camguard-config");
    std::process::exit(2);
}

fn parse_target(arg: &str) -> TargetSpec {
    if arg.contains('/') {
        TargetSpec::cidr(arg, vec![])
    } else {
        match arg.parse() {
            Ok(ip) => TargetSpec::host(ip, vec![]),
            Err(_) => {
                eprintln!("not a valid IP address or CIDR range: {arg}");
                usage();
            }
        }
    }
}

fn session_id() -> String {
    format!("session-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut config = AssessmentConfig::from_env();
    config.targets = args.iter().map(|a| parse_target(a)).collect();

    let session_id = session_id();
    let session_dir = std::env::var("CAMGUARD_SESSION_DIR")
        .unwrap_or_else(|_| format!("./camguard-sessions/{session_id}"));

    tracing::info!(session = %session_id, dir = %session_dir, targets = args.len(), "starting assessment");

    let engine = WorkflowEngine::new(
        config.clone(),
        &session_dir,
        SubprocessScanner::default(),
        NoopExploitationRunner,
        MarkdownReportGenerator {
            severity_threshold: config.reporting.severity_threshold,
            include_poc: config.reporting.include_poc,
        },
    );

    match engine.run(session_id).await {
        Ok(metrics) => {
            println!("assessment {} finished: {:?}", metrics.session_id, metrics.status);
            println!("  hosts discovered:      {}", metrics.summary.hosts_discovered);
            println!("  hosts fingerprinted:   {}", metrics.summary.hosts_fingerprinted);
            println!("  credentials found:     {}", metrics.summary.credentials_found);
            println!("  vulnerabilities found: {}", metrics.summary.vulnerabilities_found);
            println!("  exposure findings:     {}", metrics.summary.findings_found);
            println!(
                "  report: {}/deliverables/security_assessment_report.md",
                session_dir
            );
            match metrics.status {
                camguard_core::SessionStatus::Completed => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            eprintln!("assessment failed to start: {err}");
            ExitCode::FAILURE
        }
    }
}
