use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sentinel_core::prelude::*;
use sentinel_core::{FileSessionStore, SESSION_KEY};
use sentinel_state::{Percentage, Severity};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_STATEMENT: &[u8] = b"date,description,amount\n\
2024-01-02,PAYROLL ACME CORP,4200.00\n\
2024-01-05,RENT,-1650.00\n\
2024-01-09,UTILITIES,-142.17\n";

fn cli() -> Command {
    Command::new("sentinel")
        .version(sentinel_core::VERSION)
        .about("Verifiable financial identity demo engine")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the end-to-end verification flow with compressed delays")
                .arg(
                    Arg::new("identifier")
                        .long("identifier")
                        .default_value("demo@sentinel.dev")
                        .help("Email or phone used to log in"),
                )
                .arg(
                    Arg::new("phase-delay-ms")
                        .long("phase-delay-ms")
                        .default_value("250")
                        .value_parser(value_parser!(u64))
                        .help("Pause between pipeline phases"),
                )
                .arg(
                    Arg::new("risk")
                        .long("risk")
                        .default_value("35")
                        .value_parser(value_parser!(u32))
                        .help("Risk score reported by the simulated document analysis"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the final state as JSON"),
                ),
        )
        .subcommand(
            Command::new("session")
                .about("Inspect the persisted session")
                .subcommand_required(true)
                .arg(
                    Arg::new("path")
                        .long("path")
                        .global(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Session directory (defaults to the configured one)"),
                )
                .subcommand(Command::new("show").about("Print the persisted session record"))
                .subcommand(Command::new("clear").about("Erase the persisted session record")),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(config, args).await,
        Some(("session", args)) => session(&config, args),
        Some(("config", _)) => {
            print!("{}", config.to_toml_string().context("rendering configuration")?);
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}

fn phase_delay(args: &ArgMatches) -> Duration {
    let millis = args.get_one::<u64>("phase-delay-ms").copied().unwrap_or(250);
    Duration::from_millis(millis)
}

async fn simulate(config: EngineConfig, args: &ArgMatches) -> Result<()> {
    let identifier = args
        .get_one::<String>("identifier")
        .map_or("demo@sentinel.dev", String::as_str);
    let phase_delay = phase_delay(args);
    let risk = Percentage::new(args.get_one::<u32>("risk").copied().unwrap_or(35))
        .context("--risk must be between 0 and 100")?;
    let json = args.get_flag("json");

    let backend = sentinel_core::session_backend_for(&config);
    let engine = SentinelEngine::start(config, backend, Arc::new(DigestBackend))
        .context("starting engine")?;
    engine.set_has_launched(true);

    if !engine.store().snapshot().is_authenticated {
        engine
            .session()
            .login_with_credentials(&Credentials::new(identifier, "demo-password"))
            .context("logging in")?;
    }
    if let Some(user) = &engine.store().snapshot().user {
        info!(user = user.display_name(), "signed in");
    }

    engine.pipeline().handle(PipelineSignal::InterviewStarted);
    tokio::time::sleep(phase_delay).await;
    engine.pipeline().handle(PipelineSignal::InterviewCompleted);

    let doc = engine
        .documents()
        .upload_document("statement.csv", SAMPLE_STATEMENT)
        .context("uploading sample statement")?;
    let assessment = engine.scorer().score_with_fallback(SAMPLE_STATEMENT).await;
    info!(score = assessment.score, source = ?assessment.source, "credit assessment");

    let mut phase = Some(Phase::Upload);
    while let Some(current) = phase {
        engine.pipeline().handle(current);
        if current == Phase::Scan {
            engine.documents().record_analysis(
                doc.id,
                AnalysisOutcome::analyzed(risk, ["Account Number", "Employer"]),
            );
        }
        tokio::time::sleep(phase_delay).await;
        phase = current.next();
    }

    engine.proofs().generate()?.wait().await;
    engine.proofs().submit()?.wait().await;

    let state = engine.store().snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&*state)?);
        return Ok(());
    }

    println!("Credit score: {} ({:?})", assessment.score, assessment.source);
    if let Some(proof_id) = &state.zk_proof.proof_id {
        println!("Proof: {proof_id} ({:?})", state.zk_proof.status);
    }
    println!("Agents:");
    for agent in &state.agents {
        println!("  {:<18} {:?}", agent.name, agent.status);
    }
    println!("Activity (newest first):");
    for event in state.activities_at_least(Severity::Info) {
        println!("  [{:?}] {} - {}", event.severity, event.title, event.description);
    }
    Ok(())
}

fn session(config: &EngineConfig, args: &ArgMatches) -> Result<()> {
    let dir = args
        .get_one::<PathBuf>("path")
        .cloned()
        .or_else(|| config.session_path.clone())
        .context("no session directory: pass --path or set session_path")?;
    let store = FileSessionStore::new(dir);

    match args.subcommand() {
        Some(("show", _)) => {
            match store.load(SESSION_KEY)? {
                Some(raw) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("session record is not JSON")?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                None => println!("No persisted session"),
            }
            Ok(())
        }
        Some(("clear", _)) => {
            store.remove(SESSION_KEY)?;
            println!("Session cleared");
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}
