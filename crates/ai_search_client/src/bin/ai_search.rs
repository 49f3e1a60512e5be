//! ai-search: terminal frontend for the AI search service.
//! Reads config, opens a WebSocket session per query, prints the streamed
//! answer, its sources and follow-up suggestions to stdout. Status lines and
//! errors go to stderr.

use std::io::{self, Read as _, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use ai_search_client::config;
use ai_search_client::{App, ClientError, Config, EventReceiver, Phase, Provider, ViewChange};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ai-search")]
#[command(about = "Ask the AI search service and stream the answer", version)]
struct Cli {
    /// Question to ask (read from stdin when absent)
    query: Vec<String>,

    /// Path to config file (default: $AI_SEARCH_CONFIG, then ~/.ai-search/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint of the search service
    #[arg(long)]
    url: Option<String>,

    /// Search provider to ask for
    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    /// Ask the service not to answer from its cache
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Read one query per line; `:N` asks suggestion N
    #[arg(short, long, default_value_t = false)]
    interactive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, ClientError> {
    let mut cfg = config::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        cfg.server.url = Some(url.clone());
    }
    if let Some(provider) = cli.provider {
        cfg.search.provider = Some(provider);
    }
    if cli.no_cache {
        cfg.search.use_cache = Some(false);
    }
    Ok(cfg)
}

/// Writes view changes to the terminal.
#[derive(Default)]
struct Printer {
    answer_started: bool,
}

impl Printer {
    fn show(&mut self, app: &App, changes: Vec<ViewChange>) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for change in changes {
            match change {
                ViewChange::Reset { query } => {
                    self.answer_started = false;
                    eprintln!("> {query}");
                }
                ViewChange::Status(status) => eprintln!("[{status}]"),
                ViewChange::AnswerSurfaceShown => {}
                ViewChange::AnswerAppended { fragment } => {
                    self.answer_started = true;
                    let _ = write!(out, "{fragment}");
                }
                ViewChange::AnswerReplaced { raw } => {
                    self.answer_started = true;
                    let _ = write!(out, "{raw}");
                }
                ViewChange::SourcesReplaced => {
                    let _ = writeln!(out, "Sources:");
                    for card in app.view().sources() {
                        let _ = writeln!(
                            out,
                            "  [{}] {} ({})\n      {}",
                            card.rank, card.title, card.domain, card.url
                        );
                    }
                    let _ = writeln!(out);
                }
                ViewChange::SuggestionsReplaced => {
                    if self.answer_started {
                        let _ = writeln!(out);
                        self.answer_started = false;
                    }
                    let _ = writeln!(out, "\nRelated:");
                    for (i, chip) in app.view().suggestions().chips().iter().enumerate() {
                        let _ = writeln!(out, "  :{} {}", i + 1, chip);
                    }
                }
                ViewChange::ProgressCleared => {
                    if self.answer_started {
                        let _ = writeln!(out);
                        self.answer_started = false;
                    }
                }
                ViewChange::Failed(message) => eprintln!("Error: {message}"),
            }
        }
        let _ = out.flush();
    }
}

async fn run_single(mut app: App, mut events: EventReceiver, query: &str) -> Phase {
    let mut printer = Printer::default();
    if !app.submit(query) {
        eprintln!("Error: no question provided (argument or stdin)");
        return app.phase();
    }
    loop {
        let changes = app.take_changes();
        printer.show(&app, changes);
        if app.is_settled() {
            break;
        }
        match events.recv().await {
            Some(event) => app.handle(event),
            None => break,
        }
    }
    app.phase()
}

async fn run_interactive(mut app: App, mut events: EventReceiver) -> Phase {
    let mut printer = Printer::default();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        let changes = app.take_changes();
        printer.show(&app, changes);
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_input(&mut app, &line),
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error: failed to read stdin: {e}");
                    break;
                }
            },
            Some(event) = events.recv() => app.handle(event),
        }
    }
    // Let the session in flight at end of input finish.
    app.run_until_settled(&mut events).await;
    let changes = app.take_changes();
    printer.show(&app, changes);
    app.phase()
}

fn handle_input(app: &mut App, line: &str) {
    let line = line.trim();
    if let Some(n) = line.strip_prefix(':').and_then(|n| n.trim().parse::<usize>().ok()) {
        if n == 0 || !app.activate_suggestion(n - 1) {
            eprintln!("No suggestion :{n}");
        }
        return;
    }
    app.submit(line);
}

fn read_query(cli: &Cli) -> String {
    if !cli.query.is_empty() {
        return cli.query.join(" ").trim().to_string();
    }
    let mut input = String::new();
    let _ = io::stdin().read_to_string(&mut input);
    input
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let query = if cli.interactive {
        String::new()
    } else {
        let query = read_query(&cli);
        if query.is_empty() {
            eprintln!("Error: no question provided (argument or stdin)");
            return ExitCode::FAILURE;
        }
        query
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let phase = rt.block_on(async {
        let (app, events) = App::new(&cfg);
        if cli.interactive {
            run_interactive(app, events).await
        } else {
            run_single(app, events, &query).await
        }
    });

    match phase {
        Phase::Failed => ExitCode::FAILURE,
        // One-shot mode never started a session.
        Phase::Idle if !cli.interactive => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
