mod tui;

use std::io::{IsTerminal, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use moviemagic_core::backend::{MovieBackend, WeaviateClient};
use moviemagic_core::config::{MovieConfig, Secrets};
use moviemagic_core::grid::{ResultCell, ResultGrid};
use moviemagic_core::model::{SearchMode, SearchResultRow, DEFAULT_YEARS};
use moviemagic_core::prompts::{self, EXAMPLES};
use moviemagic_core::session::{self, ChatSession, CycleOutcome, ResultsOutcome, SearchForm};
use moviemagic_core::typewriter::{self, CURSOR};
use moviemagic_core::MovieError;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "moviemagic",
    about = "Movie Magic Hub: movie recommendations from Weaviate hybrid search",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal chat (default)
    Chat,
    /// Run one search and recommendation, then exit
    Search {
        /// What type of movie you are looking for
        query: String,
        /// The viewing occasion, used as the recommendation task
        #[arg(short, long, default_value = "")]
        occasion: String,
        /// Ranking mode (keyword, semantic, hybrid)
        #[arg(short, long, default_value = "hybrid")]
        mode: SearchMode,
        /// First release year to include
        #[arg(long, default_value_t = DEFAULT_YEARS.0)]
        from: u16,
        /// Last release year to include
        #[arg(long, default_value_t = DEFAULT_YEARS.1)]
        to: u16,
        /// Skip the generated recommendation
        #[arg(long)]
        no_summary: bool,
        /// Output raw JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// List the example prompts
    Examples,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Chat);
    init_tracing(matches!(command, Command::Chat));

    let config = MovieConfig::load(Some(&std::env::current_dir()?)).unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e}");
        MovieConfig::default_config()
    });

    let result = run(command, &config).await;
    if let Err(ref err) = result {
        if let Some(friendly) = format_backend_error(err) {
            eprintln!("{friendly}");
            std::process::exit(1);
        }
    }
    result
}

/// The chat owns the terminal, so it only logs when `RUST_LOG` asks for it.
fn init_tracing(interactive: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if interactive => return,
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(command: Command, config: &MovieConfig) -> Result<()> {
    match command {
        Command::Chat => {
            let backend = connect(config)?;
            tui::run_tui(config, backend).await
        }
        Command::Search {
            query,
            occasion,
            mode,
            from,
            to,
            no_summary,
            json,
        } => {
            let backend = connect(config)?;
            let form = SearchForm {
                query,
                occasion,
                mode,
                year_from: from,
                year_to: to,
            };
            let mut stdout = std::io::stdout();
            cmd_search(&backend, config, &form, no_summary, json, &mut stdout).await
        }
        Command::Examples => {
            cmd_examples();
            Ok(())
        }
        Command::Config => cmd_config(config),
    }
}

/// Read the secrets and build the client. A missing secret ends the process
/// before anything connects.
fn connect(config: &MovieConfig) -> Result<WeaviateClient> {
    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            eprintln!("{}", format!("🚨 {e}").red());
            std::process::exit(1);
        }
    };
    WeaviateClient::new(&secrets, &config.weaviate).context("failed to create Weaviate client")
}

/// Connection failures get a hint instead of the raw error chain.
fn format_backend_error(err: &anyhow::Error) -> Option<String> {
    let movie_err = err.chain().find_map(|e| e.downcast_ref::<MovieError>())?;
    if !movie_err.is_unavailable() {
        return None;
    }
    Some(format!(
        "{}\n\n  {movie_err}\n  Check that WEAVIATE_URL points at a running cluster.\n",
        "Error: Weaviate unavailable".red()
    ))
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    mode: SearchMode,
    from: u16,
    to: u16,
    results: &'a [SearchResultRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'a str>,
}

async fn cmd_search<B: MovieBackend, W: Write>(
    backend: &B,
    config: &MovieConfig,
    form: &SearchForm,
    no_summary: bool,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let mut session = ChatSession::new();

    let (rows, passage, notice) = if no_summary {
        let prepared = session.begin_search(form, &config.search)?;
        let rows = backend
            .search(&prepared.query)
            .await
            .context("search failed")?;
        match session.record_results(&prepared, &rows, config.search.row_width) {
            ResultsOutcome::NoMatches { notice } => (rows, None, Some(notice)),
            ResultsOutcome::Found { .. } => (rows, None, None),
        }
    } else {
        match session::run_cycle(&mut session, backend, &config.search, form)
            .await
            .context("recommendation failed")?
        {
            CycleOutcome::NoMatches { notice } => (Vec::new(), None, Some(notice)),
            CycleOutcome::Recommended { rows, passage, .. } => (rows, Some(passage), None),
        }
    };

    if json {
        let output = SearchOutput {
            query: &form.query,
            mode: form.mode,
            from: form.year_from,
            to: form.year_to,
            results: &rows,
            recommendation: passage.as_deref(),
            notice: notice.as_deref(),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    if let Some(user_turn) = session.conversation().turns().first() {
        writeln!(out, "{}", user_turn.content.replace("**", "").bold())?;
    }

    if let Some(notice) = notice {
        writeln!(out, "{}", notice.dimmed())?;
        return Ok(());
    }

    writeln!(out, "{}", prompts::FOUND_NOTICE.dimmed())?;
    write_grid(out, &ResultGrid::from_rows(&rows, config.search.row_width), &rows)?;

    if let Some(passage) = passage {
        writeln!(out, "\n{}", prompts::GENERATING_NOTICE.dimmed())?;
        write!(out, "{}", prompts::SUMMARY_PREFIX.magenta())?;
        let delay = if std::io::stdout().is_terminal() {
            Duration::from_millis(config.ui.stream_delay_ms)
        } else {
            Duration::ZERO
        };
        let mut shown = 0;
        typewriter::animate(&passage, delay, |frame| {
            let text = frame.trim_end_matches(CURSOR);
            if let Some(new) = text.get(shown..) {
                let _ = write!(out, "{new}");
                let _ = out.flush();
            }
            shown = text.len();
        })
        .await;
        writeln!(out)?;
    }

    Ok(())
}

fn write_grid<W: Write>(out: &mut W, grid: &ResultGrid, rows: &[SearchResultRow]) -> Result<()> {
    let mut index = 0;
    for row in grid.rows() {
        for cell in row {
            let tagline = rows.get(index).map(|r| r.tagline.as_str()).unwrap_or("");
            index += 1;
            let marker = match cell {
                ResultCell::Poster { .. } => "🖼",
                ResultCell::Title { .. } => " ",
            };
            writeln!(
                out,
                "  {:>2}. {} {}  {}",
                index.dimmed(),
                marker,
                cell.title().cyan(),
                tagline.dimmed()
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// examples / config
// ---------------------------------------------------------------------------

fn cmd_examples() {
    for (i, example) in EXAMPLES.iter().enumerate() {
        println!("  {}  {}", format!("F{}", i + 1).cyan(), example.label().bold());
        println!("      {}", example.help.dimmed());
    }
    println!(
        "\n  Try: {}",
        format!(
            "moviemagic search \"{}\" --occasion \"{}\"",
            EXAMPLES[0].movie_type, EXAMPLES[0].occasion
        )
        .cyan()
    );
}

fn cmd_config(config: &MovieConfig) -> Result<()> {
    let note = "# Effective configuration (global, project, then local overrides)\n\n";
    print!("{}{}", note, toml::to_string_pretty(config)?);
    Ok(())
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use moviemagic_core::backend::{GroupedTask, HybridQuery};

    struct FixedBackend {
        rows: Vec<SearchResultRow>,
    }

    impl MovieBackend for FixedBackend {
        async fn search(&self, _query: &HybridQuery) -> moviemagic_core::Result<Vec<SearchResultRow>> {
            Ok(self.rows.clone())
        }

        async fn generate_grouped(
            &self,
            _query: &HybridQuery,
            _task: &GroupedTask,
        ) -> moviemagic_core::Result<String> {
            Ok("A perfect pick.".into())
        }
    }

    fn heat() -> SearchResultRow {
        SearchResultRow {
            title: "Heat".into(),
            tagline: "A Los Angeles crime saga".into(),
            poster: None,
        }
    }

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::try_parse_from(["moviemagic"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "moviemagic",
            "search",
            "noir",
            "--mode",
            "keyword",
            "--from",
            "1995",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Search {
                query,
                mode,
                from,
                to,
                json,
                ..
            }) => {
                assert_eq!(query, "noir");
                assert_eq!(mode, SearchMode::Keyword);
                assert_eq!((from, to), (1995, 2024));
                assert!(json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["moviemagic", "search", "x", "--mode", "fuzzy"]).is_err());
    }

    async fn run_search(backend: &FixedBackend, form: &SearchForm, no_summary: bool, json: bool) -> String {
        let config = MovieConfig::default_config();
        let mut out = Vec::new();
        cmd_search(backend, &config, form, no_summary, json, &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_cmd_search_json() {
        let backend = FixedBackend { rows: vec![heat()] };
        let form = SearchForm {
            query: "crime".into(),
            ..SearchForm::default()
        };
        let out = run_search(&backend, &form, false, true).await;
        let json: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(json["query"], "crime");
        assert_eq!(json["mode"], "hybrid");
        assert_eq!(json["results"][0]["title"], "Heat");
        assert_eq!(json["recommendation"], "A perfect pick.");
        assert!(json.get("notice").is_none());
    }

    #[tokio::test]
    async fn test_cmd_search_text_output() {
        let backend = FixedBackend { rows: vec![heat()] };
        let form = SearchForm {
            query: "crime".into(),
            ..SearchForm::default()
        };
        let out = run_search(&backend, &form, false, false).await;
        assert!(out.contains("I'm looking for a crime movie."));
        assert!(out.contains("Heat"));
        assert!(out.contains("A Los Angeles crime saga"));
        assert!(out.contains("A perfect pick."));
        assert!(!out.contains(CURSOR));
    }

    #[tokio::test]
    async fn test_cmd_search_no_results() {
        let backend = FixedBackend { rows: Vec::new() };
        let form = SearchForm {
            query: "noir".into(),
            ..SearchForm::default()
        };
        let out = run_search(&backend, &form, true, false).await;
        assert!(out.contains("Sorry, no movies matched your search for noir using Hybrid mode."));
        assert!(!out.contains(prompts::FOUND_NOTICE));

        let json: serde_json::Value =
            serde_json::from_str(run_search(&backend, &form, true, true).await.trim()).unwrap();
        assert_eq!(json["results"].as_array().unwrap().len(), 0);
        assert!(json["notice"].as_str().unwrap().contains("noir"));
        assert!(json.get("recommendation").is_none());
    }

    #[tokio::test]
    async fn test_cmd_search_reversed_years_fails() {
        let backend = FixedBackend { rows: vec![heat()] };
        let config = MovieConfig::default_config();
        let form = SearchForm {
            query: "crime".into(),
            year_from: 2020,
            year_to: 2000,
            ..SearchForm::default()
        };
        let err = cmd_search(&backend, &config, &form, false, false, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("reversed"));
    }

    #[test]
    fn test_unavailable_error_gets_hint() {
        let err = anyhow::Error::new(MovieError::Backend("search returned 503".into()))
            .context("recommendation failed");
        let friendly = format_backend_error(&err).unwrap();
        assert!(friendly.contains("WEAVIATE_URL"));

        let rejected = anyhow::Error::new(MovieError::InvalidInput("bad".into()));
        assert!(format_backend_error(&rejected).is_none());
    }

    #[test]
    fn test_config_renders_as_toml() {
        let config = MovieConfig::default_config();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("collection = \"MovieDemo\""));
    }
}
