// Terminal front end for the cadrage wizard
//
// Drives the questionnaire on stdin against a running backend: loads the
// question catalog, walks the conditional questions, submits the cadrage,
// configures anonymisation and then follows the generation pipeline until
// it completes or fails. All wizard logic lives in the library; this binary
// is only the I/O shell.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use cadrage_wizard::catalog::{load_catalog, QuestionCatalog};
use cadrage_wizard::client::{BackendClient, SubmissionSink};
use cadrage_wizard::events;
use cadrage_wizard::generation::{GenerationEvent, GenerationPoller, StepState};
use cadrage_wizard::wizard::anonymization::AnonymMapping;
use cadrage_wizard::{
    AdvanceOutcome, AnswerValue, Question, QuestionType, RetreatOutcome, WizardConfig,
    WizardSession,
};

#[derive(Parser, Debug)]
#[command(name = "cadrage-wizard", about = "Assistant de cadrage en ligne de commande")]
struct Cli {
    /// Project id on the backend
    #[arg(long)]
    project_id: String,

    /// Backend base URL (overrides the config file)
    #[arg(long, env = "CADRAGE_BACKEND_URL")]
    backend_url: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local question catalog (YAML); fetched from the backend when unset
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => WizardConfig::load(path)?,
        None => WizardConfig::default(),
    };
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    let client = Arc::new(BackendClient::new(config.backend_url.clone()));

    let catalog = match cli.catalog.or(config.catalog_path.clone()) {
        Some(path) => load_catalog(&path)?,
        None => client
            .get_questions(&cli.project_id)
            .await
            .context("cannot load questions from backend")?,
    };

    let mut session = WizardSession::new();
    session.attach_project(cli.project_id.clone(), None);

    if !run_questionnaire(&mut session, &catalog, client.as_ref(), &cli.project_id).await? {
        println!("Cadrage abandonné.");
        return Ok(());
    }

    let mappings = prompt_anonymization()?;
    client
        .submit_anonymization(&cli.project_id, &mappings)
        .await
        .context("anonymisation submission failed")?;

    client
        .start_generation(&cli.project_id)
        .await
        .context("cannot start generation")?;
    session.begin_generation();

    follow_generation(client, config, cli.project_id).await
}

/// Walk the questionnaire until submission. Returns false when the user
/// backs out from the first question.
async fn run_questionnaire(
    session: &mut WizardSession,
    catalog: &QuestionCatalog,
    sink: &dyn SubmissionSink,
    project_id: &str,
) -> Result<bool> {
    session.begin_cadrage(catalog);

    loop {
        let Some(navigator) = session.navigator.as_mut() else {
            return Ok(false);
        };
        let Some(question) = navigator.current().cloned() else {
            break;
        };

        let (position, total) = navigator.position();
        println!("\nQuestion {} / {}", position, total);
        print_question(&question);

        let line = read_line("> ")?;
        if line.trim() == "retour" {
            if navigator.retreat(None) == RetreatOutcome::ExitedToStructure {
                session.exit_cadrage_to_structure();
                return Ok(false);
            }
            continue;
        }

        let raw = parse_input(&question, &line);
        match navigator.advance(raw) {
            AdvanceOutcome::Moved | AdvanceOutcome::Ignored => {}
            AdvanceOutcome::Submitted(submission) => {
                let verbosity = submission.verbosity_level;
                loop {
                    match sink.submit_cadrage(project_id, &submission).await {
                        Ok(()) => {
                            let payload =
                                events::CadrageSubmittedPayload::new(project_id, &submission);
                            log::debug!(
                                "{}: {}",
                                events::EVENT_CADRAGE_SUBMITTED,
                                serde_json::to_string(&payload).unwrap_or_default()
                            );
                            session.finish_cadrage(verbosity);
                            println!("Cadrage validé (verbosité {}).", verbosity);
                            return Ok(true);
                        }
                        Err(err) if err.is_retryable() => {
                            println!("Échec de l'envoi : {}", err);
                            let again = read_line("Réessayer ? (o/n) ")?;
                            if !again.trim().eq_ignore_ascii_case("o") {
                                if let Some(nav) = session.navigator.as_mut() {
                                    nav.submission_failed();
                                }
                                return Ok(false);
                            }
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
    }

    Ok(true)
}

fn print_question(question: &Question) {
    println!("{}", question.text);
    if let Some(options) = &question.options {
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        if question.multi {
            println!("  (choix multiples : numéros séparés par des virgules, vide pour passer)");
        } else {
            println!("  (numéro du choix, vide pour passer)");
        }
    } else if question.question_type == QuestionType::Number {
        println!("  (nombre, vide pour passer)");
    }
    println!("  (« retour » pour revenir en arrière)");
}

/// Map a raw stdin line onto an answer for the given question
fn parse_input(question: &Question, line: &str) -> Option<AnswerValue> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(options) = &question.options else {
        return Some(AnswerValue::Text(line.to_string()));
    };

    let pick = |token: &str| -> Option<String> {
        let index: usize = token.trim().parse().ok()?;
        options.get(index.checked_sub(1)?).cloned()
    };

    if question.multi {
        let selected: Vec<String> = line.split(',').filter_map(|t| pick(t)).collect();
        if selected.is_empty() {
            None
        } else {
            Some(AnswerValue::Many(selected))
        }
    } else {
        pick(line).map(AnswerValue::Text)
    }
}

/// Collect anonymisation rows as "terme = ALIAS" lines, empty line to finish
fn prompt_anonymization() -> Result<Vec<AnonymMapping>> {
    println!("\nAnonymisation — « terme réel = ALIAS », ligne vide pour terminer :");
    let mut mappings = Vec::new();
    loop {
        let line = read_line("> ")?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        match line.split_once('=') {
            Some((real, alias)) => {
                mappings.push(AnonymMapping::new(real.trim(), alias.trim()));
            }
            None => println!("Format attendu : terme réel = ALIAS"),
        }
    }
    Ok(mappings)
}

/// Poll the generation job and redraw the pipeline until a terminal state
async fn follow_generation(
    client: Arc<BackendClient>,
    config: WizardConfig,
    project_id: String,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut poller = GenerationPoller::with_config(client, tx, config.poller_config());
    let poll_id = poller.start(project_id);

    while let Some(event) = rx.recv().await {
        // Drop anything from a superseded loop
        if event.poll_id() != poll_id {
            continue;
        }
        let (name, payload) = events::wire_event(&event);
        log::debug!("{}: {}", name, payload);
        match event {
            GenerationEvent::StageChanged {
                pct,
                step_label,
                stages,
                ..
            } => {
                println!("\n[{:>3} %] {}", pct, step_label);
                for stage in stages {
                    let marker = match stage.state {
                        StepState::Done => "✓",
                        StepState::Active => "▶",
                        StepState::Pending => "·",
                    };
                    println!("  {} {}", marker, stage.label);
                }
            }
            GenerationEvent::Completed { project_id, .. } => {
                println!("\nGénération terminée pour {}.", project_id);
                return Ok(());
            }
            GenerationEvent::Failed { message, .. } => {
                anyhow::bail!("génération échouée : {}", message);
            }
        }
    }

    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
