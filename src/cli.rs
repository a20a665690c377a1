use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;
use zeroshot_rs::model::DEFAULT_INFERENCE_BASE;
use zeroshot_rs::results::ResultRow;
use zeroshot_rs::{HttpClassifier, Mode, Model, Submission, TableView, parse_labels, run_classification};

#[derive(Parser, Debug)]
#[command(
    name = "zeroshot-rs",
    about = "Zero-shot keyphrase classification via hosted inference",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify keyphrases once and print the scores.
    Classify {
        /// Keyphrases to classify; read one per line from stdin when omitted.
        keyphrases: Vec<String>,
        /// Comma-separated classification labels (2 or 3).
        #[arg(short, long, default_value = "Transactional,Informational")]
        labels: String,
        /// Remote model to use.
        #[arg(short, long, default_value = "distil-bart")]
        model: Model,
        /// Use your own API key instead of the demo token.
        #[arg(long)]
        unlocked: bool,
        /// API key used in unlocked mode.
        #[arg(long, env = "HF_API_KEY", hide_env_values = true, default_value = "")]
        api_key: String,
        /// Shared token used in demo mode.
        #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
        demo_token: Option<String>,
        /// Base URL the model path is appended to.
        #[arg(long, default_value = DEFAULT_INFERENCE_BASE)]
        inference_base: String,
        /// Also write the results as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Run the web form.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used for canonical links.
        #[arg(long)]
        base_url: Option<String>,
        /// Base URL the model path is appended to.
        #[arg(long, default_value = DEFAULT_INFERENCE_BASE)]
        inference_base: String,
        /// Shared token used in demo mode.
        #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
        demo_token: Option<String>,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    match cli.command {
        Command::Classify {
            keyphrases,
            labels,
            model,
            unlocked,
            api_key,
            demo_token,
            inference_base,
            csv,
        } => {
            init_tracing("warn");
            let submission = Submission {
                mode: if unlocked { Mode::Unlocked } else { Mode::Demo },
                api_key,
                model,
                labels: parse_labels(&labels),
                keyphrase_text: read_keyphrases(keyphrases)?,
            };
            let classifier = HttpClassifier::new(inference_base);
            let outcome = runtime.block_on(run_classification(
                &classifier,
                &submission,
                demo_token.as_deref(),
            ))?;
            if let Some(notice) = &outcome.notice {
                eprintln!("note: {notice}");
            }
            if let Some(path) = csv {
                let bytes = outcome.table.to_csv(&TableView::default(), &[])?;
                fs::write(&path, bytes)?;
                eprintln!("wrote {}", path.display());
            }
            if cli.json {
                let payload = json!({
                    "model": model.key(),
                    "notice": outcome.notice,
                    "rows": outcome.table.rows,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_results(&outcome.table.rows);
            }
            Ok(())
        }
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            base_url,
            inference_base,
            demo_token,
        } => {
            init_tracing("info");
            let config = zeroshot_rs::web::WebConfig {
                addr,
                base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
                inference_base,
                demo_token,
            };
            runtime.block_on(zeroshot_rs::web::serve(config))?;
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_keyphrases(args: Vec<String>) -> Result<String, Box<dyn Error>> {
    if !args.is_empty() {
        return Ok(args.join("\n"));
    }
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text.replace("\r\n", "\n"))
}

fn print_results(rows: &[ResultRow]) {
    if rows.is_empty() {
        println!("No results.");
        return;
    }
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let markdown = results_markdown(rows);
        let formatted = FmtText::from(&skin, &markdown, Some(markdown_width()));
        println!("{formatted}");
        return;
    }
    let width = rows
        .iter()
        .map(|row| row.keyphrase.chars().count())
        .max()
        .unwrap_or(0)
        .max("KEYPHRASE".len());
    println!("{:<5} {:<width$}  {}", "#", "KEYPHRASE", "SCORES", width = width);
    println!("{:-<5} {:-<width$}  {}", "", "", "------", width = width);
    for row in rows {
        println!(
            "{:<5} {:<width$}  {}",
            row.index,
            row.keyphrase,
            score_pairs(row),
            width = width
        );
    }
}

fn results_markdown(rows: &[ResultRow]) -> String {
    let mut out = String::from("|#|keyphrase|labels|classification scores|\n|-:|-|-|-|\n");
    for row in rows {
        out.push_str(&format!(
            "|{}|{}|{}|{}|\n",
            row.index,
            row.keyphrase.replace('|', "\\|"),
            row.labels.join(", ").replace('|', "\\|"),
            row.scores.join(", ")
        ));
    }
    out
}

fn score_pairs(row: &ResultRow) -> String {
    row.labels
        .iter()
        .zip(&row.scores)
        .map(|(label, score)| format!("{label} {score}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ResultRow {
        ResultRow {
            index: 0,
            keyphrase: "a|b".into(),
            labels: vec!["Positive".into(), "Negative".into()],
            scores: vec!["97.34%".into(), "2.66%".into()],
        }
    }

    #[test]
    fn markdown_table_escapes_pipes() {
        let markdown = results_markdown(&[row()]);
        assert!(markdown.contains("|0|a\\|b|Positive, Negative|97.34%, 2.66%|"));
    }

    #[test]
    fn score_pairs_follow_label_order() {
        assert_eq!(score_pairs(&row()), "Positive 97.34%, Negative 2.66%");
    }

    #[test]
    fn classify_arguments_parse() {
        let cli = Cli::try_parse_from([
            "zeroshot-rs",
            "--json",
            "classify",
            "--labels",
            "Positive,Negative",
            "--model",
            "bart-large",
            "I love this",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Classify {
                keyphrases, model, labels, ..
            } => {
                assert_eq!(keyphrases, vec!["I love this"]);
                assert_eq!(model, Model::BartLarge);
                assert_eq!(parse_labels(&labels), vec!["Positive", "Negative"]);
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected classify"),
        }
    }
}
