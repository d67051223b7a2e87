mod cmd;

use anyhow::Context;
use clap::Parser;
use cmd::*;
use corpus_tally::cluster::{self, Reduction};
use corpus_tally::config::RunSettings;
use corpus_tally::corpus::Corpus;
use corpus_tally::tracer::setup_simple_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = setup_simple_tracing();
    let args = Args::parse();
    let mut settings = RunSettings::from_env().context("reading settings from the environment")?;

    match args.cmd {
        Command::Tally(tally) => {
            settings.top_k = tally.top;
            settings.classify = tally.classify;
            settings.output = tally.output.clone();
            let classifier = tally.classifier.handle(settings.classify_timeout);

            let corpus = Corpus::open(&tally.input)
                .await
                .with_context(|| format!("opening {}", tally.input.display()))?;
            let columns = corpus
                .columns(&tally.layout())
                .with_context(|| format!("resolving columns of {}", tally.input.display()))?;

            let Reduction { report, .. } = match &tally.listen {
                Some(address) => {
                    cluster::run_with_listener(address, &corpus, columns, &settings, classifier)
                        .await
                        .with_context(|| format!("coordinating remote workers on {address}"))?
                }
                None => cluster::run_local(&corpus, columns, &settings, classifier)
                    .await
                    .context("running local workers")?,
            };

            if tally.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Worker {
            connect,
            classifier,
        } => {
            let classifier = classifier.handle(settings.classify_timeout);
            cluster::run_remote_worker(&connect, classifier)
                .await
                .with_context(|| format!("serving coordinator at {connect}"))?;
        }
    }

    Ok(())
}
