use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use corpus_tally::classify::{ClassifierHandle, OllamaClassifier};
use corpus_tally::config::DEFAULT_TOP_K;
use corpus_tally::corpus::{ColumnLayout, Columns};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(version, about = "Count categories and words across a delimited corpus")]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Tally a corpus. Worker count comes from CORPUS_TALLY_WORKERS.
    Tally(TallyArgs),
    /// Join a coordinator started with `tally --listen` and serve one range.
    Worker {
        #[arg(short, long)]
        connect: String,
        #[clap(flatten)]
        classifier: ClassifierArgs,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Columns by position
    Fixed,
    /// Columns by header name
    Named,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TallyArgs {
    #[arg(default_value = "corpus.csv")]
    pub input: PathBuf,
    #[arg(short = 'k', long = "top", default_value_t = DEFAULT_TOP_K)]
    pub top: usize,
    #[arg(long, value_enum, default_value_t = LayoutKind::Fixed)]
    pub columns: LayoutKind,
    #[arg(long, default_value = "artist")]
    pub category_column: String,
    #[arg(long, default_value = "text")]
    pub text_column: String,
    #[arg(long, default_value_t = 0)]
    pub category_index: usize,
    #[arg(long, default_value_t = 3)]
    pub text_index: usize,
    /// Label every record through the classifier
    #[arg(long)]
    pub classify: bool,
    /// Write the corpus again with a `sentiment` column
    #[arg(short, long, requires = "classify")]
    pub output: Option<PathBuf>,
    #[clap(flatten)]
    pub classifier: ClassifierArgs,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
    /// Wait on this address for remote workers instead of spawning local ones
    #[arg(short, long)]
    pub listen: Option<String>,
}

impl TallyArgs {
    pub fn layout(&self) -> ColumnLayout {
        match self.columns {
            LayoutKind::Fixed => ColumnLayout::Fixed(Columns {
                category: self.category_index,
                text: self.text_index,
            }),
            LayoutKind::Named => {
                ColumnLayout::named(self.category_column.clone(), self.text_column.clone())
            }
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClassifierArgs {
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,
    #[arg(long, default_value = "gemma3:1b")]
    pub model: String,
}

impl ClassifierArgs {
    pub fn handle(&self, timeout: Duration) -> ClassifierHandle {
        let ollama = OllamaClassifier::new(&self.ollama_url, self.model.clone());
        ClassifierHandle::new(Arc::new(ollama), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn named_layout_uses_header_names() {
        let args = Args::parse_from([
            "corpus-tally",
            "tally",
            "lyrics.csv",
            "--columns",
            "named",
            "--category-column",
            "Band",
        ]);
        let Command::Tally(tally) = args.cmd else {
            panic!("expected the tally subcommand");
        };
        assert_eq!(tally.input, PathBuf::from("lyrics.csv"));
        assert_eq!(tally.top, DEFAULT_TOP_K);
        assert_eq!(tally.layout(), ColumnLayout::named("Band", "text"));
    }

    #[test]
    fn output_needs_classification() {
        assert!(Args::try_parse_from(["corpus-tally", "tally", "--output", "out.csv"]).is_err());
        let args = Args::parse_from(["corpus-tally", "tally", "--classify", "-o", "out.csv"]);
        let Command::Tally(tally) = args.cmd else {
            panic!("expected the tally subcommand");
        };
        assert_eq!(tally.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn fixed_layout_is_the_default() {
        let args = Args::parse_from(["corpus-tally", "tally", "--text-index", "2"]);
        let Command::Tally(tally) = args.cmd else {
            panic!("expected the tally subcommand");
        };
        assert_eq!(
            tally.layout(),
            ColumnLayout::Fixed(Columns {
                category: 0,
                text: 2
            })
        );
    }
}
