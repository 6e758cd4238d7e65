use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "imdoi",
    version,
    about = "Find the DOI of a publisher page and build lookup links"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (TOML, or JSON with a .json extension)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "More log output on stderr")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the DOI in a saved page
    Resolve {
        /// URL the page was served from; drives publisher-specific rules
        #[arg(long)]
        url: String,
        /// HTML file to read; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// Show every strategy consulted
        #[arg(long, default_value_t = false)]
        explain: bool,
        /// Also print the link for this source
        #[arg(long)]
        source: Option<String>,
    },
    /// Normalize a pasted DOI, doi.org link or arXiv id
    Normalize { input: String },
    /// Print the source link for an identifier
    Link {
        input: String,
        /// Source key; the configured default when omitted
        #[arg(long, conflicts_with = "all")]
        source: Option<String>,
        /// Print links for every source
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Normalize, print links, fetch the title and record it in history
    Lookup {
        input: String,
        /// Skip the Crossref title fetch
        #[arg(long, default_value_t = false)]
        no_title: bool,
    },
    /// Show recent lookups
    History {
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    /// List configured sources
    Sources,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "imdoi",
            "resolve",
            "--url",
            "https://www.sciencedirect.com/science/article/pii/S1",
            "--file",
            "page.html",
            "--explain",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Resolve {
                url, file, explain, ..
            } => {
                assert!(url.contains("sciencedirect"));
                assert_eq!(file, Some(PathBuf::from("page.html")));
                assert!(explain);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_link_source_conflicts_with_all() {
        assert!(Cli::try_parse_from(["imdoi", "link", "10.1/a", "--source", "doi", "--all"]).is_err());
    }

    #[test]
    fn test_global_json_after_subcommand() {
        let cli = Cli::try_parse_from(["imdoi", "sources", "--json"]).unwrap();
        assert!(cli.json);
    }
}
