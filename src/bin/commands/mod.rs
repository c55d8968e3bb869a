pub mod check;
pub mod label;
pub mod terminal;
pub mod utils;

use clap::{Args, Subcommand};
use gazelle_dupe::{ArtistEntry, ArtistRole, Config};

/// Release metadata shared by the commands that build search strings.
#[derive(Args, Clone)]
pub struct ReleaseArgs {
    /// Main artist (repeat for several)
    #[arg(long = "artist", required = true)]
    pub artists: Vec<String>,

    /// Guest artist (repeat for several); guests never appear in searches
    #[arg(long = "guest")]
    pub guests: Vec<String>,

    /// Release title
    #[arg(long)]
    pub title: String,

    /// Catalogue number
    #[arg(long)]
    pub catno: Option<String>,
}

impl ReleaseArgs {
    pub fn artist_entries(&self) -> Vec<ArtistEntry> {
        self.artists
            .iter()
            .map(|name| ArtistEntry::main(name.as_str()))
            .chain(
                self.guests
                    .iter()
                    .map(|name| ArtistEntry::new(name.as_str(), ArtistRole::Guest)),
            )
            .collect()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the search strings a release would be searched with
    ///
    /// No requests are made.
    ///
    /// Usage examples:
    /// # Strings for a simple album
    /// gazelle-dupe searchstrs --artist "Burial" --title "Untrue"
    ///
    /// # A collaboration with a catalogue number
    /// gazelle-dupe searchstrs --artist "Burial" --artist "Four Tet" --title "Moth" --catno "TEXT009"
    Searchstrs {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Search the site for a release and decide where it should go
    ///
    /// Shows groups that might already hold the release and asks whether to
    /// upload into one of them, start a new group, or abort. When the search
    /// finds nothing, recent uploads from the site log are checked instead.
    ///
    /// Usage examples:
    /// gazelle-dupe --site RED check --artist "Burial" --title "Untrue"
    Check {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Do not offer to delete the music folder
        #[arg(long)]
        no_deletion: bool,
    },

    /// Compare a release against the site's most recent uploads only
    ///
    /// Usage examples:
    /// gazelle-dupe recent --artist "Burial" --title "Untrue"
    Recent {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// List the releases the site has for a record label
    ///
    /// Usage examples:
    /// gazelle-dupe label "Hyperdub" --year 2007
    Label {
        /// Record label name
        label: String,

        /// Only releases from this year
        #[arg(long)]
        year: Option<u32>,
    },
}

/// Execute the appropriate command handler based on the parsed command
pub async fn execute_command(
    command: Commands,
    config: &Config,
    site_code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Searchstrs { release } => {
            check::handle_searchstrs(config, &release);
            Ok(())
        }

        Commands::Check {
            release,
            no_deletion,
        } => {
            let client = utils::build_client(config, site_code)?;
            check::handle_check(&client, config, &release, !no_deletion).await
        }

        Commands::Recent { release } => {
            let client = utils::build_client(config, site_code)?;
            check::handle_recent(&client, config, &release).await
        }

        Commands::Label { label, year } => {
            let client = utils::build_client(config, site_code)?;
            label::handle_label(&client, &label, year).await
        }
    }
}
