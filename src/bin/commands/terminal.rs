use gazelle_dupe::{Candidate, CandidateListing, CandidateSource, GroupDetail, Presenter};
use std::io::{self, BufRead, Write};

/// Interactive presenter over stdin and stdout.
pub struct TerminalPresenter {
    input: io::StdinLock<'static>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }

    /// Read one line. End of input reads as "abort" so a closed stdin never
    /// loops forever.
    fn read_line(&mut self) -> String {
        let _ = io::stdout().flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => "abort".to_string(),
            Ok(_) => line.trim().to_string(),
        }
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for TerminalPresenter {
    fn show_candidates(&mut self, listing: &CandidateListing) {
        let heading = match listing.source {
            CandidateSource::Search => "Results",
            CandidateSource::RecentUploads => "Recent uploads",
        };
        println!(
            "\n🔎 {heading} for {} on {}:",
            listing.queries, listing.site_code
        );

        if listing.candidates.is_empty() {
            println!("  No results found.");
            return;
        }

        for (index, candidate) in listing.candidates.iter().enumerate() {
            let link = listing.link(candidate);
            match candidate {
                Candidate::Group(record) => {
                    let year = record
                        .group_year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "----".to_string());
                    let tags = record.tags.iter().cloned().collect::<Vec<_>>().join(", ");
                    println!(
                        "  {:>2}. {} - {} ({year}) [{}]",
                        index + 1,
                        record.artist,
                        record.group_name,
                        record.release_type
                    );
                    if !tags.is_empty() {
                        println!("      🏷️  {tags}");
                    }
                    println!("      {link}");
                }
                Candidate::RecentUpload(entry) => {
                    let artist = if entry.artist.is_empty() {
                        "(unknown artist)"
                    } else {
                        entry.artist.as_str()
                    };
                    println!("  {:>2}. {artist} - {}", index + 1, entry.title);
                    println!("      {link}");
                }
            }
        }
    }

    fn show_group(&mut self, group: &GroupDetail) {
        let year = group.year.map(|y| format!(" ({y})")).unwrap_or_default();
        println!("\n📀 {} - {}{year}", group.artist, group.name);
        if group.torrents.is_empty() {
            println!("  No torrents in this group.");
        }
        for torrent in &group.torrents {
            println!("  • {}", group.edition_line(torrent));
        }
    }

    fn prompt(&mut self, message: &str) -> String {
        print!("\n{message}\n> ");
        self.read_line()
    }

    fn confirm(&mut self, message: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{message} {hint} ");
            let answer = self.read_line().to_lowercase();
            match answer.as_str() {
                "" => return default,
                "abort" => return false,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => println!("Please answer y or n."),
            }
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}
