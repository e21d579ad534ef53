use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "moscloc", version, author, about = "Prayer times and iqamah countdown board for mosque displays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the iqamah countdown screen
    Iqamah {
        /// Show this prayer's window even when it is not active
        #[arg(long)]
        prayer: Option<String>,
    },
    /// Print today's schedule, current/next prayer and iqamah state
    Times {
        /// Evaluate at this clock time instead of now (HH:MM or HH:MM:SS)
        #[arg(long)]
        at: Option<String>,
    },
    /// Print today's Hijri date
    Hijri,
    /// Fetch today's schedule from the provider and cache it
    Refresh,
    /// Edit what the board shows
    Admin {
        #[command(subcommand)]
        section: AdminCommands,
    },
    /// Application config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the effective config
    Show,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Mosque name, address, contact and location
    Mosque {
        #[command(subcommand)]
        action: MosqueCommands,
    },
    /// Rotating announcement banner
    Announce {
        #[command(subcommand)]
        action: AnnounceCommands,
    },
    /// Upcoming events
    Event {
        #[command(subcommand)]
        action: EventCommands,
    },
    /// Verses shown on the board
    Verse {
        #[command(subcommand)]
        action: VerseCommands,
    },
    /// Prayer time calculation settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
    /// Iqamah offsets and auto-redirect
    Iqamah {
        #[command(subcommand)]
        action: IqamahCommands,
    },
    /// Print the whole board config as JSON
    Export,
    /// Replace the board config with a JSON file produced by `export`
    Import {
        file: PathBuf,
    },
    /// Restore every default
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MosqueCommands {
    Show,
    Set(MosqueArgs),
}

#[derive(Args, Debug, Default)]
pub struct MosqueArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum AnnounceCommands {
    List,
    Add {
        text: String,
    },
    /// Remove by the 1-based position shown in `list`
    Remove {
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    List,
    Add(EventArgs),
    Remove {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct EventArgs {
    #[arg(long)]
    pub title: String,
    /// Free-form date, e.g. 2026-10-24
    #[arg(long)]
    pub date: String,
    #[arg(long)]
    pub time: String,
    #[arg(long)]
    pub location: String,
    #[arg(long, default_value = "")]
    pub image: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Subcommand, Debug)]
pub enum VerseCommands {
    List,
    Add {
        #[arg(long)]
        arabic: String,
        #[arg(long)]
        translation: String,
        #[arg(long)]
        reference: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    Show,
    Set(SettingsArgs),
}

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Provider calculation method id (20 = Kemenag)
    #[arg(long)]
    pub method: Option<u8>,
    /// general, ahmer or abyad
    #[arg(long)]
    pub shafaq: Option<String>,
    /// Nine comma-separated minute adjustments
    #[arg(long, allow_hyphen_values = true)]
    pub tune: Option<String>,
    /// 0 = Shafi, 1 = Hanafi
    #[arg(long)]
    pub school: Option<u8>,
    /// 0 = standard, 1 = Jafari
    #[arg(long)]
    pub midnight_mode: Option<u8>,
    /// IANA name, e.g. Asia/Jakarta
    #[arg(long)]
    pub timezone: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum IqamahCommands {
    Show,
    /// Minutes between adhan and iqamah for one prayer (1-60)
    Set {
        prayer: String,
        minutes: u32,
    },
    /// Auto-redirect to the iqamah screen
    Redirect {
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
        /// Countdown before switching (3-30 seconds)
        #[arg(long)]
        delay: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_commands() {
        let cli = Cli::try_parse_from(["moscloc", "admin", "iqamah", "set", "fajr", "15"]).unwrap();
        match cli.command {
            Some(Commands::Admin { section: AdminCommands::Iqamah { action: IqamahCommands::Set { prayer, minutes } } }) => {
                assert_eq!(prayer, "fajr");
                assert_eq!(minutes, 15);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::try_parse_from(["moscloc", "admin", "mosque", "set", "--lat", "-8.06", "--lng", "112.59"]).unwrap();
        match cli.command {
            Some(Commands::Admin { section: AdminCommands::Mosque { action: MosqueCommands::Set(args) } }) => {
                assert_eq!(args.lat, Some(-8.06));
                assert_eq!(args.name, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn redirect_flags_conflict() {
        assert!(Cli::try_parse_from(["moscloc", "admin", "iqamah", "redirect", "--enable", "--disable"]).is_err());
    }

    #[test]
    fn no_subcommand_opens_board() {
        let cli = Cli::try_parse_from(["moscloc"]).unwrap();
        assert!(cli.command.is_none());
    }
}
