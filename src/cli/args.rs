use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pantrypal")]
#[command(version)]
#[command(about = "Pantry, recipes and leftovers from the command line", long_about = None)]
pub struct Cli {
    /// Backend origin, overrides the config file (e.g. http://127.0.0.1:8000)
    #[arg(long, env = "PANTRYPAL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "PANTRYPAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in with it
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "PANTRYPAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Preferred language (defaults to the configured one)
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Forget the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Dashboard counters
    Stats,
    /// Taste profile
    Taste {
        #[command(subcommand)]
        action: TasteAction,
    },
    /// Generate and manage recipes
    Recipes {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Pantry inventory
    Pantry {
        #[command(subcommand)]
        action: PantryAction,
    },
    /// Leftover ingredients and their transformations
    Leftovers {
        #[command(subcommand)]
        action: LeftoverAction,
    },
    /// Local configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Commands that only make sense with a session, like the protected screens
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Commands::Login { .. } | Commands::Register { .. } | Commands::Logout | Commands::Config { .. }
        )
    }

    /// Whether the persisted session should be restored before running
    pub fn needs_session(&self) -> bool {
        !matches!(self, Commands::Config { .. })
    }
}

#[derive(Subcommand, Debug)]
pub enum TasteAction {
    /// Show the taste profile
    Show,
    /// Fetch the taste profile, creating a default one if missing
    Init,
    /// Update the taste profile
    Set(TasteArgs),
}

#[derive(Args, Debug, Default)]
pub struct TasteArgs {
    /// Comma-separated
    #[arg(long, value_delimiter = ',')]
    pub likes: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    pub dislikes: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    pub dietary: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    pub allergies: Option<Vec<String>>,
    /// 0 (none) to 5 (very hot)
    #[arg(long)]
    pub spice_level: Option<i32>,
    /// e.g. low, moderate, high
    #[arg(long)]
    pub oil: Option<String>,
    /// Preferred cooking time in minutes
    #[arg(long)]
    pub cooking_time: Option<u32>,
    /// Create the profile instead of updating it
    #[arg(long)]
    pub create: bool,
}

#[derive(Subcommand, Debug)]
pub enum RecipeAction {
    /// Generate a recipe for a theme
    Generate {
        theme: String,
        #[arg(short, long)]
        language: Option<String>,
        /// Build around the pantry contents
        #[arg(long)]
        use_pantry: bool,
        /// Save the generated recipe
        #[arg(long)]
        save: bool,
    },
    /// Recipes that use what is already in the pantry
    Suggest {
        #[arg(short, long)]
        language: Option<String>,
    },
    /// List saved recipes
    Saved,
    /// Show one saved recipe
    Show { id: String },
    /// Delete a saved recipe
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PantryAction {
    /// List pantry items
    List,
    /// Add one item
    Add {
        name: String,
        #[arg(short, long)]
        quantity: Option<String>,
        #[arg(short, long)]
        unit: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Expiry date, e.g. 2026-11-01
        #[arg(long)]
        expires: Option<String>,
    },
    /// Add several items given as name[:quantity]
    BulkAdd {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Replace the whole pantry with items given as name[:quantity]
    Replace {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Remove an item
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum LeftoverAction {
    /// List leftover ingredients
    List,
    /// Record a leftover
    Add {
        name: String,
        /// e.g. cooked, raw, stale
        #[arg(short, long)]
        state: String,
        #[arg(short, long)]
        quantity: Option<String>,
    },
    /// Remove a leftover
    Delete { id: i64 },
    /// Ask for ideas to turn the leftovers into new dishes
    Transform {
        #[arg(short, long)]
        language: Option<String>,
        /// Save the suggestion at this position (1-based); repeatable
        #[arg(long)]
        save: Vec<usize>,
    },
    /// List saved transformations
    Saved,
    /// Show one saved transformation
    Show { id: i64 },
    /// Delete a saved transformation
    Forget { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default config file
    Init,
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_taste_lists() {
        let cli = Cli::try_parse_from([
            "pantrypal",
            "taste",
            "set",
            "--likes",
            "garlic,lemon",
            "--spice-level",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Taste {
                action: TasteAction::Set(args),
            } => {
                assert_eq!(
                    args.likes,
                    Some(vec!["garlic".to_string(), "lemon".to_string()])
                );
                assert_eq!(args.spice_level, Some(3));
                assert!(!args.create);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_auth_requirements() {
        let login = Cli::try_parse_from(["pantrypal", "login", "-e", "a@b.com"]).unwrap();
        assert!(!login.command.requires_auth());
        assert!(login.command.needs_session());

        let stats = Cli::try_parse_from(["pantrypal", "--json", "stats"]).unwrap();
        assert!(stats.json);
        assert!(stats.command.requires_auth());

        let config = Cli::try_parse_from(["pantrypal", "config", "show"]).unwrap();
        assert!(!config.command.needs_session());
    }
}
