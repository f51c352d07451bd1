/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{
    Cli, Commands, ConfigAction, LeftoverAction, PantryAction, RecipeAction, TasteAction,
    TasteArgs,
};
pub use commands::{handle_command, handle_config};
