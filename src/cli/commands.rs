use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, BufRead, Write};

use crate::{
    api::{
        LeftoverIngredientCreate, LeftoverTransformRequest, PantryBulkUpdate, PantryItem,
        PantryItemCreate, PantrySuggestionRequest, Recipe, RecipeGenerationRequest, RegisterData,
        SavedTransformation, TasteProfileUpdate, TransformationSave, TransformationSuggestion,
    },
    app::{init_config, AppState, Config},
    utils::{notify_info, notify_success},
};

use super::{
    Commands, ConfigAction, LeftoverAction, PantryAction, RecipeAction, TasteAction, TasteArgs,
};

/// Handle a command against a wired application state
pub async fn handle_command(state: &AppState, command: Commands, json: bool) -> Result<()> {
    let api = state.api();

    match command {
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let user = state.store.login(&email, &password).await?;
            notify_success(format!("Logged in as {}", user.username.bold()));
        }
        Commands::Register {
            username,
            email,
            password,
            language,
        } => {
            let password = password_or_prompt(password)?;
            let data = RegisterData {
                username,
                email,
                password,
                preferred_language: language.unwrap_or_else(|| state.language().to_string()),
            };
            let user = state.store.register(&data).await?;
            notify_success(format!("Account created, logged in as {}", user.username.bold()));
        }
        Commands::Logout => {
            state.store.logout().await?;
            notify_success("Logged out");
        }
        Commands::Whoami => {
            let user = state.store.user().context("Not logged in")?;
            emit(json, &user, || {
                println!("{} <{}>", user.username.bold(), user.email);
                println!("  id: {}  language: {}", user.id, user.preferred_language);
            })?;
        }
        Commands::Stats => {
            let stats = api.dashboard_stats().await?;
            emit(json, &stats, || println!("{}", stats))?;
        }
        Commands::Taste { action } => handle_taste(state, action, json).await?,
        Commands::Recipes { action } => handle_recipes(state, action, json).await?,
        Commands::Pantry { action } => handle_pantry(state, action, json).await?,
        Commands::Leftovers { action } => handle_leftovers(state, action, json).await?,
        Commands::Config { action } => handle_config(&state.config, action, json)?,
    }

    Ok(())
}

/// Configuration commands run without a session or network
pub fn handle_config(config: &Config, action: ConfigAction, json: bool) -> Result<()> {
    match action {
        ConfigAction::Init => match init_config()? {
            Some(path) => notify_success(format!("Created default configuration at {}", path.display())),
            None => notify_info("Configuration already exists"),
        },
        ConfigAction::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
    }
    Ok(())
}

async fn handle_taste(state: &AppState, action: TasteAction, json: bool) -> Result<()> {
    let api = state.api();
    let profile = match action {
        TasteAction::Show => api.taste_profile().await?,
        TasteAction::Init => api.taste_profile_or_create().await?,
        TasteAction::Set(args) => {
            let create = args.create;
            let update = taste_update(args);
            if update.is_empty() && !create {
                anyhow::bail!("Nothing to update. Pass at least one field, e.g. --likes garlic");
            }
            let profile = if create {
                api.create_taste_profile(&update).await?
            } else {
                api.update_taste_profile(&update).await?
            };
            notify_success("Taste profile saved");
            profile
        }
    };

    emit(json, &profile, || {
        println!("{}", "Taste profile".bold());
        println!("  likes:         {}", profile.likes.join(", "));
        println!("  dislikes:      {}", profile.dislikes.join(", "));
        println!("  dietary:       {}", profile.dietary_preferences.join(", "));
        println!("  allergies:     {}", profile.allergies.join(", "));
        println!("  spice level:   {}", profile.spice_level);
        println!("  oil:           {}", profile.oil_preference);
        if let Some(minutes) = profile.cooking_time_preference {
            println!("  cooking time:  {} min", minutes);
        }
    })
}

async fn handle_recipes(state: &AppState, action: RecipeAction, json: bool) -> Result<()> {
    let api = state.api();
    match action {
        RecipeAction::Generate {
            theme,
            language,
            use_pantry,
            save,
        } => {
            let request = RecipeGenerationRequest {
                theme,
                language: language.unwrap_or_else(|| state.language().to_string()),
                use_pantry,
            };
            notify_info("Generating recipe...");
            let recipe = api.generate_recipe(&request).await?;
            emit(json, &recipe, || print_recipe(&recipe))?;

            if save {
                let saved = api.save_generated_recipe(&recipe).await?;
                notify_success(format!("Saved as recipe {}", saved.id));
            }
        }
        RecipeAction::Suggest { language } => {
            let request = PantrySuggestionRequest {
                language: language.unwrap_or_else(|| state.language().to_string()),
            };
            let suggestions = api.suggest_from_pantry(&request).await?;
            emit(json, &suggestions, || {
                if suggestions.is_empty() {
                    println!("No suggestions for the current pantry.");
                }
                for suggestion in &suggestions {
                    print_recipe(&suggestion.recipe);
                    println!(
                        "  from pantry: {}",
                        suggestion.used_pantry_ingredients.join(", ").green()
                    );
                    if !suggestion.missing_ingredients.is_empty() {
                        println!(
                            "  missing:     {}",
                            suggestion.missing_ingredients.join(", ").yellow()
                        );
                    }
                    println!();
                }
            })?;
        }
        RecipeAction::Saved => {
            let recipes = api.saved_recipes().await?;
            emit(json, &recipes, || {
                if recipes.is_empty() {
                    println!("No saved recipes yet.");
                }
                for recipe in &recipes {
                    println!(
                        "{:>5}  {}  {}",
                        recipe.id.cyan(),
                        recipe.recipe_title.bold(),
                        recipe.difficulty_level.as_deref().unwrap_or("").dimmed()
                    );
                }
            })?;
        }
        RecipeAction::Show { id } => {
            let saved = api.saved_recipe(&id).await?;
            emit(json, &saved, || match saved.recipe() {
                Some(recipe) => print_recipe(&recipe),
                None => {
                    println!("{}", saved.recipe_title.bold());
                    println!("  ingredients: {}", saved.ingredients.join(", "));
                }
            })?;
        }
        RecipeAction::Delete { id } => {
            api.delete_saved_recipe(&id).await?;
            notify_success(format!("Deleted recipe {}", id));
        }
    }
    Ok(())
}

async fn handle_pantry(state: &AppState, action: PantryAction, json: bool) -> Result<()> {
    let api = state.api();
    match action {
        PantryAction::List => {
            let items = api.pantry_items().await?;
            emit(json, &items, || print_pantry(&items))?;
        }
        PantryAction::Add {
            name,
            quantity,
            unit,
            category,
            expires,
        } => {
            let item = api
                .add_pantry_item(&PantryItemCreate {
                    ingredient_name: name,
                    quantity,
                    unit,
                    expiry_date: expires,
                    category,
                })
                .await?;
            emit(json, &item, || {
                notify_success(format!("Added {} (id {})", item.ingredient_name, item.id))
            })?;
        }
        PantryAction::BulkAdd { items } => {
            let update = PantryBulkUpdate {
                items: items.iter().map(|raw| parse_item(raw)).collect(),
            };
            let added = api.bulk_add_pantry(&update).await?;
            emit(json, &added, || notify_success(format!("Added {} items", added.len())))?;
        }
        PantryAction::Replace { items } => {
            let update = PantryBulkUpdate {
                items: items.iter().map(|raw| parse_item(raw)).collect(),
            };
            let pantry = api.bulk_update_pantry(&update).await?;
            emit(json, &pantry, || print_pantry(&pantry))?;
        }
        PantryAction::Delete { id } => {
            api.delete_pantry_item(id).await?;
            notify_success(format!("Removed pantry item {}", id));
        }
    }
    Ok(())
}

async fn handle_leftovers(state: &AppState, action: LeftoverAction, json: bool) -> Result<()> {
    let api = state.api();
    match action {
        LeftoverAction::List => {
            let leftovers = api.leftovers().await?;
            emit(json, &leftovers, || {
                if leftovers.is_empty() {
                    println!("No leftovers recorded.");
                }
                for leftover in &leftovers {
                    println!(
                        "{:>5}  {}  {}  {}",
                        leftover.id.to_string().cyan(),
                        leftover.ingredient_name.bold(),
                        leftover.quantity.as_deref().unwrap_or("-"),
                        leftover.state.dimmed()
                    );
                }
            })?;
        }
        LeftoverAction::Add {
            name,
            state: condition,
            quantity,
        } => {
            let leftover = api
                .add_leftover(&LeftoverIngredientCreate {
                    ingredient_name: name,
                    quantity,
                    state: condition,
                })
                .await?;
            emit(json, &leftover, || {
                notify_success(format!("Recorded {} (id {})", leftover.ingredient_name, leftover.id))
            })?;
        }
        LeftoverAction::Delete { id } => {
            api.delete_leftover(id).await?;
            notify_success(format!("Removed leftover {}", id));
        }
        LeftoverAction::Transform { language, save } => {
            let language = language.unwrap_or_else(|| state.language().to_string());
            notify_info("Looking for transformation ideas...");
            let suggestions = api
                .transform_leftovers(&LeftoverTransformRequest {
                    language: language.clone(),
                })
                .await?;
            emit(json, &suggestions, || {
                for (index, suggestion) in suggestions.iter().enumerate() {
                    print!("{}. ", index + 1);
                    print_transformation(suggestion);
                }
            })?;

            for position in save {
                let suggestion = position
                    .checked_sub(1)
                    .and_then(|index| suggestions.get(index))
                    .with_context(|| format!("No suggestion at position {}", position))?;
                let saved = api
                    .save_transformation(&TransformationSave {
                        suggestion: suggestion.clone(),
                        language: language.clone(),
                    })
                    .await?;
                notify_success(format!("Saved \"{}\" (id {})", saved.suggestion.title, saved.id));
            }
        }
        LeftoverAction::Saved => {
            let saved = api.saved_transformations().await?;
            emit(json, &saved, || {
                if saved.is_empty() {
                    println!("No saved transformations.");
                }
                for item in &saved {
                    print_saved_transformation(item);
                }
            })?;
        }
        LeftoverAction::Show { id } => {
            let saved = api.saved_transformation(id).await?;
            emit(json, &saved, || print_transformation(&saved.suggestion))?;
        }
        LeftoverAction::Forget { id } => {
            api.delete_saved_transformation(id).await?;
            notify_success(format!("Deleted transformation {}", id));
        }
    }
    Ok(())
}

/// Print `value` as JSON, or run the human-readable printer
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn taste_update(args: TasteArgs) -> TasteProfileUpdate {
    TasteProfileUpdate {
        likes: args.likes,
        dislikes: args.dislikes,
        dietary_preferences: args.dietary,
        allergies: args.allergies,
        spice_level: args.spice_level,
        oil_preference: args.oil,
        cooking_time_preference: args.cooking_time,
    }
}

/// `rice:2kg` -> rice, quantity 2kg; `rice` -> rice, no quantity
fn parse_item(raw: &str) -> PantryItemCreate {
    let (name, quantity) = match raw.split_once(':') {
        Some((name, quantity)) if !quantity.trim().is_empty() => {
            (name, Some(quantity.trim().to_string()))
        }
        Some((name, _)) => (name, None),
        None => (raw, None),
    };
    PantryItemCreate {
        ingredient_name: name.trim().to_string(),
        quantity,
        ..Default::default()
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title.bold().green());
    println!("{}", recipe.description);
    let mut meta = vec![recipe.difficulty.clone()];
    if let Some(time) = &recipe.cooking_time {
        meta.push(time.clone());
    }
    if let Some(servings) = recipe.servings {
        meta.push(format!("serves {}", servings));
    }
    println!("{}", meta.join(" | ").dimmed());

    println!("\n{}", "Ingredients".bold());
    for ingredient in &recipe.ingredients {
        println!("  • {} {} {}", ingredient.quantity, ingredient.unit, ingredient.name);
    }
    println!("\n{}", "Instructions".bold());
    for (step, instruction) in recipe.instructions.iter().enumerate() {
        println!("  {}. {}", step + 1, instruction);
    }
    let nutrition = &recipe.nutrition_info;
    println!(
        "\n{} {} kcal, protein {}, carbs {}, fat {}",
        "Nutrition:".bold(),
        nutrition.calories,
        nutrition.protein,
        nutrition.carbs,
        nutrition.fat
    );
    if !recipe.tags.is_empty() {
        println!("{} {}", "Tags:".bold(), recipe.tags.join(", "));
    }
}

fn print_pantry(items: &[PantryItem]) {
    if items.is_empty() {
        println!("The pantry is empty.");
    }
    for item in items {
        let amount = match (&item.quantity, &item.unit) {
            (Some(quantity), Some(unit)) => format!("{} {}", quantity, unit),
            (Some(quantity), None) => quantity.clone(),
            _ => "-".to_string(),
        };
        println!(
            "{:>5}  {}  {}  {}",
            item.id.to_string().cyan(),
            item.ingredient_name.bold(),
            amount,
            item.category.as_deref().unwrap_or("").dimmed()
        );
    }
}

fn print_transformation(suggestion: &TransformationSuggestion) {
    println!(
        "{} ({} min, {})",
        suggestion.title.bold().green(),
        suggestion.cooking_time,
        suggestion.difficulty
    );
    println!("   {}", suggestion.description);
    println!("   {}", suggestion.transformation_idea.italic());
    println!("   uses: {}", suggestion.used_leftovers.join(", "));
    if !suggestion.additional_ingredients.is_empty() {
        println!("   also: {}", suggestion.additional_ingredients.join(", "));
    }
}

fn print_saved_transformation(saved: &SavedTransformation) {
    println!(
        "{:>5}  {}  {}",
        saved.id.to_string().cyan(),
        saved.suggestion.title.bold(),
        saved.created_at.as_deref().unwrap_or("").dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_item() {
        assert_eq!(
            parse_item("rice:2kg"),
            PantryItemCreate {
                ingredient_name: "rice".to_string(),
                quantity: Some("2kg".to_string()),
                ..Default::default()
            }
        );
        assert_eq!(parse_item(" eggs ").ingredient_name, "eggs");
        assert_eq!(parse_item("salt:").quantity, None);
    }

    #[test]
    fn test_taste_update_maps_flags() {
        let update = taste_update(TasteArgs {
            dietary: Some(vec!["vegetarian".to_string()]),
            oil: Some("low".to_string()),
            ..Default::default()
        });
        assert_eq!(
            update.dietary_preferences,
            Some(vec!["vegetarian".to_string()])
        );
        assert_eq!(update.oil_preference.as_deref(), Some("low"));
        assert!(update.likes.is_none());
        assert!(!update.is_empty());
    }
}
