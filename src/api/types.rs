use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

// ===== Auth =====

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginCredentials {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterData {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub preferred_language: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Account returned by `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub preferred_language: String,
}

// ===== Taste profile =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub user_id: i64,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default = "default_spice_level")]
    pub spice_level: i32,
    #[serde(default = "default_oil_preference")]
    pub oil_preference: String,
    #[serde(default)]
    pub cooking_time_preference: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_spice_level() -> i32 {
    2
}

fn default_oil_preference() -> String {
    "moderate".to_string()
}

/// Partial update; unset fields are left untouched by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct TasteProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 5, message = "Spice level must be between 0 and 5"))]
    pub spice_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time_preference: Option<u32>,
}

impl TasteProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ===== Recipes =====

#[derive(Debug, Clone, Serialize)]
pub struct RecipeGenerationRequest {
    pub theme: String,
    pub language: String,
    pub use_pantry: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

/// A generated recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    pub difficulty: String,
    pub nutrition_info: NutritionInfo,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PantrySuggestionRequest {
    pub language: String,
}

/// A recipe built around what is already in the pantry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub used_pantry_ingredients: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
}

/// Body of `POST /recipes/save-generated`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSave {
    pub recipe_title: String,
    pub recipe_data: Value,
    pub ingredients: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub cooking_time: Option<String>,
    pub difficulty_level: Option<String>,
}

impl RecipeSave {
    pub fn from_recipe(recipe: &Recipe) -> Result<Self, serde_json::Error> {
        Ok(Self {
            recipe_title: recipe.title.clone(),
            recipe_data: serde_json::to_value(recipe)?,
            ingredients: recipe.ingredients.iter().map(|i| i.name.clone()).collect(),
            dietary_tags: recipe.tags.clone(),
            cooking_time: recipe.cooking_time.clone(),
            difficulty_level: Some(recipe.difficulty.clone()),
        })
    }
}

/// A recipe stored on the server. The numeric backend id is exposed as a
/// string so it can be used as a stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRecipe {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub recipe_title: String,
    #[serde(default)]
    pub recipe_data: Value,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl SavedRecipe {
    /// The full recipe, when the stored data still has the generated shape
    pub fn recipe(&self) -> Option<Recipe> {
        Recipe::deserialize(&self.recipe_data).ok()
    }
}

// ===== Pantry =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct PantryItemCreate {
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub ingredient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryItem {
    pub id: i64,
    pub ingredient_name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct PantryBulkUpdate {
    #[validate(nested)]
    pub items: Vec<PantryItemCreate>,
}

// ===== Leftovers =====

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct LeftoverIngredientCreate {
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub ingredient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeftoverIngredient {
    pub id: i64,
    pub ingredient_name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeftoverTransformRequest {
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationSuggestion {
    pub title: String,
    pub description: String,
    pub transformation_idea: String,
    #[serde(default)]
    pub used_leftovers: Vec<String>,
    #[serde(default)]
    pub additional_ingredients: Vec<String>,
    pub cooking_time: u32,
    pub difficulty: String,
}

/// Body of `POST /remainings/save-transformation`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformationSave {
    #[serde(flatten)]
    pub suggestion: TransformationSuggestion,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTransformation {
    pub id: i64,
    #[serde(flatten)]
    pub suggestion: TransformationSuggestion,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ===== Dashboard =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub pantry_items_count: u64,
    pub saved_recipes_count: u64,
    pub recipes_generated_count: u64,
    pub leftover_items_count: u64,
}

impl fmt::Display for DashboardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pantry items:      {}", self.pantry_items_count)?;
        writeln!(f, "Saved recipes:     {}", self.saved_recipes_count)?;
        writeln!(f, "Recipes generated: {}", self.recipes_generated_count)?;
        write!(f, "Leftover items:    {}", self.leftover_items_count)
    }
}

/// Accepts `12` or `"12"` and yields `"12"`
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(id) => id.to_string(),
        RawId::Text(id) => id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_saved_recipe_id_becomes_string() {
        let recipe: SavedRecipe = serde_json::from_value(json!({
            "id": 12,
            "recipe_title": "Shakshuka",
            "recipe_data": {},
            "ingredients": ["eggs", "tomato"],
            "dietary_tags": [],
            "cooking_time": "25 minutes",
            "difficulty_level": "easy",
            "created_at": "2025-03-01T10:00:00"
        }))
        .unwrap();
        assert_eq!(recipe.id, "12");

        let already_string: SavedRecipe =
            serde_json::from_value(json!({"id": "7", "recipe_title": "Soup"})).unwrap();
        assert_eq!(already_string.id, "7");
    }

    #[test]
    fn test_recipe_save_from_recipe() {
        let recipe = Recipe {
            title: "Fried rice".to_string(),
            description: "Uses up rice".to_string(),
            ingredients: vec![Ingredient {
                name: "rice".to_string(),
                quantity: "2".to_string(),
                unit: "cups".to_string(),
            }],
            instructions: vec!["Fry".to_string()],
            cooking_time: Some("15 minutes".to_string()),
            difficulty: "easy".to_string(),
            nutrition_info: NutritionInfo {
                calories: "400".to_string(),
                protein: "10g".to_string(),
                carbs: "60g".to_string(),
                fat: "12g".to_string(),
            },
            tags: vec!["quick".to_string()],
            servings: Some(2),
        };

        let save = RecipeSave::from_recipe(&recipe).unwrap();
        assert_eq!(save.recipe_title, "Fried rice");
        assert_eq!(save.ingredients, vec!["rice".to_string()]);
        assert_eq!(save.difficulty_level.as_deref(), Some("easy"));
        assert_eq!(save.recipe_data["servings"], json!(2));

        let stored = SavedRecipe {
            id: "1".to_string(),
            recipe_title: save.recipe_title.clone(),
            recipe_data: save.recipe_data.clone(),
            ingredients: save.ingredients.clone(),
            dietary_tags: vec![],
            cooking_time: None,
            difficulty_level: None,
            created_at: None,
        };
        assert_eq!(stored.recipe(), Some(recipe));
    }

    #[test]
    fn test_saved_transformation_flattens_suggestion() {
        let saved: SavedTransformation = serde_json::from_value(json!({
            "id": 3,
            "title": "Bread pudding",
            "description": "Stale bread, reborn",
            "transformation_idea": "Soak and bake",
            "used_leftovers": ["bread"],
            "additional_ingredients": ["milk", "eggs"],
            "cooking_time": 45,
            "difficulty": "easy",
            "language": "English"
        }))
        .unwrap();
        assert_eq!(saved.suggestion.title, "Bread pudding");
        assert_eq!(saved.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_validation_rules() {
        let bad = RegisterData {
            username: String::new(),
            email: "not-an-email".to_string(),
            password: "secret123".to_string(),
            preferred_language: "en".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));

        let bulk = PantryBulkUpdate {
            items: vec![PantryItemCreate::default()],
        };
        assert!(bulk.validate().is_err());

        let update = TasteProfileUpdate {
            spice_level: Some(9),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(TasteProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_taste_profile_update_skips_unset_fields() {
        let update = TasteProfileUpdate {
            likes: Some(vec!["garlic".to_string()]),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"likes": ["garlic"]}));
    }
}
