use serde_json::Value;
use validator::Validate;

use super::gateway::ApiGateway;
use super::request::ApiRequest;
use super::types::{
    DashboardStats, LeftoverIngredient, LeftoverIngredientCreate, LeftoverTransformRequest,
    LoginCredentials, PantryBulkUpdate, PantryItem, PantryItemCreate, PantryRecipe,
    PantrySuggestionRequest, Recipe, RecipeGenerationRequest, RecipeSave, RegisterData,
    RegisteredUser, SavedRecipe, SavedTransformation, TasteProfile, TasteProfileUpdate,
    TokenResponse, TransformationSave, TransformationSuggestion,
};
use crate::session::User;
use crate::utils::ApiError;

/// Named backend operations. Each pins a method, path and body shape and
/// lets gateway errors through untouched.
impl ApiGateway {
    // ===== Auth =====

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse, ApiError> {
        credentials.validate()?;
        self.request(ApiRequest::post("/auth/login").json(credentials)?)
            .await
    }

    /// Creates the account only; the response carries no token
    pub async fn register(&self, data: &RegisterData) -> Result<RegisteredUser, ApiError> {
        data.validate()?;
        self.request(ApiRequest::post("/auth/register").json(data)?)
            .await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.request_value(ApiRequest::post("/auth/logout")).await?;
        Ok(())
    }

    // ===== Users =====

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/users/profile").await
    }

    pub async fn taste_profile(&self) -> Result<TasteProfile, ApiError> {
        self.get("/users/taste-profile").await
    }

    pub async fn create_taste_profile(
        &self,
        profile: &TasteProfileUpdate,
    ) -> Result<TasteProfile, ApiError> {
        profile.validate()?;
        self.post("/users/taste-profile", Some(profile)).await
    }

    pub async fn update_taste_profile(
        &self,
        profile: &TasteProfileUpdate,
    ) -> Result<TasteProfile, ApiError> {
        profile.validate()?;
        self.put("/users/taste-profile", Some(profile)).await
    }

    pub async fn taste_profile_or_create(&self) -> Result<TasteProfile, ApiError> {
        self.get("/users/taste-profile/or-create").await
    }

    // ===== Recipes =====

    pub async fn generate_recipe(
        &self,
        request: &RecipeGenerationRequest,
    ) -> Result<Recipe, ApiError> {
        if request.theme.trim().is_empty() {
            return Err(ApiError::invalid_request("Recipe theme is required"));
        }
        self.post("/recipes/generate", Some(request)).await
    }

    pub async fn suggest_from_pantry(
        &self,
        request: &PantrySuggestionRequest,
    ) -> Result<Vec<PantryRecipe>, ApiError> {
        self.post("/recipes/suggest-from-pantry", Some(request)).await
    }

    pub async fn save_generated_recipe(&self, recipe: &Recipe) -> Result<SavedRecipe, ApiError> {
        let body = RecipeSave::from_recipe(recipe).map_err(|e| ApiError::Unexpected {
            message: format!("Failed to encode recipe: {}", e),
        })?;
        self.post("/recipes/save-generated", Some(&body)).await
    }

    pub async fn saved_recipes(&self) -> Result<Vec<SavedRecipe>, ApiError> {
        self.get("/recipes/saved").await
    }

    pub async fn saved_recipe(&self, recipe_id: &str) -> Result<SavedRecipe, ApiError> {
        let id = parse_id(recipe_id, "recipe")?;
        self.get(&format!("/recipes/saved/{}", id)).await
    }

    pub async fn delete_saved_recipe(&self, recipe_id: &str) -> Result<(), ApiError> {
        let id = parse_id(recipe_id, "recipe")?;
        self.delete::<Value>(&format!("/recipes/saved/{}", id))
            .await?;
        Ok(())
    }

    // ===== Pantry =====

    pub async fn pantry_items(&self) -> Result<Vec<PantryItem>, ApiError> {
        self.get("/kitchen/items").await
    }

    pub async fn add_pantry_item(&self, item: &PantryItemCreate) -> Result<PantryItem, ApiError> {
        item.validate()?;
        self.post("/kitchen/items", Some(item)).await
    }

    /// Replaces the pantry with `update.items`
    pub async fn bulk_update_pantry(
        &self,
        update: &PantryBulkUpdate,
    ) -> Result<Vec<PantryItem>, ApiError> {
        update.validate()?;
        self.put("/kitchen/items/bulk", Some(update)).await
    }

    pub async fn bulk_add_pantry(
        &self,
        update: &PantryBulkUpdate,
    ) -> Result<Vec<PantryItem>, ApiError> {
        update.validate()?;
        self.post("/kitchen/items/bulk-add", Some(update)).await
    }

    pub async fn delete_pantry_item(&self, item_id: i64) -> Result<(), ApiError> {
        self.delete::<Value>(&format!("/kitchen/items/{}", item_id))
            .await?;
        Ok(())
    }

    // ===== Leftovers =====

    pub async fn leftovers(&self) -> Result<Vec<LeftoverIngredient>, ApiError> {
        self.get("/remainings/ingredients").await
    }

    pub async fn add_leftover(
        &self,
        leftover: &LeftoverIngredientCreate,
    ) -> Result<LeftoverIngredient, ApiError> {
        leftover.validate()?;
        self.post("/remainings/ingredients", Some(leftover)).await
    }

    pub async fn delete_leftover(&self, leftover_id: i64) -> Result<(), ApiError> {
        self.delete::<Value>(&format!("/remainings/ingredients/{}", leftover_id))
            .await?;
        Ok(())
    }

    pub async fn transform_leftovers(
        &self,
        request: &LeftoverTransformRequest,
    ) -> Result<Vec<TransformationSuggestion>, ApiError> {
        self.post("/remainings/transform", Some(request)).await
    }

    pub async fn save_transformation(
        &self,
        transformation: &TransformationSave,
    ) -> Result<SavedTransformation, ApiError> {
        self.post("/remainings/save-transformation", Some(transformation))
            .await
    }

    pub async fn saved_transformations(&self) -> Result<Vec<SavedTransformation>, ApiError> {
        self.get("/remainings/saved-transformations").await
    }

    pub async fn saved_transformation(
        &self,
        transformation_id: i64,
    ) -> Result<SavedTransformation, ApiError> {
        self.get(&format!(
            "/remainings/saved-transformations/{}",
            transformation_id
        ))
        .await
    }

    pub async fn delete_saved_transformation(&self, transformation_id: i64) -> Result<(), ApiError> {
        self.delete::<Value>(&format!(
            "/remainings/saved-transformations/{}",
            transformation_id
        ))
        .await?;
        Ok(())
    }

    // ===== Dashboard =====

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get("/dboard/stats").await
    }
}

/// Ids are strings on this side and integers on the server
fn parse_id(raw: &str, kind: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::invalid_request(format!("Invalid {} ID: {}", kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::{Method, RawResponse};
    use crate::api::transport::MockTransport;
    use crate::session::{MemoryStorage, MockNavigator, SessionContext};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn ok(body: Value) -> RawResponse {
        RawResponse {
            status: 200,
            reason: Some("OK".to_string()),
            content_type: Some("application/json".to_string()),
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        }
    }

    fn gateway_expecting(method: Method, path: &'static str, response: Value) -> ApiGateway {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(move |req| req.method == method && req.url == format!("http://api.test{}", path))
            .times(1)
            .returning(move |_| Ok(ok(response.clone())));
        gateway_with(transport)
    }

    fn gateway_with(transport: MockTransport) -> ApiGateway {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().return_const(());
        let session = Arc::new(SessionContext::new(MemoryStorage::new(), navigator));
        ApiGateway::new("http://api.test", Arc::new(transport), session)
    }

    fn offline() -> ApiGateway {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        gateway_with(transport)
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                let body: Value = serde_json::from_slice(req.body.as_deref().unwrap_or_default())
                    .unwrap_or_default();
                req.method == Method::Post
                    && req.url == "http://api.test/auth/login"
                    && body == json!({"email": "a@b.com", "password": "secret123"})
            })
            .times(1)
            .returning(|_| Ok(ok(json!({"access_token": "tok1", "token_type": "bearer"}))));

        let gateway = gateway_with(transport);
        let token = gateway
            .login(&LoginCredentials {
                email: "a@b.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.access_token, "tok1");
    }

    #[tokio::test]
    async fn test_invalid_credentials_never_hit_the_network() {
        let err = offline()
            .login(&LoginCredentials {
                email: "nope".to_string(),
                password: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed { status: None, .. }));
    }

    #[tokio::test]
    async fn test_saved_recipes_coerce_ids() {
        let gateway = gateway_expecting(
            Method::Get,
            "/recipes/saved",
            json!([{"id": 5, "recipe_title": "Dal", "recipe_data": {}, "ingredients": [], "dietary_tags": []}]),
        );
        let recipes = gateway.saved_recipes().await.unwrap();
        assert_eq!(recipes[0].id, "5");
    }

    #[tokio::test]
    async fn test_saved_recipe_rejects_non_numeric_id() {
        let err = offline().saved_recipe("abc").await.unwrap_err();
        assert_eq!(err.message(), "Invalid recipe ID: abc");
        assert!(offline().delete_saved_recipe("").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_saved_recipe_uses_numeric_path() {
        let gateway = gateway_expecting(Method::Delete, "/recipes/saved/42", json!({"message": "ok"}));
        gateway.delete_saved_recipe(" 42 ").await.unwrap();
    }

    #[tokio::test]
    async fn test_pantry_routes() {
        let gateway = gateway_expecting(
            Method::Post,
            "/kitchen/items/bulk-add",
            json!([{"id": 1, "ingredient_name": "rice", "quantity": "1kg"}]),
        );
        let items = gateway
            .bulk_add_pantry(&PantryBulkUpdate {
                items: vec![PantryItemCreate {
                    ingredient_name: "rice".to_string(),
                    quantity: Some("1kg".to_string()),
                    ..Default::default()
                }],
            })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let gateway = gateway_expecting(Method::Delete, "/kitchen/items/9", json!({}));
        gateway.delete_pantry_item(9).await.unwrap();
    }

    #[tokio::test]
    async fn test_leftover_routes() {
        let gateway = gateway_expecting(
            Method::Post,
            "/remainings/transform",
            json!([{
                "title": "Rice cakes",
                "description": "Crispy",
                "transformation_idea": "Pan fry day-old rice",
                "used_leftovers": ["rice"],
                "additional_ingredients": ["egg"],
                "cooking_time": 20,
                "difficulty": "easy"
            }]),
        );
        let suggestions = gateway
            .transform_leftovers(&LeftoverTransformRequest {
                language: "English".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(suggestions[0].cooking_time, 20);

        let gateway = gateway_expecting(
            Method::Delete,
            "/remainings/saved-transformations/3",
            json!({}),
        );
        gateway.delete_saved_transformation(3).await.unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let gateway = gateway_expecting(
            Method::Get,
            "/dboard/stats",
            json!({
                "pantry_items_count": 4,
                "saved_recipes_count": 2,
                "recipes_generated_count": 2,
                "leftover_items_count": 1
            }),
        );
        let stats = gateway.dashboard_stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                pantry_items_count: 4,
                saved_recipes_count: 2,
                recipes_generated_count: 2,
                leftover_items_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_generate_requires_theme() {
        let err = offline()
            .generate_recipe(&RecipeGenerationRequest {
                theme: "  ".to_string(),
                language: "en".to_string(),
                use_pantry: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), None);
    }
}
