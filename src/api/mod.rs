// Gateway module for api - follows the Train Station Pattern
// All backend access must go through this gateway

// Private submodules - not directly accessible from outside
mod endpoints;
mod gateway;
mod request;
mod transport;
mod types;

// Public re-exports - the ONLY way to access api functionality
pub use gateway::ApiGateway;
pub use request::{ApiRequest, Method, RawResponse, RequestDescriptor};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    DashboardStats, Ingredient, LeftoverIngredient, LeftoverIngredientCreate,
    LeftoverTransformRequest, LoginCredentials, NutritionInfo, PantryBulkUpdate, PantryItem,
    PantryItemCreate, PantryRecipe, PantrySuggestionRequest, Recipe, RecipeGenerationRequest,
    RecipeSave, RegisterData, RegisteredUser, SavedRecipe, SavedTransformation, TasteProfile,
    TasteProfileUpdate, TokenResponse, TransformationSave, TransformationSuggestion,
};

#[cfg(test)]
pub use transport::MockTransport;
