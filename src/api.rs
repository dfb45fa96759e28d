//! The data collaborator boundary: typed errors, the source trait the rest
//! of the crate consumes, and a blocking HTTP implementation.

use crate::model::{Preview, Recipe};
use serde::Deserialize;
use thiserror::Error;

/// Failure taxonomy of the data collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("recipe not found: {id}")]
	NotFound { id: String },

	#[error("request failed with status {status}: {message}")]
	Http { status: u16, message: String },

	#[error("transport failure: {details}")]
	Transport { details: String },

	#[error("malformed response in {context}: {details}")]
	Decode { context: &'static str, details: String },

	#[error("malformed ingredient line {line:?} (expected \"quantity,unit,description\")")]
	InvalidDraft { line: String },
}

/// Where recipes come from. The application controller awaits nothing else;
/// implementations block until done or failed.
pub trait RecipeSource {
	fn fetch_recipe(&self, id: &str) -> Result<Recipe, ApiError>;
	fn search(&self, query: &str) -> Result<Vec<Preview>, ApiError>;
	fn create_recipe(&self, recipe: &Recipe) -> Result<Recipe, ApiError>;
}

#[derive(Debug, Deserialize)]
struct RecipeEnvelope {
	data: RecipeData,
}

#[derive(Debug, Deserialize)]
struct RecipeData {
	recipe: Recipe,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
	data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
	recipes: Vec<Preview>,
}

#[cfg(feature = "net")]
pub use self::net::ForkifyClient;

#[cfg(feature = "net")]
mod net {
	use super::{ApiError, RecipeEnvelope, RecipeSource, SearchEnvelope};
	use crate::config;
	use crate::model::{Preview, Recipe};
	use tracing::{debug, instrument};

	/// Blocking client for the remote recipe API.
	///
	/// Requests share one agent and the configured hard timeout. An API key
	/// is required for uploads and unlocks user recipes on reads.
	#[derive(Debug)]
	pub struct ForkifyClient {
		agent: ureq::Agent,
		base_url: String,
		key: Option<String>,
	}

	impl ForkifyClient {
		#[must_use]
		pub fn new() -> Self {
			Self::with_base_url(config::API_URL)
		}

		#[must_use]
		pub fn with_base_url(base_url: &str) -> Self {
			Self {
				agent: ureq::AgentBuilder::new().timeout(config::TIMEOUT).build(),
				base_url: base_url.to_owned(),
				key: None,
			}
		}

		#[must_use]
		pub fn with_key(mut self, key: &str) -> Self {
			self.key = Some(key.to_owned());
			self
		}

		fn keyed(&self, request: ureq::Request) -> ureq::Request {
			match &self.key {
				Some(key) => request.query("key", key),
				None => request,
			}
		}
	}

	impl Default for ForkifyClient {
		fn default() -> Self {
			Self::new()
		}
	}

	impl RecipeSource for ForkifyClient {
		#[instrument(skip(self))]
		fn fetch_recipe(&self, id: &str) -> Result<Recipe, ApiError> {
			let url = format!("{}{}", self.base_url, id);
			let response = self.keyed(self.agent.get(&url)).call().map_err(|error| status_error(error, id))?;
			debug!(status = response.status(), "Fetched recipe.");
			let envelope: RecipeEnvelope = response.into_json().map_err(|error| ApiError::Decode {
				context: "recipe",
				details: error.to_string(),
			})?;
			Ok(envelope.data.recipe)
		}

		#[instrument(skip(self, query))]
		fn search(&self, query: &str) -> Result<Vec<Preview>, ApiError> {
			let request = self.keyed(self.agent.get(&self.base_url).query("search", query));
			let response = request.call().map_err(transport_error)?;
			debug!(status = response.status(), "Ran search.");
			let envelope: SearchEnvelope = response.into_json().map_err(|error| ApiError::Decode {
				context: "search",
				details: error.to_string(),
			})?;
			Ok(envelope.data.recipes)
		}

		#[instrument(skip(self, recipe))]
		fn create_recipe(&self, recipe: &Recipe) -> Result<Recipe, ApiError> {
			let request = self.keyed(self.agent.post(&self.base_url));
			let response = request.send_json(recipe).map_err(transport_error)?;
			debug!(status = response.status(), "Uploaded recipe.");
			let envelope: RecipeEnvelope = response.into_json().map_err(|error| ApiError::Decode {
				context: "upload",
				details: error.to_string(),
			})?;
			Ok(envelope.data.recipe)
		}
	}

	fn status_error(error: ureq::Error, id: &str) -> ApiError {
		match error {
			ureq::Error::Status(404, _) => ApiError::NotFound { id: id.to_owned() },
			other => transport_error(other),
		}
	}

	fn transport_error(error: ureq::Error) -> ApiError {
		match error {
			ureq::Error::Status(status, response) => ApiError::Http {
				status,
				message: response.status_text().to_owned(),
			},
			ureq::Error::Transport(transport) => ApiError::Transport {
				details: transport.to_string(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recipe_envelopes_decode() {
		let body = r#"{
			"status": "success",
			"data": {
				"recipe": {
					"id": "5ed6604591c37cdc054bc886",
					"title": "Pasta",
					"publisher": "Test Kitchen",
					"source_url": "https://example.com/pasta",
					"image_url": "https://example.com/pasta.jpg",
					"servings": 4,
					"cooking_time": 45,
					"ingredients": [
						{ "quantity": 1, "unit": "kg", "description": "tomatoes" },
						{ "quantity": null, "unit": "", "description": "salt" }
					]
				}
			}
		}"#;
		let envelope: RecipeEnvelope = serde_json::from_str(body).unwrap();
		let recipe = envelope.data.recipe;
		assert_eq!(recipe.title, "Pasta");
		assert_eq!(recipe.ingredients.len(), 2);
		assert_eq!(recipe.ingredients[0].quantity, Some(1.0));
		assert!(!recipe.bookmarked);
		assert_eq!(recipe.key, None);
	}

	#[test]
	fn search_envelopes_decode() {
		let body = r#"{
			"results": 1,
			"data": {
				"recipes": [
					{
						"id": "5ed6604591c37cdc054bc886",
						"title": "Pasta",
						"publisher": "Test Kitchen",
						"image_url": "https://example.com/pasta.jpg"
					}
				]
			}
		}"#;
		let envelope: SearchEnvelope = serde_json::from_str(body).unwrap();
		assert_eq!(envelope.data.recipes.len(), 1);
		assert_eq!(envelope.data.recipes[0].id, "5ed6604591c37cdc054bc886");
	}

	#[test]
	fn bookmarked_never_serializes() {
		let recipe = Recipe {
			id: "r1".to_owned(),
			title: "Pasta".to_owned(),
			publisher: "Test Kitchen".to_owned(),
			source_url: String::new(),
			image_url: String::new(),
			servings: 4,
			cooking_time: 30,
			ingredients: Vec::new(),
			key: None,
			bookmarked: true,
		};
		let json = serde_json::to_string(&recipe).unwrap();
		assert!(!json.contains("bookmarked"));
		assert!(!json.contains("key"));
	}
}
