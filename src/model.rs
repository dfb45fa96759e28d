//! Domain records and application state bookkeeping.

use crate::api::{ApiError, RecipeSource};
use crate::config;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One ingredient line of a recipe.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Ingredient {
	pub quantity: Option<f64>,
	#[serde(default)]
	pub unit: String,
	pub description: String,
}

/// A full recipe record, as displayed and as carried on the wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Recipe {
	#[serde(default)]
	pub id: String,
	pub title: String,
	pub publisher: String,
	pub source_url: String,
	pub image_url: String,
	pub servings: u32,
	pub cooking_time: u32,
	pub ingredients: Vec<Ingredient>,
	/// API key the recipe was uploaded under, when it is a user recipe.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
	/// Local-only flag; never serialized.
	#[serde(skip)]
	pub bookmarked: bool,
}

/// A search result entry: just enough of a recipe to list it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Preview {
	pub id: String,
	pub title: String,
	pub publisher: String,
	pub image_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
}

impl From<&Recipe> for Preview {
	fn from(recipe: &Recipe) -> Self {
		Self {
			id: recipe.id.clone(),
			title: recipe.title.clone(),
			publisher: recipe.publisher.clone(),
			image_url: recipe.image_url.clone(),
			key: recipe.key.clone(),
		}
	}
}

/// Raw upload-form fields. Ingredient lines use the
/// `"quantity,unit,description"` format.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeDraft {
	pub title: String,
	pub source_url: String,
	pub image_url: String,
	pub publisher: String,
	pub cooking_time: u32,
	pub servings: u32,
	pub ingredients: Vec<String>,
}

/// Current search: query, all fetched results, and the page being shown.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchState {
	pub query: String,
	pub results: Vec<Preview>,
	pub page: usize,
	pub results_per_page: usize,
}

impl Default for SearchState {
	fn default() -> Self {
		Self {
			query: String::new(),
			results: Vec::new(),
			page: 1,
			results_per_page: config::RESULTS_PER_PAGE,
		}
	}
}

/// Application state plus the data collaborator it is loaded through.
pub struct Model {
	pub recipe: Option<Recipe>,
	pub search: SearchState,
	pub bookmarks: Vec<Recipe>,
	source: Box<dyn RecipeSource>,
}

impl Model {
	pub fn new(source: Box<dyn RecipeSource>) -> Self {
		Self {
			recipe: None,
			search: SearchState::default(),
			bookmarks: Vec::new(),
			source,
		}
	}

	/// Loads one recipe and makes it current, marking it bookmarked when it
	/// is already on the bookmark list.
	pub fn load_recipe(&mut self, id: &str) -> Result<(), ApiError> {
		let mut recipe = self.source.fetch_recipe(id)?;
		recipe.bookmarked = self.bookmarks.iter().any(|bookmark| bookmark.id == recipe.id);
		self.recipe = Some(recipe);
		Ok(())
	}

	/// Runs a search and resets paging to the first page.
	pub fn load_search_results(&mut self, query: &str) -> Result<(), ApiError> {
		self.search.query = query.to_owned();
		self.search.results = self.source.search(query)?;
		self.search.page = 1;
		Ok(())
	}

	/// The given (or current) page of search results. Remembers the page.
	pub fn search_results_page(&mut self, page: Option<usize>) -> Vec<Preview> {
		let page = page.unwrap_or(self.search.page).max(1);
		self.search.page = page;
		let start = (page - 1) * self.search.results_per_page;
		if start >= self.search.results.len() {
			return Vec::new();
		}
		let end = (start + self.search.results_per_page).min(self.search.results.len());
		self.search.results[start..end].to_vec()
	}

	#[must_use]
	pub fn total_pages(&self) -> usize {
		let len = self.search.results.len();
		(len + self.search.results_per_page - 1) / self.search.results_per_page
	}

	/// Rescales every ingredient quantity to the new servings count.
	pub fn update_servings(&mut self, new_servings: u32) {
		let recipe = match &mut self.recipe {
			Some(recipe) => recipe,
			None => {
				warn!("No current recipe; ignoring servings change.");
				return;
			}
		};
		if new_servings == 0 || recipe.servings == 0 {
			warn!(new_servings, current = recipe.servings, "Refusing a zero servings count.");
			return;
		}
		let factor = f64::from(new_servings) / f64::from(recipe.servings);
		for ingredient in &mut recipe.ingredients {
			if let Some(quantity) = &mut ingredient.quantity {
				*quantity *= factor;
			}
		}
		recipe.servings = new_servings;
	}

	/// Bookmarks the current recipe.
	pub fn add_bookmark(&mut self) {
		let recipe = match &mut self.recipe {
			Some(recipe) => recipe,
			None => {
				warn!("No current recipe; ignoring bookmark request.");
				return;
			}
		};
		recipe.bookmarked = true;
		let recipe = recipe.clone();
		self.bookmarks.push(recipe);
	}

	/// Removes a bookmark by recipe id, unmarking the current recipe when it
	/// is the one removed.
	pub fn delete_bookmark(&mut self, id: &str) {
		self.bookmarks.retain(|bookmark| bookmark.id != id);
		if let Some(recipe) = &mut self.recipe {
			if recipe.id == id {
				recipe.bookmarked = false;
			}
		}
	}

	/// The bookmark list as previews, for list rendering.
	#[must_use]
	pub fn bookmark_previews(&self) -> Vec<Preview> {
		self.bookmarks.iter().map(Preview::from).collect()
	}

	/// Parses an upload draft, sends it to the data collaborator, bookmarks
	/// the created recipe and makes it current.
	pub fn upload_recipe(&mut self, draft: &RecipeDraft) -> Result<(), ApiError> {
		let ingredients = draft
			.ingredients
			.iter()
			.filter(|line| !line.trim().is_empty())
			.map(|line| parse_ingredient(line))
			.collect::<Result<Vec<_>, _>>()?;
		let recipe = Recipe {
			id: String::new(),
			title: draft.title.clone(),
			publisher: draft.publisher.clone(),
			source_url: draft.source_url.clone(),
			image_url: draft.image_url.clone(),
			servings: draft.servings,
			cooking_time: draft.cooking_time,
			ingredients,
			key: None,
			bookmarked: false,
		};
		self.recipe = Some(self.source.create_recipe(&recipe)?);
		self.add_bookmark();
		Ok(())
	}
}

fn parse_ingredient(line: &str) -> Result<Ingredient, ApiError> {
	let parts: Vec<&str> = line.split(',').map(str::trim).collect();
	if parts.len() != 3 {
		return Err(ApiError::InvalidDraft { line: line.to_owned() });
	}
	let quantity = if parts[0].is_empty() {
		None
	} else {
		Some(parts[0].parse::<f64>().map_err(|_| ApiError::InvalidDraft { line: line.to_owned() })?)
	};
	Ok(Ingredient {
		quantity,
		unit: parts[1].to_owned(),
		description: parts[2].to_owned(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NullSource;
	impl RecipeSource for NullSource {
		fn fetch_recipe(&self, id: &str) -> Result<Recipe, ApiError> {
			Err(ApiError::NotFound { id: id.to_owned() })
		}
		fn search(&self, _query: &str) -> Result<Vec<Preview>, ApiError> {
			Ok(Vec::new())
		}
		fn create_recipe(&self, recipe: &Recipe) -> Result<Recipe, ApiError> {
			let mut created = recipe.clone();
			created.id = "created".to_owned();
			Ok(created)
		}
	}

	fn pasta() -> Recipe {
		Recipe {
			id: "r1".to_owned(),
			title: "Pasta".to_owned(),
			publisher: "Test Kitchen".to_owned(),
			source_url: "https://example.com/pasta".to_owned(),
			image_url: "https://example.com/pasta.jpg".to_owned(),
			servings: 4,
			cooking_time: 30,
			ingredients: vec![
				Ingredient {
					quantity: Some(2.0),
					unit: "kg".to_owned(),
					description: "tomatoes".to_owned(),
				},
				Ingredient {
					quantity: None,
					unit: String::new(),
					description: "salt".to_owned(),
				},
			],
			key: None,
			bookmarked: false,
		}
	}

	fn model() -> Model {
		Model::new(Box::new(NullSource))
	}

	#[test]
	fn servings_rescale_quantities() {
		let mut model = model();
		model.recipe = Some(pasta());
		model.update_servings(8);
		let recipe = model.recipe.as_ref().unwrap();
		assert_eq!(recipe.servings, 8);
		assert_eq!(recipe.ingredients[0].quantity, Some(4.0));
		assert_eq!(recipe.ingredients[1].quantity, None);
	}

	#[test]
	fn zero_servings_are_refused() {
		let mut model = model();
		model.recipe = Some(pasta());
		model.update_servings(0);
		assert_eq!(model.recipe.as_ref().unwrap().servings, 4);
	}

	#[test]
	fn pagination_slices_and_remembers_the_page() {
		let mut model = model();
		model.search.results = (0..23)
			.map(|i| Preview {
				id: format!("r{i}"),
				title: format!("Recipe {i}"),
				publisher: String::new(),
				image_url: String::new(),
				key: None,
			})
			.collect();
		assert_eq!(model.total_pages(), 3);
		let page = model.search_results_page(Some(3));
		assert_eq!(page.len(), 3);
		assert_eq!(page[0].id, "r20");
		assert_eq!(model.search.page, 3);
		assert!(model.search_results_page(Some(9)).is_empty());
	}

	#[test]
	fn bookmark_toggle_tracks_the_current_recipe() {
		let mut model = model();
		model.recipe = Some(pasta());
		model.add_bookmark();
		assert!(model.recipe.as_ref().unwrap().bookmarked);
		assert_eq!(model.bookmarks.len(), 1);
		assert!(model.bookmarks[0].bookmarked);
		model.delete_bookmark("r1");
		assert!(model.bookmarks.is_empty());
		assert!(!model.recipe.as_ref().unwrap().bookmarked);
	}

	#[test]
	fn drafts_parse_or_fail_loudly() {
		assert_eq!(
			parse_ingredient("0.5,kg,rice").unwrap(),
			Ingredient {
				quantity: Some(0.5),
				unit: "kg".to_owned(),
				description: "rice".to_owned(),
			}
		);
		assert_eq!(parse_ingredient(",,to taste").unwrap().quantity, None);
		assert!(matches!(parse_ingredient("just rice"), Err(ApiError::InvalidDraft { .. })));
		assert!(matches!(parse_ingredient("much,kg,rice"), Err(ApiError::InvalidDraft { .. })));
	}

	#[test]
	fn upload_makes_the_created_recipe_current_and_bookmarked() {
		let mut model = model();
		let draft = RecipeDraft {
			title: "Rice".to_owned(),
			servings: 2,
			ingredients: vec!["1,kg,rice".to_owned(), String::new()],
			..RecipeDraft::default()
		};
		model.upload_recipe(&draft).unwrap();
		let recipe = model.recipe.as_ref().unwrap();
		assert_eq!(recipe.id, "created");
		assert!(recipe.bookmarked);
		assert_eq!(model.bookmarks.len(), 1);
	}
}
