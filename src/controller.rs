//! The application controller: orchestrates the data collaborator, the
//! markup generators and the mount/render controllers per user action.
//!
//! Every collaborator is passed in explicitly: one view instance per mount
//! point, constructed here, no module-level singletons. Failures from the
//! data collaborator are caught here and rendered as error overlays; nothing
//! in this layer retries.

use crate::api::{ApiError, RecipeSource};
use crate::events::{EventPayload, EventRegistry, UiEvent};
use crate::load::ParseError;
use crate::model::{Model, RecipeDraft};
use crate::view::View;
use crate::views::{
	AddRecipeView, BookmarksTemplate, BookmarksView, PageInfo, PaginationTemplate, PaginationView, PreviewList, RecipeTemplate,
	RecipeView, ResultsTemplate, ResultsView, SearchView, UploadTemplate,
};
use thiserror::Error;
use tracing::{error, instrument, warn};

/// Anything a control flow can trip over: the data collaborator failing, or
/// generated markup failing to parse.
#[derive(Debug, Error)]
enum ControlError {
	#[error(transparent)]
	Api(#[from] ApiError),

	#[error(transparent)]
	Markup(#[from] ParseError),
}

/// The application's working state: the model and one view per mount point.
pub struct Core {
	pub model: Model,
	pub recipe_view: RecipeView,
	pub results_view: ResultsView,
	pub pagination_view: PaginationView,
	pub bookmarks_view: BookmarksView,
	pub add_recipe_view: AddRecipeView,
	pub search_view: SearchView,
	selected: Option<String>,
}

impl Core {
	fn new(source: Box<dyn RecipeSource>) -> Result<Self, ParseError> {
		Ok(Self {
			model: Model::new(source),
			recipe_view: View::new(RecipeTemplate),
			results_view: View::new(ResultsTemplate),
			pagination_view: View::new(PaginationTemplate),
			bookmarks_view: View::new(BookmarksTemplate),
			add_recipe_view: View::new(UploadTemplate),
			search_view: SearchView::new()?,
			selected: None,
		})
	}

	/// The currently selected recipe id, when one is.
	#[must_use]
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// A recipe was selected: refresh list highlights, then load and show it.
	#[instrument(skip(self))]
	pub fn control_recipe(&mut self, id: &str) {
		self.selected = Some(id.to_owned());
		if let Err(control_error) = self.show_recipe(id) {
			error!(error = %control_error, "Failed to show recipe.");
			if let Err(overlay_error) = self.recipe_view.render_error(None) {
				error!(error = %overlay_error, "Failed to render the error overlay.");
			}
		}
	}

	fn show_recipe(&mut self, id: &str) -> Result<(), ControlError> {
		self.recipe_view.render_spinner()?;

		// Re-mark the selected entry on whatever lists are showing. These are
		// updates, not renders: only the active class moves.
		let items = self.model.search_results_page(None);
		self.results_view.update(PreviewList {
			items,
			selected: self.selected.clone(),
		})?;
		self.bookmarks_view.update(PreviewList {
			items: self.model.bookmark_previews(),
			selected: self.selected.clone(),
		})?;

		self.model.load_recipe(id)?;
		self.recipe_view.render(self.model.recipe.clone())?;
		Ok(())
	}

	/// The search form was submitted: read the query, load and show page one.
	#[instrument(skip(self))]
	pub fn control_search(&mut self) {
		if let Err(control_error) = self.show_search_results() {
			// Search failures are logged, not rendered; the spinner stays
			// until the next interaction.
			error!(error = %control_error, "Search failed.");
		}
	}

	fn show_search_results(&mut self) -> Result<(), ControlError> {
		self.results_view.render_spinner()?;
		let query = self.search_view.query();
		if query.is_empty() {
			return Ok(());
		}
		self.model.load_search_results(&query)?;
		let items = self.model.search_results_page(None);
		self.results_view.render(Some(PreviewList {
			items,
			selected: self.selected.clone(),
		}))?;
		self.pagination_view.render(Some(self.page_info()))?;
		Ok(())
	}

	/// A pagination control was activated: show that page and new controls.
	#[instrument(skip(self))]
	pub fn control_pagination(&mut self, page: usize) {
		if let Err(control_error) = self.show_results_page(page) {
			error!(error = %control_error, "Failed to show results page.");
		}
	}

	fn show_results_page(&mut self, page: usize) -> Result<(), ControlError> {
		let items = self.model.search_results_page(Some(page));
		self.results_view.render(Some(PreviewList {
			items,
			selected: self.selected.clone(),
		}))?;
		self.pagination_view.render(Some(self.page_info()))?;
		Ok(())
	}

	/// A servings stepper was activated: rescale in the model, then patch the
	/// recipe view in place. An update, not a render: a full replace here
	/// would flicker the header image and lose scroll state for a one-number
	/// change.
	#[instrument(skip(self))]
	pub fn control_servings(&mut self, servings: u32) {
		self.model.update_servings(servings);
		let recipe = match self.model.recipe.clone() {
			Some(recipe) => recipe,
			None => {
				warn!("No current recipe; nothing to update.");
				return;
			}
		};
		if let Err(control_error) = self.recipe_view.update(recipe) {
			error!(error = %control_error, "Failed to update the recipe view.");
		}
	}

	/// The bookmark button was activated: toggle, patch the recipe view,
	/// re-render the bookmark list.
	#[instrument(skip(self))]
	pub fn control_bookmark_toggle(&mut self) {
		let bookmarked_id = match &self.model.recipe {
			Some(recipe) if recipe.bookmarked => Some(recipe.id.clone()),
			Some(_) => None,
			None => {
				warn!("No current recipe; ignoring bookmark toggle.");
				return;
			}
		};
		match bookmarked_id {
			Some(id) => self.model.delete_bookmark(&id),
			None => self.model.add_bookmark(),
		}
		if let Err(control_error) = self.refresh_bookmark_views() {
			error!(error = %control_error, "Failed to refresh bookmark views.");
		}
	}

	fn refresh_bookmark_views(&mut self) -> Result<(), ControlError> {
		if let Some(recipe) = self.model.recipe.clone() {
			self.recipe_view.update(recipe)?;
		}
		self.bookmarks_view.render(Some(PreviewList {
			items: self.model.bookmark_previews(),
			selected: self.selected.clone(),
		}))?;
		Ok(())
	}

	/// Stored bookmarks became available: show them.
	#[instrument(skip(self))]
	pub fn control_bookmarks(&mut self) {
		let list = PreviewList {
			items: self.model.bookmark_previews(),
			selected: self.selected.clone(),
		};
		if let Err(control_error) = self.bookmarks_view.render(Some(list)) {
			error!(error = %control_error, "Failed to render bookmarks.");
		}
	}

	/// The upload form was submitted: create the recipe remotely, show it,
	/// confirm, and refresh the bookmark list.
	#[instrument(skip(self, draft))]
	pub fn control_upload(&mut self, draft: &RecipeDraft) {
		if let Err(control_error) = self.show_uploaded_recipe(draft) {
			error!(error = %control_error, "Upload failed.");
			let message = control_error.to_string();
			if let Err(overlay_error) = self.add_recipe_view.render_error(Some(&message)) {
				error!(error = %overlay_error, "Failed to render the error overlay.");
			}
		}
	}

	fn show_uploaded_recipe(&mut self, draft: &RecipeDraft) -> Result<(), ControlError> {
		self.add_recipe_view.render_spinner()?;
		self.model.upload_recipe(draft)?;
		self.recipe_view.render(self.model.recipe.clone())?;
		self.add_recipe_view.render_message(None)?;
		self.bookmarks_view.render(Some(PreviewList {
			items: self.model.bookmark_previews(),
			selected: self.selected.clone(),
		}))?;
		if let Some(recipe) = &self.model.recipe {
			self.selected = Some(recipe.id.clone());
		}
		Ok(())
	}

	fn page_info(&self) -> PageInfo {
		PageInfo {
			page: self.model.search.page,
			total_pages: self.model.total_pages(),
		}
	}
}

/// The assembled application: working state plus the event wiring that
/// drives it.
pub struct App {
	core: Core,
	registry: EventRegistry<Core>,
}

impl App {
	/// Builds the application over the given data collaborator and wires
	/// every control flow into the event registry.
	pub fn new(source: Box<dyn RecipeSource>) -> Result<Self, ParseError> {
		let core = Core::new(source)?;
		let mut registry = EventRegistry::new();
		wire(&mut registry);
		Ok(Self { core, registry })
	}

	/// Feeds one user interaction through the registry. Returns how many
	/// handlers ran.
	pub fn dispatch(&mut self, event: UiEvent, payload: &EventPayload) -> usize {
		self.registry.dispatch(&mut self.core, event, payload)
	}

	#[must_use]
	pub fn core(&self) -> &Core {
		&self.core
	}

	pub fn core_mut(&mut self) -> &mut Core {
		&mut self.core
	}
}

fn wire(registry: &mut EventRegistry<Core>) {
	registry.add_handler(UiEvent::BookmarksRestored, |core, _| core.control_bookmarks());
	registry.add_handler(UiEvent::RecipeSelected, |core, payload| match payload {
		EventPayload::RecipeId(id) => core.control_recipe(id),
		other => warn!(?other, "Ignoring a recipe selection without an id."),
	});
	registry.add_handler(UiEvent::SearchSubmitted, |core, _| core.control_search());
	registry.add_handler(UiEvent::PageSelected, |core, payload| match payload {
		EventPayload::Page(page) => core.control_pagination(*page),
		other => warn!(?other, "Ignoring a page selection without a page."),
	});
	registry.add_handler(UiEvent::ServingsAdjusted, |core, payload| match payload {
		EventPayload::Servings(servings) => core.control_servings(*servings),
		other => warn!(?other, "Ignoring a servings change without a count."),
	});
	registry.add_handler(UiEvent::BookmarkToggled, |core, _| core.control_bookmark_toggle());
	registry.add_handler(UiEvent::RecipeSubmitted, |core, payload| match payload {
		EventPayload::Draft(draft) => core.control_upload(draft),
		other => warn!(?other, "Ignoring an upload without a draft."),
	});
}
