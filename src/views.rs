//! Concrete view components: markup generators for each mount point of the
//! application, plus the static search form.
//!
//! Templates are pure string builders; every dynamic value is escaped before
//! interpolation so the produced markup always parses back.

use crate::config;
use crate::dom::{escape_attribute, escape_text, Tree};
use crate::load::{self, ParseError};
use crate::model::{Ingredient, Preview, Recipe};
use crate::view::{Template, View};
use tracing::error;

pub type RecipeView = View<RecipeTemplate>;
pub type ResultsView = View<ResultsTemplate>;
pub type BookmarksView = View<BookmarksTemplate>;
pub type PaginationView = View<PaginationTemplate>;
pub type AddRecipeView = View<UploadTemplate>;

/// A list of result previews, with the selected recipe marked.
///
/// The selected id travels with the data instead of being read from a global
/// location, so the generator stays a pure function.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewList {
	pub items: Vec<Preview>,
	pub selected: Option<String>,
}

/// Paging facts the pagination controls are generated from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageInfo {
	pub page: usize,
	pub total_pages: usize,
}

/// Full recipe detail: header figure, info row with servings steppers,
/// bookmark button, ingredient list, directions link.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecipeTemplate;

impl Template for RecipeTemplate {
	type Data = Recipe;

	fn markup(&self, recipe: &Recipe) -> String {
		let ingredients: String = recipe.ingredients.iter().map(ingredient_markup).collect();
		let bookmark_fill = if recipe.bookmarked { "-fill" } else { "" };
		format!(
			r#"<figure class="recipe__fig">
	<img src="{image}" alt="{title}" class="recipe__img">
	<h1 class="recipe__title">
		<span>{title}</span>
	</h1>
</figure>
<div class="recipe__details">
	<div class="recipe__info">
		<svg class="recipe__info-icon">
			<use href="{icons}#icon-clock"></use>
		</svg>
		<span class="recipe__info-data recipe__info-data--minutes">{minutes}</span>
		<span class="recipe__info-text">minutes</span>
	</div>
	<div class="recipe__info">
		<svg class="recipe__info-icon">
			<use href="{icons}#icon-users"></use>
		</svg>
		<span class="recipe__info-data recipe__info-data--people">{servings}</span>
		<span class="recipe__info-text">servings</span>
		<div class="recipe__info-buttons">
			<button class="btn--tiny btn--update-servings" data-update-to="{fewer}">
				<svg>
					<use href="{icons}#icon-minus-circle"></use>
				</svg>
			</button>
			<button class="btn--tiny btn--update-servings" data-update-to="{more}">
				<svg>
					<use href="{icons}#icon-plus-circle"></use>
				</svg>
			</button>
		</div>
	</div>
	<button class="btn--round btn--bookmark">
		<svg>
			<use href="{icons}#icon-bookmark{bookmark_fill}"></use>
		</svg>
	</button>
</div>
<div class="recipe__ingredients">
	<h2 class="heading--2">Recipe ingredients</h2>
	<ul class="recipe__ingredient-list">{ingredients}
	</ul>
</div>
<div class="recipe__directions">
	<h2 class="heading--2">How to cook it</h2>
	<p class="recipe__directions-text">
		This recipe was carefully designed and tested by
		<span class="recipe__publisher">{publisher}</span>. Please check out
		directions at their website.
	</p>
	<a class="btn--small recipe__btn" href="{source}" target="_blank">
		<span>Directions</span>
	</a>
</div>"#,
			icons = config::ICONS,
			image = escape_attribute(&recipe.image_url),
			title = escape_text(&recipe.title),
			minutes = recipe.cooking_time,
			servings = recipe.servings,
			fewer = recipe.servings.saturating_sub(1),
			more = recipe.servings + 1,
			bookmark_fill = bookmark_fill,
			ingredients = ingredients,
			publisher = escape_text(&recipe.publisher),
			source = escape_attribute(&recipe.source_url),
		)
	}

	fn error_message(&self) -> &str {
		"We could not find that recipe. Please try another one!"
	}
}

fn ingredient_markup(ingredient: &Ingredient) -> String {
	format!(
		r#"
		<li class="recipe__ingredient">
			<svg class="recipe__icon">
				<use href="{icons}#icon-check"></use>
			</svg>
			<div class="recipe__quantity">{quantity}</div>
			<div class="recipe__description">
				<span class="recipe__unit">{unit}</span>
				{description}
			</div>
		</li>"#,
		icons = config::ICONS,
		quantity = format_quantity(ingredient.quantity),
		unit = escape_text(&ingredient.unit),
		description = escape_text(&ingredient.description),
	)
}

/// Renders a quantity the way a cook reads it: whole numbers bare, fractions
/// to at most two decimals, absent quantities as nothing at all.
#[allow(clippy::cast_possible_truncation)]
fn format_quantity(quantity: Option<f64>) -> String {
	match quantity {
		None => String::new(),
		Some(quantity) if quantity.fract().abs() < 1e-9 => format!("{}", quantity.round() as i64),
		Some(quantity) => {
			let rounded = format!("{quantity:.2}");
			rounded.trim_end_matches('0').trim_end_matches('.').to_owned()
		}
	}
}

fn preview_markup(preview: &Preview, selected: Option<&str>) -> String {
	let active = if selected == Some(preview.id.as_str()) {
		" preview__link--active"
	} else {
		""
	};
	format!(
		r##"
<li class="preview">
	<a class="preview__link{active}" href="#{id}">
		<figure class="preview__fig">
			<img src="{image}" alt="{title}">
		</figure>
		<div class="preview__data">
			<h4 class="preview__title">{title}</h4>
			<p class="preview__publisher">{publisher}</p>
		</div>
	</a>
</li>"##,
		active = active,
		id = escape_attribute(&preview.id),
		image = escape_attribute(&preview.image_url),
		title = escape_text(&preview.title),
		publisher = escape_text(&preview.publisher),
	)
}

/// The search result list.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultsTemplate;

impl Template for ResultsTemplate {
	type Data = PreviewList;

	fn markup(&self, list: &PreviewList) -> String {
		list.items.iter().map(|item| preview_markup(item, list.selected.as_deref())).collect()
	}

	fn is_empty(&self, list: &PreviewList) -> bool {
		list.items.is_empty()
	}

	fn error_message(&self) -> &str {
		"No recipes found for your query. Please try again!"
	}
}

/// The bookmark list. Same item markup as search results.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookmarksTemplate;

impl Template for BookmarksTemplate {
	type Data = PreviewList;

	fn markup(&self, list: &PreviewList) -> String {
		list.items.iter().map(|item| preview_markup(item, list.selected.as_deref())).collect()
	}

	fn is_empty(&self, list: &PreviewList) -> bool {
		list.items.is_empty()
	}

	fn error_message(&self) -> &str {
		"No bookmarks yet. Find a nice recipe and bookmark it!"
	}
}

/// Previous/next page controls. The markup deliberately changes shape
/// between first, middle and last pages, which is why the controller always
/// full-renders this view and never updates it incrementally.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaginationTemplate;

impl Template for PaginationTemplate {
	type Data = PageInfo;

	fn markup(&self, info: &PageInfo) -> String {
		let mut out = String::new();
		if info.total_pages <= 1 {
			return out;
		}
		if info.page > 1 {
			out.push_str(&page_button_markup(info.page - 1, "prev", "icon-arrow-left"));
		}
		if info.page < info.total_pages {
			out.push_str(&page_button_markup(info.page + 1, "next", "icon-arrow-right"));
		}
		out
	}
}

fn page_button_markup(target: usize, direction: &str, icon: &str) -> String {
	format!(
		r#"
<button data-goto="{target}" class="btn--inline pagination__btn--{direction}">
	<svg class="search__icon">
		<use href="{icons}#{icon}"></use>
	</svg>
	<span>Page {target}</span>
</button>"#,
		target = target,
		direction = direction,
		icons = config::ICONS,
		icon = icon,
	)
}

/// The upload form. Rendered once as a static fragment; the view's overlays
/// (spinner, success message, error) do the talking afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct UploadTemplate;

impl Template for UploadTemplate {
	type Data = ();

	fn markup(&self, _data: &()) -> String {
		let mut ingredients = String::new();
		for i in 1..=6 {
			ingredients.push_str(&format!(
				r#"
		<label>Ingredient {i}</label>
		<input value="" type="text" name="ingredient-{i}" placeholder="Format: 'Quantity,Unit,Description'">"#,
				i = i
			));
		}
		format!(
			r#"<form class="upload">
	<div class="upload__column">
		<h3 class="upload__heading">Recipe data</h3>
		<label>Title</label>
		<input value="" required name="title" type="text">
		<label>URL</label>
		<input value="" required name="sourceUrl" type="text">
		<label>Image URL</label>
		<input value="" required name="image" type="text">
		<label>Publisher</label>
		<input value="" required name="publisher" type="text">
		<label>Prep time</label>
		<input value="" required name="cookingTime" type="number">
		<label>Servings</label>
		<input value="" required name="servings" type="number">
	</div>
	<div class="upload__column">
		<h3 class="upload__heading">Ingredients</h3>{ingredients}
	</div>
	<button class="btn upload__btn">
		<svg>
			<use href="{icons}#icon-upload-cloud"></use>
		</svg>
		<span>Upload</span>
	</button>
</form>"#,
			ingredients = ingredients,
			icons = config::ICONS,
		)
	}

	fn message(&self) -> &str {
		"Recipe was successfully uploaded!"
	}
}

/// The static search form. Not a [`View`]: it never renders data, it only
/// hands the typed query to the controller.
pub struct SearchView {
	container: Tree,
}

impl SearchView {
	pub fn new() -> Result<Self, ParseError> {
		let form = load::parse(&search_form_markup())?;
		let mut container = Tree::new();
		container.adopt(&form);
		Ok(Self { container })
	}

	#[must_use]
	pub fn container(&self) -> &Tree {
		&self.container
	}

	/// Simulates typing: sets the search field's value.
	pub fn set_query(&mut self, query: &str) {
		match self.container.element_with_class("search__field") {
			Some(field) => {
				self.container.set_attribute(field, "value", query);
			}
			None => error!("Search field not mounted."),
		}
	}

	/// Reads the typed query and clears the field, ready for the next search.
	pub fn query(&mut self) -> String {
		let field = match self.container.element_with_class("search__field") {
			Some(field) => field,
			None => {
				error!("Search field not mounted.");
				return String::new();
			}
		};
		let query = self.container.attribute(field, "value").unwrap_or_default().to_owned();
		self.container.set_attribute(field, "value", "");
		query
	}
}

fn search_form_markup() -> String {
	format!(
		r#"<form class="search">
	<input type="text" class="search__field" placeholder="Search over 1,000,000 recipes..." value="">
	<button class="btn search__btn">
		<svg class="search__icon">
			<use href="{icons}#icon-search"></use>
		</svg>
		<span>Search</span>
	</button>
</form>"#,
		icons = config::ICONS
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn preview(id: &str) -> Preview {
		Preview {
			id: id.to_owned(),
			title: format!("Recipe {id}"),
			publisher: "Test Kitchen".to_owned(),
			image_url: format!("https://example.com/{id}.jpg"),
			key: None,
		}
	}

	#[test]
	fn every_template_produces_parseable_markup() {
		let recipe = Recipe {
			id: "r1".to_owned(),
			title: "Salt & Pepper Pasta <3".to_owned(),
			publisher: "Test \"Kitchen\"".to_owned(),
			source_url: "https://example.com/pasta?a=1&b=2".to_owned(),
			image_url: "https://example.com/pasta.jpg".to_owned(),
			servings: 4,
			cooking_time: 30,
			ingredients: vec![Ingredient {
				quantity: Some(0.5),
				unit: "kg".to_owned(),
				description: "tomatoes & basil".to_owned(),
			}],
			key: None,
			bookmarked: true,
		};
		load::parse(&RecipeTemplate.markup(&recipe)).unwrap();
		let list = PreviewList {
			items: vec![preview("a"), preview("b")],
			selected: Some("a".to_owned()),
		};
		load::parse(&ResultsTemplate.markup(&list)).unwrap();
		load::parse(&BookmarksTemplate.markup(&list)).unwrap();
		load::parse(&PaginationTemplate.markup(&PageInfo { page: 2, total_pages: 3 })).unwrap();
		load::parse(&UploadTemplate.markup(&())).unwrap();
	}

	#[test]
	fn selected_preview_is_marked_active() {
		let list = PreviewList {
			items: vec![preview("a"), preview("b")],
			selected: Some("b".to_owned()),
		};
		let tree = load::parse(&ResultsTemplate.markup(&list)).unwrap();
		let active = tree.element_with_class("preview__link--active").unwrap();
		assert_eq!(tree.attribute(active, "href"), Some("#b"));
	}

	#[test]
	fn pagination_shape_follows_the_page() {
		let first = PaginationTemplate.markup(&PageInfo { page: 1, total_pages: 3 });
		assert!(first.contains("pagination__btn--next") && !first.contains("pagination__btn--prev"));
		let middle = PaginationTemplate.markup(&PageInfo { page: 2, total_pages: 3 });
		assert!(middle.contains("pagination__btn--next") && middle.contains("pagination__btn--prev"));
		let last = PaginationTemplate.markup(&PageInfo { page: 3, total_pages: 3 });
		assert!(!last.contains("pagination__btn--next") && last.contains("pagination__btn--prev"));
		assert_eq!(PaginationTemplate.markup(&PageInfo { page: 1, total_pages: 1 }), "");
	}

	#[test]
	fn quantities_format_for_cooks() {
		assert_eq!(format_quantity(None), "");
		assert_eq!(format_quantity(Some(4.0)), "4");
		assert_eq!(format_quantity(Some(0.5)), "0.5");
		assert_eq!(format_quantity(Some(4.0 / 3.0)), "1.33");
	}

	#[test]
	fn search_view_reads_and_clears_the_query() {
		let mut search = SearchView::new().unwrap();
		search.set_query("pizza");
		assert_eq!(search.query(), "pizza");
		assert_eq!(search.query(), "");
	}
}
