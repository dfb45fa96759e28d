//! Mount/render control: per mount point, decide between a full replace and
//! an incremental patch, and own the currently displayed data.

use crate::config;
use crate::diff;
use crate::dom::{escape_text, Tree};
use crate::load::{self, ParseError};
use tracing::{instrument, trace};

/// A pure markup generator: one domain record in, one markup string out.
/// No state, no side effects.
pub trait Template {
	type Data;

	/// Generates the component's markup for `data`.
	fn markup(&self, data: &Self::Data) -> String;

	/// Whether `data` counts as an empty collection. Rendering empty data
	/// falls back to the error overlay.
	fn is_empty(&self, _data: &Self::Data) -> bool {
		false
	}

	/// Message shown by the error overlay when the caller supplies none.
	fn error_message(&self) -> &str {
		"Something went wrong. Please try again!"
	}

	/// Message shown by the message overlay when the caller supplies none.
	fn message(&self) -> &str {
		"Done!"
	}
}

/// What a mount point is currently showing.
///
/// The overlay states look terminal but are not: any later render or update
/// exits them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ViewState<D> {
	/// Nothing mounted yet.
	Empty,
	/// Live data, carrying the displayed-data snapshot. Replaced wholesale on
	/// every render/update, never partially mutated.
	Displaying(D),
	Spinner,
	Error(String),
	Message(String),
}

/// One view component: a template bound to one container, obtained at
/// construction and never reassigned. The view is the only writer of its
/// container's tree.
pub struct View<T: Template> {
	template: T,
	container: Tree,
	state: ViewState<T::Data>,
}

impl<T: Template> View<T> {
	pub fn new(template: T) -> Self {
		Self {
			template,
			container: Tree::new(),
			state: ViewState::Empty,
		}
	}

	#[must_use]
	pub fn template(&self) -> &T {
		&self.template
	}

	#[must_use]
	pub fn container(&self) -> &Tree {
		&self.container
	}

	#[must_use]
	pub fn state(&self) -> &ViewState<T::Data> {
		&self.state
	}

	/// The displayed-data snapshot, when the view is displaying data.
	#[must_use]
	pub fn data(&self) -> Option<&T::Data> {
		match &self.state {
			ViewState::Displaying(data) => Some(data),
			_ => None,
		}
	}

	/// Full replace: drops the mounted tree and inserts freshly parsed
	/// markup for `data`.
	///
	/// Absent or empty data renders the default error overlay instead and
	/// leaves the displayed-data snapshot unset.
	#[instrument(skip(self, data))]
	pub fn render(&mut self, data: Option<T::Data>) -> Result<(), ParseError> {
		let data = match data {
			Some(data) if !self.template.is_empty(&data) => data,
			_ => {
				trace!("Absent or empty data; rendering the error overlay.");
				return self.render_error(None);
			}
		};
		let markup = self.template.markup(&data);
		self.replace(&markup)?;
		self.state = ViewState::Displaying(data);
		Ok(())
	}

	/// Incremental patch: generates candidate markup for `data` and
	/// reconciles it into the mounted tree, preserving node identity
	/// wherever nothing changed.
	///
	/// Caller obligation: the mounted tree is structurally congruent with
	/// what the template produces for `data` (normally: the view is
	/// displaying data of the same shape). Violations degrade as described
	/// in [`diff::reconcile`].
	#[instrument(skip(self, data))]
	pub fn update(&mut self, data: T::Data) -> Result<(), ParseError> {
		let markup = self.template.markup(&data);
		diff::reconcile_markup(&mut self.container, &markup)?;
		self.state = ViewState::Displaying(data);
		Ok(())
	}

	/// Full-replaces the container with the spinner overlay.
	pub fn render_spinner(&mut self) -> Result<(), ParseError> {
		self.replace(&spinner_markup())?;
		self.state = ViewState::Spinner;
		Ok(())
	}

	/// Full-replaces the container with the error overlay. With no message,
	/// the template's default is shown.
	pub fn render_error(&mut self, message: Option<&str>) -> Result<(), ParseError> {
		let message = message.unwrap_or_else(|| self.template.error_message()).to_owned();
		self.replace(&error_markup(&message))?;
		self.state = ViewState::Error(message);
		Ok(())
	}

	/// Full-replaces the container with the message overlay. With no
	/// message, the template's default is shown.
	pub fn render_message(&mut self, message: Option<&str>) -> Result<(), ParseError> {
		let message = message.unwrap_or_else(|| self.template.message()).to_owned();
		self.replace(&message_markup(&message))?;
		self.state = ViewState::Message(message);
		Ok(())
	}

	fn replace(&mut self, markup: &str) -> Result<(), ParseError> {
		// Parse first: a failed parse must leave the mounted tree untouched.
		let fresh = load::parse(markup)?;
		self.container.clear();
		self.container.adopt(&fresh);
		Ok(())
	}
}

fn spinner_markup() -> String {
	format!(
		r#"<div class="spinner">
	<svg>
		<use href="{icons}#icon-loader"></use>
	</svg>
</div>"#,
		icons = config::ICONS
	)
}

fn error_markup(message: &str) -> String {
	format!(
		r#"<div class="error">
	<div>
		<svg>
			<use href="{icons}#icon-alert-triangle"></use>
		</svg>
	</div>
	<p>{message}</p>
</div>"#,
		icons = config::ICONS,
		message = escape_text(message)
	)
}

fn message_markup(message: &str) -> String {
	format!(
		r#"<div class="message">
	<div>
		<svg>
			<use href="{icons}#icon-smile"></use>
		</svg>
	</div>
	<p>{message}</p>
</div>"#,
		icons = config::ICONS,
		message = escape_text(message)
	)
}
