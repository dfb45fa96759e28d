//! Application-wide constants.

use core::time::Duration;

/// Base URL of the remote recipe API. Recipe ids are appended directly.
pub const API_URL: &str = "https://forkify-api.herokuapp.com/api/v2/recipes/";

/// Hard deadline for any single API request.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Search results shown per page.
pub const RESULTS_PER_PAGE: usize = 10;

/// Path of the icon sprite referenced by generated markup.
pub const ICONS: &str = "icons.svg";
