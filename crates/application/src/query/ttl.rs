//! Default freshness windows per query.

use std::time::Duration;

/// Paginated user listings.
pub const USERS_LIST: Duration = Duration::from_secs(2 * 60);

/// A single record fetched by id.
pub const SINGLE_RECORD: Duration = Duration::from_secs(5 * 60);

/// The logged-in user's own profile.
pub const CURRENT_USER: Duration = Duration::from_secs(5 * 60);

/// The key/value translation map of one language.
pub const TRANSLATION_MAP: Duration = Duration::from_secs(5 * 60);

/// The list of languages that have translations.
pub const LANGUAGES: Duration = Duration::from_secs(10 * 60);

/// Listings without a dedicated window.
pub const DEFAULT_LIST: Duration = Duration::from_secs(60);
