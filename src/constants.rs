// src/constants.rs
//
// Application-wide constants. Each constant is documented with its purpose and usage context.

/// Backend origin used when neither flag, environment nor config file provide one.
///
/// Used in: `infrastructure/config.rs`
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Request timeout for backend calls in seconds.
///
/// Used in: `infrastructure/config.rs`, `infrastructure/api.rs`
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Quiet period in milliseconds the editor waits after the last edit before saving.
///
/// Every keystroke restarts the period, so fast typing produces a single save.
///
/// Used in: `application/note_editor.rs`, `infrastructure/config.rs`
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 1000;

/// Title given to a note created locally before its first save.
///
/// Used in: `domain/note.rs`
pub const DRAFT_NOTE_TITLE: &str = "New note";

/// Environment variable overriding the backend origin.
///
/// Used in: `cli/args.rs`
pub const API_URL_ENV: &str = "CTFDESK_API_URL";

/// Delay in milliseconds after launching the browser before the preview temp dir may go away.
///
/// Used in: `infrastructure/renderer.rs`
pub const BROWSER_LAUNCH_DELAY_MS: u64 = 500;
