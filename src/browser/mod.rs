//! Browser integration
//!
//! This module connects the coordinator to a real Chromium instance over the DevTools protocol:
//! - `BrowserSession`: launching a browser or attaching to an authenticated one
//! - `ChromeListing`: the listing tab, implementing `ListingNavigator`
//! - `ChromeDetails`: per-item tabs, implementing `DetailBrowser`
//! - `extract`: the HTML heuristics both of them apply to page snapshots

mod details;
pub mod extract;
mod listing;
mod session;

pub use details::ChromeDetails;
pub use listing::ChromeListing;
pub use session::BrowserSession;

use crate::HarvestError;
use chromiumoxide::error::CdpError;

/// Maps a DevTools failure onto the harvest error taxonomy
///
/// A page whose execution context is not ready yet is worth retrying; anything else is not.
pub(crate) fn classify_cdp_error(action: &str, error: CdpError) -> HarvestError {
    let message = error.to_string();
    if is_context_not_ready(&message) {
        HarvestError::Transient(format!("{}: {}", action, message))
    } else {
        HarvestError::Browser(format!("{}: {}", action, message))
    }
}

fn is_context_not_ready(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("execution context")
        || message.contains("cannot find context")
        || message.contains("receiving end does not exist")
}
