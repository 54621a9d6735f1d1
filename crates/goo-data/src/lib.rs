//! Goo Data -- file-backed rule sources for the goo resolver.
//!
//! Each pusher reads one data file from a config directory. Any of RON,
//! JSON, or TOML is accepted, detected by extension:
//!
//! | File            | Pusher                 | Phase        |
//! |-----------------|------------------------|--------------|
//! | `values.*`      | [`RawValuePusher`]     | `Initialize` |
//! | `baseline.*`    | [`BaselinePusher`]     | `Baseline`   |
//! | `denied.*`      | [`DenyListPusher`]     | `Denied`     |
//! | `recipes.*`     | [`RecipePusher`]       | `Derived`    |
//! | `equivalences.*`| [`EquivalencePusher`]  | `Deferred`   |
//! | `final.*`       | [`FinalPusher`]        | `Final`      |
//!
//! A missing file means "no rules". A malformed one is logged and the pusher
//! contributes nothing until a later reload reads it successfully.

pub mod baseline;
pub mod deny;
pub mod equivalence;
pub mod loader;
pub mod raw;
pub mod recipe;
pub mod schema;
pub mod source;
pub mod tiebreak;

pub use baseline::BaselinePusher;
pub use deny::DenyListPusher;
pub use equivalence::EquivalencePusher;
pub use loader::{DataLoadError, Format, load_resolver_config};
pub use raw::RawValuePusher;
pub use recipe::RecipePusher;
pub use source::{Cached, Source};
pub use tiebreak::FinalPusher;

use goo_core::handler::EntryHandler;
use goo_core::snapshot::SnapshotStore;
use schema::ValueTable;
use std::path::Path;

/// Register the full file-backed pusher set reading from `dir`.
///
/// `items` is the key universe handed to the baseline pusher; `raw_defaults`
/// seeds `values.*` the first time the directory is used.
pub fn register_data_pushers<S: SnapshotStore>(
    handler: &mut EntryHandler<S>,
    dir: &Path,
    items: Vec<String>,
    raw_defaults: ValueTable,
) {
    handler.register(RawValuePusher::new(dir, raw_defaults));
    handler.register(BaselinePusher::from_dir(items, dir));
    handler.register(DenyListPusher::from_dir(dir));
    handler.register(RecipePusher::from_dir(dir));
    handler.register(EquivalencePusher::from_dir(dir));
    handler.register(FinalPusher::from_dir(dir));
    tracing::debug!(
        target: "pusher",
        dir = %dir.display(),
        pushers = handler.pusher_count(),
        "data_pushers_registered"
    );
}
