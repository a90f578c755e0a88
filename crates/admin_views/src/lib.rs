//! View models for the live sessions admin console: list views with sorting,
//! filtering and selection, the redirect detail form, the add-domain form and
//! the administrator access gate.

use async_trait::async_trait;

pub mod access;
pub mod detail_form;
pub mod filter;
pub mod nodes;
pub mod routes;
pub mod selection;
pub mod sessions;
pub mod sort;
pub mod url_check;

pub use access::{check_access, AccessDecision};
pub use detail_form::{FormVariant, MapMarker, RedirectForm, SubmitOutcome};
pub use nodes::{AddDomainForm, NodeField, NodesView};
pub use routes::Route;
pub use selection::{BulkOutcome, Selection};
pub use sessions::{SessionField, SessionsView};
pub use sort::{SortRule, SortValue, Sortable};

/// A list that can re-fetch its source data, e.g. after a form saves.
#[async_trait]
pub trait RefreshTarget: Send {
    async fn refresh(&mut self);
}

#[derive(Debug, thiserror::Error)]
#[error("unknown column '{0}'")]
pub struct UnknownField(pub String);

#[cfg(test)]
#[path = "tests/test_support.rs"]
pub(crate) mod test_support;
