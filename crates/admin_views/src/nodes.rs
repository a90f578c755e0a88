use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use client_core::ConsoleApi;
use shared::{
    domain::{Node, NodeKey},
    protocol::{CreateNodeRequest, CurrentUser},
};
use tracing::{debug, error, info};

use crate::{
    selection::{dispatch_bulk_and_refresh, BulkOutcome, Selection},
    sort::{apply_sorting, dedup_rules, toggle_sort, SortRule, SortValue, Sortable},
    url_check::is_valid_domain,
    RefreshTarget, UnknownField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    Key,
    Account,
    Configured,
    SslConfigured,
    Timestamp,
}

impl NodeField {
    pub const ALL: [NodeField; 5] = [
        Self::Key,
        Self::Account,
        Self::Configured,
        Self::SslConfigured,
        Self::Timestamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Key => "rowKey",
            Self::Account => "account",
            Self::Configured => "configured",
            Self::SslConfigured => "sslConfigured",
            Self::Timestamp => "timestamp",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Key => "Domain",
            Self::Account => "Account",
            Self::Configured => "Configured",
            Self::SslConfigured => "SSL",
            Self::Timestamp => "Updated",
        }
    }
}

impl FromStr for NodeField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl Sortable for Node {
    type Field = NodeField;

    fn sort_value(&self, field: NodeField) -> SortValue<'_> {
        match field {
            NodeField::Key => Some(self.key.as_str()).into(),
            NodeField::Account => Some(self.account.as_str()).into(),
            NodeField::Configured => SortValue::Flag(self.configured),
            NodeField::SslConfigured => SortValue::Flag(self.ssl_configured),
            NodeField::Timestamp => self.timestamp.into(),
        }
    }
}

/// Same soft-fail contract as the sessions list.
pub async fn load_nodes(api: &dyn ConsoleApi, user: Option<&CurrentUser>) -> Vec<Node> {
    if user.is_none() {
        debug!("user not logged in, nodes list left empty");
        return Vec::new();
    }

    api.list_nodes().await.unwrap_or_else(|err| {
        error!("failed to load nodes: {err}");
        Vec::new()
    })
}

pub struct NodesView {
    api: Arc<dyn ConsoleApi>,
    user: Option<CurrentUser>,
    loading: bool,
    source: Vec<Node>,
    sorting: Vec<SortRule<NodeField>>,
    selection: Selection<NodeKey>,
}

impl NodesView {
    pub fn new(api: Arc<dyn ConsoleApi>, user: Option<CurrentUser>) -> Self {
        Self {
            api,
            user,
            loading: true,
            source: Vec::new(),
            sorting: Vec::new(),
            selection: Selection::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn source(&self) -> &[Node] {
        &self.source
    }

    pub fn sorting(&self) -> &[SortRule<NodeField>] {
        &self.sorting
    }

    pub fn set_sorting(&mut self, rules: Vec<SortRule<NodeField>>) {
        self.sorting = dedup_rules(rules);
    }

    pub fn column_click(&mut self, field: NodeField) {
        self.sorting = toggle_sort(&self.sorting, field);
    }

    pub fn rows(&self) -> Vec<&Node> {
        apply_sorting(&self.source, &self.sorting)
    }

    pub fn selection(&self) -> &Selection<NodeKey> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection<NodeKey> {
        &mut self.selection
    }

    pub fn toggle_row(&mut self, index: usize) {
        let key = self.rows().get(index).map(|node| node.key.clone());
        if let Some(key) = key {
            self.selection.toggle(key);
        }
    }

    pub async fn reload(&mut self) {
        self.loading = true;
        self.source = load_nodes(self.api.as_ref(), self.user.as_ref()).await;
        self.selection.clear();
        self.loading = false;
        info!(rows = self.source.len(), "nodes loaded");
    }

    pub async fn delete_selected(&mut self) -> Option<BulkOutcome> {
        let keys = self.selection.keys();
        let api = Arc::clone(&self.api);
        dispatch_bulk_and_refresh(self, "delete_node", keys, move |key| {
            let api = Arc::clone(&api);
            async move { api.delete_node(&key).await }
        })
        .await
    }

    pub fn open_add_domain(&self) -> AddDomainForm {
        AddDomainForm::new(Arc::clone(&self.api))
    }
}

#[async_trait]
impl RefreshTarget for NodesView {
    async fn refresh(&mut self) {
        self.reload().await;
    }
}

/// Dialog that registers a new node domain.
pub struct AddDomainForm {
    api: Arc<dyn ConsoleApi>,
    domain: String,
    loading: bool,
    error: bool,
    open: bool,
}

impl AddDomainForm {
    pub fn new(api: Arc<dyn ConsoleApi>) -> Self {
        Self {
            api,
            domain: String::new(),
            loading: false,
            error: false,
            open: true,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn set_domain(&mut self, value: impl Into<String>) {
        self.domain = value.into();
    }

    pub fn can_submit(&self) -> bool {
        is_valid_domain(self.domain.trim())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn cancel(&mut self) {
        self.open = false;
    }

    /// Returns true once the domain is saved and the parent list refreshed.
    pub async fn submit<R>(&mut self, parent: &mut R) -> bool
    where
        R: RefreshTarget + ?Sized,
    {
        if !self.open || self.loading || !self.can_submit() {
            return false;
        }

        let request = CreateNodeRequest {
            row_key: NodeKey::from(self.domain.trim()),
        };
        self.loading = true;
        self.error = false;
        info!(domain = %request.row_key, "adding node domain");

        let result = self.api.create_node(&request).await;
        self.loading = false;
        match result {
            Ok(()) => {
                parent.refresh().await;
                self.open = false;
                true
            }
            Err(err) => {
                error!(domain = %request.row_key, "failed to add node domain: {err}");
                self.error = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, node, FakeApi};

    fn fake() -> FakeApi {
        let mut late = node("b.example.com", "contoso");
        late.configured = false;
        FakeApi {
            user: Some(admin()),
            nodes: vec![late, node("a.example.com", "fabrikam")],
            ..FakeApi::default()
        }
    }

    #[tokio::test]
    async fn loads_unsorted_by_default() {
        let mut view = NodesView::new(fake().shared(), Some(admin()));
        assert!(view.is_loading());
        view.reload().await;

        assert!(view.sorting().is_empty());
        let keys = view.rows().iter().map(|n| n.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["b.example.com", "a.example.com"]);
    }

    #[tokio::test]
    async fn sorts_by_flag_and_key() {
        let mut view = NodesView::new(fake().shared(), Some(admin()));
        view.reload().await;

        view.column_click(NodeField::Key);
        let keys = view.rows().iter().map(|n| n.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["a.example.com", "b.example.com"]);

        view.set_sorting(vec![SortRule::descending(NodeField::Configured)]);
        assert!(view.rows()[0].configured);
    }

    #[tokio::test]
    async fn failed_load_is_empty() {
        let api = FakeApi {
            fail_nodes: true,
            ..fake()
        }
        .shared();
        let mut view = NodesView::new(api, Some(admin()));
        view.reload().await;
        assert!(view.rows().is_empty());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn bulk_delete_removes_each_node_and_reloads_once() {
        let api = fake().shared();
        let mut view = NodesView::new(api.clone(), Some(admin()));
        view.reload().await;
        view.toggle_row(0);
        view.toggle_row(1);

        let outcome = view.delete_selected().await.expect("outcome");

        assert_eq!(outcome.attempted, 2);
        assert_eq!(api.count("DELETE node"), 2);
        assert_eq!(api.count("GET nodes"), 2);
    }

    #[tokio::test]
    async fn add_domain_validates_then_refreshes_parent() {
        let api = fake().shared();
        let mut view = NodesView::new(api.clone(), Some(admin()));
        view.reload().await;

        let mut form = view.open_add_domain();
        form.set_domain("not a domain");
        assert!(!form.submit(&mut view).await);
        assert_eq!(api.count("POST node"), 0);

        form.set_domain("live.example.org");
        assert!(form.submit(&mut view).await);
        assert!(!form.is_open());
        assert_eq!(api.count("GET nodes"), 2);
        let created = api.created_nodes.lock().expect("created");
        assert_eq!(created[0].row_key.as_str(), "live.example.org");
    }

    #[tokio::test]
    async fn add_domain_failure_sets_error() {
        let api = FakeApi {
            fail_keys: ["dup.example.org".to_string()].into_iter().collect(),
            ..fake()
        }
        .shared();
        let mut view = NodesView::new(api.clone(), None);
        let mut form = view.open_add_domain();
        form.set_domain("dup.example.org");

        assert!(!form.submit(&mut view).await);
        assert!(form.has_error());
        assert!(form.is_open());
        assert_eq!(api.count("GET nodes"), 0);
    }

    #[test]
    fn field_parse_rejects_unknown() {
        assert_eq!("sslconfigured".parse::<NodeField>().ok(), Some(NodeField::SslConfigured));
        let err = "owner".parse::<NodeField>().unwrap_err();
        assert_eq!(err.to_string(), "unknown column 'owner'");
    }
}
