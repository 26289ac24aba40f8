//! One live server-backed table.
//!
//! A [`TableController`] owns the query state of a single table instance,
//! turns it into a filtering request, and applies what comes back. Queries
//! are split into [`TableController::begin_query`] and
//! [`TableController::finish_query`] so hosts that keep several requests in
//! flight can interleave them; the async helpers do both halves in one go.
//!
//! ```text
//! Uninitialized -> Loading -> Ready <-> Loading
//!        \            \         \
//!         `------------`---------`--> Disposed
//! ```

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use netdeck_states::{
    ClientStorage, Debouncer, Notification, Notifier, TaskHandle, TaskId,
};

use crate::{
    BusinessConfig,
    api::{ApiError, ApiResult, FilteringBackend, RemovalTarget},
    filtering::{
        BulkEditChange, FilteringPayload, FilteringRequest, FilteringResponse, OrderSpec,
        SearchMode, SearchValue, SortDirection, UNCOUNTED_RECORDS, bulk_edit_form,
    },
    table::{
        ColumnSet, ConstraintContext, ControlView, CsvDownload, DecorateContext, DecoratedRow,
        EntityConfig, RelationScope, SearchKind, SearchOptions, TableError, TableState,
        TableStatus, UserScope, csv_download, decorate_row,
    },
};

/// Collaborators shared by every table of a host.
#[derive(Clone)]
pub struct TableEnv {
    backend: Arc<dyn FilteringBackend>,
    storage: Arc<dyn ClientStorage>,
    notifier: Notifier,
    config: Arc<BusinessConfig>,
}

impl TableEnv {
    pub fn new(
        backend: Arc<dyn FilteringBackend>,
        storage: Arc<dyn ClientStorage>,
        notifier: Notifier,
        config: BusinessConfig,
    ) -> Self {
        Self {
            backend,
            storage,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn backend(&self) -> &Arc<dyn FilteringBackend> {
        &self.backend
    }

    pub fn storage(&self) -> &dyn ClientStorage {
        self.storage.as_ref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn config(&self) -> &BusinessConfig {
        &self.config
    }
}

/// How a table instance is opened.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    pub instance_id: Option<String>,
    pub constraints: Map<String, Value>,
    pub relation: Option<RelationScope>,
    pub search_terms: BTreeMap<String, SearchValue>,
    pub search_options: BTreeMap<String, SearchOptions>,
    /// Column key and direction; the entity's default ordering otherwise.
    pub sort: Option<(String, SortDirection)>,
    pub page: usize,
    pub page_size: Option<usize>,
    /// Overrides the persisted scope.
    pub user_scope: Option<UserScope>,
    /// Defaults to top-level only, except in relation tables.
    pub parent_filtering: Option<bool>,
    pub display_pagination: bool,
    pub folder_path: Option<String>,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn constraint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constraints.insert(key.into(), value);
        self
    }

    pub fn relation(mut self, relation: RelationScope) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn search(mut self, key: impl Into<String>, value: impl Into<SearchValue>) -> Self {
        self.search_terms.insert(key.into(), value.into());
        self
    }

    pub fn search_options(mut self, key: impl Into<String>, mode: SearchMode, invert: bool) -> Self {
        self.search_options
            .insert(key.into(), SearchOptions { mode, invert });
        self
    }

    pub fn sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((key.into(), direction));
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn user_scope(mut self, scope: UserScope) -> Self {
        self.user_scope = Some(scope);
        self
    }

    pub fn parent_filtering(mut self, enabled: bool) -> Self {
        self.parent_filtering = Some(enabled);
        self
    }

    pub fn display_pagination(mut self) -> Self {
        self.display_pagination = true;
        self
    }

    pub fn folder(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }
}

/// A request built from a state snapshot, waiting for its response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuery {
    pub draw: u64,
    pub request: FilteringRequest,
    pub export: bool,
    pub clipboard: bool,
    pub is_search: bool,
}

/// Side effects the host carries out after a response is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEffect {
    Download(CsvDownload),
    CopyToClipboard(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Applied {
        rows: usize,
        effects: Vec<TableEffect>,
    },
    /// The table now shows zero rows; the error was notified.
    Failed { message: String },
    /// An older response arriving after a newer search. Ignored.
    Stale { draw: u64 },
    /// The table was disposed before the response arrived.
    Discarded,
}

impl QueryOutcome {
    pub fn effects(&self) -> &[TableEffect] {
        match self {
            Self::Applied { effects, .. } => effects,
            _ => &[],
        }
    }
}

/// What a search keystroke did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTrigger {
    /// A query is due at `deadline` unless another keystroke comes first.
    Scheduled { deadline: DateTime<Utc> },
    /// A search is in flight. The term is kept for the next query.
    Deferred,
}

pub struct TableController {
    config: Arc<EntityConfig>,
    state: TableState,
    columns: ColumnSet,
    relation: Option<RelationScope>,
    folder_path: Option<String>,
    status: TableStatus,
    rows: Vec<DecoratedRow>,
    records_total: Option<u64>,
    records_filtered: Option<u64>,
    last_error: Option<String>,
    export_pending: bool,
    clipboard_pending: bool,
    search_in_flight: bool,
    debouncer: Debouncer,
    next_draw: u64,
    search_floor: u64,
    env: TableEnv,
    handle: TaskHandle,
}

fn check_page(page: usize, page_size: usize) -> Result<(), TableError> {
    match TableState::offset(page, page_size) {
        Some(_) => Ok(()),
        None => Err(TableError::InvalidPage { page, page_size }),
    }
}

impl TableController {
    pub fn new(
        config: Arc<EntityConfig>,
        options: TableOptions,
        env: TableEnv,
    ) -> Result<Self, TableError> {
        let page_size = options.page_size.unwrap_or(env.config().page_size);
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        check_page(options.page, page_size)?;

        let mut columns = ColumnSet::new(config.entity_type, config.columns.clone())?;
        columns.load_visibility(env.storage());

        let mut state = TableState::new(config.entity_type, options.instance_id, page_size);
        let table_id = state.table_id();
        state.constraints = options.constraints;
        state.current_page = options.page;
        state.parent_filtering = options
            .parent_filtering
            .unwrap_or(options.relation.is_none());
        state.display_pagination = options.display_pagination;
        state.user_scope = match options.user_scope {
            Some(scope) => scope,
            None if config.user_filtering => env
                .storage()
                .get(&UserScope::storage_key(&config.entity_type))
                .and_then(|value| UserScope::from_storage(&value))
                .unwrap_or_default(),
            None => UserScope::Everyone,
        };

        let (sort_column, sort_direction) = match options.sort {
            Some((key, direction)) => (sortable_index(&columns, table_id, &key)?, direction),
            None => config.ordering,
        };
        state.sort_column = sort_column;
        state.sort_direction = sort_direction;

        for (key, value) in options.search_terms {
            check_search_term(&columns, table_id, &key, &value)?;
            if !value.is_blank() {
                state.search_terms.insert(key, value);
            }
        }
        for (key, search_options) in options.search_options {
            check_text_column(&columns, table_id, &key)?;
            state.search_options.insert(key, search_options);
        }

        debug!("Created table {table_id}");
        Ok(Self {
            debouncer: Debouncer::new(env.config().search_debounce()),
            handle: TaskHandle::new(TaskId::new(table_id, 0), CancellationToken::new()),
            config,
            state,
            columns,
            relation: options.relation,
            folder_path: options.folder_path,
            status: TableStatus::Uninitialized,
            rows: Vec::new(),
            records_total: None,
            records_filtered: None,
            last_error: None,
            export_pending: false,
            clipboard_pending: false,
            search_in_flight: false,
            next_draw: 0,
            search_floor: 0,
            env,
        })
    }

    /// Reopening an id after disposal bumps the generation of its work.
    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.handle = TaskHandle::new(
            TaskId::new(self.table_id(), generation),
            CancellationToken::new(),
        );
        self
    }

    /// Issues the first page query. `None` once the table is already live.
    pub async fn initialize(&mut self) -> Result<Option<QueryOutcome>, TableError> {
        self.ensure_live()?;
        if self.status != TableStatus::Uninitialized {
            debug!("Table {} is already initialized", self.table_id());
            return Ok(None);
        }
        self.refresh(false).await.map(Some)
    }

    pub fn table_id(&self) -> Ustr {
        self.state.table_id()
    }

    pub fn entity_type(&self) -> Ustr {
        self.config.entity_type
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn relation(&self) -> Option<&RelationScope> {
        self.relation.as_ref()
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn rows(&self) -> &[DecoratedRow] {
        &self.rows
    }

    pub fn records_total(&self) -> Option<u64> {
        self.records_total
    }

    /// Matching record count, when real counts were asked for.
    pub fn record_count(&self) -> Option<u64> {
        self.records_filtered
            .filter(|count| self.state.display_pagination && *count != UNCOUNTED_RECORDS)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn export_pending(&self) -> bool {
        self.export_pending
    }

    pub fn clipboard_pending(&self) -> bool {
        self.clipboard_pending
    }

    pub fn is_search_in_flight(&self) -> bool {
        self.search_in_flight
    }

    pub fn search_deadline(&self) -> Option<DateTime<Utc>> {
        self.debouncer.deadline()
    }

    pub fn task_id(&self) -> TaskId {
        self.handle.id()
    }

    /// Cancelled when the table is disposed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.handle.cancellation_token()
    }

    fn ensure_live(&self) -> Result<(), TableError> {
        match self.status {
            TableStatus::Disposed => Err(TableError::Disposed(self.table_id())),
            _ => Ok(()),
        }
    }

    fn notify(&self, notification: Notification) {
        self.env.notifier().notify(notification);
    }

    fn notify_api_error(&self, err: &ApiError) {
        for notification in err.notifications() {
            self.notify(notification);
        }
    }

    /// Form, merged constraints and requested columns of the next query.
    pub fn filtering_payload(&self) -> FilteringPayload {
        let ctx = ConstraintContext {
            state: &self.state,
            relation: self.relation.as_ref(),
            current_user: self.env.config().current_user.as_deref(),
            folder_path: self.folder_path.as_deref(),
        };
        FilteringPayload {
            form: self.state.search_form(&self.columns),
            constraints: self.config.merged_constraints(&ctx),
            columns: self.columns.requested_columns(),
            entity_type: self.config.entity_type.to_string(),
            rbac: self.config.rbac.to_owned(),
        }
    }

    fn build_request(&self, draw: u64) -> FilteringRequest {
        let order = self
            .columns
            .visible_position(self.state.sort_column)
            .map(|column| {
                vec![OrderSpec {
                    column,
                    dir: self.state.sort_direction,
                }]
            })
            .unwrap_or_default();

        FilteringRequest {
            draw,
            start: self.state.start(),
            length: self.state.page_size,
            order,
            payload: self.filtering_payload(),
            export: self.export_pending,
            clipboard: self.clipboard_pending,
            pagination: self.state.display_pagination,
            extra: self.config.filtering_data.clone(),
        }
    }

    /// Snapshots the state into a request and moves to `Loading`.
    pub fn begin_query(&mut self, first_page: bool) -> Result<PendingQuery, TableError> {
        self.ensure_live()?;
        if first_page {
            self.state.current_page = 0;
        }
        self.next_draw += 1;
        let draw = self.next_draw;
        let request = self.build_request(draw);
        self.status = TableStatus::Loading;
        debug!(
            "Querying {} (draw {draw}, page {})",
            self.table_id(),
            self.state.current_page
        );

        Ok(PendingQuery {
            draw,
            export: request.export,
            clipboard: request.clipboard,
            request,
            is_search: false,
        })
    }

    /// Applies a response. Errors leave the table empty and are notified.
    pub fn finish_query(
        &mut self,
        pending: PendingQuery,
        result: ApiResult<FilteringResponse>,
    ) -> QueryOutcome {
        if self.status == TableStatus::Disposed {
            debug!("Dropping response for disposed table {}", self.table_id());
            return QueryOutcome::Discarded;
        }
        let completes_search = pending.is_search && pending.draw == self.search_floor;
        if completes_search {
            self.search_in_flight = false;
        }
        if pending.draw < self.search_floor {
            warn!(
                "Ignoring stale response for {} (draw {} < {})",
                self.table_id(),
                pending.draw,
                self.search_floor
            );
            return QueryOutcome::Stale { draw: pending.draw };
        }
        self.status = TableStatus::Ready;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!("Query for {} failed: {err}", self.table_id());
                self.notify_api_error(&err);
                return self.fail(err.to_string());
            }
        };
        if let Some(message) = response.error {
            error!("Server reported an error for {}: {message}", self.table_id());
            self.notify(Notification::error(message.as_str()));
            return self.fail(message);
        }

        let mut effects = Vec::new();
        if pending.export && self.export_pending {
            self.export_pending = false;
            let rows = response.full_result.as_deref().unwrap_or(&response.data);
            match csv_download(&self.config.entity_type, &self.columns, rows) {
                Ok(download) => effects.push(TableEffect::Download(download)),
                Err(err) => self.notify(Notification::error(err.to_string())),
            }
        }
        if pending.clipboard && self.clipboard_pending {
            self.clipboard_pending = false;
            if let Some(text) = response.clipboard {
                effects.push(TableEffect::CopyToClipboard(text));
            }
        }

        self.records_total = response.records_total;
        self.records_filtered = response.records_filtered;
        self.last_error = None;

        let table_id = self.table_id();
        let ctx = DecorateContext {
            table_id,
            entity_type: self.config.entity_type,
            relation: self.relation.as_ref(),
        };
        let config = Arc::clone(&self.config);
        self.rows = response
            .data
            .into_iter()
            .filter_map(|row| decorate_row(row, &config, &ctx))
            .collect();

        if completes_search && self.env.config().search_notification {
            self.notify(Notification::success("Search completed successfully"));
        }
        debug!("Table {table_id} shows {} row(s)", self.rows.len());
        QueryOutcome::Applied {
            rows: self.rows.len(),
            effects,
        }
    }

    fn fail(&mut self, message: String) -> QueryOutcome {
        self.rows.clear();
        self.records_total = None;
        self.records_filtered = None;
        self.last_error = Some(message.clone());
        QueryOutcome::Failed { message }
    }

    async fn run(&mut self, pending: PendingQuery) -> QueryOutcome {
        let backend = Arc::clone(self.env.backend());
        let token = self.handle.cancellation_token();
        let model = self.config.model();

        let result = tokio::select! {
            () = token.cancelled() => {
                debug!("Query for {} cancelled", self.table_id());
                return QueryOutcome::Discarded;
            }
            result = backend.filtering(&model, &pending.request) => result,
        };
        self.finish_query(pending, result)
    }

    /// Re-queries with the current state, from page 0 when `first_page`.
    pub async fn refresh(&mut self, first_page: bool) -> Result<QueryOutcome, TableError> {
        let pending = self.begin_query(first_page)?;
        Ok(self.run(pending).await)
    }

    /// Shows exactly `keys`, persists the choice and re-queries.
    pub async fn set_column_visibility<S: AsRef<str>>(
        &mut self,
        keys: &[S],
    ) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        if let Some(unknown) = keys
            .iter()
            .map(AsRef::as_ref)
            .find(|key| self.columns.get(key).is_none())
        {
            return Err(TableError::unknown_column(self.table_id(), unknown));
        }

        self.columns.set_visible(keys);
        self.columns.persist_visibility(self.env.storage())?;
        self.refresh(false).await
    }

    /// The next successful response carries the export.
    pub async fn export_csv(&mut self) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        self.export_pending = true;
        self.refresh(false).await
    }

    pub async fn copy_to_clipboard(&mut self) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        self.clipboard_pending = true;
        self.refresh(false).await
    }

    pub async fn sort_by(
        &mut self,
        key: &str,
        direction: SortDirection,
    ) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        self.state.sort_column = sortable_index(&self.columns, self.table_id(), key)?;
        self.state.sort_direction = direction;
        self.refresh(false).await
    }

    pub async fn set_page(&mut self, page: usize) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        check_page(page, self.state.page_size)?;
        self.state.current_page = page;
        self.refresh(false).await
    }

    pub async fn next_page(&mut self) -> Result<QueryOutcome, TableError> {
        let page = self.state.current_page.saturating_add(1);
        self.set_page(page).await
    }

    pub async fn previous_page(&mut self) -> Result<QueryOutcome, TableError> {
        let page = self.state.current_page.saturating_sub(1);
        self.set_page(page).await
    }

    pub async fn set_page_size(&mut self, page_size: usize) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        self.state.page_size = page_size;
        self.refresh(true).await
    }

    fn trigger_search(&mut self, now: DateTime<Utc>) -> SearchTrigger {
        if self.search_in_flight {
            debug!("Search in flight for {}; deferring", self.table_id());
            return SearchTrigger::Deferred;
        }
        SearchTrigger::Scheduled {
            deadline: self.debouncer.trigger(now),
        }
    }

    /// Records a keystroke. The query runs once the quiet period has passed
    /// without another one; see [`Self::poll`].
    pub fn search(
        &mut self,
        key: &str,
        value: impl Into<SearchValue>,
        now: DateTime<Utc>,
    ) -> Result<SearchTrigger, TableError> {
        self.ensure_live()?;
        let value = value.into();
        check_search_term(&self.columns, self.table_id(), key, &value)?;
        if value.is_blank() {
            self.state.search_terms.remove(key);
        } else {
            self.state.search_terms.insert(key.to_owned(), value);
        }
        Ok(self.trigger_search(now))
    }

    pub fn set_search_options(
        &mut self,
        key: &str,
        mode: SearchMode,
        invert: bool,
        now: DateTime<Utc>,
    ) -> Result<SearchTrigger, TableError> {
        self.ensure_live()?;
        check_text_column(&self.columns, self.table_id(), key)?;
        let options = SearchOptions { mode, invert };
        if options == SearchOptions::default() {
            self.state.search_options.remove(key);
        } else {
            self.state.search_options.insert(key.to_owned(), options);
        }
        Ok(self.trigger_search(now))
    }

    /// Search across every property, for entities that allow it.
    pub fn serialized_search(
        &mut self,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchTrigger, TableError> {
        self.ensure_live()?;
        if !self.config.serialized_search {
            return Err(TableError::unsupported(self.table_id(), "serialized search"));
        }
        self.state.serialized_search = Some(term.to_owned()).filter(|term| !term.is_empty());
        Ok(self.trigger_search(now))
    }

    /// Starts the debounced search once its deadline has passed.
    pub fn begin_search(&mut self, now: DateTime<Utc>) -> Result<Option<PendingQuery>, TableError> {
        self.ensure_live()?;
        if !self.debouncer.fire(now) {
            return Ok(None);
        }

        let mut pending = self.begin_query(true)?;
        pending.is_search = true;
        self.search_in_flight = true;
        self.search_floor = pending.draw;
        if self.env.config().search_notification {
            self.notify(Notification::success("Searching..."));
        }
        Ok(Some(pending))
    }

    /// Runs the pending search if it is due.
    pub async fn poll(&mut self, now: DateTime<Utc>) -> Result<Option<QueryOutcome>, TableError> {
        match self.begin_search(now)? {
            Some(pending) => Ok(Some(self.run(pending).await)),
            None => Ok(None),
        }
    }

    pub async fn clear_search(&mut self) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        self.state.clear_search();
        self.debouncer.cancel();
        let outcome = self.refresh(false).await?;
        self.notify(Notification::success("Search parameters cleared."));
        Ok(outcome)
    }

    /// Flips between the current user's rows and everyone's, and remembers it.
    pub async fn toggle_user_filtering(&mut self) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        if !self.config.user_filtering {
            return Err(TableError::unsupported(self.table_id(), "user filtering"));
        }
        self.state.user_scope = self.state.user_scope.toggled();
        self.env.storage().set(
            &UserScope::storage_key(&self.config.entity_type),
            self.state.user_scope.storage_value(),
        )?;
        info!(
            "Table {} now shows {} rows",
            self.table_id(),
            match self.state.user_scope {
                UserScope::Mine => "the current user's",
                UserScope::Everyone => "all",
            }
        );
        self.refresh(true).await
    }

    pub async fn set_parent_filtering(&mut self, enabled: bool) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        if !self.config.parent_filtering {
            return Err(TableError::unsupported(self.table_id(), "parent filtering"));
        }
        self.state.parent_filtering = enabled;
        self.refresh(true).await
    }

    /// Asks the server for real record counts, or stops asking.
    pub async fn toggle_pagination_display(&mut self) -> Result<QueryOutcome, TableError> {
        self.ensure_live()?;
        self.state.display_pagination = !self.state.display_pagination;
        self.refresh(false).await
    }

    /// `{origin}?search=<filtering payload>` for sharing the current search.
    pub fn copy_search_link(&self, origin: &str) -> Result<TableEffect, TableError> {
        self.ensure_live()?;
        let mut payload = serde_json::to_value(self.filtering_payload())
            .map_err(|e| TableError::SearchLink(e.to_string()))?;
        if let Value::Object(map) = &mut payload {
            map.extend(self.config.filtering_data.clone());
        }
        let encoded = serde_json::to_string(&payload)
            .map_err(|e| TableError::SearchLink(e.to_string()))?;

        Ok(TableEffect::CopyToClipboard(format!(
            "{}?search={}",
            origin.trim_end_matches('?'),
            urlencoding::encode(&encoded)
        )))
    }

    pub fn controls(&self) -> Vec<ControlView> {
        self.config
            .control_views(&self.state, self.relation.as_ref())
    }

    /// Deletes every row matching the current search and constraints.
    pub async fn bulk_deletion(&mut self) -> Result<u64, TableError> {
        self.ensure_live()?;
        let model = self.config.model();
        let payload = self.filtering_payload();
        let backend = Arc::clone(self.env.backend());

        match backend.bulk_deletion(&model, &payload).await {
            Ok(count) => {
                self.notify(Notification::success(format!("{count} items deleted.")));
                self.refresh(false).await?;
                Ok(count)
            }
            Err(err) => {
                self.notify_api_error(&err);
                Err(err.into())
            }
        }
    }

    /// Detaches every matching row from the relation parent.
    pub async fn bulk_removal(&mut self) -> Result<u64, TableError> {
        self.ensure_live()?;
        let Some(relation) = self.relation.clone() else {
            return Err(TableError::unsupported(self.table_id(), "bulk removal"));
        };
        let model = self.config.model();
        let target = RemovalTarget {
            entity_type: relation.parent.entity_type.to_string(),
            id: relation.parent.id,
            property: relation.to.clone(),
        };
        let payload = self.filtering_payload();
        let backend = Arc::clone(self.env.backend());

        match backend.bulk_removal(&model, &target, &payload).await {
            Ok(count) => {
                self.notify(Notification::success(format!(
                    "{count} {model}s removed from {} '{}'.",
                    target.entity_type, relation.parent.name
                )));
                self.refresh(false).await?;
                Ok(count)
            }
            Err(err) => {
                self.notify_api_error(&err);
                Err(err.into())
            }
        }
    }

    /// Applies `changes` to every row matching the current search.
    pub async fn bulk_edit(&mut self, changes: &[BulkEditChange]) -> Result<u64, TableError> {
        self.ensure_live()?;
        let model = self.config.model();
        let payload = self.filtering_payload();
        let backend = Arc::clone(self.env.backend());

        let result = match backend.filtering_ids(&model, &payload).await {
            Ok(ids) => {
                debug!("Bulk editing {} {model}(s)", ids.len());
                backend
                    .bulk_edit(&model, &bulk_edit_form(&ids, changes))
                    .await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(count) => {
                self.notify(Notification::success(format!("{count} items modified.")));
                self.refresh(false).await?;
                Ok(count)
            }
            Err(err) => {
                self.notify_api_error(&err);
                Err(err.into())
            }
        }
    }

    /// Stops all work for this table. Every later operation fails.
    pub fn dispose(&mut self) {
        if self.status == TableStatus::Disposed {
            return;
        }
        self.handle.cancel();
        self.debouncer.cancel();
        self.search_in_flight = false;
        self.rows.clear();
        self.status = TableStatus::Disposed;
        debug!("Disposed table {}", self.table_id());
    }
}

fn sortable_index(columns: &ColumnSet, table: Ustr, key: &str) -> Result<usize, TableError> {
    let index = columns
        .index_of(key)
        .ok_or_else(|| TableError::unknown_column(table, key))?;
    if !columns.all()[index].sortable {
        return Err(TableError::NotSortable {
            table,
            column: key.to_owned(),
        });
    }
    Ok(index)
}

fn check_search_term(
    columns: &ColumnSet,
    table: Ustr,
    key: &str,
    value: &SearchValue,
) -> Result<(), TableError> {
    let column = columns
        .get(key)
        .ok_or_else(|| TableError::unknown_column(table, key))?;
    match (column.search, value) {
        (SearchKind::Text, SearchValue::Text(_)) | (SearchKind::Boolean, SearchValue::Bool(_)) => {
            Ok(())
        }
        (SearchKind::Boolean, value) if value.is_blank() => Ok(()),
        (_, value) => Err(TableError::NotSearchable {
            table,
            column: key.to_owned(),
            kind: match value {
                SearchValue::Text(_) => "text",
                SearchValue::Bool(_) => "boolean",
            },
        }),
    }
}

fn check_text_column(columns: &ColumnSet, table: Ustr, key: &str) -> Result<(), TableError> {
    let column = columns
        .get(key)
        .ok_or_else(|| TableError::unknown_column(table, key))?;
    match column.search {
        SearchKind::Text => Ok(()),
        _ => Err(TableError::NotSearchable {
            table,
            column: key.to_owned(),
            kind: "text",
        }),
    }
}
