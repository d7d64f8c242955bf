//! Application state and the operations the page's event handlers call.
//!
//! The controller never touches the DOM. Each operation updates state (and the
//! store) and, where the user should see something happen, returns an
//! [`Outcome`] naming the toast to show and the hash to move to. The host
//! re-renders from [`App::render_main`] or, for list-only changes,
//! [`App::render_results`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::form::{AuthInput, RecordInput};
use crate::photo::{file_to_data_url, ImageAction, ImageEditState};
use crate::query::{community_view, compute_stats, known_shops, personal_view, ListQuery, SortOrder};
use crate::record::{Record, RecordKind};
use crate::render::{self, AuthMode, FormMode, FormView};
use crate::router::Route;
use crate::storage::{KeyValueStore, Store};

pub const TOAST_SAVED: &str = "保存しました";
pub const TOAST_DELETED: &str = "削除しました";
pub const TOAST_WRITE_FAILED: &str = "保存に失敗しました";
pub const TOAST_NO_PHOTO: &str = "先に写真を選択してください";
pub const TOAST_NO_DESTINATION: &str = "保存先を選択してください";

/// Bottom tab bar entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Community,
    Add,
    My,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Community => "community",
            Tab::Add => "add",
            Tab::My => "my",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Tab::all().iter().copied().find(|t| t.as_str() == s)
    }

    pub fn route(self) -> Route {
        match self {
            Tab::Community => Route::Community,
            Tab::Add => Route::New,
            Tab::My => Route::My,
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Community, Tab::Add, Tab::My]
    }
}

/// What the user should see after an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub toast: Option<String>,
    pub navigate: Option<String>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn toast(message: impl Into<String>) -> Self {
        Self {
            toast: Some(message.into()),
            navigate: None,
        }
    }

    pub fn then_navigate(mut self, route: &Route) -> Self {
        self.navigate = Some(route.to_hash());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Community,
    Personal,
    Form {
        mode: FormMode,
        kind: RecordKind,
        record: Record,
    },
    Detail {
        kind: RecordKind,
        record: Record,
    },
}

pub struct App<S> {
    store: Store<S>,
    config: AppConfig,
    route: Route,
    screen: Screen,
    query: ListQuery,
    photo: Option<ImageEditState>,
    /// Output of the last photo edit, what a submit stores.
    edited_photo: Option<String>,
    pending_delete: Option<(RecordKind, String)>,
    auth_mode: AuthMode,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(backend: S) -> Self {
        let config = AppConfig::load(&backend);
        let store = Store::with_keys(backend, &config.storage_key, &config.legacy_storage_key);
        Self {
            store,
            config,
            route: Route::Community,
            screen: Screen::Community,
            query: ListQuery::default(),
            photo: None,
            edited_photo: None,
            pending_delete: None,
            auth_mode: AuthMode::default(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Resolve `hash` to a screen. Links to records that no longer exist land
    /// on the community list.
    pub fn navigate(&mut self, hash: &str) {
        self.navigate_at(hash, Utc::now())
    }

    fn navigate_at(&mut self, hash: &str, now: DateTime<Utc>) {
        let route = Route::parse(hash);
        self.query = ListQuery::default();
        self.pending_delete = None;
        self.photo = None;
        self.edited_photo = None;

        let screen = match &route {
            Route::Community | Route::List => Some(Screen::Community),
            Route::My => Some(Screen::Personal),
            Route::New => Some(Screen::Form {
                mode: FormMode::New,
                kind: RecordKind::Community,
                record: Record::new(self.store.user().as_ref(), now),
            }),
            Route::Edit { kind, id } => self.store.get_by_id(*kind, id).map(|record| {
                if !record.image_data_url.is_empty() {
                    self.photo = Some(ImageEditState::new(record.image_data_url.clone()));
                }
                Screen::Form {
                    mode: FormMode::Edit,
                    kind: *kind,
                    record,
                }
            }),
            Route::Detail { kind, id } => self
                .store
                .get_by_id(*kind, id)
                .map(|record| Screen::Detail { kind: *kind, record }),
        };

        match screen {
            Some(screen) => {
                debug!("Route {}", route.to_hash());
                self.route = route;
                self.screen = screen;
            }
            None => {
                debug!("No record behind {}, showing community list", route.to_hash());
                self.route = Route::Community;
                self.screen = Screen::Community;
            }
        }
    }

    pub fn active_tab(&self) -> Tab {
        match &self.screen {
            Screen::Community => Tab::Community,
            Screen::Personal => Tab::My,
            Screen::Form { .. } => Tab::Add,
            Screen::Detail { kind, .. } => match kind {
                RecordKind::Community => Tab::Community,
                RecordKind::Personal => Tab::My,
            },
        }
    }

    pub fn render_main(&self) -> String {
        match &self.screen {
            Screen::Community => {
                let all = self.store.records(RecordKind::Community);
                let shops = known_shops(&all);
                let shop = self.store.selected_shop();
                let records = community_view(all, &shop, &self.query);
                render::render_community_page(&shop, &shops, &self.query, &records).into_string()
            }
            Screen::Personal => match self.store.user() {
                None => render::render_sign_in_required().into_string(),
                Some(user) => {
                    let all = self.store.records(RecordKind::Personal);
                    let stats = compute_stats(&personal_view(all.clone(), &user, &ListQuery::default()));
                    let records = personal_view(all, &user, &self.query);
                    render::render_my_page(&stats, &self.query, &records).into_string()
                }
            },
            Screen::Form { mode, record, .. } => {
                let shops = known_shops(&self.store.records(RecordKind::Community));
                render::render_form(FormView {
                    mode: *mode,
                    record,
                    allow_personal: self.store.user().is_some(),
                    preview: self.edited_photo.as_deref(),
                    crop_active: self.photo.as_ref().is_some_and(|p| p.crop),
                    shops: &shops,
                })
                .into_string()
            }
            Screen::Detail { kind, record } => render::render_detail(*kind, record).into_string(),
        }
    }

    /// Markup for the `data-results` region, on list screens only. Lets search
    /// and sort refresh without replacing the inputs being typed into.
    pub fn render_results(&self) -> Option<String> {
        match &self.screen {
            Screen::Community => {
                let shop = self.store.selected_shop();
                let records =
                    community_view(self.store.records(RecordKind::Community), &shop, &self.query);
                Some(render::render_community_results(&shop, &records).into_string())
            }
            Screen::Personal => {
                let user = self.store.user()?;
                let records =
                    personal_view(self.store.records(RecordKind::Personal), &user, &self.query);
                Some(render::render_list(RecordKind::Personal, &records).into_string())
            }
            _ => None,
        }
    }

    /// The sign-in overlay, shown until the user signs in or opts out.
    pub fn auth_overlay(&self) -> Option<String> {
        if self.store.user().is_some() || self.store.skip_auth() {
            return None;
        }
        Some(render::render_auth(self.auth_mode).into_string())
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.search = term.to_string();
    }

    pub fn set_order(&mut self, param: &str) {
        self.query.order = SortOrder::from_param(param);
    }

    pub fn select_shop(&mut self, shop: &str) -> Outcome {
        let result = self.store.set_selected_shop(shop);
        self.write_outcome(result, Outcome::none())
    }

    pub fn submit_record(&mut self, input: RecordInput) -> Outcome {
        self.submit_record_at(input, Utc::now())
    }

    fn submit_record_at(&mut self, input: RecordInput, now: DateTime<Utc>) -> Outcome {
        let user = self.store.user();
        let base = match &self.screen {
            Screen::Form {
                mode: FormMode::Edit,
                kind,
                record,
            } => self
                .store
                .get_by_id(*kind, &record.id)
                .unwrap_or_else(|| record.clone()),
            Screen::Form { .. } => Record::new(user.as_ref(), now),
            _ => return Outcome::none(),
        };

        let draft = match input.validate(now.date_naive()) {
            Ok(draft) => draft,
            Err(e) => return Outcome::toast(e.to_string()),
        };
        let record = draft.apply_to(base, self.edited_photo.clone(), user.as_ref(), now);

        let to_community = record.share_community;
        let to_personal = record.save_personal && user.is_some();
        if !to_community && !to_personal {
            return Outcome::toast(TOAST_NO_DESTINATION);
        }

        let result = self.save_record(record, to_community, to_personal);
        self.write_outcome(result, Outcome::toast(TOAST_SAVED).then_navigate(&Route::Community))
    }

    fn save_record(&mut self, record: Record, to_community: bool, to_personal: bool) -> Result<()> {
        let kinds: Vec<RecordKind> = [
            (to_community, RecordKind::Community),
            (to_personal, RecordKind::Personal),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect();
        self.store.upsert_many(&kinds, record)
    }

    pub fn sign_in(&mut self, input: AuthInput) -> Outcome {
        let user = match input.validate() {
            Ok(user) => user,
            Err(e) => return Outcome::toast(e.to_string()),
        };
        let message = format!("{}としてサインインしました", user.name);
        info!("Signed in as {}", user.id);
        let result = self.store.set_user(Some(user));
        self.write_outcome(result, Outcome::toast(message).then_navigate(&Route::My))
    }

    pub fn toggle_auth_mode(&mut self) {
        self.auth_mode = self.auth_mode.toggle();
    }

    pub fn skip_auth(&mut self) -> Outcome {
        let result = self.store.set_skip_auth(true);
        self.write_outcome(result, Outcome::none())
    }

    /// Bring the overlay back in sign-in mode.
    pub fn open_sign_in(&mut self) -> Outcome {
        self.auth_mode = AuthMode::SignIn;
        let result = self.store.set_skip_auth(false);
        self.write_outcome(result, Outcome::none())
    }

    /// Ask for confirmation before deleting the record being edited. Returns
    /// whether the confirmation modal should open.
    pub fn request_delete(&mut self) -> bool {
        if let Route::Edit { kind, id } = &self.route {
            self.pending_delete = Some((*kind, id.clone()));
        }
        self.pending_delete.is_some()
    }

    pub fn delete_pending(&self) -> bool {
        self.pending_delete.is_some()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Outcome {
        let Some((kind, id)) = self.pending_delete.take() else {
            return Outcome::none();
        };
        let result = self.store.remove(kind, &id).map(|_| ());
        if result.is_ok() {
            info!("Deleted {} record {}", kind.as_str(), id);
        }
        self.write_outcome(result, Outcome::toast(TOAST_DELETED).then_navigate(&Route::home_of(kind)))
    }

    /// Take a freshly picked file as the photo being edited.
    pub fn load_photo(&mut self, bytes: &[u8], mime: &str) {
        let data_url = file_to_data_url(bytes, mime, &self.config.image_options());
        if data_url.is_empty() {
            return;
        }
        let photo = ImageEditState::new(data_url);
        self.edited_photo = Some(photo.render(&self.config.image_options()));
        self.photo = Some(photo);
    }

    pub fn image_action(&mut self, action: ImageAction) -> Outcome {
        let options = self.config.image_options();
        let Some(photo) = self.photo.as_mut() else {
            return Outcome::toast(TOAST_NO_PHOTO);
        };
        photo.apply(action);
        self.edited_photo = Some(photo.render(&options));
        Outcome::none()
    }

    /// What the form's preview image should show right now.
    pub fn preview_src(&self) -> &str {
        self.edited_photo
            .as_deref()
            .or(self.photo.as_ref().map(|p| p.base.as_str()))
            .filter(|s| !s.is_empty())
            .unwrap_or(render::placeholder_image())
    }

    pub fn photo_crop(&self) -> bool {
        self.photo.as_ref().is_some_and(|p| p.crop)
    }

    fn write_outcome(&self, result: Result<()>, ok: Outcome) -> Outcome {
        match result {
            Ok(()) => ok,
            Err(Error::Validation(e)) => Outcome::toast(e.to_string()),
            Err(e) => {
                warn!("Storage write failed: {}", e);
                Outcome::toast(TOAST_WRITE_FAILED)
            }
        }
    }
}
