//! Markup fragments for every screen. Pure functions over data; all user text
//! goes through maud's escaping.
//!
//! Interactive elements carry `data-*` hooks instead of handlers. The host
//! page delegates events from the app root and dispatches on them:
//!
//! - `data-link`: navigate to the hash in the attribute value
//! - `data-option` / `data-value`: pick an option inside `data-option-group`
//! - `data-image-action`: photo edit (`rotate-left`, `rotate-right`, `crop`, `reset`)
//! - `data-image-input`, `data-preview`: file picker and edited preview
//! - `data-search`, `data-sort`, `data-shop-select`: list controls
//! - `data-results`: region replaced when only the list changes
//! - `data-form`, `data-delete`: record form and its delete button
//! - `data-auth-form`, `data-auth-toggle`, `data-auth-skip`, `data-auth-open`: sign-in

use std::sync::OnceLock;

use maud::{html, Markup};

use crate::photo::{encode_data_url, ImageAction};
use crate::query::{ListQuery, SortOrder, Stats};
use crate::record::{MetricKey, Record, RecordKind, CUSTOM_OPTION};
use crate::router::Route;

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="500"><defs><linearGradient id="bg" x1="0" x2="1" y1="0" y2="1"><stop offset="0%" stop-color="#2c2c2c"/><stop offset="100%" stop-color="#111"/></linearGradient></defs><rect width="100%" height="100%" fill="url(#bg)"/><rect x="40" y="40" width="720" height="420" rx="32" fill="#1b1b1b"/><text x="50%" y="50%" text-anchor="middle" fill="#ffd600" font-size="42" font-family="sans-serif">No Photo</text></svg>"##;

const MISSING_STAT: &str = "—";

/// Stand-in for records without a photo.
pub fn placeholder_image() -> &'static str {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| encode_data_url("image/svg+xml", PLACEHOLDER_SVG.as_bytes()))
}

fn image_src(data_url: &str) -> &str {
    if data_url.is_empty() {
        placeholder_image()
    } else {
        data_url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    New,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignUp,
    SignIn,
}

impl AuthMode {
    pub fn toggle(self) -> Self {
        match self {
            AuthMode::SignUp => AuthMode::SignIn,
            AuthMode::SignIn => AuthMode::SignUp,
        }
    }
}

fn metric_chip(key: MetricKey, record: &Record) -> Markup {
    html! {
        span class="chip accent" { (key.label()) " " (record.metrics.get(key).display()) }
    }
}

pub fn render_list(kind: RecordKind, records: &[Record]) -> Markup {
    if records.is_empty() {
        return html! {
            section class="section-card" {
                div class="empty-state" {
                    h3 { "記録がありません" }
                    p { "右下の＋から追加しましょう。" }
                }
            }
        };
    }

    html! {
        section class="cards-grid" {
            @for record in records {
                @let link = Route::Detail { kind, id: record.id.clone() }.to_hash();
                article class="record-card" data-link=(link) {
                    img class="record-thumb" src=(image_src(&record.image_data_url)) alt=(record.shop_name);
                    div class="record-body" {
                        h3 class="record-title" { (record.shop_name) }
                        div class="record-meta" {
                            (record.date_label()) " ・ 麺 " (record.metrics.noodles.display())
                        }
                        div class="chip-group" {
                            @for key in &MetricKey::all()[1..] {
                                (metric_chip(*key, record))
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render_detail(kind: RecordKind, record: &Record) -> Markup {
    let edit = Route::Edit {
        kind,
        id: record.id.clone(),
    }
    .to_hash();
    let back = Route::home_of(kind).to_hash();
    html! {
        section class="section-card" {
            img class="detail-hero" src=(image_src(&record.image_data_url)) alt=(record.shop_name);
            div class="detail-header" {
                div {
                    h2 class="detail-title" { (record.shop_name) }
                    div class="detail-date" { (record.date_label()) }
                }
                button class="btn ghost" data-link=(edit) { "編集" }
            }
            p { (record.notes) }
            div class="chip-group" {
                @for key in MetricKey::all() {
                    (metric_chip(*key, record))
                }
            }
            button class="btn ghost" data-link=(back) { "一覧へ戻る" }
        }
    }
}

/// Everything the record form needs besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct FormView<'a> {
    pub mode: FormMode,
    pub record: &'a Record,
    /// Personal saving needs a signed-in user.
    pub allow_personal: bool,
    /// Edited photo to show; falls back to the record's stored photo.
    pub preview: Option<&'a str>,
    pub crop_active: bool,
    pub shops: &'a [String],
}

fn image_action_label(action: ImageAction) -> &'static str {
    match action {
        ImageAction::RotateLeft => "↺ 左回転",
        ImageAction::RotateRight => "↻ 右回転",
        ImageAction::ToggleCrop => "□ 正方形",
        ImageAction::Reset => "リセット",
    }
}

fn metric_block(key: MetricKey, record: &Record) -> Markup {
    let selection = record.metrics.get(key);
    let option_field = key.option_field();
    html! {
        div class="metric-block" {
            p class="metric-title" { (key.label()) }
            div class="segmented" data-option-group {
                @for option in key.options() {
                    button
                        type="button"
                        class=(if selection.option == *option { "active" } else { "" })
                        data-option=(option_field)
                        data-value=(option)
                    {
                        (option)
                    }
                }
            }
            input type="hidden" name=(option_field) value=(selection.option);
            input
                class="input metric-custom"
                name=(key.custom_field())
                value=(selection.custom)
                placeholder={ (CUSTOM_OPTION) "の内容" };
        }
    }
}

pub fn render_form(view: FormView<'_>) -> Markup {
    let record = view.record;
    let preview = view.preview.unwrap_or(&record.image_data_url);
    let date = record
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    html! {
        form class="section-card" data-form {
            div class="form-section preview-box" {
                strong { "画像" }
                img class="preview-img" src=(image_src(preview)) alt="プレビュー" data-preview;
                input type="file" accept="image/*" class="input" data-image-input;
                div class="image-tools" {
                    @for action in ImageAction::all() {
                        @let active = *action == ImageAction::ToggleCrop && view.crop_active;
                        button
                            type="button"
                            class=(if active { "btn ghost active" } else { "btn ghost" })
                            data-image-action=(action.as_str())
                        {
                            (image_action_label(*action))
                        }
                    }
                }
            }

            div class="form-section" {
                label class="metric-title" { "店名 *" }
                input class="input" name="shopName" list="shop-list" value=(record.shop_name) required;
                (render_shop_datalist(view.shops))
            }

            div class="form-section" {
                label class="metric-title" { "日付" }
                input class="input" type="date" name="date" value=(date);
            }

            div class="form-section" {
                label class="metric-title" { "メモ" }
                textarea class="input" name="notes" rows="3" { (record.notes) }
            }

            div class="form-section metric-grid" {
                @for key in MetricKey::all() {
                    (metric_block(*key, record))
                }
            }

            div class="form-section share-options" {
                label class="check" {
                    input type="checkbox" name="shareCommunity" checked[record.share_community];
                    "みんなの二郎に共有する"
                }
                label class="check" {
                    input
                        type="checkbox"
                        name="savePersonal"
                        checked[view.allow_personal && record.save_personal]
                        disabled[!view.allow_personal];
                    "自分の二郎に保存する"
                }
                @if !view.allow_personal {
                    p class="muted-note" { "サインインすると自分の記録にも保存できます。" }
                }
            }

            div class="form-footer" {
                button class="btn primary" type="submit" { "保存する" }
                @if view.mode == FormMode::Edit {
                    button class="btn danger" type="button" data-delete { "削除" }
                }
            }
        }
    }
}

pub fn render_toolbar(query: &ListQuery) -> Markup {
    html! {
        section class="toolbar" {
            input class="input" type="search" data-search placeholder="メモ・トッピングで検索" value=(query.search);
            select class="input" data-sort {
                @for order in SortOrder::all() {
                    option value=(order.as_param()) selected[*order == query.order] { (order.label()) }
                }
            }
        }
    }
}

pub fn render_shop_datalist(shops: &[String]) -> Markup {
    html! {
        datalist id="shop-list" {
            @for shop in shops {
                option value=(shop);
            }
        }
    }
}

pub fn render_community_empty() -> Markup {
    html! {
        section class="section-card" {
            div class="empty-state" {
                h3 { "店舗を選択してください" }
                p { "店舗を選ぶと、その店のみんなの記録が表示されます。" }
            }
        }
    }
}

pub fn render_stats(stats: &Stats) -> Markup {
    let total = stats.total.to_string();
    let mash = stats.mash_rate.map(|r| format!("{r}%"));
    let cells: [(&str, &str); 4] = [
        ("記録数", total.as_str()),
        ("よく行く店", stats.top_shop.as_deref().unwrap_or(MISSING_STAT)),
        ("平均麺量", stats.avg_noodles.unwrap_or(MISSING_STAT)),
        ("マシマシ率", mash.as_deref().unwrap_or(MISSING_STAT)),
    ];
    html! {
        section class="section-card stats-grid" {
            @for (label, value) in cells {
                div class="stat" {
                    div class="stat-label" { (label) }
                    div class="stat-value" { (value) }
                }
            }
        }
    }
}

pub fn render_auth(mode: AuthMode) -> Markup {
    let (title, lead, submit, toggle) = match mode {
        AuthMode::SignUp => (
            "はじめまして",
            "ニックネームを登録すると自分の二郎を記録できます。",
            "登録する",
            "登録済みの方はこちら",
        ),
        AuthMode::SignIn => (
            "おかえりなさい",
            "登録したニックネームでサインインしてください。",
            "サインイン",
            "新しく登録する",
        ),
    };
    html! {
        div class="auth-card" {
            h2 { (title) }
            p { (lead) }
            form data-auth-form {
                input class="input" name="nickname" placeholder="ニックネーム" autocomplete="nickname" required;
                button class="btn primary" type="submit" { (submit) }
            }
            button class="btn ghost" type="button" data-auth-toggle { (toggle) }
            button class="btn ghost" type="button" data-auth-skip { "サインインせずに使う" }
        }
    }
}

pub fn render_sign_in_required() -> Markup {
    html! {
        section class="section-card" {
            div class="empty-state" {
                h3 { "サインインが必要です" }
                p { "自分の二郎はサインイン状態のみ利用できます。" }
                button class="btn primary" data-auth-open { "サインインする" }
            }
        }
    }
}

/// Shop picker, toolbar and the selected shop's records.
pub fn render_community_page(
    selected_shop: &str,
    shops: &[String],
    query: &ListQuery,
    records: &[Record],
) -> Markup {
    html! {
        section class="section-card shop-filter" {
            label class="metric-title" { "みんなの二郎 - 店舗を選択" }
            input
                class="input"
                data-shop-select
                list="shop-list"
                placeholder="店を選択してください"
                value=(selected_shop);
            p class="muted-note" { "共有データベースから最新の記録が見られます。" }
            (render_shop_datalist(shops))
        }
        (render_toolbar(query))
        div data-results {
            (render_community_results(selected_shop, records))
        }
    }
}

pub fn render_community_results(selected_shop: &str, records: &[Record]) -> Markup {
    if selected_shop.is_empty() {
        render_community_empty()
    } else {
        render_list(RecordKind::Community, records)
    }
}

pub fn render_my_page(stats: &Stats, query: &ListQuery, records: &[Record]) -> Markup {
    html! {
        (render_stats(stats))
        (render_toolbar(query))
        div data-results {
            (render_list(RecordKind::Personal, records))
        }
    }
}
