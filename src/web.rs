use crate::inference::{Classifier, HttpClassifier};
use crate::keyphrases::{
    LABEL_SUGGESTIONS, Mode, collate_keyphrases, normalize_labels, parse_labels,
};
use crate::model::Model;
use crate::results::{ColumnDef, GridColumn, GridOptions, GroupSummary, ResultRow, TableView};
use crate::session::{FormValues, SessionStore, generate_session_id, is_valid_session_id};
use crate::validation::Submission;
use crate::{ClassificationError, ResultTable, run_classification};
use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Path, RawQuery, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use cookie::{Cookie, SameSite};
use include_dir::{Dir, include_dir};
use markdown::{Options as MarkdownOptions, to_html_with_options};
use once_cell::sync::Lazy;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

type SharedState = Arc<AppState>;
const SESSION_COOKIE: &str = "zs_session";

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

const SIDEBAR_MARKDOWN: &str = r#"
### General workflow

Enter two or three classification labels, paste up to one keyphrase per line,
pick a model and submit. Each keyphrase is scored against every label by the
hosted zero-shot inference API.

### About

Zero-shot classification assigns labels the model was never trained on. Three
models are available:

1. [distilbart-mnli-12-3](https://huggingface.co/valhalla/distilbart-mnli-12-3)
2. [bart-large-mnli](https://huggingface.co/facebook/bart-large-mnli)
3. [DeBERTa-v3-mnli](https://huggingface.co/MoritzLaurer/DeBERTa-v3-base-mnli-fever-anli)

**Demo** mode uses a shared key and reviews 5 keyphrases per run.
**Unlocked Mode** takes your own API key and reviews up to 50.
"#;

static SIDEBAR_HTML: Lazy<String> =
    Lazy::new(|| render_markdown_str(SIDEBAR_MARKDOWN).unwrap_or_default());

pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub demo_token: Option<String>,
    pub sessions: SessionStore,
    pub base_url: String,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    pub inference_base: String,
    pub demo_token: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
            inference_base: crate::model::DEFAULT_INFERENCE_BASE.to_string(),
            demo_token: None,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    if config.demo_token.is_none() {
        warn!("no demo token configured; demo mode submissions will be rejected");
    }
    let state = Arc::new(AppState {
        classifier: Arc::new(HttpClassifier::new(config.inference_base.clone())),
        demo_token: config.demo_token.clone(),
        sessions: SessionStore::new(),
        base_url: config.base_url.clone(),
    });
    let router = build_router(state);
    info!(
        %config.addr,
        base = %config.base_url,
        inference = %config.inference_base,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ClassificationError> for ApiError {
    fn from(value: ClassificationError) -> Self {
        match value {
            ClassificationError::Input(err) => ApiError::bad_request(err.to_string()),
            ClassificationError::Batch(err) => ApiError::bad_gateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/results", get(home))
        .route("/classify", post(classify_form))
        .route("/layout", post(toggle_layout))
        .route("/results.csv", get(export_csv))
        .route("/assets/*path", get(asset))
        .route("/api/classify", post(api_classify))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Session id carried by the request, or a fresh one to hand out.
struct SessionHandle {
    id: String,
    fresh: bool,
}

impl SessionHandle {
    fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|id| is_valid_session_id(id));
        match existing {
            Some(id) => Self { id, fresh: false },
            None => Self {
                id: generate_session_id(),
                fresh: true,
            },
        }
    }

    fn attach(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let cookie = Cookie::build((SESSION_COOKIE, self.id.as_str()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

#[derive(Debug, Default)]
struct Banner {
    warning: Option<String>,
    notice: Option<String>,
    success: bool,
}

async fn home(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let session = SessionHandle::from_headers(&headers);
    let (view, _) = parse_view_query(query.as_deref());
    let html = render_page(&state, &session.id, &view, Banner::default());
    session.attach(Html(html))
}

#[derive(Debug, Default, Deserialize)]
struct ClassifyForm {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    labels: String,
    #[serde(default)]
    keyphrases: String,
}

impl ClassifyForm {
    fn form_values(&self) -> FormValues {
        let mode = match self.mode.as_deref() {
            Some(value) if value.eq_ignore_ascii_case("unlocked") => Mode::Unlocked,
            _ => Mode::Demo,
        };
        let model = self
            .model
            .as_deref()
            .and_then(|value| value.parse::<Model>().ok())
            .unwrap_or_default();
        FormValues {
            mode,
            api_key: self.api_key.clone(),
            model,
            labels: self.labels.clone(),
            // Browsers submit textarea lines with CRLF.
            keyphrases: self.keyphrases.replace("\r\n", "\n"),
        }
    }
}

fn submission_from(values: &FormValues) -> Submission {
    Submission {
        mode: values.mode,
        api_key: values.api_key.clone(),
        model: values.model,
        labels: parse_labels(&values.labels),
        keyphrase_text: values.keyphrases.clone(),
    }
}

async fn classify_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<ClassifyForm>,
) -> Response {
    let session = SessionHandle::from_headers(&headers);
    let values = form.form_values();
    let submission = submission_from(&values);
    let notice = collate_keyphrases(&values.keyphrases, values.mode).cap_notice();
    let outcome = run_classification(
        state.classifier.as_ref(),
        &submission,
        state.demo_token.as_deref(),
    )
    .await;
    let banner = match outcome {
        Ok(outcome) => {
            state.sessions.update(&session.id, |s| {
                s.record_valid_submission(values, outcome.table)
            });
            Banner {
                warning: None,
                notice,
                success: true,
            }
        }
        Err(err) => {
            state
                .sessions
                .update(&session.id, |s| s.record_rejected_submission(values));
            Banner {
                warning: Some(err.to_string()),
                notice,
                success: false,
            }
        }
    };
    let html = render_page(&state, &session.id, &TableView::default(), banner);
    session.attach(Html(html))
}

#[derive(Debug, Default, Deserialize)]
struct LayoutForm {
    wide: Option<String>,
}

async fn toggle_layout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<LayoutForm>,
) -> Response {
    let session = SessionHandle::from_headers(&headers);
    let wide = form.wide.is_some_and(|value| !value.is_empty());
    state
        .sessions
        .update(&session.id, |s| s.set_wide_layout(wide));
    session.attach(Redirect::to("/"))
}

async fn export_csv(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let session = SessionHandle::from_headers(&headers);
    let snapshot = state.sessions.get(&session.id);
    let table = snapshot
        .visible_results()
        .ok_or_else(|| ApiError::not_found("No results to export; submit the form first"))?;
    let (view, selected) = parse_view_query(query.as_deref());
    let bytes = table.to_csv(&view, &selected).map_err(|err| {
        warn!(error = %err, "failed to render csv export");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "failed to render csv export".to_string(),
        }
    })?;
    Ok(session.attach((
        [
            (CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", crate::results::CSV_FILE_NAME),
            ),
        ],
        bytes,
    )))
}

async fn asset(Path(path): Path<String>) -> Result<Response, ApiError> {
    let file = ASSETS
        .get_file(&path)
        .ok_or_else(|| ApiError::not_found(format!("no asset named {path:?}")))?;
    let content_type = match file.path().extension().and_then(|ext| ext.to_str()) {
        Some("svg") => mime::IMAGE_SVG.as_ref(),
        Some("png") => mime::IMAGE_PNG.as_ref(),
        _ => mime::APPLICATION_OCTET_STREAM.as_ref(),
    };
    Ok(([(CONTENT_TYPE, content_type)], file.contents()).into_response())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "zeroshot-web" }))
}

#[derive(Debug, Deserialize)]
struct ApiClassifyRequest {
    #[serde(default)]
    mode: Mode,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    keyphrases: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiClassifyResponse {
    model: Model,
    rows: Vec<ResultRow>,
    notice: Option<String>,
}

async fn api_classify(
    State(state): State<SharedState>,
    Json(request): Json<ApiClassifyRequest>,
) -> Result<Json<ApiClassifyResponse>, ApiError> {
    let model = match request.model.as_deref() {
        Some(value) => value
            .parse::<Model>()
            .map_err(|err| ApiError::bad_request(err.to_string()))?,
        None => Model::default(),
    };
    let submission = Submission {
        mode: request.mode,
        api_key: request.api_key,
        model,
        labels: normalize_labels(request.labels.iter().map(String::as_str)),
        keyphrase_text: request.keyphrases,
    };
    let outcome = run_classification(
        state.classifier.as_ref(),
        &submission,
        state.demo_token.as_deref(),
    )
    .await?;
    Ok(Json(ApiClassifyResponse {
        model: submission.model,
        rows: outcome.table.rows,
        notice: outcome.notice,
    }))
}

/// Reads grid view parameters leniently; unknown or empty values are ignored.
/// `selected` may repeat or hold a comma-separated list of row indices.
fn parse_view_query(query: Option<&str>) -> (TableView, Vec<usize>) {
    let mut view = TableView::default();
    let mut selected = Vec::new();
    let Some(query) = query else {
        return (view, selected);
    };
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_component(value);
        match key {
            "sort" => view.sort = parse_column(&value),
            "dir" => {
                view.dir = if value.eq_ignore_ascii_case("desc") {
                    crate::results::SortDirection::Desc
                } else {
                    crate::results::SortDirection::Asc
                }
            }
            "filter" => view.filter = Some(value).filter(|value| !value.trim().is_empty()),
            "group" => view.group = parse_column(&value),
            "selected" => selected.extend(
                value
                    .split(',')
                    .filter_map(|index| index.trim().parse::<usize>().ok()),
            ),
            _ => {}
        }
    }
    (view, selected)
}

fn parse_column(value: &str) -> Option<GridColumn> {
    GridColumn::ALL
        .into_iter()
        .find(|column| column.query_value().eq_ignore_ascii_case(value.trim()))
}

fn decode_component(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn view_query(view: &TableView) -> String {
    let mut parts = Vec::new();
    if let Some(column) = view.sort {
        parts.push(format!("sort={}", column.query_value()));
        parts.push(format!("dir={}", view.dir.query_value()));
    }
    if let Some(filter) = view.filter.as_deref() {
        parts.push(format!("filter={}", encode_component(filter)));
    }
    if let Some(column) = view.group {
        parts.push(format!("group={}", column.query_value()));
    }
    parts.join("&")
}

fn render_page(state: &AppState, session_id: &str, view: &TableView, banner: Banner) -> String {
    let snapshot = state.sessions.get(session_id);
    let grid = snapshot
        .visible_results()
        .map(|table| GridPayload::build(table, view));
    let form = &snapshot.form;
    let template = PageTemplate {
        container_class: if snapshot.wide_layout {
            "w-full max-w-none"
        } else {
            "w-full max-w-4xl"
        },
        layout: if snapshot.wide_layout { "wide" } else { "centered" },
        wide: snapshot.wide_layout,
        form,
        demo: form.mode == Mode::Demo,
        demo_available: state.demo_token.is_some(),
        models: Model::ALL
            .iter()
            .map(|model| ModelOption {
                key: model.key(),
                name: model.display_name(),
                selected: *model == form.model,
            })
            .collect(),
        suggestions: &LABEL_SUGGESTIONS,
        sidebar_html: SIDEBAR_HTML.as_str(),
        banner,
        grid,
        version: env!("CARGO_PKG_VERSION"),
        base_url: &state.base_url,
    };
    template
        .render()
        .unwrap_or_else(|err| render_error_page(err.to_string()))
}

fn render_error_page(message: impl Into<String>) -> String {
    let message = xml_escape(&message.into());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Zero-Shot Text Classifier • Error</title>
  </head>
  <body>
    <main>
      <h1>Something went wrong</h1>
      <p>{message}</p>
      <p><a href="/">Back to the classifier</a></p>
    </main>
  </body>
</html>"#
    )
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn render_markdown_str(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let html = to_html_with_options(trimmed, &MarkdownOptions::gfm())
        .unwrap_or_else(|_| trimmed.to_string());
    Some(html)
}

struct ModelOption {
    key: &'static str,
    name: &'static str,
    selected: bool,
}

struct HeaderCell {
    title: &'static str,
    link: String,
    indicator: &'static str,
}

struct GroupOption {
    value: &'static str,
    title: &'static str,
    selected: bool,
}

struct GridPayload<'a> {
    headers: Vec<HeaderCell>,
    rows: Vec<&'a ResultRow>,
    total_rows: usize,
    groups: Vec<GroupSummary>,
    group_title: &'static str,
    group_options: Vec<GroupOption>,
    filter: String,
    sort: &'static str,
    dir: &'static str,
    group: &'static str,
    export_link: String,
    column_defs: Vec<ColumnDef>,
    options_json: String,
}

impl<'a> GridPayload<'a> {
    fn build(table: &'a ResultTable, view: &TableView) -> Self {
        let headers = GridColumn::ALL
            .iter()
            .map(|column| {
                let active = view.sort == Some(*column);
                let next = TableView {
                    sort: Some(*column),
                    dir: if active {
                        view.dir.flipped()
                    } else {
                        Default::default()
                    },
                    ..view.clone()
                };
                let indicator = match (active, view.dir) {
                    (false, _) => "",
                    (true, crate::results::SortDirection::Asc) => "▲",
                    (true, crate::results::SortDirection::Desc) => "▼",
                };
                HeaderCell {
                    title: column.title(),
                    link: format!("/results?{}", view_query(&next)),
                    indicator,
                }
            })
            .collect();
        let group_options = GridColumn::ALL
            .iter()
            .map(|column| GroupOption {
                value: column.query_value(),
                title: column.title(),
                selected: view.group == Some(*column),
            })
            .collect();
        let options = GridOptions::for_results();
        let options_json = serde_json::to_string_pretty(&options).unwrap_or_default();
        let query = view_query(view);
        Self {
            headers,
            rows: table.view(view),
            total_rows: table.len(),
            groups: table.groups(view),
            group_title: view.group.map(|column| column.title()).unwrap_or(""),
            group_options,
            filter: view.filter.clone().unwrap_or_default(),
            sort: view.sort.map(|column| column.query_value()).unwrap_or(""),
            dir: view.dir.query_value(),
            group: view.group.map(|column| column.query_value()).unwrap_or(""),
            export_link: if query.is_empty() {
                "/results.csv".to_string()
            } else {
                format!("/results.csv?{query}")
            },
            column_defs: options.column_defs,
            options_json,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Zero-Shot Text Classifier</title>
    <link rel="icon" href="/assets/logo.svg" type="image/svg+xml">
    <link rel="canonical" href="{{ base_url }}/">
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="bg-slate-50 text-slate-900" data-layout="{{ layout }}">
    <div class="min-h-screen flex">
      <aside class="w-72 shrink-0 border-r border-slate-200 bg-white p-6 space-y-6 hidden md:block">
        <img src="/assets/sidebar-logo.svg" alt="Zero-shot classifier" class="w-full" />
        <div class="prose prose-sm text-slate-700 space-y-3">{{ sidebar_html|safe }}</div>
      </aside>
      <main class="flex-1 flex flex-col items-center py-10 px-4">
        <div class="{{ container_class }} space-y-6">
          <header class="flex items-center gap-4">
            <img src="/assets/logo.svg" alt="" width="110" />
            <div>
              <p class="uppercase tracking-wide text-sm text-slate-500">v{{ version }}</p>
              <h1 class="text-4xl font-extrabold tracking-tight">Zero-Shot Text Classifier</h1>
            </div>
          </header>
          <p class="text-lg text-slate-600">Classify keyphrases on the fly, no training needed. Create classifying labels (e.g. <code>Positive</code>, <code>Negative</code> and <code>Neutral</code>), paste your keyphrases, and submit.</p>

          <form id="classify" method="post" action="/classify" class="space-y-4 bg-white rounded-lg shadow p-6">
            <fieldset class="flex gap-6">
              <legend class="font-semibold mb-2">Mode</legend>
              <label><input type="radio" name="mode" value="demo" {% if demo %}checked{% endif %} /> Demo{% if !demo_available %} <span class="text-xs text-slate-500">(not configured)</span>{% endif %}</label>
              <label><input type="radio" name="mode" value="unlocked" {% if !demo %}checked{% endif %} /> Unlocked Mode</label>
            </fieldset>
            <label class="block">
              <span class="font-semibold">Your API key</span> <span class="text-xs text-slate-500">(used in Unlocked Mode only)</span>
              <input type="password" name="api_key" value="{{ form.api_key }}" class="mt-1 w-full rounded border border-slate-300 px-3 py-2" />
            </label>
            <label class="block">
              <span class="font-semibold">Select your preferred model</span>
              <select name="model" class="mt-1 w-full rounded border border-slate-300 px-3 py-2">
                {% for option in models %}
                <option value="{{ option.key }}" {% if option.selected %}selected{% endif %}>{{ option.name }}</option>
                {% endfor %}
              </select>
            </label>
            <label class="block">
              <span class="font-semibold">Enter desired classification labels</span> <span class="text-xs text-slate-500">(comma-separated, 3 max)</span>
              <input type="text" name="labels" list="label-suggestions" value="{{ form.labels }}" class="mt-1 w-full rounded border border-slate-300 px-3 py-2" />
              <datalist id="label-suggestions">
                {% for suggestion in suggestions %}
                <option value="{{ suggestion }}"></option>
                {% endfor %}
              </datalist>
            </label>
            <label class="block">
              <span class="font-semibold">Enter keyphrases to classify</span> <span class="text-xs text-slate-500">(one per line)</span>
              <textarea name="keyphrases" rows="8" class="mt-1 w-full rounded border border-slate-300 px-3 py-2 font-mono">{{ form.keyphrases }}</textarea>
            </label>
            <button type="submit" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800">Submit</button>
          </form>

          {% if let Some(notice) = banner.notice %}
          <div role="status" class="rounded border border-sky-300 bg-sky-50 px-4 py-3 notice">{{ notice }}</div>
          {% endif %}
          {% if let Some(warning) = banner.warning %}
          <div role="alert" class="rounded border border-amber-300 bg-amber-50 px-4 py-3 warning">{{ warning }}</div>
          {% endif %}
          {% if banner.success %}
          <div role="status" class="rounded border border-emerald-300 bg-emerald-50 px-4 py-3 success">Success!</div>
          {% endif %}

          {% if let Some(grid) = grid %}
          <section id="results" class="space-y-4">
            <h2 class="text-2xl font-bold">Check classifier results</h2>
            <form method="post" action="/layout" class="flex items-center gap-2">
              <label><input type="checkbox" name="wide" value="1" {% if wide %}checked{% endif %} onchange="this.form.submit()" /> Widen layout</label>
              <noscript><button type="submit" class="underline">Apply</button></noscript>
            </form>

            <form method="get" action="/results" class="flex flex-wrap items-end gap-3">
              <input type="hidden" name="sort" value="{{ grid.sort }}" />
              <input type="hidden" name="dir" value="{{ grid.dir }}" />
              <label>Filter <input type="search" name="filter" value="{{ grid.filter }}" class="rounded border border-slate-300 px-2 py-1" /></label>
              <label>Group by
                <select name="group" class="rounded border border-slate-300 px-2 py-1">
                  <option value="">(none)</option>
                  {% for option in grid.group_options %}
                  <option value="{{ option.value }}" {% if option.selected %}selected{% endif %}>{{ option.title }}</option>
                  {% endfor %}
                </select>
              </label>
              <button type="submit" class="rounded bg-slate-200 px-3 py-1">Apply</button>
            </form>

            <div class="flex gap-4">
              <div class="flex-1 overflow-x-auto bg-white rounded-lg shadow">
                <table class="min-w-full text-left text-sm">
                  <thead>
                    <tr class="border-b border-slate-200">
                      <th class="px-3 py-2"><span class="sr-only">Select</span></th>
                      <th class="px-3 py-2"></th>
                      {% for header in grid.headers %}
                      <th class="px-3 py-2"><a href="{{ header.link }}">{{ header.title }}</a> {{ header.indicator }}</th>
                      {% endfor %}
                    </tr>
                  </thead>
                  <tbody>
                    {% for row in grid.rows %}
                    <tr class="border-b border-slate-200 result-row">
                      <td class="px-3 py-2"><input type="checkbox" form="export" name="selected" value="{{ row.index }}" /></td>
                      <td class="px-3 py-2 text-slate-500">{{ row.index }}</td>
                      <td class="px-3 py-2">{{ row.keyphrase }}</td>
                      <td class="px-3 py-2">{{ row.labels.join(", ") }}</td>
                      <td class="px-3 py-2">{{ row.scores.join(", ") }}</td>
                    </tr>
                    {% endfor %}
                  </tbody>
                </table>
                <p class="px-3 py-2 text-xs text-slate-500">Showing {{ grid.rows.len() }} of {{ grid.total_rows }} rows.</p>
              </div>
              <details class="w-64 shrink-0 bg-white rounded-lg shadow p-3 text-sm" open>
                <summary class="font-semibold cursor-pointer">Columns</summary>
                <ul class="mt-2 space-y-1">
                  {% for column in grid.column_defs %}
                  <li><span class="font-medium">{{ column.header_name }}</span>
                    <span class="text-xs text-slate-500">{% if column.enable_pivot %}pivot {% endif %}{% if column.enable_value %}value {% endif %}{% if column.enable_row_group %}group{% endif %}</span></li>
                  {% endfor %}
                </ul>
                {% if grid.groups.len() > 0 %}
                <h3 class="mt-4 font-semibold">Grouped by {{ grid.group_title }}</h3>
                <ul class="mt-1 space-y-1 groups">
                  {% for group in grid.groups %}
                  <li>{{ group.value }} <span class="text-slate-500">({{ group.rows }})</span></li>
                  {% endfor %}
                </ul>
                {% endif %}
              </details>
            </div>
            <script type="application/json" id="grid-options">{{ grid.options_json|safe }}</script>

            <form id="export" method="get" action="/results.csv" class="flex items-center gap-3">
              <input type="hidden" name="sort" value="{{ grid.sort }}" />
              <input type="hidden" name="dir" value="{{ grid.dir }}" />
              <input type="hidden" name="filter" value="{{ grid.filter }}" />
              <input type="hidden" name="group" value="{{ grid.group }}" />
              <button type="submit" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow">Download results as CSV</button>
              <a href="{{ grid.export_link }}" class="text-sm underline">Export the full view</a>
            </form>
          </section>
          {% endif %}
        </div>
      </main>
    </div>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    container_class: &'static str,
    layout: &'static str,
    wide: bool,
    form: &'a FormValues,
    demo: bool,
    demo_available: bool,
    models: Vec<ModelOption>,
    suggestions: &'static [&'static str],
    sidebar_html: &'a str,
    banner: Banner,
    grid: Option<GridPayload<'a>>,
    version: &'static str,
    base_url: &'a str,
}
