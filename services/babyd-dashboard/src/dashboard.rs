//! Web dashboard with JSON API endpoints
//!
//! Each bank is shown as a grid of register panels, `register_columns`
//! panels per row. A panel shows the register's words as padded hex,
//! `words_per_row` words per row with the byte offset of each row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use register_view::{
    encode_hex_padded, DisplayGrid, EditState, RegisterError, RegisterPath, RegisterView,
};
use serde::{Deserialize, Serialize};

use crate::state::{SharedState, StateHandle};
use crate::DashboardError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle) -> Router {
    let dashboard_state = DashboardState { state };

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/banks", get(banks_handler))
        .route("/api/banks/{bank}", get(bank_handler))
        .route(
            "/api/banks/{bank}/{register}/words/{index}",
            put(edit_word_handler),
        )
        .route(
            "/api/banks/{bank}/{register}/fields/{field}",
            put(edit_field_handler),
        )
        .route("/api/banks/{bank}/{register}/commit", post(commit_handler))
        .route("/api/banks/{bank}/{register}/cancel", post(cancel_handler))
        .with_state(dashboard_state)
}

/// One bank in the bank list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub name: String,
    pub registers: usize,
    pub editing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanksResponse {
    pub banks: Vec<BankSummary>,
    pub last_poll_epoch_ms: u64,
    pub consecutive_errors: u32,
}

/// A labelled row of words inside a register panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRow {
    pub offset: String,
    pub words: Vec<WordCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCell {
    pub index: usize,
    pub hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCell {
    pub name: String,
    pub bits: Option<String>,
    pub value: u32,
    pub hex: String,
}

/// Everything needed to draw one register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPanel {
    pub name: String,
    pub path: String,
    pub address: Option<String>,
    pub read_only: bool,
    pub state: EditState,
    pub rows: Vec<WordRow>,
    pub fields: Vec<FieldCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankResponse {
    pub bank: String,
    pub columns: usize,
    pub rows: Vec<Vec<RegisterPanel>>,
}

#[derive(Debug, Deserialize)]
pub struct WordEdit {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    pub value: u32,
}

/// Error response carrying a status code and a JSON message
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        Self(e)
    }
}

impl From<RegisterError> for ApiError {
    fn from(e: RegisterError) -> Self {
        Self(DashboardError::Register(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::Register(e) => match e {
                RegisterError::UnknownRegister(_) | RegisterError::UnknownField(_) => {
                    StatusCode::NOT_FOUND
                }
                RegisterError::ReadOnly(_) => StatusCode::FORBIDDEN,
                RegisterError::WordOutOfRange { .. } | RegisterError::FieldValueTooWide { .. } => {
                    StatusCode::BAD_REQUEST
                }
                RegisterError::NoPendingEdit(_) | RegisterError::CommitInFlight(_) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DashboardError::Dashboard(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::debug!("API error {}: {}", status, self.0);
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn register_panel(state: &SharedState, view: RegisterView) -> RegisterPanel {
    let spec = state
        .store
        .definitions()
        .field_spec(view.path.bank(), view.path.name());

    let rows = DisplayGrid::layout(view.values.iter().copied().enumerate(), state.words_per_row)
        .map(|grid| {
            let offsets: Vec<String> = (0..grid.row_count())
                .map(|row| format!("{:#06x}", grid.row_byte_offset(row)))
                .collect();
            offsets
                .into_iter()
                .zip(grid.into_rows())
                .map(|(offset, words)| WordRow {
                    offset,
                    words: words
                        .into_iter()
                        .map(|(index, word)| WordCell {
                            index,
                            hex: encode_hex_padded(word, register_view::codec::WORD_BITS),
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    let fields = view
        .fields
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let range = spec.and_then(|spec| spec.get(&name));
            let width = range.map_or(register_view::codec::WORD_BITS, |r| r.width());
            FieldCell {
                bits: range.map(|r| r.to_string()),
                hex: encode_hex_padded(value, width),
                name,
                value,
            }
        })
        .collect();

    RegisterPanel {
        path: view.path.to_string(),
        address: view.address.map(|addr| encode_hex_padded(addr, 16)),
        name: view.name,
        read_only: view.read_only,
        state: view.state,
        rows,
        fields,
    }
}

fn lookup(state: &SharedState, bank: &str, register: &str) -> Result<RegisterPath, ApiError> {
    let path = RegisterPath::new(bank, register);
    if state.store.view(&path).is_none() {
        return Err(RegisterError::UnknownRegister(path.to_string()).into());
    }
    Ok(path)
}

fn panel_for(state: &SharedState, path: &RegisterPath) -> ApiResult<RegisterPanel> {
    let view = state
        .store
        .view(path)
        .ok_or_else(|| RegisterError::UnknownRegister(path.to_string()))?;
    Ok(Json(register_panel(state, view)))
}

/// Escape text for use in HTML content and quoted attribute values
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let tabs: String = state
        .banks
        .iter()
        .map(|bank| {
            let bank = escape_html(bank);
            format!(
                r#"<button class="tab" data-bank="{bank}" onclick="selectBank(this.dataset.bank)">{bank}</button>"#
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Register Dashboard</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 1200px; margin: 0 auto; padding: 1rem; }}
        .tab {{ padding: 0.4rem 0.8rem; margin-right: 0.25rem; border: 1px solid #dee2e6; background: #f8f9fa; cursor: pointer; }}
        .tab.active {{ background: #0d6efd; color: white; }}
        .row {{ display: flex; gap: 1rem; margin-top: 1rem; }}
        .panel {{ flex: 1; border: 1px solid #dee2e6; border-radius: 0.25rem; padding: 0.5rem; }}
        .panel.editing {{ border-color: #ffc107; background: #fff8e1; }}
        .panel.committing {{ border-color: #0d6efd; background: #e7f1ff; }}
        .panel h3 {{ margin: 0 0 0.5rem 0; font-size: 1rem; }}
        .offset {{ color: #6c757d; font-family: monospace; padding-right: 0.5rem; }}
        input.word {{ width: 7rem; font-family: monospace; }}
        table.fields td {{ font-family: monospace; padding-right: 0.75rem; }}
    </style>
    <script>
        let currentBank = null;

        function esc(s) {{
            return String(s).replace(/[&<>"']/g, c => ({{
                '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
            }})[c]);
        }}

        function selectBank(bank) {{
            currentBank = bank;
            document.querySelectorAll('.tab').forEach(t => t.classList.toggle('active', t.dataset.bank === bank));
            refreshBank();
        }}

        function registerUrl(path) {{
            const split = path.indexOf('/');
            return '/api/banks/' + encodeURIComponent(path.slice(0, split))
                + '/' + encodeURIComponent(path.slice(split + 1));
        }}

        function panelPath(el) {{
            return el.closest('.panel').dataset.path;
        }}

        function editWord(path, index, text) {{
            return fetch(registerUrl(path) + '/words/' + index, {{
                method: 'PUT',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ text: text }}),
            }}).then(refreshBank);
        }}

        function editField(path, field, text) {{
            fetch(registerUrl(path) + '/fields/' + encodeURIComponent(field), {{
                method: 'PUT',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ value: parseInt(text, 16) || 0 }}),
            }}).then(refreshBank);
        }}

        function confirmEdit(path) {{
            fetch(registerUrl(path) + '/commit', {{ method: 'POST' }}).then(refreshBank);
        }}

        function cancelEdit(path) {{
            fetch(registerUrl(path) + '/cancel', {{ method: 'POST' }}).then(refreshBank);
        }}

        function renderPanel(r) {{
            const disabled = r.read_only ? 'disabled' : '';
            const words = r.rows.map(row => `<tr><td class="offset">${{esc(row.offset)}}</td>` +
                row.words.map(w => `<td><input class="word" value="${{esc(w.hex)}}" ${{disabled}}
                    data-index="${{w.index}}"
                    onchange="editWord(panelPath(this), this.dataset.index, this.value)"
                    onkeydown="if (event.key === 'Enter') editWord(panelPath(this), this.dataset.index, this.value).then(() => confirmEdit(panelPath(this)));
                               if (event.key === 'Escape') cancelEdit(panelPath(this));"></td>`).join('') +
                '</tr>').join('');
            const fields = r.fields.map(f => `<tr><td>${{esc(f.name)}}</td><td>${{esc(f.bits || '')}}</td>
                <td><input class="word" value="${{esc(f.hex)}}" ${{disabled}} data-field="${{esc(f.name)}}"
                    onchange="editField(panelPath(this), this.dataset.field, this.value)"></td></tr>`).join('');
            const buttons = r.read_only ? '' :
                `<button onclick="confirmEdit(panelPath(this))">Confirm</button>
                 <button onclick="cancelEdit(panelPath(this))">Cancel</button>`;
            return `<div class="panel ${{esc(r.state)}}" data-path="${{esc(r.path)}}">
                <h3>${{esc(r.name)}} <small>${{esc(r.address || '')}}</small> <small>${{r.read_only ? '(read-only)' : ''}}</small></h3>
                <table>${{words}}</table>
                ${{fields ? `<table class="fields">${{fields}}</table>` : ''}}
                ${{buttons}}
            </div>`;
        }}

        // A panel holding focus is left alone; every other panel is redrawn.
        function refreshBank() {{
            if (!currentBank) return;
            fetch('/api/banks/' + encodeURIComponent(currentBank))
                .then(r => r.json())
                .then(data => {{
                    const bank = document.getElementById('bank');
                    const next = document.createElement('div');
                    next.innerHTML = data.rows.map(row =>
                        `<div class="row">${{row.map(renderPanel).join('')}}</div>`).join('');

                    const focused = document.activeElement && document.activeElement.closest('#bank .panel');
                    if (!focused) {{
                        bank.replaceChildren(...next.childNodes);
                        return;
                    }}

                    const current = Array.from(bank.querySelectorAll('.panel'));
                    const fresh = Array.from(next.querySelectorAll('.panel'));
                    const sameLayout = current.length === fresh.length
                        && current.every((panel, i) => panel.dataset.path === fresh[i].dataset.path);
                    if (!sameLayout) return;
                    current.forEach((panel, i) => {{
                        if (panel !== focused) panel.replaceWith(fresh[i]);
                    }});
                }});
        }}

        function refreshStatus() {{
            fetch('/api/banks')
                .then(r => r.json())
                .then(data => {{
                    const status = data.consecutive_errors > 0
                        ? `Feed errors: ${{data.consecutive_errors}}`
                        : (data.last_poll_epoch_ms ? 'Last update ' + new Date(data.last_poll_epoch_ms).toLocaleTimeString() : 'Waiting for data');
                    document.getElementById('status').textContent = status;
                }});
        }}

        setInterval(refreshBank, 1000);
        setInterval(refreshStatus, 5000);
        window.onload = () => {{
            const first = document.querySelector('.tab');
            if (first) selectBank(first.dataset.bank);
            refreshStatus();
        }};
    </script>
</head>
<body>
    <h1>Register Dashboard</h1>
    <p id="status" style="color: #6c757d;"></p>
    <nav>{tabs}</nav>
    <div id="bank"></div>
</body>
</html>"#
    );

    Html(html)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn banks_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let banks = state
        .banks
        .iter()
        .map(|bank| {
            let views = state.store.bank_view(bank);
            BankSummary {
                name: bank.clone(),
                registers: views.len(),
                editing: views
                    .iter()
                    .filter(|view| view.state != EditState::Clean)
                    .count(),
            }
        })
        .collect();

    Json(BanksResponse {
        banks,
        last_poll_epoch_ms: state.last_poll_epoch_ms,
        consecutive_errors: state.consecutive_errors,
    })
}

async fn bank_handler(
    State(dashboard): State<DashboardState>,
    Path(bank): Path<String>,
) -> ApiResult<BankResponse> {
    let state = dashboard.state.read().await;
    let bank = bank.to_ascii_lowercase();
    if !state.banks.contains(&bank) && state.store.catalog(&bank).is_none() {
        return Err(DashboardError::Dashboard(format!("Unknown bank '{}'", bank)).into());
    }

    let grid = state.store.bank_grid(&bank, state.register_columns)?;
    let columns = grid.columns();
    let rows = grid
        .map(|view| register_panel(&state, view))
        .into_rows();

    Ok(Json(BankResponse {
        bank,
        columns,
        rows,
    }))
}

async fn edit_word_handler(
    State(dashboard): State<DashboardState>,
    Path((bank, register, index)): Path<(String, String, usize)>,
    Json(edit): Json<WordEdit>,
) -> ApiResult<RegisterPanel> {
    let mut state = dashboard.state.write().await;
    let path = lookup(&state, &bank, &register)?;
    state.store.edit_word(&path, index, &edit.text)?;
    panel_for(&state, &path)
}

async fn edit_field_handler(
    State(dashboard): State<DashboardState>,
    Path((bank, register, field)): Path<(String, String, String)>,
    Json(edit): Json<FieldEdit>,
) -> ApiResult<RegisterPanel> {
    let mut state = dashboard.state.write().await;
    let path = lookup(&state, &bank, &register)?;
    state.store.edit_field(&path, &field, edit.value)?;
    panel_for(&state, &path)
}

async fn commit_handler(
    State(dashboard): State<DashboardState>,
    Path((bank, register)): Path<(String, String)>,
) -> ApiResult<RegisterPanel> {
    let mut guard = dashboard.state.write().await;
    let state = &mut *guard;
    let path = lookup(state, &bank, &register)?;
    state.store.commit(&path, &state.dispatcher)?;
    panel_for(state, &path)
}

async fn cancel_handler(
    State(dashboard): State<DashboardState>,
    Path((bank, register)): Path<(String, String)>,
) -> ApiResult<RegisterPanel> {
    let mut state = dashboard.state.write().await;
    let path = lookup(&state, &bank, &register)?;
    state.store.cancel(&path);
    panel_for(&state, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command_queue;
    use crate::state::new_state_handle;
    use axum::body::Body;
    use axum::http::Request;
    use register_view::{
        BankSnapshot, RawRegister, RegisterDefinitions, RegisterStore, WriteCommand,
    };
    use tokio::sync::mpsc::UnboundedReceiver;
    use tower::ServiceExt;

    const DEFINITIONS: &str = r#"{
        "UDP": {
            "CTRL": {"addr": 0, "size": 4, "fields": {"ENABLE": 0, "MODE": [1, 3]}}
        }
    }"#;

    fn raw(address: u32, values: &[u32], read_only: bool) -> RawRegister {
        RawRegister {
            address: Some(address),
            values: values.to_vec(),
            fields: None,
            read_only,
        }
    }

    fn test_state() -> (StateHandle, UnboundedReceiver<WriteCommand>) {
        let (queue, rx) = command_queue();
        let mut store =
            RegisterStore::with_definitions(RegisterDefinitions::from_json(DEFINITIONS).unwrap());
        let snapshot: BankSnapshot = [
            ("IP_REMOTE".to_string(), raw(0x14, &[0xC0A8_0001], false)),
            ("CTRL".to_string(), raw(0x00, &[0x0000_0005], false)),
            (
                "MAC_STATUS".to_string(),
                raw(0x40, &[1, 2, 3, 4, 5], true),
            ),
        ]
        .into_iter()
        .collect();
        store.apply_snapshot("udp", &snapshot);

        let state = SharedState::new(
            store,
            queue,
            vec!["udp".to_string(), "iic".to_string()],
            2,
            4,
        );
        (new_state_handle(state), rx)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn index_lists_banks() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Register Dashboard"));
        assert!(html.contains(r#"data-bank="udp""#));
        assert!(html.contains(r#"data-bank="iic""#));
    }

    #[test]
    fn escape_html_covers_markup_and_quotes() {
        assert_eq!(escape_html("udp"), "udp");
        assert_eq!(
            escape_html(r#"a'b"<c>&"#),
            "a&#39;b&quot;&lt;c&gt;&amp;"
        );
    }

    #[tokio::test]
    async fn index_escapes_bank_names() {
        let (queue, _rx) = command_queue();
        let state = new_state_handle(SharedState::new(
            RegisterStore::new(),
            queue,
            vec![r#"o'neil"<b>"#.to_string()],
            2,
            4,
        ));
        let app = build_router(state);

        let response = send(app, "GET", "/", None).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"data-bank="o&#39;neil&quot;&lt;b&gt;""#));
        assert!(!html.contains("o'neil"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("selectBank(this.dataset.bank)"));
    }

    #[tokio::test]
    async fn index_redraws_all_but_the_focused_panel() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/", None).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("if (panel !== focused) panel.replaceWith(fresh[i]);"));
        assert!(!html.contains("if (focused) return;"));
    }

    #[tokio::test]
    async fn banks_endpoint() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/api/banks", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let banks: BanksResponse = json_body(response).await;
        assert_eq!(banks.banks.len(), 2);
        assert_eq!(banks.banks[0].name, "udp");
        assert_eq!(banks.banks[0].registers, 3);
        assert_eq!(banks.banks[1].registers, 0);
    }

    #[tokio::test]
    async fn bank_endpoint_lays_out_panels() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/api/banks/UDP", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bank: BankResponse = json_body(response).await;
        assert_eq!(bank.columns, 2);
        let names: Vec<Vec<&str>> = bank
            .rows
            .iter()
            .map(|row| row.iter().map(|p| p.name.as_str()).collect())
            .collect();
        assert_eq!(names, vec![vec!["CTRL", "IP_REMOTE"], vec!["MAC_STATUS"]]);

        let ctrl = &bank.rows[0][0];
        assert_eq!(ctrl.address.as_deref(), Some("0x0000"));
        assert_eq!(ctrl.rows[0].words[0].hex, "0x00000005");
        let fields: Vec<(&str, u32)> = ctrl
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value))
            .collect();
        assert_eq!(fields, vec![("ENABLE", 1), ("MODE", 2)]);
        assert_eq!(ctrl.fields[1].bits.as_deref(), Some("[1..=3]"));
        assert_eq!(ctrl.fields[1].hex, "0x2");

        let status = &bank.rows[1][0];
        assert!(status.read_only);
        assert_eq!(status.rows.len(), 2);
        assert_eq!(status.rows[0].offset, "0x0000");
        assert_eq!(status.rows[1].offset, "0x0010");
        assert_eq!(status.rows[1].words[0].index, 4);
    }

    #[tokio::test]
    async fn configured_bank_without_data_is_empty() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/api/banks/iic", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bank: BankResponse = json_body(response).await;
        assert!(bank.rows.is_empty());
    }

    #[tokio::test]
    async fn unknown_bank_is_not_found() {
        let (state, _rx) = test_state();
        let app = build_router(state);

        let response = send(app, "GET", "/api/banks/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_then_commit_enqueues_write() {
        let (state, mut rx) = test_state();

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/IP_REMOTE/words/0",
            Some(r#"{"text": "c0a80002"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let panel: RegisterPanel = json_body(response).await;
        assert_eq!(panel.state, EditState::Editing);
        assert_eq!(panel.rows[0].words[0].hex, "0xC0A80002");

        let response = send(
            build_router(state.clone()),
            "POST",
            "/api/banks/udp/IP_REMOTE/commit",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let panel: RegisterPanel = json_body(response).await;
        assert_eq!(panel.state, EditState::Committing);

        let command = rx.try_recv().unwrap();
        assert_eq!(command.path, "udp/IP_REMOTE/value");
        assert_eq!(command.value, vec![0xC0A8_0002]);

        let response = send(
            build_router(state),
            "POST",
            "/api/banks/udp/IP_REMOTE/commit",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_returns_to_clean() {
        let (state, mut rx) = test_state();

        send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/IP_REMOTE/words/0",
            Some(r#"{"text": "0"}"#),
        )
        .await;
        let response = send(
            build_router(state),
            "POST",
            "/api/banks/udp/IP_REMOTE/cancel",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let panel: RegisterPanel = json_body(response).await;
        assert_eq!(panel.state, EditState::Clean);
        assert_eq!(panel.rows[0].words[0].hex, "0xC0A80001");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn field_edit() {
        let (state, _rx) = test_state();

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/CTRL/fields/MODE",
            Some(r#"{"value": 7}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let panel: RegisterPanel = json_body(response).await;
        assert_eq!(panel.rows[0].words[0].hex, "0x0000000F");

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/CTRL/fields/MODE",
            Some(r#"{"value": 8}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            build_router(state),
            "PUT",
            "/api/banks/udp/CTRL/fields/NOPE",
            Some(r#"{"value": 1}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_errors_map_to_status_codes() {
        let (state, _rx) = test_state();

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/MAC_STATUS/words/0",
            Some(r#"{"text": "0"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/IP_REMOTE/words/3",
            Some(r#"{"text": "0"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            build_router(state.clone()),
            "PUT",
            "/api/banks/udp/MISSING/words/0",
            Some(r#"{"text": "0"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            build_router(state),
            "POST",
            "/api/banks/udp/IP_REMOTE/commit",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: serde_json::Value = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("has no pending edit"));
    }
}
