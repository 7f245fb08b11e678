//! In-memory Firestore for integration tests
//!
//! `FakeFirestore` implements `Transport` and answers the REST calls the
//! client makes: document reads, batchGet, runQuery, and the transaction
//! lifecycle. Transactions are optimistic: every transactional read records
//! the version it saw, and commit fails with 409 ABORTED when any of those
//! documents changed since. Contention, errors and hangs can be injected.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value as Json};

use firerest::transport::{HttpRequest, HttpResponse, Transport, TransportFuture};
use firerest::{CancelSignal, ClientConfig, Firestore, StaticTokenProvider};

pub const PROJECT: &str = "demo";
pub const BASE_URL: &str = "http://fake/v1";
pub const TOKEN: &str = "test-token";

/// Resource name prefix of the fake's documents
pub fn root() -> String {
    format!("projects/{}/databases/(default)/documents", PROJECT)
}

pub fn name_of(relative: &str) -> String {
    format!("{}/{}", root(), relative)
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: Map<String, Json>,
    create_time: String,
    update_time: String,
    version: u64,
}

impl StoredDoc {
    fn to_json(&self, name: &str) -> Json {
        json!({
            "name": name,
            "fields": self.fields,
            "createTime": self.create_time,
            "updateTime": self.update_time,
        })
    }
}

#[derive(Debug, Default)]
struct FakeTx {
    read_only: bool,
    /// Version seen per document name; 0 for missing
    reads: HashMap<String, u64>,
    open: bool,
}

#[derive(Default)]
struct FakeState {
    docs: BTreeMap<String, StoredDoc>,
    clock: u64,
    next_tx: u64,
    transactions: HashMap<String, FakeTx>,
    begins: Vec<Json>,
    commits: Vec<Json>,
    calls: HashMap<String, usize>,
    requests: Vec<HttpRequest>,

    abort_commits: u32,
    abort_reads: u32,
    fail_commit: Option<(u16, Json)>,
    fail_rollback: bool,
    hang_commits: bool,
    cancel_on_commit: Option<CancelSignal>,
}

impl FakeState {
    fn tick(&mut self) -> (u64, String) {
        self.clock += 1;
        let ts = Utc
            .timestamp_opt(1_704_067_200 + self.clock as i64, 123_000)
            .unwrap()
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        (self.clock, ts)
    }

    fn now(&self) -> String {
        Utc.timestamp_opt(1_704_067_200 + self.clock as i64, 123_000)
            .unwrap()
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn version_of(&self, name: &str) -> u64 {
        self.docs.get(name).map(|d| d.version).unwrap_or(0)
    }

    fn record_read(&mut self, tx: Option<&str>, name: &str) -> Result<(), HttpResponse> {
        let Some(id) = tx else { return Ok(()) };
        let version = self.version_of(name);
        match self.transactions.get_mut(id) {
            Some(t) if t.open => {
                t.reads.entry(name.to_string()).or_insert(version);
                Ok(())
            }
            _ => Err(error(400, "INVALID_ARGUMENT", "transaction is not open")),
        }
    }
}

/// Undo the client's per-segment URL escaping
fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match (bytes[i], hex) {
            (b'%', Some(byte)) => {
                out.push(byte);
                i += 3;
            }
            (byte, _) => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub fn error(status: u16, code: &str, message: &str) -> HttpResponse {
    HttpResponse::new(
        status,
        json!({"error": {"code": status, "status": code, "message": message}}),
    )
}

// =============================================================================
// Fake server
// =============================================================================

#[derive(Default)]
pub struct FakeFirestore {
    state: Mutex<FakeState>,
}

impl FakeFirestore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    // ---- seeding and inspection ----

    /// Store a document (as another client would), bumping its version
    pub fn insert(&self, relative: &str, fields: Json) {
        let mut state = self.state();
        let (version, ts) = state.tick();
        let name = name_of(relative);
        let create_time = state
            .docs
            .get(&name)
            .map(|d| d.create_time.clone())
            .unwrap_or_else(|| ts.clone());
        let fields = fields.as_object().cloned().unwrap_or_default();
        state.docs.insert(
            name,
            StoredDoc {
                fields,
                create_time,
                update_time: ts,
                version,
            },
        );
    }

    pub fn remove(&self, relative: &str) {
        self.state().docs.remove(&name_of(relative));
    }

    pub fn fields(&self, relative: &str) -> Option<Map<String, Json>> {
        self.state().docs.get(&name_of(relative)).map(|d| d.fields.clone())
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.state().docs.contains_key(&name_of(relative))
    }

    pub fn update_time(&self, relative: &str) -> Option<String> {
        self.state()
            .docs
            .get(&name_of(relative))
            .map(|d| d.update_time.clone())
    }

    /// Integer field of a stored document
    pub fn integer(&self, relative: &str, field: &str) -> Option<i64> {
        self.fields(relative)?
            .get(field)?
            .get("integerValue")?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state().calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn begins(&self) -> Vec<Json> {
        self.state().begins.clone()
    }

    pub fn commits(&self) -> Vec<Json> {
        self.state().commits.clone()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    pub fn open_transactions(&self) -> usize {
        self.state().transactions.values().filter(|t| t.open).count()
    }

    // ---- injection ----

    /// The next `n` transactional commits fail with 409 ABORTED
    pub fn abort_next_commits(&self, n: u32) {
        self.state().abort_commits = n;
    }

    /// The next `n` transactional reads fail with 409 ABORTED
    pub fn abort_next_reads(&self, n: u32) {
        self.state().abort_reads = n;
    }

    /// The next commit fails with the given status and error code
    pub fn fail_next_commit(&self, status: u16, code: &str) {
        self.state().fail_commit = Some((
            status,
            json!({"error": {"code": status, "status": code, "message": "injected"}}),
        ));
    }

    pub fn fail_rollbacks(&self) {
        self.state().fail_rollback = true;
    }

    /// Commits never answer
    pub fn hang_commits(&self) {
        self.state().hang_commits = true;
    }

    /// Fire `signal` once a commit has been applied, before its response
    /// reaches the client
    pub fn cancel_on_commit(&self, signal: CancelSignal) {
        self.state().cancel_on_commit = Some(signal);
    }

    // ---- request handling ----

    fn handle(&self, request: HttpRequest) -> HttpResponse {
        let mut state = self.state();
        state.requests.push(request.clone());

        if request.bearer.as_deref() != Some(TOKEN) {
            return error(401, "UNAUTHENTICATED", "missing bearer token");
        }

        let Some(path) = request.url.strip_prefix(&format!("{}/", BASE_URL)) else {
            return error(404, "NOT_FOUND", "unknown url");
        };
        let path = percent_decode(path);
        let body = request.json_body().cloned().unwrap_or(Json::Null);

        let (resource, action) = match path.rsplit_once(':') {
            Some((resource, action)) => (resource.to_string(), action.to_string()),
            None => (path.clone(), "get".to_string()),
        };
        *state.calls.entry(action.clone()).or_insert(0) += 1;

        match action.as_str() {
            "get" => get(&mut state, &resource, request.query_param("transaction")),
            "batchGet" => batch_get(&mut state, &body),
            "beginTransaction" => begin(&mut state, &body),
            "commit" => commit(&mut state, &body),
            "rollback" => rollback(&mut state, &body),
            "runQuery" => run_query(&mut state, &resource, &body),
            other => error(400, "INVALID_ARGUMENT", &format!("unknown action {}", other)),
        }
    }
}

impl Transport for FakeFirestore {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let hang = request.url.ends_with(":commit") && self.state().hang_commits;
            if hang {
                self.state().requests.push(request.clone());
                std::future::pending::<()>().await;
            }
            // Yield so concurrent reads interleave like real network calls
            tokio::task::yield_now().await;
            let is_commit = request.url.ends_with(":commit");
            let response = self.handle(request);

            let cancel = self.state().cancel_on_commit.clone();
            if let (true, Some(signal)) = (is_commit, cancel) {
                signal.cancel();
                tokio::task::yield_now().await;
            }
            Ok(response)
        })
    }
}

/// Route the crate's tracing output to the test harness; safe to call
/// from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A client bound to `fake`
pub fn client(fake: &Arc<FakeFirestore>) -> Firestore {
    client_with(fake, ClientConfig::new(PROJECT))
}

pub fn client_with(fake: &Arc<FakeFirestore>, mut config: ClientConfig) -> Firestore {
    config.base_url = Some(BASE_URL.to_string());
    Firestore::new(config, Arc::new(StaticTokenProvider::new(TOKEN)), fake.clone()).unwrap()
}

// =============================================================================
// Endpoints
// =============================================================================

fn get(state: &mut FakeState, name: &str, tx: Option<&str>) -> HttpResponse {
    if tx.is_some() && state.abort_reads > 0 {
        state.abort_reads -= 1;
        return error(409, "ABORTED", "injected read contention");
    }
    if let Err(resp) = state.record_read(tx, name) {
        return resp;
    }
    match state.docs.get(name) {
        Some(doc) => HttpResponse::new(200, doc.to_json(name)),
        None => error(404, "NOT_FOUND", &format!("no document {}", name)),
    }
}

fn batch_get(state: &mut FakeState, body: &Json) -> HttpResponse {
    let tx = body["transaction"].as_str().map(str::to_string);
    let names: Vec<String> = body["documents"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let read_time = state.now();
    let mut items = Vec::new();
    // Reverse order: callers must not rely on response order
    for name in names.iter().rev() {
        if let Err(resp) = state.record_read(tx.as_deref(), name) {
            return resp;
        }
        let item = match state.docs.get(name) {
            Some(doc) => json!({"found": doc.to_json(name), "readTime": read_time}),
            None => json!({"missing": name, "readTime": read_time}),
        };
        items.push(item);
    }
    HttpResponse::new(200, Json::Array(items))
}

fn begin(state: &mut FakeState, body: &Json) -> HttpResponse {
    state.next_tx += 1;
    let id = format!("dHgt{}", state.next_tx);
    state.begins.push(body.clone());
    state.transactions.insert(
        id.clone(),
        FakeTx {
            read_only: body["options"].get("readOnly").is_some(),
            reads: HashMap::new(),
            open: true,
        },
    );
    HttpResponse::new(200, json!({ "transaction": id }))
}

fn rollback(state: &mut FakeState, body: &Json) -> HttpResponse {
    if state.fail_rollback {
        return error(503, "UNAVAILABLE", "injected rollback failure");
    }
    let id = body["transaction"].as_str().unwrap_or_default();
    match state.transactions.get_mut(id) {
        Some(tx) if tx.open => {
            tx.open = false;
            HttpResponse::new(200, json!({}))
        }
        _ => error(400, "INVALID_ARGUMENT", "transaction is not open"),
    }
}

fn commit(state: &mut FakeState, body: &Json) -> HttpResponse {
    state.commits.push(body.clone());

    if let Some((status, err)) = state.fail_commit.take() {
        if let Some(id) = body["transaction"].as_str() {
            if let Some(tx) = state.transactions.get_mut(id) {
                tx.open = false;
            }
        }
        return HttpResponse::new(status, err);
    }

    let writes = body["writes"].as_array().cloned().unwrap_or_default();

    if let Some(id) = body["transaction"].as_str() {
        let Some(tx) = state.transactions.get_mut(id) else {
            return error(400, "INVALID_ARGUMENT", "unknown transaction");
        };
        if !tx.open {
            return error(400, "INVALID_ARGUMENT", "transaction is not open");
        }
        tx.open = false;
        if tx.read_only && !writes.is_empty() {
            return error(400, "INVALID_ARGUMENT", "writes in read-only transaction");
        }
        let reads: Vec<(String, u64)> = tx.reads.iter().map(|(k, v)| (k.clone(), *v)).collect();

        if state.abort_commits > 0 {
            state.abort_commits -= 1;
            return error(409, "ABORTED", "injected commit contention");
        }
        if reads.iter().any(|(name, seen)| state.version_of(name) != *seen) {
            return error(409, "ABORTED", "Too much contention on these documents");
        }
    }

    let (version, now) = state.tick();
    let mut docs = state.docs.clone();
    let mut results = Vec::new();
    for write in &writes {
        match apply_write(&mut docs, write, version, &now) {
            Ok(result) => results.push(result),
            Err(resp) => return resp,
        }
    }
    state.docs = docs;

    HttpResponse::new(200, json!({"writeResults": results, "commitTime": now}))
}

fn apply_write(
    docs: &mut BTreeMap<String, StoredDoc>,
    write: &Json,
    version: u64,
    now: &str,
) -> Result<Json, HttpResponse> {
    let name = write["update"]["name"]
        .as_str()
        .or_else(|| write["delete"].as_str())
        .unwrap_or_default()
        .to_string();
    let existing = docs.get(&name).cloned();

    if let Some(pre) = write.get("currentDocument") {
        if let Some(must_exist) = pre.get("exists").and_then(Json::as_bool) {
            match (must_exist, &existing) {
                (true, None) => return Err(error(404, "NOT_FOUND", &format!("no document {}", name))),
                (false, Some(_)) => {
                    return Err(error(409, "ALREADY_EXISTS", &format!("document exists {}", name)))
                }
                _ => {}
            }
        }
        if let Some(expected) = pre.get("updateTime").and_then(Json::as_str) {
            let matches = existing.as_ref().map(|d| same_instant(&d.update_time, expected));
            if matches != Some(true) {
                return Err(error(400, "FAILED_PRECONDITION", "update time mismatch"));
            }
        }
    }

    if write.get("delete").is_some() {
        docs.remove(&name);
        return Ok(json!({}));
    }

    let update = &write["update"];
    let incoming = update["fields"].as_object().cloned().unwrap_or_default();
    let mut fields = match write.get("updateMask") {
        None => incoming.clone(),
        Some(mask) => {
            let mut fields = existing.as_ref().map(|d| d.fields.clone()).unwrap_or_default();
            for path in mask["fieldPaths"].as_array().into_iter().flatten() {
                let segments = split_field_path(path.as_str().unwrap_or_default());
                match lookup(&incoming, &segments) {
                    Some(value) => set_path(&mut fields, &segments, value.clone()),
                    None => remove_path(&mut fields, &segments),
                }
            }
            fields
        }
    };

    let mut transform_results = Vec::new();
    for transform in write["updateTransforms"].as_array().into_iter().flatten() {
        let segments = split_field_path(transform["fieldPath"].as_str().unwrap_or_default());
        let current = lookup(&fields, &segments).cloned();
        let next = if transform.get("setToServerValue").is_some() {
            json!({ "timestampValue": now })
        } else if let Some(by) = transform.get("increment") {
            increment(current.as_ref(), by)
        } else if let Some(values) = transform.get("appendMissingElements") {
            let mut items = array_items(current.as_ref());
            for v in values["values"].as_array().into_iter().flatten() {
                if !items.contains(v) {
                    items.push(v.clone());
                }
            }
            json!({ "arrayValue": { "values": items } })
        } else if let Some(values) = transform.get("removeAllFromArray") {
            let remove = values["values"].as_array().cloned().unwrap_or_default();
            let items: Vec<Json> = array_items(current.as_ref())
                .into_iter()
                .filter(|v| !remove.contains(v))
                .collect();
            json!({ "arrayValue": { "values": items } })
        } else {
            return Err(error(400, "INVALID_ARGUMENT", "unknown transform"));
        };
        transform_results.push(next.clone());
        set_path(&mut fields, &segments, next);
    }

    let create_time = existing
        .map(|d| d.create_time)
        .unwrap_or_else(|| now.to_string());
    docs.insert(
        name,
        StoredDoc {
            fields,
            create_time,
            update_time: now.to_string(),
            version,
        },
    );
    Ok(json!({ "updateTime": now, "transformResults": transform_results }))
}

fn run_query(state: &mut FakeState, parent: &str, body: &Json) -> HttpResponse {
    let tx = body["transaction"].as_str().map(str::to_string);
    let query = &body["structuredQuery"];
    let collection = query["from"][0]["collectionId"].as_str().unwrap_or_default();
    let prefix = format!("{}/{}/", parent, collection);

    let mut matches: Vec<(String, StoredDoc)> = state
        .docs
        .iter()
        .filter(|(name, _)| {
            name.strip_prefix(&prefix)
                .map(|rest| !rest.contains('/'))
                .unwrap_or(false)
        })
        .filter(|(_, doc)| query.get("where").map_or(true, |f| eval_filter(f, &doc.fields)))
        .map(|(name, doc)| (name.clone(), doc.clone()))
        .collect();

    if let Some(order) = query["orderBy"].as_array().and_then(|o| o.first()) {
        let segments = split_field_path(order["field"]["fieldPath"].as_str().unwrap_or_default());
        let descending = order["direction"] == json!("DESCENDING");
        matches.sort_by(|(_, a), (_, b)| {
            let ord = match (lookup(&a.fields, &segments), lookup(&b.fields, &segments)) {
                (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
    if let Some(limit) = query["limit"].as_u64() {
        matches.truncate(limit as usize);
    }

    let read_time = state.now();
    let mut rows = Vec::new();
    for (name, doc) in &matches {
        if let Err(resp) = state.record_read(tx.as_deref(), name) {
            return resp;
        }
        rows.push(json!({"document": doc.to_json(name), "readTime": read_time}));
    }
    if rows.is_empty() {
        rows.push(json!({ "readTime": read_time }));
    }
    HttpResponse::new(200, Json::Array(rows))
}

// =============================================================================
// Value helpers
// =============================================================================

fn same_instant(a: &str, b: &str) -> bool {
    match (
        chrono::DateTime::parse_from_rfc3339(a),
        chrono::DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

fn split_field_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in path.chars() {
        match c {
            '`' => quoted = !quoted,
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    segments
}

fn lookup<'a>(fields: &'a Map<String, Json>, segments: &[String]) -> Option<&'a Json> {
    let (first, rest) = segments.split_first()?;
    let mut value = fields.get(first)?;
    for segment in rest {
        value = value.get("mapValue")?.get("fields")?.get(segment)?;
    }
    Some(value)
}

fn set_path(fields: &mut Map<String, Json>, segments: &[String], value: Json) {
    match segments {
        [] => {}
        [last] => {
            fields.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let entry = fields
                .entry(first.clone())
                .or_insert_with(|| json!({"mapValue": {"fields": {}}}));
            if entry.get("mapValue").is_none() {
                *entry = json!({"mapValue": {"fields": {}}});
            }
            if entry["mapValue"].get("fields").is_none() {
                entry["mapValue"]["fields"] = json!({});
            }
            if let Some(inner) = entry["mapValue"]["fields"].as_object_mut() {
                set_path(inner, rest, value);
            }
        }
    }
}

fn remove_path(fields: &mut Map<String, Json>, segments: &[String]) {
    match segments {
        [] => {}
        [last] => {
            fields.remove(last);
        }
        [first, rest @ ..] => {
            if let Some(inner) = fields
                .get_mut(first)
                .and_then(|v| v.get_mut("mapValue"))
                .and_then(|v| v.get_mut("fields"))
                .and_then(Json::as_object_mut)
            {
                remove_path(inner, rest);
            }
        }
    }
}

fn int_of(v: &Json) -> Option<i64> {
    v.get("integerValue")?.as_str()?.parse().ok()
}

fn number_of(v: &Json) -> Option<f64> {
    int_of(v)
        .map(|i| i as f64)
        .or_else(|| v.get("doubleValue").and_then(Json::as_f64))
}

fn increment(current: Option<&Json>, by: &Json) -> Json {
    let base = current.cloned().unwrap_or_else(|| json!({"integerValue": "0"}));
    match (int_of(&base), int_of(by)) {
        (Some(a), Some(b)) => json!({ "integerValue": (a + b).to_string() }),
        _ => json!({
            "doubleValue": number_of(&base).unwrap_or(0.0) + number_of(by).unwrap_or(0.0)
        }),
    }
}

fn array_items(value: Option<&Json>) -> Vec<Json> {
    value
        .and_then(|v| v.get("arrayValue"))
        .and_then(|a| a.get("values"))
        .and_then(Json::as_array)
        .cloned()
        .unwrap_or_default()
}

fn compare(a: &Json, b: &Json) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (number_of(a), number_of(b)) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (
        a.get("stringValue").and_then(Json::as_str),
        b.get("stringValue").and_then(Json::as_str),
    ) {
        return Some(x.cmp(y));
    }
    if let (Some(x), Some(y)) = (
        a.get("booleanValue").and_then(Json::as_bool),
        b.get("booleanValue").and_then(Json::as_bool),
    ) {
        return Some(x.cmp(&y));
    }
    (a == b).then_some(Ordering::Equal)
}

fn eval_filter(filter: &Json, fields: &Map<String, Json>) -> bool {
    if let Some(composite) = filter.get("compositeFilter") {
        return composite["filters"]
            .as_array()
            .map(|fs| fs.iter().all(|f| eval_filter(f, fields)))
            .unwrap_or(true);
    }
    if let Some(unary) = filter.get("unaryFilter") {
        let segments = split_field_path(unary["field"]["fieldPath"].as_str().unwrap_or_default());
        let value = lookup(fields, &segments);
        let is_null = value.map_or(false, |v| v.get("nullValue").is_some());
        let is_nan = value
            .and_then(|v| v.get("doubleValue"))
            .map_or(false, |d| d.as_str() == Some("NaN"));
        return match unary["op"].as_str().unwrap_or_default() {
            "IS_NULL" => is_null,
            "IS_NOT_NULL" => value.is_some() && !is_null,
            "IS_NAN" => is_nan,
            "IS_NOT_NAN" => value.is_some() && !is_nan,
            _ => false,
        };
    }
    let f = &filter["fieldFilter"];
    let segments = split_field_path(f["field"]["fieldPath"].as_str().unwrap_or_default());
    let Some(actual) = lookup(fields, &segments) else {
        return false;
    };
    let expected = &f["value"];
    let ord = compare(actual, expected);
    let candidates = array_items(Some(expected));
    let contains = |v: &Json| candidates.iter().any(|c| compare(v, c) == Some(Ordering::Equal));

    match f["op"].as_str().unwrap_or_default() {
        "EQUAL" => ord == Some(Ordering::Equal),
        "NOT_EQUAL" => ord != Some(Ordering::Equal),
        "LESS_THAN" => ord == Some(Ordering::Less),
        "LESS_THAN_OR_EQUAL" => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        "GREATER_THAN" => ord == Some(Ordering::Greater),
        "GREATER_THAN_OR_EQUAL" => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        "ARRAY_CONTAINS" => array_items(Some(actual))
            .iter()
            .any(|v| compare(v, expected) == Some(Ordering::Equal)),
        "ARRAY_CONTAINS_ANY" => array_items(Some(actual)).iter().any(|v| contains(v)),
        "IN" => contains(actual),
        "NOT_IN" => !contains(actual),
        _ => false,
    }
}
