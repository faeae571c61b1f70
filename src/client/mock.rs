//! Mock Ferrite clients for testing.
//!
//! Provides an in-memory keyspace for headless testing, plus a client whose
//! every operation fails.

use super::{FerriteClient, KeyType, Reply, ScanCursor, ScanPage, Ttl};
use crate::error::{LensError, Result};
use crate::keyspace::pattern::glob_to_regex;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// A value stored in the mock keyspace.
#[derive(Debug, Clone)]
enum MockValue {
    String(String),
    List(Vec<String>),
    Hash(Vec<(String, String)>),
    Set(BTreeSet<String>),
    /// Kept ordered by (score, member).
    SortedSet(Vec<(f64, String)>),
    Stream(Vec<(String, Vec<(String, String)>)>),
    /// A type this mock cannot read, reported by `TYPE` under the given tag.
    Opaque(String),
}

impl MockValue {
    fn type_tag(&self) -> &str {
        match self {
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Hash(_) => "hash",
            Self::Set(_) => "set",
            Self::SortedSet(_) => "zset",
            Self::Stream(_) => "stream",
            Self::Opaque(tag) => tag,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: MockValue,
    ttl: Option<u64>,
}

impl Entry {
    fn new(value: MockValue) -> Self {
        Self { value, ttl: None }
    }
}

/// A mock client backed by an ordered in-memory keyspace.
///
/// `SCAN` pages through the matching keys in lexicographic order using the
/// offset as cursor, so a keyspace of `n` matches and batch size `b` takes
/// exactly `ceil(n / b)` calls to exhaust.
pub struct MockFerriteClient {
    keys: Mutex<BTreeMap<String, Entry>>,
    calls: Mutex<Vec<Vec<String>>>,
    scan_calls: AtomicUsize,
    fail_scan_at: Option<usize>,
    server_version: String,
    closed: Arc<AtomicBool>,
}

impl MockFerriteClient {
    /// Creates a mock client with an empty keyspace.
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            scan_calls: AtomicUsize::new(0),
            fail_scan_at: None,
            server_version: "0.3.1".to_string(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adds string keys with placeholder values.
    pub fn with_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut data = self.data();
            for key in keys {
                let key = key.into();
                let value = MockValue::String(format!("value of {key}"));
                data.insert(key, Entry::new(value));
            }
        }
        self
    }

    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.insert(key, MockValue::String(value.to_string()))
    }

    pub fn with_list(self, key: &str, items: &[&str]) -> Self {
        self.insert(key, MockValue::List(owned(items)))
    }

    pub fn with_hash(self, key: &str, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect();
        self.insert(key, MockValue::Hash(fields))
    }

    pub fn with_set(self, key: &str, members: &[&str]) -> Self {
        self.insert(key, MockValue::Set(owned(members).into_iter().collect()))
    }

    pub fn with_zset(self, key: &str, members: &[(&str, f64)]) -> Self {
        let mut entries: Vec<(f64, String)> =
            members.iter().map(|(m, s)| (*s, m.to_string())).collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.insert(key, MockValue::SortedSet(entries))
    }

    pub fn with_stream(self, key: &str, entries: &[(&str, &[(&str, &str)])]) -> Self {
        let entries = entries
            .iter()
            .map(|(id, fields)| {
                let fields = fields
                    .iter()
                    .map(|(f, v)| (f.to_string(), v.to_string()))
                    .collect();
                (id.to_string(), fields)
            })
            .collect();
        self.insert(key, MockValue::Stream(entries))
    }

    /// Adds a key of a type the client has no reader for.
    pub fn with_opaque(self, key: &str, type_tag: &str) -> Self {
        self.insert(key, MockValue::Opaque(type_tag.to_string()))
    }

    /// Sets the time-to-live of an existing key.
    pub fn with_ttl(self, key: &str, seconds: u64) -> Self {
        if let Some(entry) = self.data().get_mut(key) {
            entry.ttl = Some(seconds);
        }
        self
    }

    /// Makes the `n`th scan call (1-based) and every later one fail.
    pub fn fail_scan_at(mut self, n: usize) -> Self {
        self.fail_scan_at = Some(n);
        self
    }

    /// Sets the version reported under `ferrite_version` in `INFO server`.
    pub fn with_server_version(mut self, version: &str) -> Self {
        self.server_version = version.to_string();
        self
    }

    /// Number of `scan` calls made so far.
    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    /// Every command passed to `call`, name first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// A handle that flips to true once `close` has been called.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn insert(self, key: &str, value: MockValue) -> Self {
        self.data().insert(key.to_string(), Entry::new(value));
        self
    }

    fn data(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        lock(&self.keys)
    }

    fn info_text(&self) -> String {
        let data = self.data();
        let expires = data.values().filter(|e| e.ttl.is_some()).count();
        format!(
            "# Server\r\nferrite_version:{}\r\nredis_mode:standalone\r\ntcp_port:6379\r\n\
             uptime_in_seconds:90061\r\n\r\n\
             # Clients\r\nconnected_clients:3\r\nblocked_clients:0\r\n\r\n\
             # Memory\r\nused_memory:2097152\r\nused_memory_peak:3221225472\r\n\
             maxmemory_policy:noeviction\r\n\r\n\
             # Persistence\r\naof_enabled:1\r\nrdb_changes_since_last_save:12\r\n\r\n\
             # Stats\r\ntotal_connections_received:42\r\ntotal_commands_processed:1024\r\n\
             keyspace_hits:900\r\nkeyspace_misses:124\r\n\r\n\
             # Keyspace\r\ndb0:keys={},expires={},avg_ttl=0\r\n",
            self.server_version,
            data.len(),
            expires
        )
    }

    fn dispatch(&self, command: &str, args: &[String]) -> Result<Reply> {
        let mut data = self.data();

        match command {
            "PING" => Ok(match args.first() {
                Some(message) => Reply::from(message.as_str()),
                None => Reply::Status("PONG".to_string()),
            }),
            "DBSIZE" => Ok(Reply::Integer(data.len() as i64)),
            "FLUSHDB" => {
                data.clear();
                Ok(ok())
            }
            "GET" => match data.get(arg(command, args, 0)?) {
                None => Ok(Reply::Nil),
                Some(Entry { value: MockValue::String(s), .. }) => Ok(Reply::from(s.as_str())),
                Some(_) => Err(LensError::command(WRONGTYPE)),
            },
            "SET" => {
                let key = arg(command, args, 0)?;
                let value = arg(command, args, 1)?;
                data.insert(key.to_string(), Entry::new(MockValue::String(value.to_string())));
                Ok(ok())
            }
            "INCR" => {
                let key = arg(command, args, 0)?;
                let entry = data
                    .entry(key.to_string())
                    .or_insert_with(|| Entry::new(MockValue::String("0".to_string())));
                match &mut entry.value {
                    MockValue::String(s) => {
                        let n = parse_int(s)? + 1;
                        *s = n.to_string();
                        Ok(Reply::Integer(n))
                    }
                    _ => Err(LensError::command(WRONGTYPE)),
                }
            }
            "HGETALL" => match data.get(arg(command, args, 0)?) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry { value: MockValue::Hash(fields), .. }) => Ok(Reply::from(
                    fields
                        .iter()
                        .flat_map(|(f, v)| [f.clone(), v.clone()])
                        .collect::<Vec<_>>(),
                )),
                Some(_) => Err(LensError::command(WRONGTYPE)),
            },
            "LPUSH" | "RPUSH" => {
                let key = arg(command, args, 0)?;
                arg(command, args, 1)?;
                let entry = data
                    .entry(key.to_string())
                    .or_insert_with(|| Entry::new(MockValue::List(Vec::new())));
                let MockValue::List(items) = &mut entry.value else {
                    return Err(LensError::command(WRONGTYPE));
                };
                for value in &args[1..] {
                    if command == "LPUSH" {
                        items.insert(0, value.clone());
                    } else {
                        items.push(value.clone());
                    }
                }
                Ok(Reply::Integer(items.len() as i64))
            }
            "LRANGE" => {
                let start = parse_int(arg(command, args, 1)?)?;
                let stop = parse_int(arg(command, args, 2)?)?;
                match data.get(arg(command, args, 0)?) {
                    None => Ok(Reply::Array(Vec::new())),
                    Some(Entry { value: MockValue::List(items), .. }) => {
                        Ok(Reply::from(slice(items, start, stop).to_vec()))
                    }
                    Some(_) => Err(LensError::command(WRONGTYPE)),
                }
            }
            "SADD" => {
                let key = arg(command, args, 0)?;
                arg(command, args, 1)?;
                let entry = data
                    .entry(key.to_string())
                    .or_insert_with(|| Entry::new(MockValue::Set(BTreeSet::new())));
                let MockValue::Set(members) = &mut entry.value else {
                    return Err(LensError::command(WRONGTYPE));
                };
                let added = args[1..].iter().filter(|m| members.insert((*m).clone())).count();
                Ok(Reply::Integer(added as i64))
            }
            "SMEMBERS" => match data.get(arg(command, args, 0)?) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry { value: MockValue::Set(members), .. }) => {
                    Ok(Reply::from(members.iter().cloned().collect::<Vec<_>>()))
                }
                Some(_) => Err(LensError::command(WRONGTYPE)),
            },
            "ZRANGE" => {
                let start = parse_int(arg(command, args, 1)?)?;
                let stop = parse_int(arg(command, args, 2)?)?;
                let with_scores = args
                    .get(3)
                    .is_some_and(|s| s.eq_ignore_ascii_case("WITHSCORES"));
                match data.get(arg(command, args, 0)?) {
                    None => Ok(Reply::Array(Vec::new())),
                    Some(Entry { value: MockValue::SortedSet(members), .. }) => {
                        let mut out = Vec::new();
                        for (score, member) in slice(members, start, stop) {
                            out.push(member.clone());
                            if with_scores {
                                out.push(score.to_string());
                            }
                        }
                        Ok(Reply::from(out))
                    }
                    Some(_) => Err(LensError::command(WRONGTYPE)),
                }
            }
            "XRANGE" => {
                let count = match args.get(3) {
                    Some(option) if option.eq_ignore_ascii_case("COUNT") => {
                        parse_int(arg(command, args, 4)?)?.max(0) as usize
                    }
                    Some(_) => return Err(LensError::command("ERR syntax error")),
                    None => usize::MAX,
                };
                match data.get(arg(command, args, 0)?) {
                    None => Ok(Reply::Array(Vec::new())),
                    Some(Entry { value: MockValue::Stream(entries), .. }) => Ok(Reply::Array(
                        entries
                            .iter()
                            .take(count)
                            .map(|(id, fields)| {
                                let flat: Vec<String> = fields
                                    .iter()
                                    .flat_map(|(f, v)| [f.clone(), v.clone()])
                                    .collect();
                                Reply::Array(vec![Reply::from(id.as_str()), Reply::from(flat)])
                            })
                            .collect(),
                    )),
                    Some(_) => Err(LensError::command(WRONGTYPE)),
                }
            }
            _ => Err(LensError::command(format!(
                "ERR unknown command '{}', with args beginning with: {}",
                command,
                args.iter()
                    .map(|a| format!("'{a}'"))
                    .collect::<Vec<_>>()
                    .join(" ")
            ))),
        }
    }
}

impl Default for MockFerriteClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FerriteClient for MockFerriteClient {
    async fn call(&self, command: &str, args: &[String]) -> Result<Reply> {
        let command = command.to_uppercase();
        let mut entry = vec![command.clone()];
        entry.extend(args.iter().cloned());
        lock(&self.calls).push(entry);

        self.dispatch(&command, args)
    }

    async fn scan(&self, cursor: &ScanCursor, pattern: &str, count: usize) -> Result<ScanPage> {
        let call = self.scan_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_scan_at.is_some_and(|n| call >= n) {
            return Err(LensError::connection("Connection reset by peer"));
        }

        let offset: usize = cursor
            .as_str()
            .parse()
            .map_err(|_| LensError::command("ERR invalid cursor"))?;
        let matcher = glob_to_regex(pattern)
            .map_err(|e| LensError::command(format!("ERR invalid pattern: {e}")))?;

        let matching: Vec<String> = self
            .data()
            .keys()
            .filter(|k| matcher.is_match(k))
            .cloned()
            .collect();

        let count = count.max(1);
        let end = offset.saturating_add(count).min(matching.len());
        let keys = matching.get(offset..end).map(<[String]>::to_vec).unwrap_or_default();
        let next = if end >= matching.len() {
            ScanCursor::start()
        } else {
            ScanCursor::new(end.to_string())
        };

        Ok(ScanPage::new(next, keys))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        Ok(self
            .data()
            .get(key)
            .map(|e| KeyType::parse(e.value.type_tag()))
            .unwrap_or(KeyType::None))
    }

    async fn ttl(&self, key: &str) -> Result<Ttl> {
        Ok(match self.data().get(key) {
            None => Ttl::Expired,
            Some(Entry { ttl: None, .. }) => Ttl::Persistent,
            Some(Entry { ttl: Some(s), .. }) => Ttl::Seconds(*s),
        })
    }

    async fn info(&self, section: Option<&str>) -> Result<String> {
        Ok(select_info_section(&self.info_text(), section))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A client whose every operation fails with a connection error.
pub struct FailingFerriteClient {
    message: String,
}

impl FailingFerriteClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(LensError::connection(self.message.clone()))
    }
}

impl Default for FailingFerriteClient {
    fn default() -> Self {
        Self::new("Connection refused")
    }
}

#[async_trait]
impl FerriteClient for FailingFerriteClient {
    async fn call(&self, _command: &str, _args: &[String]) -> Result<Reply> {
        self.fail()
    }

    async fn scan(&self, _cursor: &ScanCursor, _pattern: &str, _count: usize) -> Result<ScanPage> {
        self.fail()
    }

    async fn key_type(&self, _key: &str) -> Result<KeyType> {
        self.fail()
    }

    async fn ttl(&self, _key: &str) -> Result<Ttl> {
        self.fail()
    }

    async fn info(&self, _section: Option<&str>) -> Result<String> {
        self.fail()
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn ok() -> Reply {
    Reply::Status("OK".to_string())
}

fn wrong_arity(command: &str) -> LensError {
    LensError::command(format!(
        "ERR wrong number of arguments for '{}' command",
        command.to_lowercase()
    ))
}

fn arg<'a>(command: &str, args: &'a [String], index: usize) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| wrong_arity(command))
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse()
        .map_err(|_| LensError::command("ERR value is not an integer or out of range"))
}

/// Applies `LRANGE`-style inclusive indexes, negatives counting from the end.
fn slice<T>(items: &[T], start: i64, stop: i64) -> &[T] {
    let len = items.len() as i64;
    let normalize = |i: i64| if i < 0 { len + i } else { i };
    let start = normalize(start).max(0);
    let stop = normalize(stop).min(len - 1);
    if start > stop || start >= len {
        return &[];
    }
    &items[start as usize..=stop as usize]
}

/// Returns one `# Section` block of `INFO` text, or all of it.
fn select_info_section(info: &str, section: Option<&str>) -> String {
    let whole = |s: &&str| matches!(s.to_lowercase().as_str(), "all" | "everything" | "default");
    let Some(section) = section.filter(|s| !whole(s)) else {
        return info.to_string();
    };

    info.split("\r\n\r\n")
        .find(|block| {
            block
                .lines()
                .next()
                .and_then(|header| header.strip_prefix("# "))
                .is_some_and(|name| name.eq_ignore_ascii_case(section))
        })
        .map(|block| format!("{}\r\n", block.trim_end()))
        .unwrap_or_default()
}
