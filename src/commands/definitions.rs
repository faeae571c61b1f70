//! Command definitions for declarative command metadata.
//!
//! Catalog of the server commands the client knows about. Used for the REPL
//! `help` output, per-command syntax lookup and prefix completion. Commands
//! missing from the catalog can still be executed.

/// Definition of a server command.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Command name as sent to the server (upper case).
    pub name: &'static str,
    /// Argument syntax, without the command name.
    pub args: &'static str,
    /// Short description shown in help.
    pub description: &'static str,
    /// Category for grouping in help.
    pub category: CommandCategory,
}

impl CommandDef {
    /// Returns the full usage line, e.g. `GET key`.
    pub fn usage(&self) -> String {
        if self.args.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {}", self.name, self.args)
        }
    }
}

/// Category for grouping commands in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    Keys,
    Hashes,
    Lists,
    Sets,
    SortedSets,
    Streams,
    PubSub,
    Transactions,
    Server,
    /// Ferrite extensions (vector search, time series, documents).
    Extensions,
}

impl CommandCategory {
    /// All categories in help display order.
    pub const ALL: [CommandCategory; 10] = [
        Self::Keys,
        Self::Hashes,
        Self::Lists,
        Self::Sets,
        Self::SortedSets,
        Self::Streams,
        Self::PubSub,
        Self::Transactions,
        Self::Server,
        Self::Extensions,
    ];

    /// Returns the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Keys => "Keys and strings",
            Self::Hashes => "Hashes",
            Self::Lists => "Lists",
            Self::Sets => "Sets",
            Self::SortedSets => "Sorted sets",
            Self::Streams => "Streams",
            Self::PubSub => "Pub/Sub",
            Self::Transactions => "Transactions",
            Self::Server => "Server",
            Self::Extensions => "Ferrite extensions",
        }
    }
}

macro_rules! def {
    ($name:literal, $args:literal, $desc:literal, $cat:ident) => {
        CommandDef {
            name: $name,
            args: $args,
            description: $desc,
            category: CommandCategory::$cat,
        }
    };
}

/// All command definitions.
pub static COMMANDS: &[CommandDef] = &[
    def!("GET", "key", "Get the value of a key. Returns nil if the key does not exist.", Keys),
    def!(
        "SET",
        "key value [EX seconds] [PX ms] [NX|XX]",
        "Set key to hold the string value. EX/PX set an expiry, NX/XX make it conditional.",
        Keys
    ),
    def!("DEL", "key [key ...]", "Remove the specified keys. Returns the number removed.", Keys),
    def!("EXISTS", "key [key ...]", "Count how many of the given keys exist.", Keys),
    def!("EXPIRE", "key seconds", "Set a key's time to live in seconds.", Keys),
    def!("TTL", "key", "Get the time to live of a key in seconds.", Keys),
    def!("TYPE", "key", "Get the type of the value stored at a key.", Keys),
    def!("INCR", "key", "Increment the integer value of a key by one.", Keys),
    def!("DECR", "key", "Decrement the integer value of a key by one.", Keys),
    def!(
        "SCAN",
        "cursor [MATCH pattern] [COUNT count]",
        "Incrementally iterate the keyspace.",
        Keys
    ),
    def!(
        "HSET",
        "key field value [field value ...]",
        "Set fields in the hash stored at key. Returns the number of fields added.",
        Hashes
    ),
    def!("HGET", "key field", "Get the value of a hash field.", Hashes),
    def!("HGETALL", "key", "Get all fields and values of a hash.", Hashes),
    def!(
        "LPUSH",
        "key value [value ...]",
        "Insert values at the head of a list. Returns the new length.",
        Lists
    ),
    def!("RPUSH", "key value [value ...]", "Append values to the tail of a list.", Lists),
    def!("LRANGE", "key start stop", "Get a range of elements from a list.", Lists),
    def!("SADD", "key member [member ...]", "Add members to a set.", Sets),
    def!("SMEMBERS", "key", "Get all members of a set.", Sets),
    def!(
        "ZADD",
        "key [NX|XX] [GT|LT] [CH] score member [score member ...]",
        "Add members with scores to a sorted set. Returns the number added.",
        SortedSets
    ),
    def!(
        "ZRANGE",
        "key start stop [WITHSCORES]",
        "Get a range of members from a sorted set by index.",
        SortedSets
    ),
    def!(
        "XADD",
        "key [NOMKSTREAM] [MAXLEN|MINID [=|~] threshold] *|id field value [field value ...]",
        "Append an entry to a stream. Returns the ID of the new entry.",
        Streams
    ),
    def!(
        "XREAD",
        "[COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]",
        "Read entries from one or more streams.",
        Streams
    ),
    def!("PUBLISH", "channel message", "Publish a message to a channel.", PubSub),
    def!("SUBSCRIBE", "channel [channel ...]", "Subscribe to channels.", PubSub),
    def!("MULTI", "", "Start a transaction.", Transactions),
    def!("EXEC", "", "Execute all queued commands of a transaction.", Transactions),
    def!("PING", "[message]", "Ping the server.", Server),
    def!("INFO", "[section]", "Get server information and statistics.", Server),
    def!("DBSIZE", "", "Return the number of keys in the selected database.", Server),
    def!("FLUSHDB", "[ASYNC]", "Remove all keys from the selected database.", Server),
    def!(
        "VECTOR.SEARCH",
        "index vector TOP_K n",
        "Vector similarity search.",
        Extensions
    ),
    def!("TS.ADD", "key timestamp value", "Add a time series sample.", Extensions),
    def!("DOC.INSERT", "collection id document", "Insert a document.", Extensions),
];

/// Finds a command definition by name (case-insensitive).
pub fn find_command(name: &str) -> Option<&'static CommandDef> {
    let name_upper = name.to_uppercase();
    COMMANDS.iter().find(|c| c.name == name_upper)
}

/// Returns commands whose name starts with the given prefix (case-insensitive).
pub fn complete(prefix: &str) -> impl Iterator<Item = &'static CommandDef> {
    let prefix_upper = prefix.to_uppercase();
    COMMANDS
        .iter()
        .filter(move |c| c.name.starts_with(&prefix_upper))
}

/// Generates help text from command definitions.
pub fn generate_help_text() -> String {
    let category_blocks = CommandCategory::ALL
        .iter()
        .filter_map(|category| {
            let cmds: Vec<_> = COMMANDS
                .iter()
                .filter(|c| c.category == *category)
                .collect();

            if cmds.is_empty() {
                return None;
            }

            let command_lines = cmds
                .iter()
                .map(|cmd| format!("  {:<14} - {}\n", cmd.name, cmd.description))
                .collect::<Vec<_>>()
                .join("");

            Some(format!("{}:\n{}\n", category.display_name(), command_lines))
        })
        .collect::<Vec<_>>()
        .join("");

    let session_commands = [
        "Session commands:",
        "  help [COMMAND]   - Show this help, or the syntax of one command",
        "  browse           - List namespaces and keys",
        "  expand <prefix>  - List the keys of one namespace",
        "  inspect <key>    - Show a key's type, TTL and value",
        "  info [section]   - Show server telemetry",
        "  format [mode]    - Show or set the output format (json, table, raw)",
        "  connect [target] - Connect to a saved connection or URL, or reconnect",
        "  disconnect       - Close the current connection",
        "  connections      - List saved connections",
        "  quit, exit       - Leave the session",
    ]
    .join("\n");

    format!("{}{}", category_blocks, session_commands)
}

/// Describes a single command for `help <COMMAND>`.
pub fn describe(cmd: &CommandDef) -> String {
    format!("{}\n\n{}", cmd.usage(), cmd.description)
}
