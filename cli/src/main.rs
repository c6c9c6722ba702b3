mod config;
mod output;

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use invent_core::{
    InventoryNumberFormat, ItemFilter, ItemUpdate, ItemWithRealm, NewItem, NewLabel, NewRealm,
    Pagination, RealmFilter, RealmSelector, SortKey,
};
use invent_label::{LabelAttributes, LabelKind, LabelOutput, LabelRenderer};
use invent_sqlite::{DatabaseLocation, DeleteMode, InventoryStore, Migration, latest_version};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::{ItemRow, LineTemplate};

#[derive(Debug, Parser)]
#[command(name = "invent")]
#[command(version, about = "Track physical items, assign inventory numbers and print labels")]
struct Cli {
    /// Database connection string (e.g. sqlite://invent.db).
    #[arg(long, short = 'D', global = true, env = "INVENT_DATABASE")]
    database: Option<String>,
    /// YAML configuration file.
    #[arg(long, global = true, env = "INVENT_CONFIG")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or migrate the database schema.
    CreateDb(CreateDbArgs),
    /// Add a realm.
    AddRealm(AddRealmArgs),
    /// List realms.
    ListRealms(ListRealmsArgs),
    /// Add an item and assign its inventory number.
    AddItem(AddItemArgs),
    /// Change fields of an item.
    UpdateItem(UpdateItemArgs),
    /// List items.
    ListItems(ListItemsArgs),
    /// Show items in detail.
    ShowItem(ShowItemArgs),
    /// Deactivate or purge an item.
    DeleteItem(DeleteItemArgs),
    /// Render a label document.
    GenerateLabel(GenerateLabelArgs),
}

#[derive(Debug, Args)]
struct CreateDbArgs {
    /// Migrate to this schema version instead of the latest.
    #[arg(long)]
    target: Option<u32>,
    /// Only report the schema status.
    #[arg(long, conflicts_with = "target")]
    status: bool,
}

#[derive(Debug, Args)]
struct AddRealmArgs {
    /// Base URL that inventory numbers are joined onto in QR codes.
    #[arg(long, short = 'U')]
    url_base: Option<String>,
    /// Mark the realm as external; it is never picked as the default realm.
    #[arg(long)]
    external: bool,
    prefix: String,
    name: String,
}

#[derive(Debug, Args)]
struct ListRealmsArgs {
    /// Include internal realms (default).
    #[arg(long, overrides_with = "no_internal")]
    internal: bool,
    /// Exclude internal realms.
    #[arg(long, overrides_with = "internal")]
    no_internal: bool,
    /// Include external realms (default).
    #[arg(long, overrides_with = "no_external")]
    external: bool,
    /// Exclude external realms.
    #[arg(long, overrides_with = "external")]
    no_external: bool,
    /// Line template, e.g. "{{ id }} {{ prefix }} {{ name }}".
    #[arg(long)]
    format: Option<String>,
}

#[derive(Debug, Args)]
struct AddItemArgs {
    /// Explicit inventory number instead of a generated one.
    #[arg(long, short = 'I')]
    inventory_number: Option<String>,
    /// Realm prefix or id (default: the first internal realm).
    #[arg(long, short = 'R')]
    realm: Option<String>,
    #[arg(long, short = 'U')]
    resource_url: Option<String>,
    #[arg(long, short = 'o')]
    owner: Option<String>,
    /// Also render a label of this type for the new item.
    #[arg(long)]
    label_type: Option<LabelKind>,
    /// Label attribute (repeatable).
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"], requires = "label_type")]
    label_attribute: Vec<String>,
    /// Where to write the label ("-" for stdout, the default).
    #[arg(long, requires = "label_type")]
    label_output: Option<PathBuf>,
    title: String,
}

#[derive(Debug, Args)]
struct UpdateItemArgs {
    #[arg(long, short = 't')]
    title: Option<String>,
    #[arg(long, short = 'U')]
    resource_url: Option<String>,
    #[arg(long, short = 'o')]
    owner: Option<String>,
    #[arg(long, overrides_with = "inactive")]
    active: bool,
    #[arg(long, overrides_with = "active")]
    inactive: bool,
    #[arg(long, overrides_with = "unlabeled")]
    labeled: bool,
    #[arg(long, overrides_with = "labeled")]
    unlabeled: bool,
    /// Do not print the updated item.
    #[arg(long, short = 'q')]
    quiet: bool,
    inventory_number: String,
}

#[derive(Debug, Args)]
struct ListItemsArgs {
    /// Only items of this realm (prefix or id).
    #[arg(long, short = 'R')]
    realm: Option<String>,
    /// Maximum number of items; 0 or less lists everything.
    #[arg(long, short = 'l', allow_negative_numbers = true)]
    limit: Option<i64>,
    #[arg(long, short = 'o', default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,
    /// Field to sort by, descending.
    #[arg(long, short = 'S', default_value_t = SortKey::default())]
    sort_key: SortKey,
    #[arg(long)]
    owner: Option<String>,
    #[arg(long, overrides_with = "inactive")]
    active: bool,
    #[arg(long, overrides_with = "active")]
    inactive: bool,
    #[arg(long, overrides_with = "unlabeled")]
    labeled: bool,
    #[arg(long, overrides_with = "labeled")]
    unlabeled: bool,
    /// Line template, e.g. "{{ inventory_number }}\t{{ owner }}".
    #[arg(long, conflicts_with_all = ["csv", "json"])]
    format: Option<String>,
    #[arg(long, conflicts_with = "json")]
    csv: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShowItemArgs {
    #[arg(long, overrides_with = "hide_qrcode")]
    show_qrcode: bool,
    #[arg(long, overrides_with = "show_qrcode")]
    hide_qrcode: bool,
    #[arg(required = true)]
    inventory_numbers: Vec<String>,
}

#[derive(Debug, Args)]
struct DeleteItemArgs {
    /// Remove the item and its label records instead of deactivating it.
    #[arg(long)]
    purge: bool,
    inventory_number: String,
}

#[derive(Debug, Args)]
struct GenerateLabelArgs {
    /// Output file ("-" for stdout); a directory when several items are given.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    /// Label attribute (repeatable).
    #[arg(long, short = 'a', num_args = 2, value_names = ["KEY", "VALUE"])]
    attr: Vec<String>,
    /// Inventory number of an item to label (repeatable).
    #[arg(long, short = 'i')]
    item: Vec<String>,
    /// Read further inventory numbers from stdin, one per line.
    #[arg(long)]
    item_stdin: bool,
    /// Store a label record for every labeled item.
    #[arg(long)]
    record: bool,
    #[arg(value_name = "TYPE")]
    label_type: LabelKind,
}

/// Resolved settings shared by all commands.
struct Env {
    database: DatabaseLocation,
    config: Config,
    number_format: InventoryNumberFormat,
}

impl Env {
    fn new(cli_database: Option<String>, config_path: Option<&Path>) -> Result<Self, String> {
        let config = Config::load_optional(config_path).map_err(|e| e.to_string())?;
        let number_format = config.number_format().map_err(|e| e.to_string())?;
        let raw = cli_database.unwrap_or_else(|| config.database.clone());
        let database = raw
            .parse::<DatabaseLocation>()
            .map_err(|e| format!("Invalid database '{raw}': {e}"))?;
        debug!(%database, "resolved settings");
        Ok(Self {
            database,
            config,
            number_format,
        })
    }

    fn open(&self) -> Result<Connection, String> {
        self.database
            .open()
            .map_err(|e| format!("Failed to open database '{}': {e}", self.database))
    }

    /// Opens the database and checks that the schema is current.
    fn connect(&self) -> Result<Connection, String> {
        let migration = Migration::new(self.open()?)
            .map_err(|e| format!("Failed to initialize migration: {e}"))?;
        migration
            .ensure_current()
            .map_err(|e| format!("{e} (run `invent create-db` first)"))?;
        Ok(migration.into_connection())
    }

    fn store<'a>(&self, conn: &'a Connection) -> Result<InventoryStore<'a>, String> {
        Ok(InventoryStore::new(conn)
            .map_err(|e| format!("Failed to open store: {e}"))?
            .with_number_format(self.number_format.clone()))
    }

    fn renderer(&self) -> Result<LabelRenderer, String> {
        LabelRenderer::new(self.config.renderer.clone())
            .map_err(|e| format!("Failed to set up label renderer: {e}"))
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Env::new(cli.database, cli.config.as_deref()).and_then(|env| match cli.command {
        Command::CreateDb(args) => run_create_db(&env, args),
        Command::AddRealm(args) => run_add_realm(&env, args),
        Command::ListRealms(args) => run_list_realms(&env, args),
        Command::AddItem(args) => run_add_item(&env, args),
        Command::UpdateItem(args) => run_update_item(&env, args),
        Command::ListItems(args) => run_list_items(&env, args),
        Command::ShowItem(args) => run_show_item(&env, args),
        Command::DeleteItem(args) => run_delete_item(&env, args),
        Command::GenerateLabel(args) => run_generate_label(&env, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// create-db
// ---------------------------------------------------------------------------

fn run_create_db(env: &Env, args: CreateDbArgs) -> Result<(), String> {
    let mut migration = Migration::new(env.open()?)
        .map_err(|e| format!("Failed to initialize migration: {e}"))?;

    if args.status {
        let status = migration
            .status()
            .map_err(|e| format!("Failed to get migration status: {e}"))?;
        println!("Schema Status:");
        println!("  Database: {}", env.database);
        println!(
            "  Version: {} of {}{}",
            status.current_version,
            status.latest_version,
            if status.is_current() { " (current)" } else { "" }
        );
        if !status.pending.is_empty() {
            println!("  Pending: {}", status.pending.join(", "));
        }
        println!("  Realms: {}", status.realm_count);
        println!("  Items: {}", status.item_count);
        println!("  Labels: {}", status.label_count);
        return Ok(());
    }

    let target = args.target.unwrap_or_else(latest_version);
    let ran = migration
        .migrate_to(target)
        .map_err(|e| format!("Migration failed: {e}"))?;
    if ran.is_empty() {
        println!("Database is already at version {target}.");
    } else {
        println!(
            "Database migrated to version {target} ({}).",
            ran.join(", ")
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// realms
// ---------------------------------------------------------------------------

fn run_add_realm(env: &Env, args: AddRealmArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let mut realm = NewRealm::new(args.prefix, args.name);
    if let Some(url_base) = args.url_base {
        realm = realm.with_url_base(url_base);
    }
    if args.external {
        realm = realm.external();
    }
    let created = store
        .create_realm(&realm)
        .map_err(|e| format!("Failed to add realm: {e}"))?;
    println!("{}", output::realm_line(&created));
    Ok(())
}

fn run_list_realms(env: &Env, args: ListRealmsArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let filter = RealmFilter {
        internal: flag_pair(args.internal, args.no_internal).unwrap_or(true),
        external: flag_pair(args.external, args.no_external).unwrap_or(true),
    };
    let realms = store
        .list_realms(filter)
        .map_err(|e| format!("Failed to list realms: {e}"))?;

    let template = args.format.as_deref().map(LineTemplate::new).transpose()?;
    let mut stdout = std::io::stdout().lock();
    for realm in &realms {
        let line = match &template {
            Some(template) => template.render(realm)?,
            None => output::realm_line(realm),
        };
        writeln!(stdout, "{line}").map_err(|e| format!("Failed to write output: {e}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// items
// ---------------------------------------------------------------------------

fn run_add_item(env: &Env, args: AddItemArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let mut item = NewItem::new(args.title).in_realm(RealmSelector::from_option(args.realm));
    if let Some(number) = args.inventory_number {
        item = item.with_inventory_number(number);
    }
    if let Some(owner) = args.owner {
        item = item.with_owner(owner);
    }
    if let Some(url) = args.resource_url {
        item = item.with_resource_url(url);
    }
    let created = store
        .create_item(&item)
        .map_err(|e| format!("Failed to add item: {e}"))?;

    let Some(kind) = args.label_type else {
        return print_item(&created, true);
    };

    let label_output = args
        .label_output
        .as_deref()
        .map_or(LabelOutput::Stdout, LabelOutput::from_arg);
    // The label owns stdout in that case; the summary moves to stderr.
    if label_output == LabelOutput::Stdout {
        output::write_item(&mut std::io::stderr().lock(), &created, false)
            .map_err(|e| format!("Failed to write output: {e}"))?;
    } else {
        print_item(&created, true)?;
    }

    let renderer = env.renderer()?;
    label_item(
        &store,
        &renderer,
        kind,
        &created,
        &pairs(&args.label_attribute),
        &label_output,
        true,
    )
}

fn run_update_item(env: &Env, args: UpdateItemArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let update = ItemUpdate {
        title: args.title,
        resource_url: args.resource_url,
        owner: args.owner,
        is_active: flag_pair(args.active, args.inactive),
        is_labeled: flag_pair(args.labeled, args.unlabeled),
    };
    let updated = store
        .update_item(&args.inventory_number, &update)
        .map_err(|e| format!("Failed to update item: {e}"))?;
    if args.quiet {
        return Ok(());
    }
    print_item(&updated, false)
}

fn run_list_items(env: &Env, args: ListItemsArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let filter = ItemFilter {
        realm: args.realm,
        owner: args.owner,
        is_active: flag_pair(args.active, args.inactive),
        is_labeled: flag_pair(args.labeled, args.unlabeled),
    };
    let page = Pagination::from_signed(
        args.limit.unwrap_or(env.config.default_limit),
        args.offset,
    );
    let items = store
        .list_items(&filter, args.sort_key, page)
        .map_err(|e| format!("Failed to list items: {e}"))?;
    debug!(count = items.len(), sort_key = %args.sort_key, "listed items");

    let stdout = std::io::stdout().lock();
    if args.csv {
        return output::write_csv(stdout, &items);
    }
    if args.json {
        return output::write_json(stdout, &items);
    }

    let template = args.format.as_deref().map(LineTemplate::new).transpose()?;
    let mut stdout = stdout;
    for entry in &items {
        let line = match &template {
            Some(template) => template.render(&ItemRow::from(entry))?,
            None => output::item_line(entry),
        };
        writeln!(stdout, "{line}").map_err(|e| format!("Failed to write output: {e}"))?;
    }
    Ok(())
}

fn run_show_item(env: &Env, args: ShowItemArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;
    let show_qrcode = flag_pair(args.show_qrcode, args.hide_qrcode).unwrap_or(true);

    let mut missing = Vec::new();
    for number in &args.inventory_numbers {
        match store
            .find_item(number)
            .map_err(|e| format!("Failed to look up item '{number}': {e}"))?
        {
            Some(entry) => print_item(&entry, show_qrcode)?,
            None => {
                eprintln!("item not found: {number}");
                missing.push(number.as_str());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} item(s) not found: {}",
            missing.len(),
            args.inventory_numbers.len(),
            missing.join(", ")
        ))
    }
}

fn run_delete_item(env: &Env, args: DeleteItemArgs) -> Result<(), String> {
    let conn = env.connect()?;
    let store = env.store(&conn)?;

    let mode = if args.purge {
        DeleteMode::Purge
    } else {
        DeleteMode::Deactivate
    };
    let deleted = store
        .delete_item(&args.inventory_number, mode)
        .map_err(|e| format!("Failed to delete item: {e}"))?;
    match mode {
        DeleteMode::Deactivate => println!("Deactivated {}", deleted.display_number()),
        DeleteMode::Purge => println!("Purged {}", deleted.display_number()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// labels
// ---------------------------------------------------------------------------

fn run_generate_label(env: &Env, args: GenerateLabelArgs) -> Result<(), String> {
    let kind = args.label_type;
    let attrs = pairs(&args.attr);

    let mut numbers = args.item.clone();
    if args.item_stdin {
        for line in std::io::stdin().lock().lines() {
            let line = line.map_err(|e| format!("Failed to read stdin: {e}"))?;
            let line = line.trim();
            if !line.is_empty() {
                numbers.push(line.to_string());
            }
        }
    }

    let renderer = env.renderer()?;

    if numbers.is_empty() {
        if args.record {
            return Err("--record needs at least one item".to_string());
        }
        let attributes = LabelAttributes::from_pairs(kind, attrs)
            .map_err(|e| format!("Invalid label attributes: {e}"))?;
        let output = args
            .output
            .as_deref()
            .map_or(LabelOutput::Stdout, LabelOutput::from_arg);
        return renderer
            .render_to(kind, &attributes, &output)
            .map_err(|e| format!("Failed to generate label: {e}"));
    }

    let conn = env.connect()?;
    let store = env.store(&conn)?;
    // Resolve every item before rendering anything.
    let items = numbers
        .iter()
        .map(|number| {
            store
                .get_item(number)
                .map_err(|e| format!("Failed to load item: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let [entry] = items.as_slice() {
        let output = args
            .output
            .as_deref()
            .map_or(LabelOutput::Stdout, LabelOutput::from_arg);
        return label_item(&store, &renderer, kind, entry, &attrs, &output, args.record);
    }

    let dir = args
        .output
        .filter(|path| path.as_os_str() != "-")
        .ok_or_else(|| "--output must name a directory when labeling several items".to_string())?;
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create output directory '{}': {e}", dir.display()))?;
    for entry in &items {
        let path = dir.join(format!("{}.pdf", file_stem(entry.display_number())));
        label_item(
            &store,
            &renderer,
            kind,
            entry,
            &attrs,
            &LabelOutput::File(path),
            args.record,
        )?;
    }
    info!(count = items.len(), dir = %dir.display(), "generated labels");
    Ok(())
}

fn label_item(
    store: &InventoryStore<'_>,
    renderer: &LabelRenderer,
    kind: LabelKind,
    entry: &ItemWithRealm,
    attrs: &[(String, String)],
    output: &LabelOutput,
    record: bool,
) -> Result<(), String> {
    let attributes = LabelAttributes::for_item(kind, entry, attrs.iter().cloned())
        .map_err(|e| format!("Invalid label attributes: {e}"))?;
    renderer
        .render_to(kind, &attributes, output)
        .map_err(|e| format!("Failed to generate label for {}: {e}", entry.display_number()))?;

    if record {
        let url = match output {
            LabelOutput::File(path) => Some(path.display().to_string()),
            LabelOutput::Stdout => None,
        };
        store
            .record_label(&NewLabel {
                label_type: kind.name().to_string(),
                item_id: entry.item.id,
                media_type: Some(kind.media_type().to_string()),
                attributes: attributes.into_map(),
                url,
            })
            .map_err(|e| format!("Failed to record label: {e}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_item(entry: &ItemWithRealm, show_qrcode: bool) -> Result<(), String> {
    output::write_item(&mut std::io::stdout().lock(), entry, show_qrcode)
        .map_err(|e| format!("Failed to write output: {e}"))
}

/// Maps a `--x`/`--no-x` flag pair to an optional value.
fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Groups the flat values of a two-valued repeatable option.
fn pairs(values: &[String]) -> Vec<(String, String)> {
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

fn file_stem(inventory_number: &str) -> String {
    inventory_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flag_pair() {
        assert_eq!(flag_pair(false, false), None);
        assert_eq!(flag_pair(true, false), Some(true));
        assert_eq!(flag_pair(false, true), Some(false));
    }

    #[test]
    fn test_pairs_and_file_stem() {
        let values = vec!["policy".to_string(), "ask".to_string(), "owner".to_string(), "Bob".to_string()];
        assert_eq!(
            pairs(&values),
            vec![
                ("policy".to_string(), "ask".to_string()),
                ("owner".to_string(), "Bob".to_string())
            ]
        );
        assert_eq!(file_stem("LIB/2017/1"), "LIB_2017_1");
    }

    #[test]
    fn test_parse_list_items() {
        let cli = Cli::try_parse_from([
            "invent", "list-items", "--owner", "Alice", "--active", "--limit", "-1", "-S", "title",
        ])
        .unwrap();
        let Command::ListItems(args) = cli.command else {
            panic!("expected list-items");
        };
        assert_eq!(args.limit, Some(-1));
        assert_eq!(args.sort_key, SortKey::Title);
        assert!(args.active);
    }

    #[test]
    fn test_unknown_sort_key_is_usage_error() {
        let err = Cli::try_parse_from(["invent", "list-items", "--sort-key", "colour"]).unwrap_err();
        assert!(err.to_string().contains("invalid sort key 'colour'"));
    }

    #[test]
    fn test_label_attributes_require_label_type() {
        assert!(
            Cli::try_parse_from(["invent", "add-item", "--label-attribute", "k", "v", "Scope"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "invent",
            "generate-label",
            "-a",
            "title",
            "Scope",
            "-a",
            "generate_qrcode",
            "yes",
            "simple-62x29",
        ])
        .unwrap();
        let Command::GenerateLabel(args) = cli.command else {
            panic!("expected generate-label");
        };
        assert_eq!(args.attr.len(), 4);
        assert_eq!(args.label_type, LabelKind::Simple62x29);
    }
}
