// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the license management workspace.
//!
//! `cargo test` runs everything against in-memory `SQLite`. The `MariaDB`
//! backend is opt-in:
//!
//! - `cargo xtask test-mariadb` starts a throwaway `MariaDB` container and
//!   runs the ignored `backend_validation_tests` of `lms-persistence`
//! - `cargo xtask verify-migrations` applies both migration trees and fails
//!   if the resulting schemas differ
//!
//! Containers are removed when the command finishes, whether it passed or not.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::process::Output;
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{Result, eyre::Context, eyre::eyre};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
const MYSQL_MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../crates/persistence/migrations_mysql");

/// Seconds to wait for a container to accept connections.
const READY_TIMEOUT_SECS: u32 = 30;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, backend validation)
    CI,

    /// Build the workspace
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting and clippy
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the workspace
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check for formatting issues
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Fix formatting issues
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Verify schema parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => run_cargo(&["build", "--all-targets", "--all-features"]),
            Self::Check => run_cargo(&["check", "--all-targets", "--all-features"]),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintFormatting => run_cargo_nightly(&["fmt", "--all", "--check"]),
            Self::FixFormatting => run_cargo_nightly(&["fmt", "--all"]),
            Self::Test => run_cargo(&["test", "--all-targets", "--all-features"]),
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn ci() -> Result<()> {
    lint()?;
    Command::Build.run()?;
    Command::Test.run()?;
    test_mariadb()?;
    verify_migrations()
}

fn lint() -> Result<()> {
    lint_clippy()?;
    Command::LintFormatting.run()
}

fn lint_clippy() -> Result<()> {
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

fn run_cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: &[&str]) -> Result<()> {
    cmd("cargo", args)
        // CARGO is set because we run as a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// MariaDB containers
// ---------------------------------------------------------------------------

/// A throwaway `MariaDB` 11 container, removed on drop.
struct MariaDb {
    container: &'static str,
    database: &'static str,
    port: u16,
}

impl MariaDb {
    const USER: &'static str = "lms";
    const PASSWORD: &'static str = "lms_test_password";

    /// Starts the container and waits until it accepts queries.
    fn start(container: &'static str, database: &'static str, port: u16) -> Result<Self> {
        cmd!("docker", "--version")
            .run_with_trace()
            .wrap_err("Docker is not available. Please install Docker.")?;

        // Leftovers from an interrupted run
        let _ = cmd!("docker", "rm", "--force", container).run();

        tracing::info!("Starting MariaDB container {container} on port {port}");
        cmd!(
            "docker",
            "run",
            "--name",
            container,
            "-e",
            format!("MARIADB_DATABASE={database}"),
            "-e",
            format!("MARIADB_USER={}", Self::USER),
            "-e",
            format!("MARIADB_PASSWORD={}", Self::PASSWORD),
            "-e",
            "MARIADB_ROOT_PASSWORD=root_password",
            "-p",
            format!("{port}:3306"),
            "-d",
            "mariadb:11"
        )
        .run_with_trace()
        .wrap_err("Failed to start MariaDB container")?;

        let db = Self {
            container,
            database,
            port,
        };
        db.wait_ready()?;
        Ok(db)
    }

    fn wait_ready(&self) -> Result<()> {
        for attempt in 1..=READY_TIMEOUT_SECS {
            sleep(Duration::from_secs(1));
            tracing::debug!("Connection attempt {attempt}/{READY_TIMEOUT_SECS}");
            let ping = cmd!(
                "docker",
                "exec",
                self.container,
                "mariadb",
                "-u",
                Self::USER,
                format!("-p{}", Self::PASSWORD),
                "-e",
                "SELECT 1"
            )
            .stdout_null()
            .stderr_null()
            .run();
            if ping.is_ok() {
                tracing::info!("MariaDB is ready");
                return Ok(());
            }
        }
        Err(eyre!(
            "MariaDB did not become ready within {READY_TIMEOUT_SECS} seconds"
        ))
    }

    fn url(&self) -> String {
        format!(
            "mysql://{}:{}@127.0.0.1:{}/{}",
            Self::USER,
            Self::PASSWORD,
            self.port,
            self.database
        )
    }
}

impl Drop for MariaDb {
    fn drop(&mut self) {
        tracing::info!("Removing MariaDB container {}", self.container);
        let _ = cmd!("docker", "rm", "--force", self.container)
            .stdout_null()
            .run();
    }
}

/// Runs the ignored backend validation tests of `lms-persistence` against
/// a fresh `MariaDB`.
///
/// The tests read `DATABASE_URL` and refuse to run unless
/// `LMS_TEST_BACKEND=mariadb`, so they never run by accident.
fn test_mariadb() -> Result<()> {
    let db = MariaDb::start("lms-test-mariadb", "lms_test", 3307)?;

    tracing::info!("Running MariaDB backend validation tests");
    cmd!(
        "cargo",
        "test",
        "--package",
        "lms-persistence",
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", db.url())
    .env("LMS_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend validation tests failed")?;

    tracing::info!("MariaDB backend validation completed successfully");
    Ok(())
}

// ---------------------------------------------------------------------------
// Schema parity
// ---------------------------------------------------------------------------

/// The parts of a table both backends must agree on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct TableShape {
    /// Column name to (normalized type, nullable).
    columns: BTreeMap<String, (String, bool)>,
    primary_key: BTreeSet<String>,
    /// (column, referenced table, referenced column)
    foreign_keys: BTreeSet<(String, String, String)>,
    unique: BTreeSet<Vec<String>>,
    /// Column lists of non-unique indexes.
    indexes: BTreeSet<Vec<String>>,
}

type SchemaShape = BTreeMap<String, TableShape>;

/// Applies both migration trees and compares the resulting schemas.
///
/// `MariaDB` runs on port 3308 so this can run next to `test-mariadb`.
fn verify_migrations() -> Result<()> {
    let db = MariaDb::start("lms-verify-migrations", "lms_verify", 3308)?;

    tracing::info!("Applying SQLite migrations");
    let mut sqlite = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut sqlite)
        .wrap_err("Failed to enable foreign keys on SQLite")?;
    sqlite
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply SQLite migrations: {e}"))?;

    tracing::info!("Applying MySQL migrations");
    let mut mysql = MysqlConnection::establish(&db.url()).wrap_err("Failed to connect to MariaDB")?;
    mysql
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply MySQL migrations: {e}"))?;

    let sqlite_shape: SchemaShape = sqlite_schema(&mut sqlite)?;
    let mysql_shape: SchemaShape = mysql_schema(&mut mysql, db.database)?;

    let mismatches: Vec<String> = compare_schemas(&sqlite_shape, &mysql_shape);
    if !mismatches.is_empty() {
        return Err(eyre!(
            "Schema parity check failed:\n{}",
            mismatches.join("\n")
        ));
    }

    tracing::info!(
        "Schema parity verified for {} tables",
        sqlite_shape.len()
    );
    Ok(())
}

fn normalize_type(raw: &str) -> String {
    let upper: String = raw.to_uppercase();
    let kind: &str = if upper.contains("INT") {
        "integer"
    } else if upper.contains("REAL")
        || upper.contains("FLOA")
        || upper.contains("DOUB")
        || upper.contains("DECIMAL")
        || upper.contains("NUMERIC")
    {
        "real"
    } else if upper.contains("BLOB") || upper.contains("BINARY") {
        "blob"
    } else {
        "text"
    };
    kind.to_string()
}

fn sqlite_schema(conn: &mut SqliteConnection) -> Result<SchemaShape> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Integer)]
        unique: i32,
    }

    #[derive(QueryableByName)]
    struct IndexColumn {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations'",
    )
    .load(conn)
    .wrap_err("Failed to list SQLite tables")?;

    let mut schema: SchemaShape = SchemaShape::new();
    for table in tables {
        let mut shape: TableShape = TableShape::default();

        let columns: Vec<ColumnInfo> = diesel::sql_query(format!("PRAGMA table_info({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to read columns of {}", table.name))?;
        for column in columns {
            if column.pk > 0 {
                shape.primary_key.insert(column.name.clone());
            }
            shape.columns.insert(
                column.name,
                (normalize_type(&column.r#type), column.notnull == 0),
            );
        }

        let foreign_keys: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to read foreign keys of {}", table.name))?;
        shape.foreign_keys = foreign_keys
            .into_iter()
            .map(|fk| (fk.from, fk.table, fk.to))
            .collect();

        let indexes: Vec<IndexInfo> = diesel::sql_query(format!("PRAGMA index_list({})", table.name))
            .load(conn)
            .wrap_err_with(|| format!("Failed to read indexes of {}", table.name))?;
        for index in indexes {
            let columns: Vec<String> =
                diesel::sql_query(format!("PRAGMA index_info({})", index.name))
                    .load::<IndexColumn>(conn)
                    .wrap_err_with(|| format!("Failed to read index {}", index.name))?
                    .into_iter()
                    .map(|c| c.name)
                    .collect();
            if index.unique == 1 {
                // INTEGER PRIMARY KEY has no index; other primary keys show up as unique
                if columns.iter().cloned().collect::<BTreeSet<_>>() != shape.primary_key {
                    shape.unique.insert(columns);
                }
            } else {
                shape.indexes.insert(columns);
            }
        }

        schema.insert(table.name, shape);
    }
    Ok(schema)
}

#[allow(clippy::too_many_lines)]
fn mysql_schema(conn: &mut MysqlConnection, database: &str) -> Result<SchemaShape> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        table_name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        data_type: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    #[derive(QueryableByName)]
    #[allow(clippy::struct_field_names)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        referenced_table_name: String,
        #[diesel(sql_type = Text)]
        referenced_column_name: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        index_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Integer)]
        non_unique: i32,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = ? AND table_name != '__diesel_schema_migrations'",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to list MySQL tables")?;

    let mut schema: SchemaShape = SchemaShape::new();
    for table in tables {
        let name: &str = &table.table_name;
        let mut shape: TableShape = TableShape::default();

        let columns: Vec<ColumnInfo> = diesel::sql_query(
            "SELECT column_name, data_type, is_nullable, column_key \
             FROM information_schema.columns WHERE table_schema = ? AND table_name = ?",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to read columns of {name}"))?;
        for column in columns {
            if column.column_key == "PRI" {
                shape.primary_key.insert(column.column_name.clone());
            }
            shape.columns.insert(
                column.column_name,
                (normalize_type(&column.data_type), column.is_nullable == "YES"),
            );
        }

        let foreign_keys: Vec<ForeignKeyInfo> = diesel::sql_query(
            "SELECT column_name, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to read foreign keys of {name}"))?;
        shape.foreign_keys = foreign_keys
            .into_iter()
            .map(|fk| {
                (
                    fk.column_name,
                    fk.referenced_table_name,
                    fk.referenced_column_name,
                )
            })
            .collect();

        let index_rows: Vec<IndexInfo> = diesel::sql_query(
            "SELECT index_name, column_name, non_unique FROM information_schema.statistics \
             WHERE table_schema = ? AND table_name = ? AND index_name != 'PRIMARY' \
             ORDER BY index_name, seq_in_index",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to read indexes of {name}"))?;

        let mut grouped: BTreeMap<String, (bool, Vec<String>)> = BTreeMap::new();
        for row in index_rows {
            grouped
                .entry(row.index_name)
                .or_insert_with(|| (row.non_unique == 0, Vec::new()))
                .1
                .push(row.column_name);
        }
        for (unique, columns) in grouped.into_values() {
            if unique {
                shape.unique.insert(columns);
            } else {
                shape.indexes.insert(columns);
            }
        }

        schema.insert(table.table_name, shape);
    }
    Ok(schema)
}

/// Lists every difference between the two schemas.
///
/// `InnoDB` indexes every foreign key column, so extra single-column
/// indexes on foreign keys are allowed on the `MySQL` side.
fn compare_schemas(sqlite: &SchemaShape, mysql: &SchemaShape) -> Vec<String> {
    let mut mismatches: Vec<String> = Vec::new();

    for name in sqlite.keys().filter(|name| !mysql.contains_key(*name)) {
        mismatches.push(format!("  - table '{name}' exists only in SQLite"));
    }
    for name in mysql.keys().filter(|name| !sqlite.contains_key(*name)) {
        mismatches.push(format!("  - table '{name}' exists only in MySQL"));
    }

    for (name, lite) in sqlite {
        let Some(my) = mysql.get(name) else {
            continue;
        };

        if lite.columns != my.columns {
            mismatches.push(format!(
                "  - columns of '{name}' differ\n      SQLite: {:?}\n      MySQL:  {:?}",
                lite.columns, my.columns
            ));
        }
        if lite.primary_key != my.primary_key {
            mismatches.push(format!(
                "  - primary key of '{name}' differs: {:?} vs {:?}",
                lite.primary_key, my.primary_key
            ));
        }
        if lite.foreign_keys != my.foreign_keys {
            mismatches.push(format!(
                "  - foreign keys of '{name}' differ: {:?} vs {:?}",
                lite.foreign_keys, my.foreign_keys
            ));
        }
        if lite.unique != my.unique {
            mismatches.push(format!(
                "  - unique constraints of '{name}' differ: {:?} vs {:?}",
                lite.unique, my.unique
            ));
        }

        for columns in lite.indexes.difference(&my.indexes) {
            mismatches.push(format!("  - index {columns:?} on '{name}' missing in MySQL"));
        }
        let fk_columns: BTreeSet<&String> = my.foreign_keys.iter().map(|(from, _, _)| from).collect();
        for columns in my.indexes.difference(&lite.indexes) {
            let implicit_fk_index: bool = columns.len() == 1 && fk_columns.contains(&columns[0]);
            if !implicit_fk_index {
                mismatches.push(format!("  - index {columns:?} on '{name}' exists only in MySQL"));
            }
        }
    }

    mismatches
}

/// Logs a `duct` command before running it.
trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command may have scrolled off the screen
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
