//! Runs prepared statements against a table and writes the user-facing lines.

use std::io::Write;

use crate::command::Statement;
use crate::{DbError, Result, Row, Table};

pub const EXECUTED: &str = "Executed.";

/// The line shown for an error the session can recover from, `None` if it is fatal.
pub fn user_message(err: &DbError) -> Option<&'static str> {
    match err {
        DbError::InvalidId => Some("ID must be positive."),
        DbError::ValueTooLong { .. } => Some("String is too long."),
        DbError::NulInValue { .. } => Some("String contains a NUL byte."),
        DbError::DuplicateKey(_) => Some("Error: Duplicate key."),
        DbError::TableFull => Some("Error: Table full."),
        _ => None,
    }
}

pub fn execute<W: Write>(statement: Statement, table: &mut Table, out: &mut W) -> Result<()> {
    match statement {
        Statement::Insert {
            id,
            username,
            email,
        } => execute_insert(table, out, id, &username, &email),
        Statement::Select => execute_select(table, out),
    }
}

/// Inserts one row. Rejections are written to `out`; only fatal errors are returned.
pub fn execute_insert<W: Write>(
    table: &mut Table,
    out: &mut W,
    id: i32,
    username: &str,
    email: &str,
) -> Result<()> {
    let row = Row::new(id, username, email);
    let outcome = row.validate().and_then(|()| table.insert(&row));
    report(outcome, out)
}

pub fn execute_select<W: Write>(table: &mut Table, out: &mut W) -> Result<()> {
    for row in table.scan() {
        writeln!(out, "{}", row?).map_err(DbError::Terminal)?;
    }
    writeln!(out, "{EXECUTED}").map_err(DbError::Terminal)
}

fn report<W: Write>(outcome: Result<()>, out: &mut W) -> Result<()> {
    let line = match outcome {
        Ok(()) => EXECUTED,
        Err(err) => match user_message(&err) {
            Some(message) => message,
            None => return Err(err),
        },
    };
    writeln!(out, "{line}").map_err(DbError::Terminal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, Config, LEAF_NODE_MAX_CELLS};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn insert(table: &mut Table, id: i32, username: &str, email: &str) -> String {
        let mut out = Vec::new();
        execute_insert(table, &mut out, id, username, email).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn select(table: &mut Table) -> String {
        let mut out = Vec::new();
        execute_select(table, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn open(dir: &TempDir) -> Table {
        Table::open(&dir.path().join("test.db"), &Config::default()).unwrap()
    }

    #[test]
    fn inserts_and_selects_a_row() {
        let dir = TempDir::new().unwrap();
        let mut table = open(&dir);

        assert_eq!(
            insert(&mut table, 1, "user1", "user1@example.com"),
            "Executed.\n"
        );
        assert_eq!(
            select(&mut table),
            "(1, user1, user1@example.com)\nExecuted.\n"
        );
    }

    #[test]
    fn maps_rejections_to_messages() {
        let dir = TempDir::new().unwrap();
        let mut table = open(&dir);

        assert_eq!(insert(&mut table, -1, "a", "b"), "ID must be positive.\n");
        assert_eq!(insert(&mut table, 0, "a", "b"), "ID must be positive.\n");
        assert_eq!(
            insert(&mut table, 1, &"a".repeat(COLUMN_USERNAME_SIZE + 1), "b"),
            "String is too long.\n"
        );
        assert_eq!(
            insert(&mut table, 1, "a", &"b".repeat(COLUMN_EMAIL_SIZE + 1)),
            "String is too long.\n"
        );
        assert_eq!(select(&mut table), "Executed.\n");

        assert_eq!(
            insert(&mut table, 1, "a\0b", "b"),
            "String contains a NUL byte.\n"
        );
        assert_eq!(select(&mut table), "Executed.\n");

        insert(&mut table, 1, "a", "b");
        assert_eq!(insert(&mut table, 1, "a", "b"), "Error: Duplicate key.\n");
    }

    #[test]
    fn reports_a_full_table() {
        let dir = TempDir::new().unwrap();
        let mut table = open(&dir);
        for id in 1..=LEAF_NODE_MAX_CELLS as i32 {
            assert_eq!(insert(&mut table, id, "u", "e"), "Executed.\n");
        }
        assert_eq!(insert(&mut table, 100, "u", "e"), "Error: Table full.\n");
    }

    #[test]
    fn fatal_errors_have_no_user_message() {
        let corrupt = DbError::CorruptFile {
            len: 1,
            reason: "partial page",
        };
        assert_eq!(user_message(&corrupt), None);
        assert_eq!(
            user_message(&DbError::TableFull),
            Some("Error: Table full.")
        );
    }

    #[test]
    fn executes_prepared_statements() {
        let dir = TempDir::new().unwrap();
        let mut table = open(&dir);
        let mut out = Vec::new();

        let insert = Statement::prepare("insert 2 bob bob@example.com").unwrap();
        execute(insert, &mut table, &mut out).unwrap();
        execute(Statement::Select, &mut table, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Executed.\n(2, bob, bob@example.com)\nExecuted.\n"
        );
    }
}
