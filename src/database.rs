// src/database.rs

use crate::error::StoreError;
use crate::models::JsonBook;
use log::{debug, info};
use rusqlite::{params, Connection};

pub fn init_db(conn: &Connection) -> Result<(), StoreError> {
    debug!("init_db: Checking database schema...");

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS users (
            user_key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            balance REAL NOT NULL DEFAULT 0.0,
            books_read INTEGER NOT NULL DEFAULT 0,
            total_earnings REAL NOT NULL DEFAULT 0.0,
            registered_at INTEGER NOT NULL,
            last_login INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            genre TEXT NOT NULL,
            base_value REAL NOT NULL CHECK (base_value >= 0)
        );
        CREATE TABLE IF NOT EXISTS questions (
            book_id INTEGER NOT NULL REFERENCES books(id),
            question_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            kind TEXT CHECK (kind IN ('comprehension','opinion')),
            prompt TEXT NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (book_id, question_key)
        );
        CREATE TABLE IF NOT EXISTS question_options (
            book_id INTEGER NOT NULL,
            question_key TEXT NOT NULL,
            option_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            correct INTEGER NOT NULL DEFAULT 0,
            points INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (book_id, question_key, option_key)
        );
        CREATE TABLE IF NOT EXISTS readings (
            id INTEGER PRIMARY KEY,
            user_key TEXT NOT NULL,
            book_id INTEGER NOT NULL,
            strategy TEXT NOT NULL,
            elapsed_seconds INTEGER NOT NULL,
            total_points INTEGER NOT NULL,
            monetary_value REAL NOT NULL,
            rating INTEGER,
            rejected INTEGER NOT NULL,
            timestamp INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS achievements (
            user_key TEXT NOT NULL,
            achievement TEXT NOT NULL,
            unlocked_at INTEGER NOT NULL,
            PRIMARY KEY (user_key, achievement)
        );
        ",
    )?;

    // Databases created before these columns existed.
    add_column_if_missing(conn, "users", "phone", "TEXT")?;
    add_column_if_missing(conn, "readings", "rating", "INTEGER")?;

    let count: i64 = conn.query_row("SELECT count(*) FROM books", [], |row| row.get(0))?;
    if count == 0 {
        info!("init_db: Book table empty. Seeding content...");
        seed_data(conn)?;
    }

    Ok(())
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .any(|name| name == column);
    if !exists {
        info!("init_db: Adding column {}.{}", table, column);
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))?;
    }
    Ok(())
}

fn seed_data(conn: &Connection) -> Result<(), StoreError> {
    let data = include_str!("data/books.json");
    let books: Vec<JsonBook> = serde_json::from_str(data)?;

    let mut b_stmt = conn.prepare(
        "INSERT OR REPLACE INTO books (id, title, author, genre, base_value) VALUES (?, ?, ?, ?, ?)",
    )?;
    let mut q_stmt = conn.prepare(
        "INSERT OR REPLACE INTO questions (book_id, question_key, position, kind, prompt, points) VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    let mut o_stmt = conn.prepare(
        "INSERT OR REPLACE INTO question_options (book_id, question_key, option_key, position, text, correct, points) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )?;

    for book in books {
        b_stmt.execute(params![book.id, book.title, book.author, book.genre, book.base_value])?;

        for (pos, q) in book.quiz.comprehension.iter().enumerate() {
            q_stmt.execute(params![book.id, q.id, pos as i64, "comprehension", q.prompt, q.points])?;
            for (opos, o) in q.options.iter().enumerate() {
                o_stmt.execute(params![book.id, q.id, o.id, opos as i64, o.text, o.correct, 0])?;
            }
        }

        for (pos, q) in book.quiz.opinion.iter().enumerate() {
            q_stmt.execute(params![book.id, q.id, pos as i64, "opinion", q.prompt, 0])?;
            for (opos, o) in q.options.iter().enumerate() {
                o_stmt.execute(params![book.id, q.id, o.id, opos as i64, o.text, true, o.points])?;
            }
        }
        debug!("Seeded book {} ({})", book.id, book.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_schema_gains_new_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                user_key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                balance REAL NOT NULL DEFAULT 0.0,
                books_read INTEGER NOT NULL DEFAULT 0,
                total_earnings REAL NOT NULL DEFAULT 0.0,
                registered_at INTEGER NOT NULL,
                last_login INTEGER NOT NULL
            );
            INSERT INTO users VALUES ('ana', 'Ana', 'ana@example.com', 1.0, 1, 1.0, 0, 0);",
        )
        .unwrap();

        init_db(&conn).unwrap();

        let phone: Option<String> = conn
            .query_row("SELECT phone FROM users WHERE user_key = 'ana'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(phone, None);
        conn.execute("UPDATE readings SET rating = 5", []).unwrap();
    }
}
