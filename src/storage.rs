use crate::api::models::{Chat, ChatQuery, ChatSort, Contact, Message, MessageContext, MessageFilter, TIMESTAMP_FORMAT};
use crate::error::ApiError;
use crate::utils::phone_from_jid;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::PathBuf;

const CONTACT_SEARCH_LIMIT: i64 = 50;

const MESSAGE_COLUMNS: &str =
    "m.timestamp, m.sender, c.name, m.content, m.is_from_me, c.jid, m.id, m.media_type";

/// Read-only view of the bridge's `messages.db`.
#[derive(Debug, Clone)]
pub struct MessageStore {
    path: PathBuf,
}

/// Parses the timestamp text the bridge writes, keeping the wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

// Filters are compared in UTC through sqlite's datetime().
fn filter_timestamp(field: &'static str, raw: &str) -> Result<String, ApiError> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| parse_timestamp(raw))
        .or_else(|| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ApiError::InvalidDate {
            field,
            value: raw.to_string(),
        })?;
    Ok(parsed.format(TIMESTAMP_FORMAT).to_string())
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_timestamp(&text).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("unrecognised timestamp: {}", text).into(),
            )
        }),
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let timestamp = timestamp_column(row, 0)?
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(0, "timestamp".into(), Type::Null))?;
    let media_type: Option<String> = row.get(7)?;
    Ok(Message {
        timestamp,
        sender: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        chat_name: row.get(2)?,
        content: row.get(3)?,
        is_from_me: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        chat_jid: row.get(5)?,
        id: row.get(6)?,
        media_type: media_type.filter(|kind| !kind.is_empty()),
    })
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        jid: row.get(0)?,
        name: row.get(1)?,
        last_message_time: timestamp_column(row, 2)?,
        last_message: row.get(3)?,
    })
}

fn chat_select(include_last_message: bool) -> &'static str {
    if include_last_message {
        // One row per chat even when several messages share the last timestamp.
        "SELECT c.jid, c.name, c.last_message_time, m.content \
         FROM chats c \
         LEFT JOIN messages m ON m.rowid = ( \
             SELECT rowid FROM messages \
             WHERE chat_jid = c.jid AND timestamp = c.last_message_time \
             ORDER BY rowid DESC LIMIT 1)"
    } else {
        "SELECT c.jid, c.name, c.last_message_time, NULL FROM chats c"
    }
}

/// Clamps a count to SQLite's signed 64-bit range.
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn page_offset(page: usize, limit: usize) -> i64 {
    sql_count(page.saturating_mul(limit))
}

fn like(term: &str) -> String {
    format!("%{}%", term)
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>, ApiError> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

impl MessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open_conn(&self) -> Result<Connection, ApiError> {
        debug!("opening message store at {}", self.path.display());
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    pub fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, ApiError> {
        let conn = self.open_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT jid, name FROM chats \
             WHERE (LOWER(name) LIKE LOWER(?1) OR LOWER(jid) LIKE LOWER(?1)) \
             AND jid NOT LIKE '%@g.us' \
             ORDER BY name, jid LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![like(query), CONTACT_SEARCH_LIMIT], |row| {
            let jid: String = row.get(0)?;
            Ok(Contact {
                phone_number: Some(phone_from_jid(&jid).to_string()),
                name: row.get(1)?,
                jid: Some(jid),
            })
        })?;
        let contacts = collect(rows)?;
        debug!("search_contacts({:?}) matched {}", query, contacts.len());
        Ok(contacts)
    }

    pub fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, ApiError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<SqlValue> = Vec::new();
        if let Some(after) = &filter.after {
            clauses.push("datetime(m.timestamp) > datetime(?)");
            args.push(SqlValue::Text(filter_timestamp("after", after)?));
        }
        if let Some(before) = &filter.before {
            clauses.push("datetime(m.timestamp) < datetime(?)");
            args.push(SqlValue::Text(filter_timestamp("before", before)?));
        }
        if let Some(sender) = &filter.sender_phone_number {
            clauses.push("m.sender = ?");
            args.push(SqlValue::Text(sender.clone()));
        }
        if let Some(chat_jid) = &filter.chat_jid {
            clauses.push("m.chat_jid = ?");
            args.push(SqlValue::Text(chat_jid.clone()));
        }
        if let Some(query) = &filter.query {
            clauses.push("LOWER(m.content) LIKE LOWER(?)");
            args.push(SqlValue::Text(like(query)));
        }

        let mut sql = format!("SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid", MESSAGE_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY m.timestamp DESC LIMIT ? OFFSET ?");
        args.push(SqlValue::Integer(sql_count(filter.limit)));
        args.push(SqlValue::Integer(page_offset(filter.page, filter.limit)));

        let conn = self.open_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), message_from_row)?;
        collect(rows)
    }

    pub fn message_context(&self, message_id: &str, before: usize, after: usize) -> Result<Option<MessageContext>, ApiError> {
        let conn = self.open_conn()?;
        let anchor: Option<(String, String, i64)> = conn
            .query_row(
                "SELECT timestamp, chat_jid, rowid FROM messages WHERE id = ?1 LIMIT 1",
                params![message_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((timestamp, chat_jid, rowid)) = anchor else {
            debug!("message {} not found", message_id);
            return Ok(None);
        };

        let message = conn.query_row(
            &format!(
                "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid WHERE m.id = ?1 AND m.chat_jid = ?2",
                MESSAGE_COLUMNS
            ),
            params![message_id, chat_jid],
            message_from_row,
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
             WHERE m.chat_jid = ?1 AND (m.timestamp < ?2 OR (m.timestamp = ?2 AND m.rowid < ?3)) \
             ORDER BY m.timestamp DESC, m.rowid DESC LIMIT ?4",
            MESSAGE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![chat_jid, timestamp, rowid, sql_count(before)], message_from_row)?;
        let mut earlier = collect(rows)?;
        earlier.reverse();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
             WHERE m.chat_jid = ?1 AND (m.timestamp > ?2 OR (m.timestamp = ?2 AND m.rowid > ?3)) \
             ORDER BY m.timestamp ASC, m.rowid ASC LIMIT ?4",
            MESSAGE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![chat_jid, timestamp, rowid, sql_count(after)], message_from_row)?;
        let later = collect(rows)?;

        Ok(Some(MessageContext {
            message,
            before: earlier,
            after: later,
        }))
    }

    pub fn list_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>, ApiError> {
        let mut sql = chat_select(query.include_last_message).to_string();
        let mut args: Vec<SqlValue> = Vec::new();
        if let Some(term) = &query.query {
            sql.push_str(" WHERE (LOWER(c.name) LIKE LOWER(?) OR c.jid LIKE ?)");
            args.push(SqlValue::Text(like(term)));
            args.push(SqlValue::Text(like(term)));
        }
        sql.push_str(match query.sort_by {
            ChatSort::LastActive => " ORDER BY c.last_message_time DESC",
            ChatSort::Name => " ORDER BY c.name",
        });
        sql.push_str(" LIMIT ? OFFSET ?");
        args.push(SqlValue::Integer(sql_count(query.limit)));
        args.push(SqlValue::Integer(page_offset(query.page, query.limit)));

        let conn = self.open_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), chat_from_row)?;
        collect(rows)
    }

    pub fn get_chat(&self, chat_jid: &str, include_last_message: bool) -> Result<Option<Chat>, ApiError> {
        let conn = self.open_conn()?;
        let sql = format!("{} WHERE c.jid = ?1 LIMIT 1", chat_select(include_last_message));
        let chat = conn.query_row(&sql, params![chat_jid], chat_from_row).optional()?;
        Ok(chat)
    }

    pub fn get_direct_chat_by_contact(&self, phone_number: &str) -> Result<Option<Chat>, ApiError> {
        let conn = self.open_conn()?;
        let sql = format!(
            "{} WHERE c.jid LIKE ?1 AND c.jid NOT LIKE '%@g.us' LIMIT 1",
            chat_select(true)
        );
        let chat = conn.query_row(&sql, params![like(phone_number)], chat_from_row).optional()?;
        Ok(chat)
    }

    /// Chats the contact took part in: their direct chat and any chat they wrote in.
    pub fn get_contact_chats(&self, jid: &str, limit: usize, page: usize) -> Result<Vec<Chat>, ApiError> {
        let conn = self.open_conn()?;
        let sql = format!(
            "{} WHERE c.jid = ?1 OR c.jid IN (SELECT chat_jid FROM messages WHERE sender IN (?1, ?2)) \
             ORDER BY c.last_message_time DESC LIMIT ?3 OFFSET ?4",
            chat_select(true)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![jid, phone_from_jid(jid), sql_count(limit), page_offset(page, limit)],
            chat_from_row,
        )?;
        collect(rows)
    }

    pub fn last_interaction(&self, jid: &str) -> Result<Option<Message>, ApiError> {
        let conn = self.open_conn()?;
        let sql = format!(
            "SELECT {} FROM messages m JOIN chats c ON m.chat_jid = c.jid \
             WHERE m.sender IN (?1, ?2) OR c.jid = ?1 ORDER BY m.timestamp DESC LIMIT 1",
            MESSAGE_COLUMNS
        );
        let message = conn
            .query_row(&sql, params![jid, phone_from_jid(jid)], message_from_row)
            .optional()?;
        Ok(message)
    }

    /// Display names for the senders of `messages`, falling back to the raw sender.
    pub fn sender_names(&self, messages: &[Message]) -> Result<HashMap<String, String>, ApiError> {
        let mut names = HashMap::new();
        if messages.is_empty() {
            return Ok(names);
        }
        let conn = self.open_conn()?;
        for message in messages {
            if message.is_from_me || names.contains_key(&message.sender) {
                continue;
            }
            let name = Self::sender_name_with(&conn, &message.sender)?;
            names.insert(message.sender.clone(), name);
        }
        Ok(names)
    }

    fn sender_name_with(conn: &Connection, sender: &str) -> Result<String, ApiError> {
        let exact: Option<Option<String>> = conn
            .query_row("SELECT name FROM chats WHERE jid = ?1 LIMIT 1", params![sender], |row| row.get(0))
            .optional()?;
        if let Some(name) = exact.flatten().filter(|name| !name.is_empty()) {
            return Ok(name);
        }
        let partial: Option<Option<String>> = conn
            .query_row(
                "SELECT name FROM chats WHERE jid LIKE ?1 ORDER BY (jid LIKE '%@g.us') LIMIT 1",
                params![like(phone_from_jid(sender))],
                |row| row.get(0),
            )
            .optional()?;
        Ok(partial.flatten().filter(|name| !name.is_empty()).unwrap_or_else(|| sender.to_string()))
    }
}
