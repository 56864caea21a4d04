use std::path::Path;

use rusqlite::Connection;

use crate::error::ExtractError;
use crate::export::{ExplodedRow, SummaryRow};

type Result<T> = std::result::Result<T, ExtractError>;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS votes_summary (
            meeting_date      TEXT NOT NULL,
            item_number       TEXT NOT NULL,
            motion_number     INTEGER NOT NULL,
            motion_title      TEXT,
            motion_type       TEXT NOT NULL,
            legistar_number   TEXT,
            legistar_link     TEXT,
            description       TEXT,
            is_unanimous      BOOLEAN NOT NULL,
            total_ayes        INTEGER NOT NULL,
            total_noes        INTEGER NOT NULL,
            total_abstentions INTEGER NOT NULL,
            total_excused     INTEGER NOT NULL,
            total_recused     INTEGER NOT NULL,
            total_non_voting  INTEGER NOT NULL,
            page_number       INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_summary_date ON votes_summary(meeting_date);

        CREATE TABLE IF NOT EXISTS votes_by_member (
            meeting_date    TEXT NOT NULL,
            item_number     TEXT NOT NULL,
            motion_number   INTEGER NOT NULL,
            motion_type     TEXT NOT NULL,
            legistar_number TEXT,
            member_name     TEXT NOT NULL,
            vote_type       TEXT NOT NULL CHECK(vote_type IN
                ('AYE','NO','ABSTAIN','EXCUSED','RECUSED','NON_VOTING','UNANIMOUS_AYE')),
            is_unanimous    BOOLEAN NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_member_date ON votes_by_member(meeting_date);
        CREATE INDEX IF NOT EXISTS idx_member_name ON votes_by_member(member_name);

        CREATE VIEW IF NOT EXISTS non_unanimous_votes AS
        SELECT meeting_date, item_number, motion_number, motion_title,
               total_ayes, total_noes, total_abstentions,
               total_excused, total_recused, total_non_voting
        FROM votes_summary
        WHERE NOT is_unanimous
        ORDER BY meeting_date DESC, CAST(item_number AS INTEGER), motion_number;

        CREATE VIEW IF NOT EXISTS member_voting_patterns AS
        SELECT member_name,
               vote_type,
               COUNT(*) AS vote_count,
               COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (PARTITION BY member_name) AS vote_percentage
        FROM votes_by_member
        WHERE NOT is_unanimous
        GROUP BY member_name, vote_type
        ORDER BY member_name, vote_type;
        ",
    )?;
    Ok(())
}

// ── Saving ──

/// Replace everything stored for `meeting_date` with this run's rows.
pub fn save_meeting(
    conn: &Connection,
    meeting_date: &str,
    summary: &[SummaryRow],
    detailed: &[ExplodedRow],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        tx.execute("DELETE FROM votes_summary WHERE meeting_date = ?1", [meeting_date])?;
        tx.execute("DELETE FROM votes_by_member WHERE meeting_date = ?1", [meeting_date])?;

        let mut s_stmt = tx.prepare(
            "INSERT INTO votes_summary
             (meeting_date, item_number, motion_number, motion_title, motion_type,
              legistar_number, legistar_link, description, is_unanimous,
              total_ayes, total_noes, total_abstentions, total_excused, total_recused,
              total_non_voting, page_number)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        )?;
        for s in summary {
            count += s_stmt.execute(rusqlite::params![
                meeting_date, s.item_number, s.motion_number, s.motion_title,
                s.motion_type.as_str(), s.legistar_number, s.legistar_link, s.description,
                s.is_unanimous, s.total_ayes, s.total_noes, s.total_abstentions,
                s.total_excused, s.total_recused, s.total_non_voting, s.page_number as i64,
            ])?;
        }

        let mut m_stmt = tx.prepare(
            "INSERT INTO votes_by_member
             (meeting_date, item_number, motion_number, motion_type, legistar_number,
              member_name, vote_type, is_unanimous)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for m in detailed {
            m_stmt.execute(rusqlite::params![
                meeting_date, m.item_number, m.motion_number, m.motion_type.as_str(),
                m.legistar_number, m.member_name, m.vote_type.as_str(), m.is_unanimous,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Patterns ──

pub struct MemberPattern {
    pub member_name: String,
    pub vote_type: String,
    pub vote_count: usize,
    pub vote_percentage: f64,
}

pub fn fetch_member_patterns(conn: &Connection, member: Option<&str>) -> Result<Vec<MemberPattern>> {
    let mut stmt = conn.prepare(
        "SELECT member_name, vote_type, vote_count, vote_percentage
         FROM member_voting_patterns
         WHERE ?1 IS NULL OR member_name = ?1
         ORDER BY member_name, vote_type",
    )?;
    let rows = stmt
        .query_map([member], |row| {
            Ok(MemberPattern {
                member_name: row.get(0)?,
                vote_type: row.get(1)?,
                vote_count: row.get(2)?,
                vote_percentage: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub meetings: usize,
    pub motions: usize,
    pub non_unanimous: usize,
    pub by_vote_type: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let meetings: usize =
        conn.query_row("SELECT COUNT(DISTINCT meeting_date) FROM votes_summary", [], |r| r.get(0))?;
    let motions: usize = conn.query_row("SELECT COUNT(*) FROM votes_summary", [], |r| r.get(0))?;
    let non_unanimous: usize =
        conn.query_row("SELECT COUNT(*) FROM non_unanimous_votes", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT vote_type, COUNT(*) AS n
         FROM votes_by_member
         GROUP BY vote_type
         ORDER BY n DESC, vote_type",
    )?;
    let by_vote_type = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Stats {
        meetings,
        motions,
        non_unanimous,
        by_vote_type,
    })
}
