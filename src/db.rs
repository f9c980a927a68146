// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use reviewkit_core::Analysis;
use reviewkit_core::ErrorReport;
use reviewkit_core::Fallible;
use reviewkit_core::ItemId;
use reviewkit_core::ItemStatus;
use reviewkit_core::LearnerId;
use reviewkit_core::Quality;
use reviewkit_core::ReviewState;
use reviewkit_core::ReviewStore;
use reviewkit_core::Timestamp;
use reviewkit_core::TopicId;
use reviewkit_core::TopicResolver;
use reviewkit_core::report::ReportWindow;
use reviewkit_core::store::DueCandidate;
use reviewkit_core::store::unknown_item;
use reviewkit_core::store::unknown_learner;
use reviewkit_core::store::version_mismatch;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use rusqlite::types::Type;

const SCHEMA: &str = "
    create table if not exists learners (
        learner_id integer primary key,
        name text not null,
        created_at text not null
    );
    create table if not exists items (
        item_id integer primary key,
        learner_id integer not null references learners (learner_id),
        topic text not null,
        analysis text,
        created_at text not null
    );
    create table if not exists review_states (
        learner_id integer not null references learners (learner_id),
        item_id integer not null references items (item_id),
        topic text not null,
        status text not null,
        ease_factor real not null,
        interval_days integer not null,
        repetitions integer not null,
        next_due_at text,
        last_rated_at text,
        last_quality text,
        version integer not null,
        primary key (learner_id, item_id)
    );
    create index if not exists items_by_learner on items (learner_id);
";

const STATE_COLUMNS: &str = "s.learner_id, s.item_id, s.topic, s.status, s.ease_factor, \
    s.interval_days, s.repetitions, s.next_due_at, s.last_rated_at, s.last_quality, s.version";

fn sql_error(e: rusqlite::Error) -> ErrorReport {
    ErrorReport::storage(format!("database error: {e}"))
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Fallible<Self> {
        log::debug!("Opening database at {}", path.display());
        let conn = Connection::open(path).map_err(sql_error)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.execute_batch("pragma foreign_keys = on;")
            .map_err(sql_error)?;
        conn.execute_batch(SCHEMA).map_err(sql_error)?;
        Ok(Self { conn })
    }

    pub fn add_learner(&self, learner: LearnerId, name: &str, now: Timestamp) -> Fallible<()> {
        self.conn
            .execute(
                "insert into learners (learner_id, name, created_at) values (?1, ?2, ?3)",
                params![learner.0 as i64, name, now.to_string()],
            )
            .map_err(sql_error)?;
        Ok(())
    }

    /// Adds a problem for a learner. Its topic is derived from the analysis.
    /// Returns the item's identifier, allocated if not given.
    pub fn add_item(
        &self,
        learner: LearnerId,
        item: Option<ItemId>,
        analysis: Option<&Analysis>,
        now: Timestamp,
    ) -> Fallible<(ItemId, TopicId)> {
        self.check_learner(learner)?;
        let topic = match analysis {
            Some(analysis) => analysis.topic(),
            None => Analysis::Raw(String::new()).topic(),
        };
        let analysis_json: Option<String> = match analysis {
            Some(analysis) => Some(analysis.to_json()?),
            None => None,
        };
        self.conn
            .execute(
                "insert into items (item_id, learner_id, topic, analysis, created_at)
                 values (?1, ?2, ?3, ?4, ?5)",
                params![
                    item.map(|i| i.0 as i64),
                    learner.0 as i64,
                    topic.as_str(),
                    analysis_json,
                    now.to_string()
                ],
            )
            .map_err(sql_error)?;
        let item = ItemId(self.conn.last_insert_rowid() as u64);
        log::debug!("Added item {item} for learner {learner} under topic {topic}");
        Ok((item, topic))
    }

    /// How many items the learner added within the window.
    pub fn items_created_in(&self, learner: LearnerId, window: &ReportWindow) -> Fallible<usize> {
        self.check_learner(learner)?;
        let count: i64 = self
            .conn
            .query_row(
                "select count(*) from items
                 where learner_id = ?1 and created_at >= ?2 and created_at < ?3",
                params![
                    learner.0 as i64,
                    window.start.to_string(),
                    window.end.to_string()
                ],
                |row| row.get(0),
            )
            .map_err(sql_error)?;
        Ok(count as usize)
    }

    fn check_learner(&self, learner: LearnerId) -> Fallible<()> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "select learner_id from learners where learner_id = ?1",
                [learner.0 as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error)?;
        match found {
            Some(_) => Ok(()),
            None => Err(unknown_learner(learner)),
        }
    }

    fn check_owner(&self, learner: LearnerId, item: ItemId) -> Fallible<()> {
        self.check_learner(learner)?;
        let owner: Option<i64> = self
            .conn
            .query_row(
                "select learner_id from items where item_id = ?1",
                [item.0 as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error)?;
        match owner {
            Some(owner) if owner == learner.0 as i64 => Ok(()),
            _ => Err(unknown_item(item)),
        }
    }
}

fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: TryFrom<String, Error = ErrorReport>,
{
    T::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional<T>(idx: usize, value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: TryFrom<String, Error = ErrorReport>,
{
    value.map(|v| parse_column(idx, v)).transpose()
}

/// Reads a state from the columns of `STATE_COLUMNS`, starting at `offset`.
fn state_from_row(row: &Row, offset: usize) -> rusqlite::Result<ReviewState> {
    let learner: i64 = row.get(offset)?;
    let item: i64 = row.get(offset + 1)?;
    let topic: String = row.get(offset + 2)?;
    let status: String = row.get(offset + 3)?;
    let ease_factor: f64 = row.get(offset + 4)?;
    let interval_days: u32 = row.get(offset + 5)?;
    let repetitions: u32 = row.get(offset + 6)?;
    let next_due_at: Option<String> = row.get(offset + 7)?;
    let last_rated_at: Option<String> = row.get(offset + 8)?;
    let last_quality: Option<String> = row.get(offset + 9)?;
    let version: i64 = row.get(offset + 10)?;
    Ok(ReviewState {
        learner: LearnerId(learner as u64),
        item: ItemId(item as u64),
        topic: TopicId::new(topic),
        status: parse_column::<ItemStatus>(offset + 3, status)?,
        ease_factor,
        interval_days,
        repetitions,
        next_due_at: parse_optional::<Timestamp>(offset + 7, next_due_at)?,
        last_rated_at: parse_optional::<Timestamp>(offset + 8, last_rated_at)?,
        last_quality: parse_optional::<Quality>(offset + 9, last_quality)?,
        version: version as u64,
    })
}

impl ReviewStore for Database {
    fn get_state(&self, learner: LearnerId, item: ItemId) -> Fallible<Option<ReviewState>> {
        self.check_owner(learner, item)?;
        let sql = format!(
            "select {STATE_COLUMNS} from review_states s where s.learner_id = ?1 and s.item_id = ?2"
        );
        self.conn
            .query_row(&sql, params![learner.0 as i64, item.0 as i64], |row| {
                state_from_row(row, 0)
            })
            .optional()
            .map_err(sql_error)
    }

    fn upsert_state(&self, state: &ReviewState, expected_version: u64) -> Fallible<ReviewState> {
        self.check_owner(state.learner, state.item)?;
        let tx = self.conn.unchecked_transaction().map_err(sql_error)?;
        let found: Option<i64> = tx
            .query_row(
                "select version from review_states where learner_id = ?1 and item_id = ?2",
                params![state.learner.0 as i64, state.item.0 as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error)?;
        let found = found.map(|v| v as u64).unwrap_or(0);
        if found != expected_version {
            return Err(version_mismatch(state.item, expected_version, found));
        }
        let mut stored = state.clone();
        stored.version = found + 1;
        let changed = tx
            .execute(
                "insert into review_states (
                    learner_id, item_id, topic, status, ease_factor, interval_days,
                    repetitions, next_due_at, last_rated_at, last_quality, version
                 ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 on conflict (learner_id, item_id) do update set
                    topic = excluded.topic,
                    status = excluded.status,
                    ease_factor = excluded.ease_factor,
                    interval_days = excluded.interval_days,
                    repetitions = excluded.repetitions,
                    next_due_at = excluded.next_due_at,
                    last_rated_at = excluded.last_rated_at,
                    last_quality = excluded.last_quality,
                    version = excluded.version
                 where review_states.version = ?12",
                params![
                    stored.learner.0 as i64,
                    stored.item.0 as i64,
                    stored.topic.as_str(),
                    stored.status.as_str(),
                    stored.ease_factor,
                    stored.interval_days,
                    stored.repetitions,
                    stored.next_due_at.map(|t| t.to_string()),
                    stored.last_rated_at.map(|t| t.to_string()),
                    stored.last_quality.map(|q| q.as_str().to_string()),
                    stored.version as i64,
                    expected_version as i64,
                ],
            )
            .map_err(sql_error)?;
        if changed != 1 {
            return Err(ErrorReport::concurrent_modification(format!(
                "state of item {} changed concurrently",
                state.item
            )));
        }
        tx.commit().map_err(sql_error)?;
        Ok(stored)
    }

    fn due_candidates(
        &self,
        learner: LearnerId,
        as_of: Timestamp,
    ) -> Fallible<Vec<DueCandidate>> {
        // Due dates saturate at the end of year 9999, so their fixed-width
        // text sorts in time order.
        let sql = format!(
            "select i.item_id, s.item_id, {STATE_COLUMNS}
             from items i
             left join review_states s
                on s.item_id = i.item_id and s.learner_id = i.learner_id
             where i.learner_id = ?1
               and (s.item_id is null
                    or (s.next_due_at is null and s.status != 'correct')
                    or s.next_due_at <= ?2)
             order by i.item_id"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(sql_error)?;
        let candidates = stmt
            .query_map(params![learner.0 as i64, as_of.to_string()], |row| {
                let item: i64 = row.get(0)?;
                let state_item: Option<i64> = row.get(1)?;
                let state = match state_item {
                    Some(_) => Some(state_from_row(row, 2)?),
                    None => None,
                };
                Ok(DueCandidate {
                    item: ItemId(item as u64),
                    state,
                })
            })
            .map_err(sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error)?;
        if candidates.is_empty() {
            self.check_learner(learner)?;
        }
        Ok(candidates)
    }

    fn states_for_learner(&self, learner: LearnerId) -> Fallible<Vec<ReviewState>> {
        self.check_learner(learner)?;
        let sql = format!(
            "select {STATE_COLUMNS} from review_states s where s.learner_id = ?1 order by s.item_id"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(sql_error)?;
        let states = stmt
            .query_map([learner.0 as i64], |row| state_from_row(row, 0))
            .map_err(sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error)?;
        Ok(states)
    }
}

impl TopicResolver for Database {
    fn topic_of(&self, item: ItemId) -> Fallible<TopicId> {
        let topic: Option<String> = self
            .conn
            .query_row(
                "select topic from items where item_id = ?1",
                [item.0 as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error)?;
        match topic {
            Some(topic) => Ok(TopicId::new(topic)),
            None => Err(unknown_item(item)),
        }
    }
}
