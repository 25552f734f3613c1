//! Query functions for the track request queue.
//!
//! All functions borrow a connection and are meant to run on the store's
//! dedicated executor thread; see [`crate::Store`].

use crate::{CustomParam, DataTrack, RequestState, StoreResult, TrackRequest};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// Insert a track request and its custom params in one transaction.
///
/// Either the request and every param land together, or nothing is
/// committed. Returns the assigned record id.
pub fn insert_track_request(
    conn: &mut Connection,
    payload: &str,
    params_kv: &[(String, String)],
) -> StoreResult<i64> {
    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO track_requests (payload, state, created_at) VALUES (?1, ?2, ?3)",
        params![payload, RequestState::New.as_str(), now],
    )?;
    let id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO custom_params (track_id, param_key, param_value) VALUES (?1, ?2, ?3)",
        )?;
        for (key, value) in params_kv {
            stmt.execute(params![id, key, value])?;
        }
    }
    tx.commit()?;
    Ok(id)
}

/// Fetch all requests whose state is in `states`, in insertion order
/// (ascending id), each with its custom params.
pub fn fetch_by_state(conn: &Connection, states: &[RequestState]) -> StoreResult<Vec<DataTrack>> {
    if states.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; states.len()].join(", ");
    let sql = format!(
        "SELECT id, payload, state, created_at FROM track_requests
         WHERE state IN ({placeholders}) ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let requests = stmt
        .query_map(
            rusqlite::params_from_iter(states.iter().map(|s| s.as_str())),
            |row| {
                Ok(TrackRequest {
                    id: row.get(0)?,
                    payload: row.get(1)?,
                    state: RequestState::from_str(&row.get::<_, String>(2)?),
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tracks = Vec::with_capacity(requests.len());
    for request in requests {
        let params = params_for_request(conn, request.id)?;
        tracks.push(DataTrack { request, params });
    }
    Ok(tracks)
}

/// Fetch the custom params attached to one request.
pub fn params_for_request(conn: &Connection, track_id: i64) -> StoreResult<Vec<CustomParam>> {
    let mut stmt = conn.prepare(
        "SELECT id, track_id, param_key, param_value FROM custom_params
         WHERE track_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map(params![track_id], |row| {
            Ok(CustomParam {
                id: row.get(0)?,
                track_id: row.get(1)?,
                param_key: row.get(2)?,
                param_value: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Transition requests to a new state, atomically for the whole set.
///
/// Ids that no longer exist are skipped silently; concurrent cleanup may
/// have removed them. Returns the number of rows actually updated.
pub fn mark_state(conn: &mut Connection, ids: &[i64], state: RequestState) -> StoreResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    let mut changed = 0;
    {
        let mut stmt = tx.prepare("UPDATE track_requests SET state = ?1 WHERE id = ?2")?;
        for id in ids {
            changed += stmt.execute(params![state.as_str(), id])?;
        }
    }
    tx.commit()?;
    Ok(changed)
}

/// Delete requests by id; custom params cascade away with their owner.
///
/// Idempotent: deleting an id that is already gone is not an error.
/// Returns the number of rows actually deleted.
pub fn delete_requests(conn: &mut Connection, ids: &[i64]) -> StoreResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    let mut deleted = 0;
    {
        let mut stmt = tx.prepare("DELETE FROM track_requests WHERE id = ?1")?;
        for id in ids {
            deleted += stmt.execute(params![id])?;
        }
    }
    tx.commit()?;
    Ok(deleted)
}

/// Remove custom params whose owning request no longer exists.
///
/// Cascade handles this on connections with foreign keys enabled; the
/// sweep guards connections opened without them.
pub fn sweep_orphaned_params(conn: &Connection) -> StoreResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM custom_params
         WHERE track_id NOT IN (SELECT id FROM track_requests)",
        [],
    )?;
    Ok(deleted)
}

/// Count requests in a given state.
pub fn count_by_state(conn: &Connection, state: RequestState) -> StoreResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM track_requests WHERE state = ?1",
        params![state.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Count all custom params.
pub fn count_custom_params(conn: &Connection) -> StoreResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM custom_params", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn kv(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn enqueue_then_fetch_returns_new_record() {
        let mut conn = test_conn();
        let id = insert_track_request(&mut conn, "p=100,home", &[]).unwrap();

        let tracks = fetch_by_state(&conn, &[RequestState::New]).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].request.id, id);
        assert_eq!(tracks[0].request.payload, "p=100,home");
        assert_eq!(tracks[0].request.state, RequestState::New);
        assert!(tracks[0].params.is_empty());
    }

    #[test]
    fn fetch_preserves_insertion_order() {
        let mut conn = test_conn();
        for i in 0..5 {
            insert_track_request(&mut conn, &format!("p={i}"), &[]).unwrap();
        }

        let tracks = fetch_by_state(&conn, &[RequestState::New]).unwrap();
        let ids: Vec<i64> = tracks.iter().map(|t| t.request.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(tracks[0].request.payload, "p=0");
        assert_eq!(tracks[4].request.payload, "p=4");
    }

    #[test]
    fn fetch_filters_by_state_set() {
        let mut conn = test_conn();
        let a = insert_track_request(&mut conn, "a", &[]).unwrap();
        let b = insert_track_request(&mut conn, "b", &[]).unwrap();
        let c = insert_track_request(&mut conn, "c", &[]).unwrap();
        mark_state(&mut conn, &[b], RequestState::Failed).unwrap();
        mark_state(&mut conn, &[c], RequestState::Done).unwrap();

        let eligible =
            fetch_by_state(&conn, &[RequestState::New, RequestState::Failed]).unwrap();
        let ids: Vec<i64> = eligible.iter().map(|t| t.request.id).collect();
        assert_eq!(ids, vec![a, b]);

        let done = fetch_by_state(&conn, &[RequestState::Done]).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].request.id, c);
    }

    #[test]
    fn fetch_with_empty_state_set_is_empty() {
        let mut conn = test_conn();
        insert_track_request(&mut conn, "a", &[]).unwrap();
        assert!(fetch_by_state(&conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn params_are_stored_with_request() {
        let mut conn = test_conn();
        let id = insert_track_request(
            &mut conn,
            "p=1",
            &kv(&[("cp1", "value one"), ("cp2", "value two")]),
        )
        .unwrap();

        let tracks = fetch_by_state(&conn, &[RequestState::New]).unwrap();
        assert_eq!(tracks[0].params.len(), 2);
        assert_eq!(tracks[0].params[0].track_id, id);
        assert_eq!(tracks[0].params[0].param_key, "cp1");
        assert_eq!(tracks[0].params[1].param_value, "value two");
    }

    #[test]
    fn mark_state_on_missing_id_is_noop() {
        let mut conn = test_conn();
        let changed = mark_state(&mut conn, &[9999], RequestState::Done).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn delete_cascades_params() {
        let mut conn = test_conn();
        let id = insert_track_request(&mut conn, "p=1", &kv(&[("cp1", "v")])).unwrap();
        assert_eq!(count_custom_params(&conn).unwrap(), 1);

        let deleted = delete_requests(&mut conn, &[id]).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(count_custom_params(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut conn = test_conn();
        let id = insert_track_request(&mut conn, "p=1", &[]).unwrap();

        assert_eq!(delete_requests(&mut conn, &[id]).unwrap(), 1);
        assert_eq!(delete_requests(&mut conn, &[id]).unwrap(), 0);
        assert_eq!(delete_requests(&mut conn, &[]).unwrap(), 0);
    }

    #[test]
    fn sweep_removes_orphans_when_cascade_is_off() {
        // Foreign keys deliberately left off: simulates storage without
        // native cascade, which is what the sweep exists for.
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        migrations::run_migrations(&conn).unwrap();

        let id = insert_track_request(&mut conn, "p=1", &kv(&[("cp1", "v")])).unwrap();
        delete_requests(&mut conn, &[id]).unwrap();
        assert_eq!(count_custom_params(&conn).unwrap(), 1);

        let swept = sweep_orphaned_params(&conn).unwrap();
        assert_eq!(swept, 1);
        assert_eq!(count_custom_params(&conn).unwrap(), 0);
    }

    #[test]
    fn count_by_state_tracks_transitions() {
        let mut conn = test_conn();
        let id = insert_track_request(&mut conn, "p=1", &[]).unwrap();
        assert_eq!(count_by_state(&conn, RequestState::New).unwrap(), 1);

        mark_state(&mut conn, &[id], RequestState::Done).unwrap();
        assert_eq!(count_by_state(&conn, RequestState::New).unwrap(), 0);
        assert_eq!(count_by_state(&conn, RequestState::Done).unwrap(), 1);
    }
}
