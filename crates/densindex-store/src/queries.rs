//! SQL for every registry operation, over a bare connection so the same
//! statements serve both pool reads and in-transaction writes.

use sqlx::{Row, SqliteConnection};

use densindex_core::{
    AssetClass, ChainPoint, Hash32, NameSetEntry, Point, ProtocolParams, ProtocolRecord,
    ResourceRecord, ScriptHash, TxOutRef,
};

use crate::error::StoreError;
use crate::store::PredecessorLookup;

// ─── Row helpers ──────────────────────────────────────────────────────────────

fn hash32(blob: Vec<u8>) -> Result<Hash32, StoreError> {
    Hash32::try_from(blob.as_slice()).map_err(StoreError::db)
}

fn script_hash(blob: Vec<u8>) -> Result<ScriptHash, StoreError> {
    ScriptHash::try_from(blob.as_slice()).map_err(StoreError::db)
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<NameSetEntry, StoreError> {
    Ok(NameSetEntry {
        name: row.get("name"),
        pointer: AssetClass::new(row.get("pointer_currency"), row.get("pointer_token")),
        tx_out_ref: TxOutRef::new(
            hash32(row.get("tx_id"))?,
            row.get::<i64, _>("output_index") as u32,
        ),
    })
}

// ─── Points ───────────────────────────────────────────────────────────────────

pub(crate) async fn insert_point(
    conn: &mut SqliteConnection,
    point: &Point,
) -> Result<(), StoreError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM points WHERE slot = ?)")
        .bind(point.slot as i64)
        .fetch_one(&mut *conn)
        .await
        .map_err(StoreError::db)?;
    if exists {
        return Err(StoreError::DuplicatePoint { slot: point.slot });
    }

    sqlx::query("INSERT INTO points (slot, block_id) VALUES (?, ?)")
        .bind(point.slot as i64)
        .bind(point.id.as_bytes())
        .execute(&mut *conn)
        .await
        .map_err(StoreError::db)?;
    Ok(())
}

pub(crate) async fn recent_points(
    conn: &mut SqliteConnection,
    limit: u32,
) -> Result<Vec<Point>, StoreError> {
    let rows = sqlx::query("SELECT slot, block_id FROM points ORDER BY slot DESC LIMIT ?")
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(StoreError::db)?;

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        points.push(Point::new(
            row.get::<i64, _>("slot") as u64,
            hash32(row.get("block_id"))?,
        ));
    }
    Ok(points)
}

/// Delete every point with slot strictly greater than the target and every
/// row attributed to a deleted point. Rolling back to origin clears all
/// projected state. Idempotent.
pub(crate) async fn roll_back_to(
    conn: &mut SqliteConnection,
    target: &ChainPoint,
) -> Result<(), StoreError> {
    let cutoff = match target.slot() {
        Some(slot) => slot as i64,
        None => -1,
    };
    for sql in [
        "DELETE FROM record_bundles WHERE created_slot > ?",
        "DELETE FROM name_set WHERE created_slot > ?",
        "DELETE FROM protocol WHERE created_slot > ?",
        "DELETE FROM live_refs WHERE created_slot > ?",
        "DELETE FROM points WHERE slot > ?",
    ] {
        sqlx::query(sql)
            .bind(cutoff)
            .execute(&mut *conn)
            .await
            .map_err(StoreError::db)?;
    }
    tracing::debug!(%target, "rolled back registry");
    Ok(())
}

// ─── Live refs ────────────────────────────────────────────────────────────────

pub(crate) async fn insert_live_ref(
    conn: &mut SqliteConnection,
    tx_out_ref: &TxOutRef,
    created_slot: u64,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO live_refs (tx_id, output_index, created_slot) VALUES (?, ?, ?)")
        .bind(tx_out_ref.tx_id.as_bytes())
        .bind(i64::from(tx_out_ref.index))
        .bind(created_slot as i64)
        .execute(&mut *conn)
        .await
        .map_err(StoreError::db)?;
    Ok(())
}

/// Delete a consumed reference, cascading to any registry row keyed by it.
pub(crate) async fn delete_live_ref(
    conn: &mut SqliteConnection,
    tx_out_ref: &TxOutRef,
) -> Result<(), StoreError> {
    for sql in [
        "DELETE FROM record_bundles WHERE tx_id = ? AND output_index = ?",
        "DELETE FROM name_set WHERE tx_id = ? AND output_index = ?",
        "DELETE FROM protocol WHERE tx_id = ? AND output_index = ?",
        "DELETE FROM live_refs WHERE tx_id = ? AND output_index = ?",
    ] {
        sqlx::query(sql)
            .bind(tx_out_ref.tx_id.as_bytes())
            .bind(i64::from(tx_out_ref.index))
            .execute(&mut *conn)
            .await
            .map_err(StoreError::db)?;
    }
    Ok(())
}

pub(crate) async fn live_ref_exists(
    conn: &mut SqliteConnection,
    tx_out_ref: &TxOutRef,
) -> Result<bool, StoreError> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM live_refs WHERE tx_id = ? AND output_index = ?)",
    )
    .bind(tx_out_ref.tx_id.as_bytes())
    .bind(i64::from(tx_out_ref.index))
    .fetch_one(conn)
    .await
    .map_err(StoreError::db)
}

// ─── Protocol singleton ───────────────────────────────────────────────────────

pub(crate) async fn insert_protocol(
    conn: &mut SqliteConnection,
    tx_out_ref: &TxOutRef,
    params: &ProtocolParams,
    created_slot: u64,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR REPLACE INTO protocol
         (id, tx_id, output_index, element_id_policy, set_elem_policy,
          set_validator, records_validator, created_slot)
         VALUES (0, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tx_out_ref.tx_id.as_bytes())
    .bind(i64::from(tx_out_ref.index))
    .bind(params.element_id_policy.as_bytes())
    .bind(params.set_elem_policy.as_bytes())
    .bind(params.set_validator.as_bytes())
    .bind(params.records_validator.as_bytes())
    .bind(created_slot as i64)
    .execute(&mut *conn)
    .await
    .map_err(StoreError::db)?;

    tracing::debug!(at = %tx_out_ref, "protocol singleton updated");
    Ok(())
}

pub(crate) async fn select_protocol(
    conn: &mut SqliteConnection,
) -> Result<Option<ProtocolRecord>, StoreError> {
    let row = sqlx::query(
        "SELECT tx_id, output_index, element_id_policy, set_elem_policy,
                set_validator, records_validator
         FROM protocol WHERE id = 0",
    )
    .fetch_optional(conn)
    .await
    .map_err(StoreError::db)?;

    row.map(|row| {
        Ok(ProtocolRecord {
            tx_out_ref: TxOutRef::new(
                hash32(row.get("tx_id"))?,
                row.get::<i64, _>("output_index") as u32,
            ),
            params: ProtocolParams {
                element_id_policy: script_hash(row.get("element_id_policy"))?,
                set_elem_policy: script_hash(row.get("set_elem_policy"))?,
                set_validator: script_hash(row.get("set_validator"))?,
                records_validator: script_hash(row.get("records_validator"))?,
            },
        })
    })
    .transpose()
}

// ─── Name set ─────────────────────────────────────────────────────────────────

pub(crate) async fn insert_name_set_entry(
    conn: &mut SqliteConnection,
    entry: &NameSetEntry,
    created_slot: u64,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO name_set
         (name, pointer_currency, pointer_token, tx_id, output_index, created_slot)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.name)
    .bind(&entry.pointer.currency_symbol)
    .bind(&entry.pointer.token_name)
    .bind(entry.tx_out_ref.tx_id.as_bytes())
    .bind(i64::from(entry.tx_out_ref.index))
    .bind(created_slot as i64)
    .execute(&mut *conn)
    .await
    .map_err(StoreError::db)?;

    tracing::debug!(name = %String::from_utf8_lossy(&entry.name), "name registered");
    Ok(())
}

/// Greatest live name strictly below the query (BLOB comparison is raw
/// byte order), plus whether the exact name is live.
pub(crate) async fn select_predecessor(
    conn: &mut SqliteConnection,
    name: &[u8],
) -> Result<PredecessorLookup, StoreError> {
    let row = sqlx::query(
        "SELECT name, pointer_currency, pointer_token, tx_id, output_index
         FROM name_set WHERE name < ? ORDER BY name DESC LIMIT 1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StoreError::db)?;
    let predecessor = row.as_ref().map(entry_from_row).transpose()?;

    let name_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM name_set WHERE name = ?)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(StoreError::db)?;

    Ok(PredecessorLookup {
        predecessor,
        name_exists,
    })
}

/// The live name whose pointer token matches one of the given classes.
pub(crate) async fn select_name_by_pointer(
    conn: &mut SqliteConnection,
    classes: &[AssetClass],
) -> Result<Option<Vec<u8>>, StoreError> {
    for class in classes {
        let row = sqlx::query(
            "SELECT name FROM name_set WHERE pointer_currency = ? AND pointer_token = ?",
        )
        .bind(&class.currency_symbol)
        .bind(&class.token_name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StoreError::db)?;
        if let Some(row) = row {
            return Ok(Some(row.get("name")));
        }
    }
    Ok(None)
}

// ─── Record bundles ───────────────────────────────────────────────────────────

pub(crate) async fn insert_record_bundle(
    conn: &mut SqliteConnection,
    name: &[u8],
    tx_out_ref: &TxOutRef,
    records: &[ResourceRecord],
    created_slot: u64,
) -> Result<(), StoreError> {
    let records_json = serde_json::to_string(records).map_err(StoreError::db)?;

    sqlx::query(
        "INSERT INTO record_bundles (name, records_json, tx_id, output_index, created_slot)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(&records_json)
    .bind(tx_out_ref.tx_id.as_bytes())
    .bind(i64::from(tx_out_ref.index))
    .bind(created_slot as i64)
    .execute(&mut *conn)
    .await
    .map_err(StoreError::db)?;

    tracing::debug!(
        name = %String::from_utf8_lossy(name),
        records = records.len(),
        "record bundle stored"
    );
    Ok(())
}

/// Every live bundle's records for a name, flattened. Order within a
/// bundle is preserved; order across bundles follows insertion.
pub(crate) async fn select_records_for_name(
    conn: &mut SqliteConnection,
    name: &[u8],
) -> Result<Vec<ResourceRecord>, StoreError> {
    let rows = sqlx::query("SELECT records_json FROM record_bundles WHERE name = ? ORDER BY id")
        .bind(name)
        .fetch_all(conn)
        .await
        .map_err(StoreError::db)?;

    let mut records = Vec::new();
    for row in rows {
        let json: String = row.get("records_json");
        let bundle: Vec<ResourceRecord> = serde_json::from_str(&json).map_err(StoreError::db)?;
        records.extend(bundle);
    }
    Ok(records)
}

// ─── Tracked protocol asset class ─────────────────────────────────────────────

pub(crate) async fn protocol_asset_class(
    conn: &mut SqliteConnection,
) -> Result<Option<AssetClass>, StoreError> {
    let row = sqlx::query("SELECT nft_currency, nft_token FROM config WHERE id = 0")
        .fetch_optional(conn)
        .await
        .map_err(StoreError::db)?;
    Ok(row.map(|row| AssetClass::new(row.get("nft_currency"), row.get("nft_token"))))
}

pub(crate) async fn set_protocol_asset_class(
    conn: &mut SqliteConnection,
    class: &AssetClass,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR REPLACE INTO config (id, nft_currency, nft_token, updated_at)
         VALUES (0, ?, ?, ?)",
    )
    .bind(&class.currency_symbol)
    .bind(&class.token_name)
    .bind(chrono::Utc::now().timestamp())
    .execute(conn)
    .await
    .map_err(StoreError::db)?;

    tracing::debug!(class = %class, "tracked protocol asset class set");
    Ok(())
}

// ─── Counts ───────────────────────────────────────────────────────────────────

pub(crate) async fn count(conn: &mut SqliteConnection, table: Table) -> Result<u64, StoreError> {
    let sql = match table {
        Table::Points => "SELECT COUNT(*) FROM points",
        Table::LiveRefs => "SELECT COUNT(*) FROM live_refs",
        Table::NameSet => "SELECT COUNT(*) FROM name_set",
        Table::RecordBundles => "SELECT COUNT(*) FROM record_bundles",
    };
    let count: i64 = sqlx::query_scalar(sql)
        .fetch_one(conn)
        .await
        .map_err(StoreError::db)?;
    Ok(count as u64)
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Table {
    Points,
    LiveRefs,
    NameSet,
    RecordBundles,
}
