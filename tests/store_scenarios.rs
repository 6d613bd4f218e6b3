#![allow(missing_docs)]

use minidb::{
    DbError, KeyPolicy, QueryEngine, Record, RecordStore, Result, Schema, StoreConfig, Value,
    ValueKind,
};

fn game(appid: i64, name: &str, price: f64) -> Record {
    Record::new()
        .with("appid", appid)
        .with("name", name)
        .with("mat_final_price", price)
}

fn catalog() -> Result<QueryEngine> {
    let store = RecordStore::new(StoreConfig::compact(["appid", "mat_final_price"]))?;
    let mut engine = QueryEngine::new(store, "appid")?;
    engine.insert_record(game(1, "Portal", 10.0))?;
    engine.insert_record(game(2, "Dota", 20.0))?;
    engine.insert_record(game(3, "Quake", 15.0))?;
    Ok(engine)
}

fn appids(records: &[&Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|record| record.get("appid").and_then(Value::as_i64))
        .collect()
}

#[test]
fn range_follows_deletes() -> Result<()> {
    let mut engine = catalog()?;
    let low = Value::Int(12);
    let high = Value::Int(20);

    assert_eq!(appids(&engine.range_query("mat_final_price", &low, &high)?), vec![3, 2]);
    assert!(engine.delete_record(&Value::Int(2))?);
    assert_eq!(appids(&engine.range_query("mat_final_price", &low, &high)?), vec![3]);
    assert!(engine.search_record(&Value::Int(2))?.is_empty());
    Ok(())
}

#[test]
fn deleted_slot_is_handed_to_the_next_insert() -> Result<()> {
    let mut engine = catalog()?;
    let slot = engine.store().find_slots("appid", &Value::Int(1))?[0];
    engine.delete_record(&Value::Int(1))?;

    let reused = engine.insert_record(game(4, "Braid", 14.99))?;
    assert_eq!(reused, slot);
    let next = engine.insert_record(game(5, "Limbo", 9.99))?;
    assert_eq!(next, 3);
    engine.store().verify_indexes()?;
    Ok(())
}

#[test]
fn update_keeps_slot_and_moves_range_membership() -> Result<()> {
    let mut engine = catalog()?;
    let slot = engine.store().find_slots("appid", &Value::Int(1))?[0];
    engine.update_record(&Value::Int(1), "mat_final_price", Value::Float(18.5))?;

    assert_eq!(engine.store().find_slots("appid", &Value::Int(1))?, vec![slot]);
    let hits = engine.range_query("mat_final_price", &Value::Int(12), &Value::Int(20))?;
    assert_eq!(appids(&hits), vec![3, 1, 2]);
    assert_eq!(
        engine.get_record(slot).and_then(|r| r.get("name")),
        Some(&Value::from("Portal"))
    );
    Ok(())
}

#[test]
fn null_sentinel_sorts_first() -> Result<()> {
    let mut engine = catalog()?;
    engine.insert_record(
        Record::new()
            .with("appid", 9)
            .with("mat_final_price", Value::Null),
    )?;
    let index = engine.store().index("mat_final_price")?;
    assert_eq!(index.min_key(), Some(&Value::Null));

    let free = engine.range_query("mat_final_price", &Value::Null, &Value::Null)?;
    assert_eq!(appids(&free), vec![9]);
    let priced = engine.range_query("mat_final_price", &Value::Int(0), &Value::Int(100))?;
    assert_eq!(priced.len(), 3);
    Ok(())
}

#[test]
fn errors_surface_without_side_effects() -> Result<()> {
    let mut engine = catalog()?;
    let before = engine.store().slot_count();

    let missing = engine.insert_record(Record::new().with("appid", 7));
    assert_eq!(missing.unwrap_err(), DbError::MissingAttribute("mat_final_price".into()));
    assert_eq!(engine.store().slot_count(), before);

    assert!(matches!(
        engine.range_query("name", &Value::from("a"), &Value::from("z")),
        Err(DbError::UnindexedAttribute(_))
    ));
    assert!(matches!(
        engine.range_query("mat_final_price", &Value::Int(30), &Value::Int(1)),
        Err(DbError::InvalidRange { .. })
    ));
    engine.store().verify_indexes()?;
    Ok(())
}

#[test]
fn strict_engine_with_schema() -> Result<()> {
    let schema = Schema::new()
        .field("appid", ValueKind::Int)
        .field("mat_final_price", ValueKind::Float)
        .field("name", ValueKind::Str);
    let store = RecordStore::new(
        StoreConfig::append_only(["appid", "mat_final_price"]).with_schema(schema),
    )?;
    let mut engine = QueryEngine::with_policy(store, "appid", KeyPolicy::StrictUnique)?;
    engine.insert_record(game(1, "Portal", 10.0))?;

    assert!(matches!(
        engine.insert_record(game(1, "Portal again", 1.0)),
        Err(DbError::DuplicateKey { .. })
    ));
    assert!(matches!(
        engine.insert_record(Record::new().with("appid", 2).with("mat_final_price", "free")),
        Err(DbError::TypeMismatch { .. })
    ));
    assert_eq!(engine.store().len(), 1);
    Ok(())
}

#[test]
fn metrics_track_the_workload() -> Result<()> {
    let mut engine = catalog()?;
    engine.search_record(&Value::Int(1))?;
    engine.delete_record(&Value::Int(1))?;
    engine.insert_record(game(4, "Braid", 14.99))?;

    let metrics = engine.store().metrics();
    assert_eq!(metrics.inserts, 4);
    assert_eq!(metrics.deletes, 1);
    assert_eq!(metrics.slots_reused, 1);
    assert!(metrics.reuse_rate() > 0.0);
    Ok(())
}
