#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use engine::{
    Engine,
    transform::{PharmacyDocument, UserDocument},
};
use migration::MigratorTrait;

pub const PHARMACIES: &str = r#"[
    {
        "name": "DFW Wellness",
        "cashBalance": 328.41,
        "openingHours": "Mon, Wed, Fri 08:00 - 12:00 / Tue, Thu 14:00 - 18:00",
        "masks": [
            {"name": "True Barrier (green) (3 per pack)", "price": 13.7},
            {"name": "MaskT (green) (10 per pack)", "price": 41.86},
            {"name": "Second Smile (black) (10 per pack)", "price": 15.99},
            {"name": "Cheap Cover (white) (1 per pack)", "price": 10}
        ]
    },
    {
        "name": "Carepoint",
        "cashBalance": 593.35,
        "openingHours": "Mon - Fri 08:00 - 17:00 / Sat, Sun 08:00 - 12:00",
        "masks": [
            {"name": "Masquerade (blue) (6 per pack)", "price": 16.75},
            {"name": "Not a mask", "price": 1}
        ]
    },
    {
        "name": "Night Owl",
        "cashBalance": 10,
        "openingHours": "Mon, Thur 20:00 - 22:00",
        "masks": []
    }
]"#;

pub const USERS: &str = r#"[
    {
        "name": "Yvonne Guerrero",
        "cashBalance": 191.83,
        "purchaseHistories": [
            {"pharmacyName": "DFW Wellness", "maskName": "True Barrier (green) (3 per pack)",
             "transactionAmount": 12.35, "transactionDate": "2021-01-04 15:18:51"},
            {"pharmacyName": "Carepoint", "maskName": "Masquerade (blue) (6 per pack)",
             "transactionAmount": 16.75, "transactionDate": "2021-01-05 09:00:00"},
            {"pharmacyName": "Nowhere", "maskName": "Ghost (clear) (1 per pack)",
             "transactionAmount": 1, "transactionDate": "2021-01-06 09:00:00"}
        ]
    },
    {
        "name": "Ada Pierce",
        "cashBalance": 50,
        "purchaseHistories": []
    }
]"#;

async fn engine_on(options: ConnectOptions) -> (Engine, DatabaseConnection) {
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Engine on `sqlite::memory:`; a single pooled connection, since every
/// connection to `:memory:` is a separate database.
pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    engine_on(options).await
}

/// SQLite file in the temp dir, removed on drop.
pub struct TempDb {
    path: PathBuf,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Seeded engine on a file database with a pool of `connections`, so that
/// concurrent transactions really run on separate connections.
pub async fn seeded_file_engine(connections: u32) -> (Engine, DatabaseConnection, TempDb) {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let path = std::env::temp_dir().join(format!(
        "phantom_mask_test_{}_{}.db",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    let temp = TempDb { path };
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", temp.path.display()));
    options.max_connections(connections).sqlx_logging(false);
    let (engine, db) = engine_on(options).await;
    seed(&engine).await;
    (engine, db, temp)
}

pub fn pharmacies() -> Vec<PharmacyDocument> {
    serde_json::from_str(PHARMACIES).unwrap()
}

pub fn users() -> Vec<UserDocument> {
    serde_json::from_str(USERS).unwrap()
}

/// Engine loaded with the fixture documents.
pub async fn seeded_engine() -> (Engine, DatabaseConnection) {
    let (engine, db) = engine_with_db().await;
    seed(&engine).await;
    (engine, db)
}

pub async fn seed(engine: &Engine) {
    engine.ingest_pharmacies(&pharmacies()).await.unwrap();
    engine.ingest_users(&users()).await.unwrap();
}

pub async fn mask_id(engine: &Engine, pharmacy: &str, mask_name: &str) -> i32 {
    engine
        .pharmacy_masks(pharmacy, engine::MaskSort::Name)
        .await
        .unwrap()
        .into_iter()
        .find(|mask| mask.mask_name == mask_name)
        .map(|mask| mask.id)
        .expect("fixture mask missing")
}
