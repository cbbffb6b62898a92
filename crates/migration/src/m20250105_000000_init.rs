//! Initial schema migration.
//!
//! - `pharmacy_openings`: weekly opening intervals, one row per day
//! - `masks`: mask catalog lines sold by pharmacies
//! - `pharmacy_cash`: pharmacy cash accounts, one base row per pharmacy plus
//!   one per sold mask
//! - `users`: buyers and their cash balance
//! - `purchases`: append-only purchase ledger
//!
//! Money columns hold integer cents. Natural keys are enforced with unique
//! indexes so that re-running an ingestion only skips rows.

use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum PharmacyOpenings {
    Table,
    Id,
    Name,
    OpeningDay,
    OpenTime,
    CloseTime,
}

#[derive(Iden)]
enum Masks {
    Table,
    Id,
    Name,
    MaskName,
    Color,
    PackQuantity,
    Price,
}

#[derive(Iden)]
enum PharmacyCash {
    Table,
    Id,
    Name,
    SoldItem,
    CashBalance,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    CashBalance,
}

#[derive(Iden)]
enum Purchases {
    Table,
    Id,
    UserId,
    PharmacyName,
    MaskId,
    TrnAmount,
    TrnDate,
    IdempotencyKey,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Opening hours
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PharmacyOpenings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PharmacyOpenings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PharmacyOpenings::Name).string().not_null())
                    .col(
                        ColumnDef::new(PharmacyOpenings::OpeningDay)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PharmacyOpenings::OpenTime).string().not_null())
                    .col(
                        ColumnDef::new(PharmacyOpenings::CloseTime)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux-pharmacy_openings-interval")
                    .table(PharmacyOpenings::Table)
                    .col(PharmacyOpenings::Name)
                    .col(PharmacyOpenings::OpeningDay)
                    .col(PharmacyOpenings::OpenTime)
                    .col(PharmacyOpenings::CloseTime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Masks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Masks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Masks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Masks::Name).string().not_null())
                    .col(ColumnDef::new(Masks::MaskName).string().not_null())
                    .col(ColumnDef::new(Masks::Color).string().not_null())
                    .col(ColumnDef::new(Masks::PackQuantity).integer().not_null())
                    .col(ColumnDef::new(Masks::Price).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux-masks-catalog_line")
                    .table(Masks::Table)
                    .col(Masks::Name)
                    .col(Masks::MaskName)
                    .col(Masks::Color)
                    .col(Masks::PackQuantity)
                    .col(Masks::Price)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Pharmacy cash accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PharmacyCash::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PharmacyCash::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PharmacyCash::Name).string().not_null())
                    .col(ColumnDef::new(PharmacyCash::SoldItem).integer())
                    .col(
                        ColumnDef::new(PharmacyCash::CashBalance)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(PharmacyCash::CashBalance).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pharmacy_cash-sold_item")
                            .from(PharmacyCash::Table, PharmacyCash::SoldItem)
                            .to(Masks::Table, Masks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Target of the purchase credit upsert.
        manager
            .create_index(
                Index::create()
                    .name("ux-pharmacy_cash-name-sold_item")
                    .table(PharmacyCash::Table)
                    .col(PharmacyCash::Name)
                    .col(PharmacyCash::SoldItem)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // NULLs are distinct in the index above, so the base account (no
        // `sold_item`) needs its own partial index: one per pharmacy.
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"ux-pharmacy_cash-base\" \
             ON pharmacy_cash (name) WHERE sold_item IS NULL;"
                .to_string(),
        ))
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Users::CashBalance)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Users::CashBalance).gte(0)),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Purchases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::UserId).integer().not_null())
                    .col(ColumnDef::new(Purchases::PharmacyName).string().not_null())
                    .col(ColumnDef::new(Purchases::MaskId).integer().not_null())
                    .col(ColumnDef::new(Purchases::TrnAmount).big_integer().not_null())
                    .col(ColumnDef::new(Purchases::TrnDate).timestamp().not_null())
                    .col(ColumnDef::new(Purchases::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-user_id")
                            .from(Purchases::Table, Purchases::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-mask_id")
                            .from(Purchases::Table, Purchases::MaskId)
                            .to(Masks::Table, Masks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-user_id")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux-purchases-user_id-idempotency_key")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .col(Purchases::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PharmacyCash::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Masks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PharmacyOpenings::Table).to_owned())
            .await?;
        Ok(())
    }
}
