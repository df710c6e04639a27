//! Creates `expense`.
//!
//! Amounts are stored as integer minor units. `note_norm` holds the folded
//! note used by case-insensitive search.

use sea_orm_migration::prelude::*;

use crate::m20260201_000001_category::Category;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Expense {
    Table,
    Id,
    CategoryId,
    Count,
    UnitPriceMinor,
    TotalPriceMinor,
    LocalDate,
    Note,
    NoteNorm,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expense::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expense::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expense::CategoryId).integer().not_null())
                    .col(
                        ColumnDef::new(Expense::Count)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Expense::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expense::TotalPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expense::LocalDate).date().not_null())
                    .col(ColumnDef::new(Expense::Note).string())
                    .col(ColumnDef::new(Expense::NoteNorm).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense-category_id")
                            .from(Expense::Table, Expense::CategoryId)
                            .to(Category::Table, Category::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense-local_date")
                    .table(Expense::Table)
                    .col(Expense::LocalDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense-category_id")
                    .table(Expense::Table)
                    .col(Expense::CategoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expense::Table).to_owned())
            .await
    }
}
