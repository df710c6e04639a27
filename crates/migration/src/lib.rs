pub use sea_orm_migration::prelude::*;

mod m20260201_000001_category;
mod m20260201_000002_expense;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260201_000001_category::Migration),
            Box::new(m20260201_000002_expense::Migration),
        ]
    }
}
