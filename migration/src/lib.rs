pub use sea_orm_migration::prelude::*;

mod m20261018_120000_create_table_feedback;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261018_120000_create_table_feedback::Migration)]
    }
}
