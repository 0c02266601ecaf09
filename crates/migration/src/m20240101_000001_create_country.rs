//! Create `country` table.
//! Country names are globally unique; the index is the atomic backstop for
//! concurrent creates racing past the service-level check.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(uuid(Country::Id).primary_key())
                    .col(string_len(Country::Name, 255).not_null())
                    .col(string_len(Country::Capital, 255).not_null())
                    .col(big_integer(Country::Population).not_null())
                    .col(string_len(Country::Region, 255).not_null())
                    .col(ColumnDef::new(Country::FlagUrl).string_len(255).null())
                    .col(ColumnDef::new(Country::Motto).string_len(255).null())
                    .col(ColumnDef::new(Country::Language).string_len(255).null())
                    .col(ColumnDef::new(Country::Description).text().null())
                    .col(timestamp_with_time_zone(Country::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Country::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_country_name_unique")
                    .table(Country::Table)
                    .col(Country::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Country::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Country {
    Table,
    Id,
    Name,
    Capital,
    Population,
    Region,
    FlagUrl,
    Motto,
    Language,
    Description,
    CreatedAt,
    UpdatedAt,
}
