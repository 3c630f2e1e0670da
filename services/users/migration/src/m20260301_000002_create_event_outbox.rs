use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventOutbox::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventOutbox::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventOutbox::EventType).string().not_null())
                    .col(
                        ColumnDef::new(EventOutbox::EventDateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventOutbox::Environment).string().not_null())
                    .col(ColumnDef::new(EventOutbox::EventContext).text().not_null())
                    .col(
                        ColumnDef::new(EventOutbox::Processed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EventOutbox::ProcessedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Dispatcher poll: pending rows, oldest id first.
        manager
            .create_index(
                Index::create()
                    .table(EventOutbox::Table)
                    .col(EventOutbox::Processed)
                    .col(EventOutbox::Id)
                    .name("idx_event_outbox_processed_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventOutbox::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EventOutbox {
    Table,
    Id,
    EventType,
    EventDateTime,
    Environment,
    EventContext,
    Processed,
    ProcessedAt,
}
