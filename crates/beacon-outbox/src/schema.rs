//! sea-orm entity for the outbox table.

pub mod event_outbox {
    use sea_orm::entity::prelude::*;

    /// Domain event waiting for (or done with) delivery to the event log.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "event_outbox")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub event_type: String,
        /// Write time of the entry, not the business time of the event.
        pub event_date_time: chrono::DateTime<chrono::Utc>,
        pub environment: String,
        /// Serialized event body (JSON text).
        #[sea_orm(column_type = "Text")]
        pub event_context: String,
        pub processed: bool,
        pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
