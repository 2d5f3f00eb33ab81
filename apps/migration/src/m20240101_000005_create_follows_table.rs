use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000005_create_follows_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Follows::UserId).uuid().not_null())
                    .col(ColumnDef::new(Follows::AuthorId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-follows-user_id")
                            .from(Follows::Table, Follows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-follows-author_id")
                            .from(Follows::Table, Follows::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // `follow` relies on this for ON CONFLICT DO NOTHING
        manager
            .create_index(
                Index::create()
                    .name("idx-follows-user_id-author_id")
                    .table(Follows::Table)
                    .col(Follows::UserId)
                    .col(Follows::AuthorId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Follows {
    Table,
    Id,
    UserId,
    AuthorId,
}
