use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    Code,
    Status,
    HostPlayerId,
    RoundsTotal,
    CurrentRound,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum Players {
    Table,
    Id,
    SessionId,
    DisplayName,
    IsHost,
    JoinOrder,
    JoinedAt,
}

#[derive(Iden)]
enum Rounds {
    Table,
    Id,
    SessionId,
    Number,
    ImageUrl,
    Status,
    StartsAt,
    EndsAt,
}

#[derive(Iden)]
enum Captions {
    Table,
    Id,
    SessionId,
    RoundId,
    PlayerId,
    DisplayName,
    Text,
    SubmittedAt,
    Humour,
    Relevance,
    Total,
    Roast,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // sessions
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::Code).string_len(6).not_null())
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string_len(16)
                            .not_null()
                            .default("lobby"),
                    )
                    .col(ColumnDef::new(Sessions::HostPlayerId).string().not_null())
                    .col(ColumnDef::new(Sessions::RoundsTotal).small_integer().not_null())
                    .col(
                        ColumnDef::new(Sessions::CurrentRound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Session codes are the insert-if-absent key for create-session.
        manager
            .create_index(
                Index::create()
                    .name("ux_sessions_code")
                    .table(Sessions::Table)
                    .col(Sessions::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_sessions_expires_at")
                    .table(Sessions::Table)
                    .col(Sessions::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // players
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Players::SessionId).string().not_null())
                    .col(ColumnDef::new(Players::DisplayName).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Players::IsHost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Players::JoinOrder).integer().not_null())
                    .col(
                        ColumnDef::new(Players::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_players_session")
                            .from(Players::Table, Players::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_players_session_join_order")
                    .table(Players::Table)
                    .col(Players::SessionId)
                    .col(Players::JoinOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // rounds
        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rounds::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Rounds::SessionId).string().not_null())
                    .col(ColumnDef::new(Rounds::Number).integer().not_null())
                    .col(ColumnDef::new(Rounds::ImageUrl).text().not_null())
                    .col(
                        ColumnDef::new(Rounds::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Rounds::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rounds::EndsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_session")
                            .from(Rounds::Table, Rounds::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_rounds_session_number")
                    .table(Rounds::Table)
                    .col(Rounds::SessionId)
                    .col(Rounds::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // captions
        manager
            .create_table(
                Table::create()
                    .table(Captions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Captions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Captions::SessionId).string().not_null())
                    .col(ColumnDef::new(Captions::RoundId).string().not_null())
                    .col(ColumnDef::new(Captions::PlayerId).string().not_null())
                    .col(ColumnDef::new(Captions::DisplayName).string_len(30).not_null())
                    .col(ColumnDef::new(Captions::Text).text().not_null())
                    .col(
                        ColumnDef::new(Captions::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Captions::Humour).small_integer().null())
                    .col(ColumnDef::new(Captions::Relevance).small_integer().null())
                    .col(ColumnDef::new(Captions::Total).small_integer().null())
                    .col(ColumnDef::new(Captions::Roast).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_captions_session")
                            .from(Captions::Table, Captions::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_captions_round")
                            .from(Captions::Table, Captions::RoundId)
                            .to(Rounds::Table, Rounds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_captions_player")
                            .from(Captions::Table, Captions::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One caption per (round, player); enforced here, never by read-then-write.
        manager
            .create_index(
                Index::create()
                    .name("ux_captions_round_player")
                    .table(Captions::Table)
                    .col(Captions::RoundId)
                    .col(Captions::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Captions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rounds::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
