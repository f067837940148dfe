use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Identities {
    Table,
    Id,
    Uuid,
    DisplayName,
    LastName,
    Email,
    Phone,
    Gender,
    PasswordHash,
    ReferralCode,
    ReferredBy,
    LinkToken,
    LinkCreatedAt,
    LinkExpiresAt,
    LinkClickCount,
    LinkActive,
    ArtifactRef,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Identities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Identities::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Identities::Uuid).uuid().not_null())
                    .col(
                        ColumnDef::new(Identities::DisplayName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Identities::LastName).string_len(255).not_null())
                    .col(ColumnDef::new(Identities::Email).string_len(254).not_null())
                    .col(ColumnDef::new(Identities::Phone).string_len(15).null())
                    .col(ColumnDef::new(Identities::Gender).string_len(10).null())
                    .col(
                        ColumnDef::new(Identities::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Identities::ReferralCode).string_len(7).not_null())
                    .col(ColumnDef::new(Identities::ReferredBy).big_integer().null())
                    .col(ColumnDef::new(Identities::LinkToken).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Identities::LinkCreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Identities::LinkExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Identities::LinkClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Identities::LinkActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Identities::ArtifactRef).string_len(255).null())
                    .col(
                        ColumnDef::new(Identities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_identities_referred_by")
                            .from(Identities::Table, Identities::ReferredBy)
                            .to(Identities::Table, Identities::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Allocation retries key off these names, keep them stable.
        for (name, column) in [
            ("uq_identities_uuid", Identities::Uuid),
            ("uq_identities_email", Identities::Email),
            ("uq_identities_phone", Identities::Phone),
            ("uq_identities_referral_code", Identities::ReferralCode),
            ("uq_identities_link_token", Identities::LinkToken),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name(name)
                        .table(Identities::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_identities_referred_by_created_at")
                    .table(Identities::Table)
                    .col(Identities::ReferredBy)
                    .col(Identities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Identities::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
