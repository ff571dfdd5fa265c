use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Base tables, one per entity kind.
        manager
            .create_table(
                Table::create()
                    .table(Blocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blocks::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Blocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Blocks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Elements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Elements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Elements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Elements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sections::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Points::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Points::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Points::ParentId).string().null())
                    .col(
                        ColumnDef::new(Points::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Points::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Login).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Title).string().not_null())
                    .col(
                        ColumnDef::new(Groups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Groups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Files::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Files::FileName).string().not_null())
                    .col(ColumnDef::new(Files::MimeType).string().null())
                    .col(ColumnDef::new(Files::Size).big_integer().null())
                    .col(
                        ColumnDef::new(Files::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Files::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Shared attribute tables, keyed by (owner_kind, parent_id).
        manager
            .create_table(
                Table::create()
                    .table(AttrStrings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrStrings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttrStrings::OwnerKind).string().not_null())
                    .col(ColumnDef::new(AttrStrings::ParentId).string().not_null())
                    .col(ColumnDef::new(AttrStrings::AttributeId).string().not_null())
                    .col(ColumnDef::new(AttrStrings::LanguageId).string().null())
                    .col(ColumnDef::new(AttrStrings::Value).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_strings_owner")
                    .table(AttrStrings::Table)
                    .col(AttrStrings::OwnerKind)
                    .col(AttrStrings::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttrDescriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrDescriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttrDescriptions::OwnerKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttrDescriptions::ParentId).string().not_null())
                    .col(
                        ColumnDef::new(AttrDescriptions::AttributeId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttrDescriptions::LanguageId).string().null())
                    .col(ColumnDef::new(AttrDescriptions::Value).text().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_descriptions_owner")
                    .table(AttrDescriptions::Table)
                    .col(AttrDescriptions::OwnerKind)
                    .col(AttrDescriptions::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttrPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrPoints::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttrPoints::OwnerKind).string().not_null())
                    .col(ColumnDef::new(AttrPoints::ParentId).string().not_null())
                    .col(ColumnDef::new(AttrPoints::AttributeId).string().not_null())
                    .col(ColumnDef::new(AttrPoints::PointId).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_points_owner")
                    .table(AttrPoints::Table)
                    .col(AttrPoints::OwnerKind)
                    .col(AttrPoints::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttrCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrCounters::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttrCounters::OwnerKind).string().not_null())
                    .col(ColumnDef::new(AttrCounters::ParentId).string().not_null())
                    .col(ColumnDef::new(AttrCounters::AttributeId).string().not_null())
                    .col(ColumnDef::new(AttrCounters::PointId).string().null())
                    .col(ColumnDef::new(AttrCounters::MeasureId).string().null())
                    .col(ColumnDef::new(AttrCounters::Count).double().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_counters_owner")
                    .table(AttrCounters::Table)
                    .col(AttrCounters::OwnerKind)
                    .col(AttrCounters::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AttrFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrFiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttrFiles::OwnerKind).string().not_null())
                    .col(ColumnDef::new(AttrFiles::ParentId).string().not_null())
                    .col(ColumnDef::new(AttrFiles::AttributeId).string().not_null())
                    .col(ColumnDef::new(AttrFiles::FileId).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_files_owner")
                    .table(AttrFiles::Table)
                    .col(AttrFiles::OwnerKind)
                    .col(AttrFiles::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AclEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AclEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AclEntries::OwnerKind).string().not_null())
                    .col(ColumnDef::new(AclEntries::ParentId).string().not_null())
                    .col(ColumnDef::new(AclEntries::GroupId).string().null())
                    .col(ColumnDef::new(AclEntries::Method).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_acl_entries_owner")
                    .table(AclEntries::Table)
                    .col(AclEntries::OwnerKind)
                    .col(AclEntries::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccessRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessRules::Entity).string().not_null())
                    .col(ColumnDef::new(AccessRules::Method).string().not_null())
                    .col(ColumnDef::new(AccessRules::GroupId).string().null())
                    .to_owned(),
            )
            .await?;

        // Membership join tables.
        manager
            .create_table(
                Table::create()
                    .table(ElementBlocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ElementBlocks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ElementBlocks::ElementId).string().not_null())
                    .col(ColumnDef::new(ElementBlocks::BlockId).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ElementSections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ElementSections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ElementSections::ElementId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ElementSections::SectionId)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserGroups::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserGroups::UserId).string().not_null())
                    .col(ColumnDef::new(UserGroups::GroupId).string().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Table::drop().table(UserGroups::Table).to_owned(),
            Table::drop().table(ElementSections::Table).to_owned(),
            Table::drop().table(ElementBlocks::Table).to_owned(),
            Table::drop().table(AccessRules::Table).to_owned(),
            Table::drop().table(AclEntries::Table).to_owned(),
            Table::drop().table(AttrFiles::Table).to_owned(),
            Table::drop().table(AttrCounters::Table).to_owned(),
            Table::drop().table(AttrPoints::Table).to_owned(),
            Table::drop().table(AttrDescriptions::Table).to_owned(),
            Table::drop().table(AttrStrings::Table).to_owned(),
            Table::drop().table(Files::Table).to_owned(),
            Table::drop().table(Groups::Table).to_owned(),
            Table::drop().table(Users::Table).to_owned(),
            Table::drop().table(Points::Table).to_owned(),
            Table::drop().table(Sections::Table).to_owned(),
            Table::drop().table(Elements::Table).to_owned(),
            Table::drop().table(Blocks::Table).to_owned(),
        ] {
            manager.drop_table(table).await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Blocks {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Elements {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sections {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Points {
    Table,
    Id,
    ParentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Login,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    FileName,
    MimeType,
    Size,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AttrStrings {
    Table,
    Id,
    OwnerKind,
    ParentId,
    AttributeId,
    LanguageId,
    Value,
}

#[derive(DeriveIden)]
enum AttrDescriptions {
    Table,
    Id,
    OwnerKind,
    ParentId,
    AttributeId,
    LanguageId,
    Value,
}

#[derive(DeriveIden)]
enum AttrPoints {
    Table,
    Id,
    OwnerKind,
    ParentId,
    AttributeId,
    PointId,
}

#[derive(DeriveIden)]
enum AttrCounters {
    Table,
    Id,
    OwnerKind,
    ParentId,
    AttributeId,
    PointId,
    MeasureId,
    Count,
}

#[derive(DeriveIden)]
enum AttrFiles {
    Table,
    Id,
    OwnerKind,
    ParentId,
    AttributeId,
    FileId,
}

#[derive(DeriveIden)]
enum AclEntries {
    Table,
    Id,
    OwnerKind,
    ParentId,
    GroupId,
    Method,
}

#[derive(DeriveIden)]
enum AccessRules {
    Table,
    Id,
    Entity,
    Method,
    GroupId,
}

#[derive(DeriveIden)]
enum ElementBlocks {
    Table,
    Id,
    ElementId,
    BlockId,
}

#[derive(DeriveIden)]
enum ElementSections {
    Table,
    Id,
    ElementId,
    SectionId,
}

#[derive(DeriveIden)]
enum UserGroups {
    Table,
    Id,
    UserId,
    GroupId,
}
