use sea_orm_migration::prelude::*;
use uuid::Uuid;

/// Seeds the admin group and the method-level access rules: READ is open
/// to everyone, everything else requires the admin group until operators
/// change the rules.
#[derive(DeriveMigrationName)]
pub struct Migration;

const ADMIN_GROUP: &str = "admins";
const ENTITIES: [&str; 7] = [
    "block", "element", "section", "point", "user", "group", "file",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = time::OffsetDateTime::now_utc();

        let mut groups = Query::insert()
            .into_table(Groups::Table)
            .columns([
                Groups::Id,
                Groups::Title,
                Groups::CreatedAt,
                Groups::UpdatedAt,
            ])
            .to_owned();
        groups.values_panic([
            ADMIN_GROUP.into(),
            "Administrators".into(),
            now.into(),
            now.into(),
        ]);
        manager.exec_stmt(groups).await?;

        let mut rules = Query::insert()
            .into_table(AccessRules::Table)
            .columns([
                AccessRules::Id,
                AccessRules::Entity,
                AccessRules::Method,
                AccessRules::GroupId,
            ])
            .to_owned();
        for entity in ENTITIES {
            rules.values_panic([
                Uuid::now_v7().into(),
                entity.into(),
                "READ".into(),
                None::<String>.into(),
            ]);
            rules.values_panic([
                Uuid::now_v7().into(),
                entity.into(),
                "ALL".into(),
                ADMIN_GROUP.into(),
            ]);
        }
        manager.exec_stmt(rules).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(AccessRules::Table).to_owned())
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Groups::Table)
                    .and_where(Expr::col(Groups::Id).eq(ADMIN_GROUP))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
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
enum AccessRules {
    Table,
    Id,
    Entity,
    Method,
    GroupId,
}
