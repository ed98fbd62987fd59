use crate::entities::prelude::*;
use crate::entities::{episodes, media_directories, media_files, people};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_from_entity<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        create_from_entity(manager, &schema, Movies).await?;
        create_from_entity(manager, &schema, People).await?;
        create_from_entity(manager, &schema, Releases).await?;
        create_from_entity(manager, &schema, Series).await?;
        create_from_entity(manager, &schema, Episodes).await?;
        create_from_entity(manager, &schema, MediaFiles).await?;
        create_from_entity(manager, &schema, MediaDirectories).await?;
        create_from_entity(manager, &schema, ScanResults).await?;
        create_from_entity(manager, &schema, LibraryPaths).await?;
        create_from_entity(manager, &schema, MediaAssignments).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_people_role")
                    .table(People)
                    .col(people::Column::Role)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_series_season")
                    .table(Episodes)
                    .col(episodes::Column::SeriesId)
                    .col(episodes::Column::SeasonNumber)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_files_library_path")
                    .table(MediaFiles)
                    .col(media_files::Column::LibraryPath)
                    .col(media_files::Column::FilePath)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_files_scan_id")
                    .table(MediaFiles)
                    .col(media_files::Column::ScanId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_directories_scan_id")
                    .table(MediaDirectories)
                    .col(media_directories::Column::ScanId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "media_assignments",
            "library_paths",
            "scan_results",
            "media_directories",
            "media_files",
            "episodes",
            "series",
            "releases",
            "people",
            "movies",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
