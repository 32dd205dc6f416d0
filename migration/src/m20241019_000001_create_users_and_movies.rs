use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len_uniq(Users::Username, 80))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string_len(Movies::Title, 120))
                    .col(string_len(Movies::Director, 120))
                    .col(integer(Movies::Year))
                    .col(double(Movies::Rating))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserMovies::Table)
                    .if_not_exists()
                    .col(integer(UserMovies::UserId))
                    .col(integer(UserMovies::MovieId))
                    .primary_key(Index::create().col(UserMovies::UserId).col(UserMovies::MovieId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_movies_user")
                            .from(UserMovies::Table, UserMovies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_movies_movie")
                            .from(UserMovies::Table, UserMovies::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_movies_movie_id")
                    .table(UserMovies::Table)
                    .col(UserMovies::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserMovies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Director,
    Year,
    Rating,
}

#[derive(DeriveIden)]
enum UserMovies {
    Table,
    UserId,
    MovieId,
}
